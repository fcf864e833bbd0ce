#![no_main]
use libfuzzer_sys::fuzz_target;
use rbparse::automaton::DefinitionGrammar;
use rbparse::builder::{AstBuilder, ParseRoot};
use rbparse::{DiagnosticClass, Driver, DriverConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    for aware in [true, false] {
        let config = DriverConfig::new()
            .with_indentation_aware(aware)
            .with_reprocess_limit(16 * source.len());
        let mut driver = Driver::from_source(source, AstBuilder::new(), config);
        let ast = driver
            .parse::<DefinitionGrammar>(ParseRoot::new("fuzz.rb"), false)
            .unwrap();

        assert!(ast.is_some());
        assert!(driver.scopes().is_empty());
        assert_eq!(driver.scopes().enters(), driver.scopes().exits());
        assert_eq!(driver.diagnostics().count(DiagnosticClass::InternalError), 0);
        if !aware {
            assert_eq!(driver.stats().backtracks, 0);
        }
    }
});
