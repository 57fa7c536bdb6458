//! Included files, search directories and redeclaration across files.

use wxdict_tests::prelude::*;

mod redeclaration {
    use super::*;

    fn setup() -> ConfigStore {
        Fixture::tree("setup").unwrap().search("site").store()
    }

    #[test]
    fn test_fixture_loads_cleanly() {
        let mut store = setup();
        assert!(store.read_complete_config());
        assert_clean(&store);
    }

    #[test]
    fn test_included_file_adds_aliases() {
        let mut store = setup();
        let found = store.identify_source("GDPS", None).unwrap();
        let gem = store.source(found.source).unwrap();
        assert_eq!(gem.name, "GEM");
        assert_eq!(gem.labels.label.as_deref(), Some("GEM model"));
        assert_eq!(gem.source_type, Some(SourceType::Guidance));
        assert_eq!(gem.subsources().len(), 3);
        assert_eq!(gem.blocks.len(), 2);
        assert_ne!(gem.blocks[0].file, gem.blocks[1].file);
    }

    #[test]
    fn test_redeclared_element_keeps_settings() {
        let mut store = setup();
        assert!(store.equivalent_element_definitions("TT", "temperature"));
        let id = store.identify_element("tt").unwrap();
        let temperature = store.element(id).unwrap();
        assert_eq!(temperature.labels.label.as_deref(), Some("Temperature"));
        assert_eq!(temperature.kind(), LevelType::Level);
        assert_eq!(store.identify_element_aliases("temp"), vec!["temp", "temperature", "TT"]);
    }

    #[test]
    fn test_detail_read_across_files() {
        let mut store = setup();
        let temperature = store.get_element_info("TT").unwrap();
        let detail = temperature.detail().unwrap();
        assert!(detail.editor.is_some());
        assert_eq!(detail.labelling.len(), 1);
        assert_eq!(detail.labelling[0].name, "label");
    }
}

mod search_path {
    use super::*;

    #[test]
    fn test_missing_include_is_structural() {
        let mut store = Fixture::tree("setup").unwrap().store();
        assert!(!store.read_complete_config());
        assert!(store
            .diagnostics()
            .iter()
            .any(|e| e.class() == ErrorClass::Structural));

        // Everything outside the missing file still loads.
        assert!(store.identify_source("GEM", None).is_some());
        assert!(store.identify_source("GDPS", None).is_none());
        assert!(store.identify_source("Obs", None).is_none());
    }

    #[test]
    fn test_missing_fixture() {
        assert!(matches!(
            Fixture::tree("no_such_tree"),
            Err(FixtureError::Missing(name)) if name == "no_such_tree"
        ));
    }

    #[test]
    fn test_include_next_to_including_file() {
        let scratch = ScratchConfig::new()
            .unwrap()
            .file("root.cfg", "include common/units.cfg\n")
            .unwrap()
            .file("common/units.cfg", "include base.cfg\nUnits { kmh { MKS_equivalent = mps; MKS_conversion = 0.27778 } }\n")
            .unwrap()
            .file("common/base.cfg", "Units { mps { MKS_equivalent = mps } }\n")
            .unwrap();
        let mut store = scratch.store("root.cfg", &[]);
        assert_close(store.convert_value("kmh", 36.0, "mps"), 10.0, 1e-3);
        assert_clean(&store);
    }

    #[test]
    fn test_include_found_in_search_dir() {
        let scratch = ScratchConfig::new()
            .unwrap()
            .file("config/root.cfg", "include shared.cfg\nSources { Interp { source_type = Depiction } }\n")
            .unwrap()
            .file("shared/shared.cfg", "Sources { Shared { source_type = Maps } }\n")
            .unwrap();
        let mut store = scratch.store("config/root.cfg", &["shared"]);
        assert!(store.read_complete_config());
        assert_eq!(store.identify_sources_by_type(SourceType::Any).len(), 2);
        assert!(store.identify_source("shared", None).is_some());
    }

    #[test]
    fn test_include_cycle_reported() {
        let scratch = ScratchConfig::new()
            .unwrap()
            .file("a.cfg", "include b.cfg\nUnits { m { MKS_equivalent = m } }\n")
            .unwrap()
            .file("b.cfg", "include a.cfg\nUnits { km { MKS_equivalent = m; MKS_conversion = 1000 } }\n")
            .unwrap();
        let mut store = scratch.store("a.cfg", &[]);
        assert!(!store.read_complete_config());
        assert_close(store.convert_value("km", 2.0, "m"), 2000.0, 1e-9);
    }

    #[test]
    fn test_newer_revision_refused() {
        let scratch = ScratchConfig::new()
            .unwrap()
            .file("root.cfg", "revision 8.0\ninclude future.cfg\n")
            .unwrap()
            .file("future.cfg", "revision 9.0\nUnits { m { MKS_equivalent = m } }\n")
            .unwrap();
        let mut store = scratch.store("root.cfg", &[]);
        assert!(store.identify_unit("m").is_none());
        assert!(!store.read_complete_config());
    }
}
