//! Source lookups: aliases, subsources and types.

use wxdict_tests::prelude::*;

fn setup() -> ConfigStore {
    Fixture::tree("setup").unwrap().search("site").store()
}

mod aliases {
    use super::*;

    #[test]
    fn test_alias_symmetry() {
        let mut store = setup();
        assert!(store.equivalent_source_definitions("GEM", "cmc"));
        assert!(store.equivalent_source_definitions("cmc", "gem"));
        assert!(store.equivalent_source_definitions("Gdps", "CMC"));
        assert!(!store.equivalent_source_definitions("GEM", "Interp"));
        assert!(!store.equivalent_source_definitions("GEM", "Nowhere"));
    }

    #[test]
    fn test_every_alias_lists_the_same_names() {
        let mut store = setup();
        let from_name = store.identify_source_aliases("GEM");
        assert_eq!(from_name, vec!["CMC", "GDPS", "GEM"]);
        assert_eq!(store.identify_source_aliases("cmc"), from_name);
        assert!(store.identify_source_aliases("Nowhere").is_empty());
    }
}

mod subsources {
    use super::*;

    #[test]
    fn test_subsource_by_qualified_name() {
        let mut store = setup();
        let regional = store.identify_source("cmc:regional", None).unwrap();
        assert_eq!(regional.sub, 1);
        let gem = store.source(regional.source).unwrap();
        assert_eq!(gem.full_name(regional.sub), "GEM:Regional");
        assert_eq!(gem.sub_label(1), "GEM Regional");
        assert_eq!(gem.sub_label(2), "GEM model");
        assert!(store.identify_source("GEM:Hemispheric", None).is_none());
    }
}

mod types {
    use super::*;

    #[test]
    fn test_sources_by_type() {
        let mut store = setup();
        assert_eq!(store.identify_sources_by_type(SourceType::Guidance).len(), 1);
        assert_eq!(store.identify_sources_by_type(SourceType::Depiction).len(), 1);
        assert_eq!(store.identify_sources_by_type(SourceType::Direct).len(), 1);
        assert_eq!(store.identify_sources_by_type(SourceType::Any).len(), 3);
        assert!(store.identify_sources_by_type(SourceType::Maps).is_empty());
    }

    #[test]
    fn test_source_info() {
        let mut store = setup();
        let interp = store.get_source_info("interp", None).unwrap();
        assert_eq!(interp.directory_tag.as_deref(), Some("Data"));
        assert_eq!(interp.directory_path.as_deref(), Some("interp"));
        assert!(interp.allied.is_none());
    }
}
