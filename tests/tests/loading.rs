//! Lazy, read-once loading and the guarantees that come with it.

use wxdict_tests::prelude::*;

mod read_once {
    use super::*;

    #[test]
    fn test_each_registry_read_once() {
        let mut store = Fixture::tree("setup").unwrap().search("site").store();
        for _ in 0..3 {
            store.identify_field("temperature", "500");
            store.identify_source("GEM", None);
            store.get_element_info("temperature");
        }
        assert!(store.read_complete_config());
        assert!(store.read_complete_config());
        for kind in RegistryKind::ALL {
            assert_eq!(store.read_count(kind), 1, "{kind} read more than once");
        }
    }

    #[test]
    fn test_dependencies_only() {
        let mut store = Fixture::tree("setup").unwrap().search("site").store();
        assert!(store.identify_field("temperature", "500").is_some());
        assert!(store.is_loaded(RegistryKind::Levels));
        assert!(store.is_loaded(RegistryKind::Elements));
        assert!(store.is_loaded(RegistryKind::Units));
        assert!(!store.is_loaded(RegistryKind::Sources));
        assert!(!store.is_loaded(RegistryKind::Constants));
        assert_eq!(store.read_count(RegistryKind::Sources), 0);
    }
}

mod validity {
    use super::*;

    const TEXT: &str = r#"
Sources
{
  Bad { source_type = Imaginary }
  Good { source_type = Guidance }
}
Sources
{
  Bad { source_type = Guidance; alias = Redeemed }
  Good { alias = Better }
}
"#;

    #[test]
    fn test_invalid_record_stays_invalid() {
        let mut store = Fixture::text(TEXT).store();
        assert!(store.identify_source("Bad", None).is_none());
        assert!(store.identify_source("Redeemed", None).is_none());
        assert!(!store.equivalent_source_definitions("Bad", "Redeemed"));
        assert!(store.equivalent_source_definitions("Good", "Better"));
        assert_reported(&store, "Bad", ErrorClass::Value);
        assert!(problem_classes(&store, "Good").is_empty());
    }

    #[test]
    fn test_failed_detail_invalidates() {
        let text = r#"
Levels { surface { level_type = Surface; level_levels = Surface } }
Elements
{
  weather
  {
    level_type = Surface
    field_type = Discrete
    sampling { attribute_sample_names = cloud }
  }
}
"#;
        let mut store = Fixture::text(text).store();
        assert!(store.identify_element("weather").is_some());
        assert!(store.get_element_info("weather").is_none());
        assert!(store.identify_element("weather").is_none());
        assert!(store.get_element_info("weather").is_none());
        assert_reported(&store, "weather", ErrorClass::CrossRecord);
    }
}

mod defaults {
    use super::*;

    #[test]
    fn test_defaults_applied_once() {
        let mut store = Fixture::tree("setup").unwrap().search("site").store();
        let first = store.get_element_info("actual_wind").unwrap().detail().cloned().unwrap();
        let again = store.get_element_info("actual_wind").unwrap().detail().cloned().unwrap();
        assert_eq!(first, again);
        assert_eq!(first.attributes.len(), 7);
        assert_eq!(first.labelling.len(), 1);
    }

    #[test]
    fn test_detail_problems_reported_once() {
        let text = r#"
Levels { surface { level_type = Surface; level_levels = Surface } }
Elements
{
  weather { level_type = Surface; field_type = Discrete; editor { hilo = yes } }
}
"#;
        let mut store = Fixture::text(text).store();
        store.get_element_info("weather");
        let reported = store.diagnostics().len();
        assert!(reported > 0);
        store.get_element_info("weather");
        store.get_field_info("weather", "surface");
        assert_eq!(store.diagnostics().len(), reported);
    }
}
