//! Levels, elements and the pairing between them.

use wxdict_tests::prelude::*;

fn setup() -> ConfigStore {
    Fixture::tree("setup").unwrap().search("site").store()
}

mod levels {
    use super::*;

    #[test]
    fn test_level_alias() {
        let mut store = setup();
        assert!(store.equivalent_level_definitions("SFC", "surface"));
        assert_eq!(store.identify_level_aliases("sfc"), vec!["sfc", "surface"]);
    }

    #[test]
    fn test_level_from_values() {
        let mut store = setup();
        let layer = store
            .identify_level_from_levels(LevelType::Layer, None, Some("500"), Some("1000"))
            .unwrap();
        assert_eq!(store.level(layer).unwrap().name, "1000-500");
        let single = store
            .identify_level_from_levels(LevelType::Level, Some("1000"), None, None)
            .unwrap();
        assert_eq!(store.level(single).unwrap().name, "1000");
        assert_eq!(store.identify_levels_by_type(LevelType::Level).len(), 2);
    }
}

mod pairing {
    use super::*;

    #[test]
    fn test_layer_rejected_for_level_element() {
        let mut store = setup();
        assert!(!store.consistent_element_and_level("temperature", "1000-500"));
        assert!(store.identify_field("temperature", "1000-500").is_none());
    }

    #[test]
    fn test_level_element_accepts_surface() {
        let mut store = setup();
        assert!(store.consistent_element_and_level("temp", "sfc"));
        assert!(!store.consistent_element_and_level("fronts", "500"));
        assert!(store.consistent_element_and_level("thickness", "1000-500"));
        assert!(store.consistent_element_and_level("pressure", "msl"));
        assert!(!store.consistent_element_and_level("pressure", "surface"));
    }
}

mod elements {
    use super::*;

    #[test]
    fn test_element_settings() {
        let mut store = setup();
        let id = store.identify_element("TEMP").unwrap();
        let temperature = store.element(id).unwrap();
        assert_eq!(temperature.kind(), LevelType::Level);
        assert_eq!(temperature.field_kind(), Some(FieldKind::Continuous));
        assert_eq!(temperature.time_dependence.time_type, TimeType::Normal);
        let units = temperature.units().unwrap();
        assert_eq!(store.unit(units).unwrap().name, "degreesC");
    }

    #[test]
    fn test_elements_by_group() {
        let mut store = setup();
        assert_eq!(store.identify_elements_by_group(Some("Temperatures")).len(), 1);
        assert_eq!(store.identify_elements_by_group(Some("winds")).len(), 1);
        assert_eq!(store.identify_elements_by_group(Some("Miscellaneous")).len(), 4);
        assert_eq!(store.identify_elements_by_group(None).len(), 6);
    }

    #[test]
    fn test_wind_detail_defaults() {
        let mut store = setup();
        let wind = store.get_element_info("actual_wind").unwrap();
        let detail = wind.detail().unwrap();
        let names: Vec<&str> = detail.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "FPA_category",
                "FPA_auto_label",
                "FPA_user_label",
                "FPA_wind_model",
                "FPA_wind_direction",
                "FPA_wind_speed",
                "FPA_wind_gust",
            ]
        );
        assert_eq!(detail.sampling.as_ref().unwrap().value_samples().len(), 2);
    }

    #[test]
    fn test_line_types() {
        let mut store = setup();
        let cold = store
            .identify_line_type_by_name("fronts", "surface", "COLD")
            .unwrap();
        assert_eq!(cold.labels.label.as_deref(), Some("Cold front"));
        assert!(store
            .identify_line_type_by_name("fronts", "surface", "occluded")
            .is_none());
    }
}
