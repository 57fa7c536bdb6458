//! Unit conversion and constants over the shared fixture tree.

use wxdict_tests::prelude::*;

fn setup() -> ConfigStore {
    Fixture::tree("setup").unwrap().search("site").store()
}

mod conversion {
    use super::*;

    #[test]
    fn test_identity_conversion() {
        let mut store = setup();
        assert_eq!(store.convert_value("mps", 12.5, "mps"), Some(12.5));
        assert_eq!(store.convert_value("furlongs", 3.0, "furlongs"), Some(3.0));
    }

    #[test]
    fn test_scale_conversion() {
        let mut store = setup();
        assert_close(store.convert_value("kmh", 36.0, "mps"), 10.0, 1e-3);
        assert_close(store.convert_value("mps", 10.0, "kmh"), 36.0, 1e-2);
        assert_close(store.convert_value("mb", 1000.0, "Pa"), 100000.0, 1e-6);
        assert_close(store.convert_value("dam", 552.0, "m"), 5520.0, 1e-9);
    }

    #[test]
    fn test_offset_conversion() {
        let mut store = setup();
        assert_close(store.convert_value("degreesC", 0.0, "degreesK"), 273.15, 1e-9);
        assert_close(store.convert_value("degreesK", 300.0, "degreesC"), 26.85, 1e-9);
    }

    #[test]
    fn test_between_derived_units() {
        let mut store = setup();
        assert_close(store.convert_value("knots", 10.0, "kmh"), 18.52, 1e-2);
    }

    #[test]
    fn test_incompatible_units() {
        let mut store = setup();
        assert_eq!(store.convert_value("mps", 1.0, "mb"), None);
        assert_eq!(store.convert_value("mps", 1.0, "furlongs"), None);
    }

    #[test]
    fn test_unit_names_are_case_sensitive() {
        let mut store = setup();
        assert!(store.identify_unit("mb").is_some());
        assert!(store.identify_unit("MB").is_none());
    }
}

mod constants {
    use super::*;

    #[test]
    fn test_constant_in_other_units() {
        let mut store = setup();
        assert_close(store.constant_value("Standard_Pressure", "Pa"), 101325.0, 1e-6);
        assert_close(store.constant_value("Freezing", "degreesK"), 273.15, 1e-9);
        assert_eq!(store.constant_value("Freezing", "mps"), None);
        assert_eq!(store.constant_value("Boiling", "degreesC"), None);
    }
}
