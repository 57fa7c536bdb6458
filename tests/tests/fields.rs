//! Declared and synthesized fields.

use wxdict_tests::prelude::*;

fn setup() -> ConfigStore {
    Fixture::tree("setup").unwrap().search("site").store()
}

mod declared {
    use super::*;

    #[test]
    fn test_default_label_and_group() {
        let mut store = setup();
        let id = store.identify_field("temperature", "500").unwrap();
        let field = store.field(id).unwrap();
        assert!(!field.created);
        assert_eq!(field.name, "temperature 500");
        assert_eq!(field.labels.label.as_deref(), Some("500mb Temperature"));
        let group = field.group.unwrap();
        assert_eq!(store.group(group).unwrap().name, "Upper_Air");

        let id = store.identify_field("pressure", "msl").unwrap();
        let group = store.field(id).unwrap().group.unwrap();
        assert_eq!(store.group(group).unwrap().name, "Miscellaneous");
    }

    #[test]
    fn test_fields_by_group() {
        let mut store = setup();
        assert_eq!(store.identify_fields_by_group(None).len(), 8);
        assert_eq!(store.identify_fields_by_group(Some("upper_air")).len(), 5);
        assert_eq!(store.identify_fields_by_group(Some("Surface_Fields")).len(), 1);
    }
}

mod synthesized {
    use super::*;

    #[test]
    fn test_consistent_pair_creates_field() {
        let mut store = setup();
        let id = store.identify_field("temp", "sfc").unwrap();
        let field = store.field(id).unwrap();
        assert!(field.created);
        assert_eq!(field.labels.label.as_deref(), Some("Surface Temperature"));
        assert_eq!(store.identify_field("temperature", "surface"), Some(id));
    }

    #[test]
    fn test_detail_shared_with_element() {
        let mut store = setup();
        assert!(store.get_field_info("height", "500").is_some());
        let field = store.identify_field("height", "500").unwrap();
        let element = store.identify_element("height").unwrap();
        assert_eq!(store.field_detail(field), store.element(element).unwrap().detail());
    }
}
