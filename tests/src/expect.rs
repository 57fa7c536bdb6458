//! Assertions over lookups and diagnostics.

use wxdict_registry::{ConfigStore, ErrorClass};

/// Assert a converted value is present and within `tolerance`.
#[track_caller]
pub fn assert_close(actual: Option<f64>, expected: f64, tolerance: f64) {
    match actual {
        Some(value) => assert!(
            (value - expected).abs() <= tolerance,
            "expected {expected} (within {tolerance}), got {value}"
        ),
        None => panic!("expected {expected}, got no value"),
    }
}

/// The classes of the problems reported against `record`.
pub fn problem_classes(store: &ConfigStore, record: &str) -> Vec<ErrorClass> {
    store
        .diagnostics_for(record)
        .into_iter()
        .map(|err| err.class())
        .collect()
}

/// Assert at least one problem of `class` was reported against `record`.
#[track_caller]
pub fn assert_reported(store: &ConfigStore, record: &str, class: ErrorClass) {
    let classes = problem_classes(store, record);
    assert!(
        classes.contains(&class),
        "expected a {class} problem for '{record}', found {classes:?}"
    );
}

/// Assert nothing at all has been reported.
#[track_caller]
pub fn assert_clean(store: &ConfigStore) {
    let messages: Vec<String> = store.diagnostics().iter().map(|e| e.to_string()).collect();
    assert!(messages.is_empty(), "unexpected problems: {messages:#?}");
}
