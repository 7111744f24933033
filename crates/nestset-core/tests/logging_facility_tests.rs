#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{create_node, fields, new_gateway};
use nestset_core::errors::TreeError;
use nestset_core::logging_facility::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use nestset_core::logging_facility::test_capture::init_test_capture;
use nestset_core::{log_op_end, log_op_error, log_op_start, DocId};
use serde_json::json;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event(), Some(EVENT_END));
    assert_eq!(events[0].duration_ms(), Some(42));
    assert!(events[0].is_outcome());
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = TreeError::ParentNotFound {
        key: "k1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_code"), Some("ERR_PARENT_NOT_FOUND"));
    assert_eq!(capture.error_codes(op_name), vec!["ERR_PARENT_NOT_FOUND"]);
}

#[test]
fn test_create_logs_start_and_end_with_doc_id() {
    let capture = init_test_capture();
    let mut gw = new_gateway();

    let id = create_node(&mut gw, "logged", "0");

    let ends = capture.count_events(|e| {
        e.is("create", EVENT_END) && e.field("doc_id") == Some(id.as_str())
    });
    assert_eq!(ends, 1);
    capture.assert_event_exists("create", EVENT_START);
}

#[test]
fn test_rebuild_end_carries_counters() {
    let capture = init_test_capture();
    let mut gw = new_gateway();
    create_node(&mut gw, "counted", "0");

    gw.rebuild().unwrap();

    let with_counters = capture.count_events(|e| {
        e.is("rebuild", EVENT_END)
            && e.field("visited").is_some()
            && e.field("written").is_some()
            && e.field("detached").is_some()
    });
    assert!(with_counters >= 2);
}

#[test]
fn test_failed_update_logs_error_event() {
    let capture = init_test_capture();
    let mut gw = new_gateway();
    let missing = DocId::new("logging-missing-doc-5");

    let result = gw.update(&missing, fields(json!({"name": "x"})));

    assert!(result.is_err());
    let errors = capture.count_events(|e| {
        e.is("update", EVENT_END_ERROR)
            && e.field("doc_id") == Some("logging-missing-doc-5")
            && e.field("err_code") == Some("ERR_NOT_FOUND")
    });
    assert_eq!(errors, 1);
}

#[test]
fn test_error_event_names_offending_entity() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_entity_unique_6";

    let err = TreeError::NodeNotFound {
        id: "doc-entity-6".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 1);

    let events = capture.events_for(op_name);
    assert_eq!(events[0].field("err_entity"), Some("doc-entity-6"));
    assert!(events[0].field("err_message").is_some());
    assert_eq!(capture.completed(op_name), 0);
}
