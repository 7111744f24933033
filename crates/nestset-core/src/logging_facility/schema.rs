//! Field and event names used by the operation logging macros

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_DOC_ID: &str = "doc_id";
pub const FIELD_NODE_KEY: &str = "node_key";

// Rebuild counters
pub const FIELD_VISITED: &str = "visited";
pub const FIELD_WRITTEN: &str = "written";
pub const FIELD_DETACHED: &str = "detached";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_MESSAGE: &str = "err_message";
pub const FIELD_ERR_ENTITY: &str = "err_entity";

// Values of the `event` field
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TreeError;
    use crate::logging_facility::init_test_capture;
    use crate::log_op_error;

    #[test]
    fn test_error_events_carry_every_error_field() {
        let capture = init_test_capture();
        let op = "schema_error_fields_check";

        let err = TreeError::DuplicateKey {
            key: "k".to_string(),
        };
        log_op_error!(op, err, duration_ms = 0);

        let events = capture.events_for(op);
        assert_eq!(events.len(), 1);
        for field in [
            FIELD_COMPONENT,
            FIELD_EVENT,
            FIELD_DURATION_MS,
            FIELD_ERR_KIND,
            FIELD_ERR_CODE,
            FIELD_ERR_MESSAGE,
            FIELD_ERR_ENTITY,
        ] {
            assert!(events[0].field(field).is_some(), "missing {}", field);
        }
        assert_eq!(events[0].event(), Some(EVENT_END_ERROR));
    }
}
