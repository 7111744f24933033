//! Operation logging macros
//!
//! Every public operation emits a `start` event, then either `end` with its
//! duration or `end_error` carrying the canonical error code. Extra fields
//! use ordinary `tracing` field syntax. The macros reach `tracing` through
//! this crate, so callers need no direct dependency on it.

/// Log the start of an operation
///
/// ```
/// # use nestset_core::log_op_start;
/// log_op_start!("rebuild");
/// log_op_start!("create", node_key = "fruit");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use nestset_core::log_op_end;
/// log_op_end!("rebuild", duration_ms = 3, visited = 10);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log a failed operation
///
/// The error is converted to [`ExError`](crate::errors::ExError); the
/// event carries its kind, code, message and offending entity.
///
/// ```
/// # use nestset_core::{log_op_error, errors::TreeError};
/// let err = TreeError::NodeNotFound { id: "doc-1".to_string() };
/// log_op_error!("update", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            err_entity = ex_err.entity_id(),
            $($($field)*)?
        );
    }};
}
