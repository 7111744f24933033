//! Structured operation logging
//!
//! Operations report through [`log_op_start!`](crate::log_op_start),
//! [`log_op_end!`](crate::log_op_end) and
//! [`log_op_error!`](crate::log_op_error) with the field names in
//! [`schema`]. Binaries pick a [`Profile`] once at startup:
//!
//! ```rust
//! use nestset_core::logging_facility::{init, Profile};
//!
//! init(Profile::Production);
//! ```
//!
//! Tests install [`init_test_capture`] instead and assert on the recorded
//! events.

pub mod init;
pub mod macros;
pub mod schema;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
