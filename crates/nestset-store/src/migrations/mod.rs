//! Embedded schema migrations, applied idempotently and recorded with a
//! checksum in the `schema_version` ledger

mod embedded;
mod runner;

pub use runner::apply_migrations;
