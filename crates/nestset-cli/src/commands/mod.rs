//! Subcommand implementations
//!
//! Every command opens the gateway over the configured database, runs one
//! operation and prints its result as JSON on stdout.

use std::path::{Path, PathBuf};

use nestset_core::errors::{Result, TreeError};
use nestset_core::{Fields, MutationGateway, TreeConfig};
use nestset_store::SqliteDocumentStore;
use serde_json::Value;

pub mod mutate;
pub mod query;

/// Global options shared by every subcommand
pub struct Context {
    pub db: PathBuf,
    pub config: Option<PathBuf>,
}

impl Context {
    fn tree_config(&self) -> Result<TreeConfig> {
        match &self.config {
            Some(path) => TreeConfig::load(path),
            None => Ok(TreeConfig::default()),
        }
    }

    /// Open (creating if needed) the database and bind the gateway to it
    pub fn open(&self) -> Result<MutationGateway<SqliteDocumentStore>> {
        let config = self.tree_config()?;
        ensure_parent_dir(&self.db)?;
        let store = SqliteDocumentStore::open(&self.db, config.collection.clone())?;
        MutationGateway::new(store, config)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| TreeError::store("open", format!("{}: {}", dir.display(), e))),
        _ => Ok(()),
    }
}

/// Interpret a command-line value: JSON when it parses, a string otherwise
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse repeated `name=value` pairs into a field set
pub fn parse_fields(pairs: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let (name, raw) = pair.split_once('=').ok_or_else(|| TreeError::InvalidInput {
            reason: format!("expected name=value, got {:?}", pair),
        })?;
        fields.insert(name.to_string(), parse_value(raw));
    }
    Ok(fields)
}

/// Print a serializable value as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_prefers_json() {
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("fruit"), json!("fruit"));
        assert_eq!(parse_value("\"7\""), json!("7"));
    }

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&["name=Apple".to_string(), "position=2".to_string()]).unwrap();
        assert_eq!(fields.get("name"), Some(&json!("Apple")));
        assert_eq!(fields.get("position"), Some(&json!(2)));
        assert!(parse_fields(&["broken".to_string()]).is_err());
    }
}
