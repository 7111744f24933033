//! Tree configuration
//!
//! Names the document fields that carry tree topology and selects how the
//! indexer walks the tree. Loadable from TOML; every field has a default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, TreeError};

/// How the indexer gathers children during a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildStrategy {
    /// One child query per visited node
    PerNode,
    /// One query for the whole collection, adjacency built in memory
    #[default]
    Batched,
}

/// Field mapping and indexing options for one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Collection (table) holding the tree's documents
    pub collection: String,
    /// Field holding the domain key that parent references point at
    pub primary_column: String,
    pub parent_column: String,
    /// Field ordering siblings; insertion order when unset
    pub order_column: Option<String>,
    /// Field used as the display label in tree and select listings
    pub label_column: String,
    pub left_column: String,
    pub right_column: String,
    pub level_column: String,
    /// Parent value marking a top-level node
    pub root_value: Value,
    /// First coordinate handed out by a rebuild
    pub root_left: i64,
    pub strategy: RebuildStrategy,
    /// Fail instead of degrading when stored coordinates are inconsistent
    pub strict: bool,
    /// Marker repeated `level - 1` times in front of select option labels
    pub indent: String,
    pub date_insert_column: Option<String>,
    pub date_update_column: Option<String>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            collection: "nodes".to_string(),
            primary_column: "item".to_string(),
            parent_column: "parent".to_string(),
            order_column: None,
            label_column: "name".to_string(),
            left_column: "lft".to_string(),
            right_column: "rght".to_string(),
            level_column: "level".to_string(),
            root_value: Value::String("0".to_string()),
            root_left: 0,
            strategy: RebuildStrategy::default(),
            strict: false,
            indent: "- ".to_string(),
            date_insert_column: None,
            date_update_column: None,
        }
    }
}

impl TreeConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `Config` if the TOML is malformed or fails validation.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: TreeConfig = toml::from_str(source).map_err(|e| TreeError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&source)
    }

    /// Builder-style override of the sibling order field
    pub fn with_order_column(mut self, column: impl Into<String>) -> Self {
        self.order_column = Some(column.into());
        self
    }

    pub fn with_strategy(mut self, strategy: RebuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The three coordinate fields, in left/right/level order
    pub fn coordinate_columns(&self) -> [&str; 3] {
        [
            self.left_column.as_str(),
            self.right_column.as_str(),
            self.level_column.as_str(),
        ]
    }

    /// Check that every configured field name is usable
    ///
    /// Field names must be non-empty identifiers (`[A-Za-z0-9_]`) so that
    /// stores can embed them in JSON paths, and the topology fields must be
    /// distinct from each other.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let mut named: Vec<(&str, &str)> = vec![
            ("primary_column", self.primary_column.as_str()),
            ("parent_column", self.parent_column.as_str()),
            ("left_column", self.left_column.as_str()),
            ("right_column", self.right_column.as_str()),
            ("level_column", self.level_column.as_str()),
        ];
        if let Some(order) = &self.order_column {
            named.push(("order_column", order.as_str()));
        }

        let optional = [
            ("label_column", Some(self.label_column.as_str())),
            ("date_insert_column", self.date_insert_column.as_deref()),
            ("date_update_column", self.date_update_column.as_deref()),
        ];

        for (setting, column) in named
            .iter()
            .map(|(s, c)| (*s, *c))
            .chain(optional.iter().filter_map(|(s, c)| c.map(|c| (*s, c))))
        {
            if !is_identifier(column) {
                return Err(TreeError::Config {
                    reason: format!("{} must be a non-empty identifier, got {:?}", setting, column),
                });
            }
        }

        for (i, (setting, column)) in named.iter().enumerate() {
            if let Some((other, _)) = named[i + 1..].iter().find(|(_, c)| c == column) {
                return Err(TreeError::Config {
                    reason: format!("{} and {} both use field {:?}", setting, other, column),
                });
            }
        }

        if self.root_value.is_null() {
            return Err(TreeError::Config {
                reason: "root_value must not be null".to_string(),
            });
        }

        if self.collection.is_empty() {
            return Err(TreeError::Config {
                reason: "collection must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// True for names made only of ASCII letters, digits and underscores
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
