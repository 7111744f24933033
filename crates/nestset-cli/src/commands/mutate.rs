//! Write commands
//!
//! Usage:
//!   nestset add <KEY> [--parent <KEY>] [--name <LABEL>] [--field name=value]...
//!   nestset update <KEY> [--key <NEW>] [--parent <KEY>] [--name <LABEL>] [--field name=value]...
//!   nestset remove <VALUE> [--by <FIELD>] [--all]
//!   nestset rebuild

use clap::Args;
use nestset_core::errors::{Result, TreeError};
use nestset_core::{Fields, Filter};
use serde_json::{json, Value};

use super::{parse_fields, parse_value, print_json, Context};

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Primary key of the new node
    pub key: String,

    /// Key of the parent node; top level when omitted
    #[arg(long)]
    pub parent: Option<String>,

    /// Display label
    #[arg(long)]
    pub name: Option<String>,

    /// Extra field as name=value (value parsed as JSON when possible)
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Primary key of the node to change
    pub key: String,

    /// New primary key
    #[arg(long = "key", value_name = "NEW_KEY")]
    pub new_key: Option<String>,

    /// New parent key; "0" or "" moves the node to the top level
    #[arg(long)]
    pub parent: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Value to match
    pub value: String,

    /// Field to match on; the primary key field when omitted
    #[arg(long)]
    pub by: Option<String>,

    /// Remove every match instead of the first
    #[arg(long)]
    pub all: bool,
}

pub fn execute_add(context: &Context, args: AddArgs) -> Result<()> {
    let mut gateway = context.open()?;
    let config = gateway.config().clone();

    let mut fields = parse_fields(&args.fields)?;
    fields.insert(config.primary_column.clone(), parse_value(&args.key));
    if let Some(parent) = &args.parent {
        fields.insert(config.parent_column.clone(), parse_value(parent));
    }
    if let Some(name) = args.name {
        fields.insert(config.label_column.clone(), Value::String(name));
    }

    let id = gateway.create(fields)?;
    let node = gateway.get_by_id(&id)?;
    print_json(&node)
}

pub fn execute_update(context: &Context, args: UpdateArgs) -> Result<()> {
    let mut gateway = context.open()?;
    let config = gateway.config().clone();

    let key = parse_value(&args.key);
    let node = gateway
        .get_by_key(&key)?
        .ok_or_else(|| TreeError::NodeNotFound { id: args.key.clone() })?;

    let mut fields: Fields = parse_fields(&args.fields)?;
    if let Some(new_key) = &args.new_key {
        fields.insert(config.primary_column.clone(), parse_value(new_key));
    }
    if let Some(parent) = &args.parent {
        fields.insert(config.parent_column.clone(), parse_value(parent));
    }
    if let Some(name) = args.name {
        fields.insert(config.label_column.clone(), Value::String(name));
    }

    gateway.update(&node.id, fields)?;
    let updated = gateway.get_by_id(&node.id)?;
    print_json(&updated)
}

pub fn execute_remove(context: &Context, args: RemoveArgs) -> Result<()> {
    let mut gateway = context.open()?;
    let field = args
        .by
        .unwrap_or_else(|| gateway.config().primary_column.clone());

    let filter = Filter::Eq(field, parse_value(&args.value));
    let removed = gateway.remove(&filter, !args.all)?;
    print_json(&json!({ "removed": removed }))
}

pub fn execute_rebuild(context: &Context) -> Result<()> {
    let mut gateway = context.open()?;
    let report = gateway.rebuild()?;
    print_json(&report)
}
