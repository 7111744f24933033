//! Read commands
//!
//! Usage:
//!   nestset tree [--top <KEY>] [--html] [--url <TEMPLATE>]
//!   nestset parents <KEY> [--include-self]
//!   nestset options [--current <KEY>]
//!   nestset check

use clap::Args;
use nestset_core::display_tree;
use nestset_core::errors::{Result, TreeError};
use serde_json::json;

use super::{parse_value, print_json, Context};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Only the subtree below this key
    #[arg(long)]
    pub top: Option<String>,

    /// Render as nested HTML lists instead of JSON
    #[arg(long)]
    pub html: bool,

    /// Link template for HTML output; `[-ID-]` is replaced by the node key
    #[arg(long, requires = "html")]
    pub url: Option<String>,
}

#[derive(Debug, Args)]
pub struct ParentsArgs {
    /// Primary key of the node
    pub key: String,

    /// Include the node itself as the last entry
    #[arg(long)]
    pub include_self: bool,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Node being edited; it and its descendants are disabled
    #[arg(long)]
    pub current: Option<String>,
}

pub fn execute_tree(context: &Context, args: TreeArgs) -> Result<()> {
    let gateway = context.open()?;
    let top = match &args.top {
        Some(key) => parse_value(key),
        None => gateway.config().root_value.clone(),
    };

    let tree = gateway.queries().get_tree(&top)?;
    if args.html {
        println!("{}", display_tree(&tree, args.url.as_deref()));
    } else {
        // compact: pretty indentation grows with depth on every line
        println!("{}", serde_json::to_string(&tree)?);
    }
    Ok(())
}

pub fn execute_parents(context: &Context, args: ParentsArgs) -> Result<()> {
    let gateway = context.open()?;
    let node = gateway
        .get_by_key(&parse_value(&args.key))?
        .ok_or_else(|| TreeError::NodeNotFound { id: args.key.clone() })?;

    let parents = gateway.queries().get_parents(&node, args.include_self)?;
    let keys: Vec<_> = parents.iter().map(|p| p.key.clone()).collect();
    print_json(&keys)
}

pub fn execute_options(context: &Context, args: OptionsArgs) -> Result<()> {
    let gateway = context.open()?;
    let current = args.current.as_deref().map(parse_value);
    let options = gateway.queries().get_form_select_options(current.as_ref())?;
    print_json(&options)
}

pub fn execute_check(context: &Context) -> Result<()> {
    let gateway = context.open()?;
    gateway.verify()?;
    print_json(&json!({ "consistent": true }))
}
