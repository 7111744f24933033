use crate::model::{key_label, TreeNode};

/// Placeholder replaced by each node's primary key in link templates
pub const ID_PLACEHOLDER: &str = "[-ID-]";

enum Step<'a> {
    Open(&'a TreeNode),
    Close { nested: bool },
}

/// Render a tree as nested HTML lists
///
/// Produces `<ul class="tree">` with one `<li><span>label</span>` per
/// node and a nested `<ul>` for its children. With `url_template`, each
/// label is wrapped in a link whose `[-ID-]` is replaced by the node's
/// primary key. Labels are HTML-escaped; an empty tree renders as "".
pub fn display_tree(tree: &[TreeNode], url_template: Option<&str>) -> String {
    if tree.is_empty() {
        return String::new();
    }

    let url_template = url_template.filter(|t| !t.is_empty());
    let mut output = String::from("<ul class=\"tree\">");
    let mut steps: Vec<Step> = tree.iter().rev().map(Step::Open).collect();

    while let Some(step) = steps.pop() {
        match step {
            Step::Open(node) => {
                output.push_str("<li><span>");
                match url_template {
                    Some(template) => {
                        let href = template.replace(ID_PLACEHOLDER, &key_label(&node.key));
                        output.push_str(&format!(
                            "<a href=\"{}\">{}</a>",
                            escape_html(&href),
                            escape_html(&node.label)
                        ));
                    }
                    None => output.push_str(&escape_html(&node.label)),
                }
                output.push_str("</span>");

                let nested = !node.children.is_empty();
                if nested {
                    output.push_str("<ul>");
                }
                steps.push(Step::Close { nested });
                steps.extend(node.children.iter().rev().map(Step::Open));
            }
            Step::Close { nested } => {
                if nested {
                    output.push_str("</ul>");
                }
                output.push_str("</li>");
            }
        }
    }

    output.push_str("</ul>");
    output
}

/// Escape the five HTML special characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}
