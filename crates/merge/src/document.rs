//! Splitting a post into frontmatter and body, and back
//!
//! A post is a markdown file with an optional frontmatter block:
//!
//! ```text
//! ---
//! title: Hello
//! labels: [rust, sync]
//! ---
//! Body text...
//! ```
//!
//! The strict parser (`split_document`) rejects malformed blocks. The lossy
//! variant (`split_document_lossy`) never fails: anything that does not parse
//! cleanly is treated as body text, so merging never destroys content.

use crate::frontmatter::{FrontmatterMap, Value};
use thiserror::Error;

/// Frontmatter block delimiter line
const DELIMITER: &str = "---";

/// A post split into its frontmatter and body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Parsed frontmatter, empty when the post has no block
    pub frontmatter: FrontmatterMap,
    /// Everything after the frontmatter block, verbatim
    pub body: String,
}

/// Strict frontmatter parse failure
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("frontmatter block is not terminated by '---'")]
    UnterminatedFrontmatter,

    #[error("invalid frontmatter line {line}: {text:?}")]
    InvalidLine { line: usize, text: String },
}

/// Split a post into frontmatter and body, strictly
///
/// A document starts a frontmatter block only when its very first line is
/// `---`. Inside the block every non-blank line must be `key: value`; the
/// value has exactly one leading space stripped if present. Only the
/// `labels` key is parsed as an inline `[a, b]` list. A missing closing
/// delimiter or a line without a colon is an error.
pub fn split_document(text: &str) -> Result<Document, DocumentError> {
    let mut lines = text.split_inclusive('\n');

    let first = match lines.next() {
        Some(line) => line,
        None => return Ok(Document::default()),
    };
    if first.trim_end_matches(['\r', '\n']) != DELIMITER {
        return Ok(Document {
            frontmatter: FrontmatterMap::new(),
            body: text.to_string(),
        });
    }

    let mut frontmatter = FrontmatterMap::new();
    let mut line_number = 1;
    let mut consumed = first.len();
    let mut terminated = false;

    for line in lines {
        line_number += 1;
        consumed += line.len();
        let content = line.trim_end_matches(['\r', '\n']);

        if content == DELIMITER {
            terminated = true;
            break;
        }
        if content.trim().is_empty() {
            continue;
        }

        let (key, raw_value) = match content.split_once(':') {
            Some(pair) => pair,
            None => {
                return Err(DocumentError::InvalidLine {
                    line: line_number,
                    text: content.to_string(),
                })
            }
        };
        let key = key.trim().to_string();
        let value_text = raw_value.strip_prefix(' ').unwrap_or(raw_value);

        let value = if key == "labels" {
            parse_inline_list(value_text)
        } else {
            Value::scalar(value_text)
        };
        frontmatter.set(key, value);
    }

    if !terminated {
        return Err(DocumentError::UnterminatedFrontmatter);
    }

    Ok(Document {
        frontmatter,
        body: text[consumed..].to_string(),
    })
}

/// Split a post, falling back to an all-body document on parse failure
///
/// Used on the merge path so a malformed side still merges: its text is
/// carried whole as the body and contributes no frontmatter.
pub fn split_document_lossy(text: &str) -> Document {
    match split_document(text) {
        Ok(doc) => doc,
        Err(error) => {
            tracing::debug!(%error, "frontmatter did not parse; treating whole text as body");
            Document {
                frontmatter: FrontmatterMap::new(),
                body: text.to_string(),
            }
        }
    }
}

/// Serialize frontmatter and body back into post text
///
/// An empty frontmatter map yields the body unchanged, with no empty
/// delimiter block.
pub fn serialize_document(doc: &Document) -> String {
    if doc.frontmatter.is_empty() {
        return doc.body.clone();
    }

    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');
    for (key, value) in doc.frontmatter.iter() {
        out.push_str(key);
        out.push_str(": ");
        match value {
            Value::Scalar(text) => out.push_str(text),
            Value::List(items) => {
                out.push('[');
                out.push_str(&items.join(", "));
                out.push(']');
            }
        }
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&doc.body);
    out
}

/// Parse a `[a, b, c]` inline list; anything else stays a scalar
fn parse_inline_list(text: &str) -> Value {
    let trimmed = text.trim();
    let inner = match trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner,
        None => return Value::scalar(text),
    };

    if inner.trim().is_empty() {
        return Value::List(Vec::new());
    }
    let items = inner
        .split(',')
        .map(|item| item.trim().to_string())
        .collect();
    Value::List(items)
}
