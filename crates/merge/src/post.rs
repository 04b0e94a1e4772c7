//! Per-post merge orchestrator
//!
//! Splits each side into frontmatter and body, merges the two halves with
//! their own strategies, and reassembles one document. The halves are
//! independent: a body conflict never blocks the frontmatter merge and vice
//! versa, so the caller always gets the best merge of each.

use crate::body::{merge_file_with, BodyMergeOptions, MergeToolError};
use crate::document::{serialize_document, split_document_lossy, Document};
use crate::fields::merge_frontmatter;
use serde::Serialize;

/// Combined result of merging one post
#[derive(Debug, Clone, Serialize)]
pub struct PostMergeResult {
    /// The reassembled document, possibly containing conflict markers
    pub merged_content: String,
    /// True when the body merge left conflict markers in the content
    pub body_conflicted: bool,
    /// Tracked frontmatter keys both sides changed to different values
    pub field_conflicts: Vec<String>,
}

impl PostMergeResult {
    /// True when either half reported a conflict
    pub fn is_conflicted(&self) -> bool {
        self.body_conflicted || !self.field_conflicts.is_empty()
    }
}

/// Merge one post with default body merge options
pub fn merge_post_file(
    base_doc: Option<&str>,
    server_doc: &str,
    client_doc: &str,
) -> Result<PostMergeResult, MergeToolError> {
    merge_post_file_with(base_doc, server_doc, client_doc, &BodyMergeOptions::default())
}

/// Merge one post
///
/// Each document is split lossily, so a side with malformed frontmatter
/// still merges: its whole text rides along as body. An absent base
/// propagates as `None` to both halves.
pub fn merge_post_file_with(
    base_doc: Option<&str>,
    server_doc: &str,
    client_doc: &str,
    options: &BodyMergeOptions,
) -> Result<PostMergeResult, MergeToolError> {
    let base = base_doc.map(split_document_lossy);
    let server = split_document_lossy(server_doc);
    let client = split_document_lossy(client_doc);

    let outcome = merge_frontmatter(
        base.as_ref().map(|doc| &doc.frontmatter),
        &server.frontmatter,
        &client.frontmatter,
    );
    let (body, body_conflicted) = merge_file_with(
        base.as_ref().map(|doc| doc.body.as_str()),
        &server.body,
        &client.body,
        options,
    )?;

    let merged_content = serialize_document(&Document {
        frontmatter: outcome.merged,
        body,
    });

    if body_conflicted || !outcome.field_conflicts.is_empty() {
        tracing::debug!(
            body_conflicted,
            field_conflicts = outcome.field_conflicts.len(),
            "post merge left conflicts"
        );
    }

    Ok(PostMergeResult {
        merged_content,
        body_conflicted,
        field_conflicts: outcome.field_conflicts,
    })
}
