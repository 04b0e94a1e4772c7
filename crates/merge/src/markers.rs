//! Git-style conflict marker handling
//!
//! This module provides utilities for:
//! - Detecting conflict markers in merged text
//! - Counting conflict regions
//! - Parsing conflict regions back into their three sides
//!
//! Markers follow the diff3 layout the body merge emits, so any standard
//! editor or merge tool can resolve them.

/// Conflict marker strings (Git-compatible)
pub const CONFLICT_MARKER_START: &str = "<<<<<<<";
pub const CONFLICT_MARKER_BASE: &str = "|||||||";
pub const CONFLICT_MARKER_SEPARATOR: &str = "=======";
pub const CONFLICT_MARKER_END: &str = ">>>>>>>";

/// Side label on the opening marker
pub const SERVER_LABEL: &str = "SERVER";
/// Side label on the base marker
pub const BASE_LABEL: &str = "BASE";
/// Side label on the closing marker
pub const CLIENT_LABEL: &str = "CLIENT";

/// Check if merged text contains conflict markers
pub fn has_conflict_markers(content: &str) -> bool {
    content.contains(CONFLICT_MARKER_START) && content.contains(CONFLICT_MARKER_END)
}

/// Count the number of conflict regions in merged text
///
/// Returns the number of `<<<<<<<` markers found.
pub fn count_conflicts(content: &str) -> usize {
    content
        .lines()
        .filter(|line| line.starts_with(CONFLICT_MARKER_START))
        .count()
}

/// One conflict region parsed out of merged text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRegion {
    /// Start line number (1-indexed)
    pub start_line: usize,
    /// End line number (1-indexed)
    pub end_line: usize,
    /// Server-side content
    pub server: String,
    /// Base content (present in diff3-style output)
    pub base: Option<String>,
    /// Client-side content
    pub client: String,
}

/// Parse conflict regions from merged text
pub fn parse_conflict_regions(content: &str) -> Vec<ConflictRegion> {
    let mut regions = Vec::new();
    let lines: Vec<&str> = content.lines().collect();

    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with(CONFLICT_MARKER_START) {
            let start_line = i + 1; // 1-indexed
            let mut server = String::new();
            let mut base = None;
            let mut client = String::new();
            let mut section = Section::Server;

            i += 1;
            while i < lines.len() {
                let line = lines[i];

                if line.starts_with(CONFLICT_MARKER_BASE) {
                    section = Section::Base;
                    base = Some(String::new());
                } else if line.starts_with(CONFLICT_MARKER_SEPARATOR) {
                    section = Section::Client;
                } else if line.starts_with(CONFLICT_MARKER_END) {
                    regions.push(ConflictRegion {
                        start_line,
                        end_line: i + 1,
                        server,
                        base,
                        client,
                    });
                    break;
                } else {
                    let target = match section {
                        Section::Server => Some(&mut server),
                        Section::Base => base.as_mut(),
                        Section::Client => Some(&mut client),
                    };
                    if let Some(buffer) = target {
                        if !buffer.is_empty() {
                            buffer.push('\n');
                        }
                        buffer.push_str(line);
                    }
                }
                i += 1;
            }
        }
        i += 1;
    }

    regions
}

#[derive(Debug, Clone, Copy)]
enum Section {
    Server,
    Base,
    Client,
}
