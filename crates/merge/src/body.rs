//! Body merge via an external diff3 tool
//!
//! Bodies are free text, so merging them is delegated to a line-based
//! three-way merge tool (`git merge-file` by default). The three inputs are
//! staged in a fresh OS temp directory, never under the content root, so
//! scratch files can never be swept into a snapshot and concurrent merges
//! cannot collide.
//!
//! A conflicted merge is an ordinary result: the tool's conflict-marked
//! output comes back with `conflicted == true`. Only a tool that cannot be
//! launched, times out, or exits outside the merge status range is an error.

use crate::markers::{BASE_LABEL, CLIENT_LABEL, SERVER_LABEL};
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long the external tool may run before it is killed
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for the external tool
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Options for the external body merge
#[derive(Debug, Clone)]
pub struct BodyMergeOptions {
    /// Executable invoked as `<tool> merge-file -p --diff3 ...`
    pub tool: String,
    /// Hard deadline for one merge invocation
    pub timeout: Duration,
}

impl Default for BodyMergeOptions {
    fn default() -> Self {
        Self {
            tool: "git".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Failure of the external merge tool
///
/// A conflicted merge is not an error; these are the cases where no merge
/// output exists at all.
#[derive(Debug, Error)]
pub enum MergeToolError {
    #[error("failed to launch merge tool '{tool}'")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("merge tool '{tool}' did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("merge tool '{tool}' failed with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("merge scratch I/O failed")]
    Io(#[from] std::io::Error),
}

/// Three-way merge of document bodies with default options
pub fn merge_file(
    base: Option<&str>,
    server: &str,
    client: &str,
) -> Result<(String, bool), MergeToolError> {
    merge_file_with(base, server, client, &BodyMergeOptions::default())
}

/// Three-way merge of document bodies
///
/// Returns `(merged_text, conflicted)`. Without a base there is no ancestor
/// to diff against, so the server text is returned as conflicted. With a
/// base, sides that trivially agree short-circuit without spawning the
/// tool; real divergence goes through `<tool> merge-file -p --diff3` with
/// `SERVER`/`BASE`/`CLIENT` side labels. Exit status 0 is a clean merge,
/// 1..=127 is the tool's conflict count, anything else is a hard error.
pub fn merge_file_with(
    base: Option<&str>,
    server: &str,
    client: &str,
    options: &BodyMergeOptions,
) -> Result<(String, bool), MergeToolError> {
    let base = match base {
        Some(base) => base,
        None => return Ok((server.to_string(), true)),
    };

    if server == client {
        return Ok((server.to_string(), false));
    }
    if server == base {
        return Ok((client.to_string(), false));
    }
    if client == base {
        return Ok((server.to_string(), false));
    }

    let scratch = tempfile::Builder::new().prefix("quill-merge-").tempdir()?;
    let server_path = scratch.path().join("server");
    let base_path = scratch.path().join("base");
    let client_path = scratch.path().join("client");
    std::fs::write(&server_path, server)?;
    std::fs::write(&base_path, base)?;
    std::fs::write(&client_path, client)?;

    let mut child = Command::new(&options.tool)
        .args(["merge-file", "-p", "--diff3"])
        .args(["-L", SERVER_LABEL, "-L", BASE_LABEL, "-L", CLIENT_LABEL])
        .arg(&server_path)
        .arg(&base_path)
        .arg(&client_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| MergeToolError::Launch {
            tool: options.tool.clone(),
            source,
        })?;

    // Drain both pipes on threads so a large merge cannot deadlock against
    // a full pipe buffer while we poll for exit.
    let stdout_reader = spawn_drain(child.stdout.take());
    let stderr_reader = spawn_drain(child.stderr.take());

    let deadline = Instant::now() + options.timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MergeToolError::Timeout {
                tool: options.tool.clone(),
                timeout: options.timeout,
            });
        }
        std::thread::sleep(WAIT_POLL);
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();
    let output = String::from_utf8_lossy(&stdout).into_owned();

    match status.code() {
        Some(0) => Ok((output, false)),
        Some(conflicts @ 1..=127) => {
            tracing::debug!(conflicts, "body merge produced conflicts");
            Ok((output, true))
        }
        other => Err(MergeToolError::Failed {
            tool: options.tool.clone(),
            status: other.unwrap_or(-1),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }),
    }
}

fn spawn_drain<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::has_conflict_markers;

    #[test]
    fn test_no_base_returns_server_conflicted() {
        let (merged, conflicted) = merge_file(None, "server text\n", "client text\n").unwrap();
        assert_eq!(merged, "server text\n");
        assert!(conflicted);
    }

    #[test]
    fn test_identical_sides_are_clean() {
        let (merged, conflicted) =
            merge_file(Some("old\n"), "same\n", "same\n").unwrap();
        assert_eq!(merged, "same\n");
        assert!(!conflicted);
    }

    #[test]
    fn test_only_client_changed() {
        let (merged, conflicted) =
            merge_file(Some("old\n"), "old\n", "new\n").unwrap();
        assert_eq!(merged, "new\n");
        assert!(!conflicted);
    }

    #[test]
    fn test_only_server_changed() {
        let (merged, conflicted) =
            merge_file(Some("old\n"), "new\n", "old\n").unwrap();
        assert_eq!(merged, "new\n");
        assert!(!conflicted);
    }

    #[test]
    fn test_disjoint_edits_merge_cleanly() {
        let base = "line1\nline2\nline3\nline4\nline5\n";
        let server = "SERVER1\nline2\nline3\nline4\nline5\n";
        let client = "line1\nline2\nline3\nline4\nCLIENT5\n";

        let (merged, conflicted) = merge_file(Some(base), server, client).unwrap();
        assert!(!conflicted);
        assert_eq!(merged, "SERVER1\nline2\nline3\nline4\nCLIENT5\n");
    }

    #[test]
    fn test_overlapping_edits_conflict_with_markers() {
        let base = "line1\noriginal\nline3\n";
        let server = "line1\nserver\nline3\n";
        let client = "line1\nclient\nline3\n";

        let (merged, conflicted) = merge_file(Some(base), server, client).unwrap();
        assert!(conflicted);
        assert!(has_conflict_markers(&merged));
        assert!(merged.contains("server"));
        assert!(merged.contains("client"));
        assert!(merged.contains("<<<<<<< SERVER"));
        assert!(merged.contains("||||||| BASE"));
        assert!(merged.contains(">>>>>>> CLIENT"));
    }

    #[test]
    fn test_missing_tool_is_a_launch_error() {
        let options = BodyMergeOptions {
            tool: "quill-no-such-merge-tool".to_string(),
            ..BodyMergeOptions::default()
        };
        let result = merge_file_with(
            Some("base\nmid\n"),
            "server\nmid\n",
            "base\nclient\n",
            &options,
        );
        assert!(matches!(result, Err(MergeToolError::Launch { .. })));
    }
}
