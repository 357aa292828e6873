//! Small helpers shared by the subprocess-backed collaborators.

use std::process::Output;

/// Maximum stderr length carried into an error message.
const STDERR_LIMIT: usize = 1000;

/// Lossy stderr from a finished command, truncated so a failing tool
/// cannot dump megabytes into a diagnostic.
pub(crate) fn stderr_excerpt(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .chars()
        .take(STDERR_LIMIT)
        .collect()
}

/// Whether a spawn failure means the binary itself is missing from PATH.
pub(crate) fn is_missing_tool(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound
}
