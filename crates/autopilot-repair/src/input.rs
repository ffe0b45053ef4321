use autopilot_core::text::tail_chars;
use std::path::Path;

/// Concatenate the last `tail_chars` characters of each existing log file,
/// separated by a blank line. Missing or unreadable files are skipped.
pub fn read_error_logs(root: &Path, files: &[String], tail_chars_per_file: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for rel in files {
        let path = root.join(rel);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(_) => {
                tracing::debug!(path = %path.display(), "log file not readable, skipped");
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let tail = tail_chars(&text, tail_chars_per_file).trim();
        if !tail.is_empty() {
            parts.push(tail.to_string());
        }
    }
    parts.join("\n\n")
}
