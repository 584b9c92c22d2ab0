//! Marker-delimited configuration blocks.

use std::path::PathBuf;

/// A span of text owned by rebox inside a user-owned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    pub path: PathBuf,
    pub start_marker: String,
    pub end_marker: String,
    pub body: String,
    /// Restrict the file to owner read/write after installing.
    pub credential_bearing: bool,
}

impl ConfigBlock {
    /// Block named `name` using the standard `# >>> rebox:<name> >>>` markers.
    pub fn named(name: &str, path: impl Into<PathBuf>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            start_marker: start_marker(name),
            end_marker: end_marker(name),
            body: body.into(),
            credential_bearing: false,
        }
    }

    #[must_use]
    pub fn credential_bearing(mut self) -> Self {
        self.credential_bearing = true;
        self
    }

    /// Text appended to the target file: a blank line, start marker, body,
    /// end marker. `existing` is the current content (empty for a new file).
    #[must_use]
    pub fn render_append(&self, existing: &str) -> String {
        let mut out = String::new();
        if !existing.is_empty() {
            if !existing.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str(&self.start_marker);
        out.push('\n');
        out.push_str(&self.body);
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.end_marker);
        out.push('\n');
        out
    }
}

/// Result of an install call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The start marker was already present; nothing was touched.
    AlreadyInstalled,
    /// The block was appended. `backup` is set when a pre-existing file was
    /// copied aside first.
    Installed { backup: Option<PathBuf> },
}

#[must_use]
pub fn start_marker(name: &str) -> String {
    format!("# >>> rebox:{name} >>>")
}

#[must_use]
pub fn end_marker(name: &str) -> String {
    format!("# <<< rebox:{name} <<<")
}

/// Whether any line of `content` contains `start_marker`.
#[must_use]
pub fn contains_marker(content: &str, start_marker: &str) -> bool {
    content.lines().any(|line| line.contains(start_marker))
}
