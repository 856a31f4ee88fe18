//! Release notes pulled out of the bundled README.
//!
//! The README keeps a `## Release Notes` section with one `### <version>`
//! heading per release, newest first.

/// README shipped inside the binary.
pub const README: &str = include_str!("../../README.md");

const SECTION_HEADING: &str = "## release notes";

/// The newest entry of the release notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    /// Version heading text, e.g. `0.2.0`
    pub version: String,
    /// Markdown body under the heading, trimmed
    pub body: String,
}

/// Extracts the newest release from a README, if it has a release notes section
/// with at least one version heading.
#[must_use]
pub fn latest_release(readme: &str) -> Option<ReleaseNotes> {
    let mut lines = readme
        .lines()
        .skip_while(|line| !line.trim().to_lowercase().starts_with(SECTION_HEADING))
        .skip(1)
        .take_while(|line| !is_level_two_heading(line));

    let version = lines
        .find_map(|line| line.trim().strip_prefix("### "))?
        .trim()
        .to_string();

    let body = lines
        .take_while(|line| !line.trim_start().starts_with("### "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    Some(ReleaseNotes { version, body })
}

fn is_level_two_heading(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("## ") || line == "##"
}
