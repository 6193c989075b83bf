use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// What a blank line in the destinations text means.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlankLinePolicy {
    /// The first blank line ends the list.
    #[default]
    Stop,
    /// Blank lines are ignored.
    Skip,
}

pub fn parse_destinations(text: &str, policy: BlankLinePolicy) -> Vec<String> {
    let mut destinations = Vec::new();
    for line in text.split('\n').map(str::trim) {
        if line.is_empty() {
            match policy {
                BlankLinePolicy::Stop => break,
                BlankLinePolicy::Skip => continue,
            }
        }
        destinations.push(line.to_string());
    }
    destinations
}

/// Reads a line-oriented destinations file and returns its lines joined with `\n`,
/// ready to be placed in the destinations field.
pub fn load_destinations_file(path: &Path) -> io::Result<String> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().collect::<Vec<_>>().join("\n"))
}
