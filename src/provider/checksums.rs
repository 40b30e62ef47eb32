//! Checksum manifest (`SHA256SUMS`) parsing

use std::sync::LazyLock;

use regex::Regex;

use crate::provider::types::Platform;

/// `<project>_<version>_<os>_<arch>.zip`
static ARCHIVE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+_(?P<os>[^_]+)_(?P<arch>[^_]+)\.zip$").expect("archive name pattern is valid")
});

/// Checksum entries in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<(String, String)>,
}

impl ChecksumManifest {
    /// Parses `<sha256>  <filename>` lines, ignoring blank or malformed lines
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let checksum = fields.next()?;
                let filename = fields.next()?;
                Some((filename.to_string(), checksum.to_string()))
            })
            .collect();

        Self { entries }
    }

    pub fn checksum_for(&self, filename: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, checksum)| checksum.as_str())
    }

    /// Platforms with a binary archive listed in the manifest, first occurrence order
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = Vec::new();
        for (filename, _) in &self.entries {
            let Some(captures) = ARCHIVE_NAME.captures(filename) else {
                continue;
            };
            let platform = Platform::new(&captures["os"], &captures["arch"]);
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        platforms
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
