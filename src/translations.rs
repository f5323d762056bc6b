use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// meaning -> set of transcriptions, accumulated across every crawled page.
///
/// Serialized as a plain JSON object of string arrays. `BTreeMap`/`BTreeSet`
/// keep the file sorted so reruns diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMap(BTreeMap<String, BTreeSet<String>>);

impl TranslationMap {
    /// Returns true if the transcription was new for this meaning.
    pub fn insert(&mut self, meaning: &str, transcription: &str) -> bool {
        self.0
            .entry(meaning.to_string())
            .or_default()
            .insert(transcription.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn pair_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read translations from {:?}", path))?;
        let map = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed translations file {:?}", path))?;
        Ok(map)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }
}

/// Write to a sibling temp file, then rename over `path`, so a failed write
/// never leaves a truncated file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let written = fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {:?}", tmp))
        .and_then(|()| {
            fs::rename(&tmp, path).with_context(|| format!("Failed to move output into {:?}", path))
        });
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}
