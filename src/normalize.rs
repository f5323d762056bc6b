//! Meaning decomposition: peel annotation affixes off a meaning string so the
//! semantic root can drive sorting and link targets.

const SUFFIX_MARKERS: &[&str] = &[", ", " on ", " ("];
const PREFIX_MARKER: &str = ") ";

/// A meaning split into `prefix + root + suffix`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub prefix: String,
    pub root: String,
    pub suffix: String,
}

impl Decomposition {
    fn bare(s: &str) -> Self {
        Decomposition {
            prefix: String::new(),
            root: s.to_string(),
            suffix: String::new(),
        }
    }

    /// Rebuild the original meaning.
    pub fn joined(&self) -> String {
        format!("{}{}{}", self.prefix, self.root, self.suffix)
    }
}

/// Recursively strip affixes from `meaning`.
///
/// Sentence-like meanings (trailing period) are never split. Suffix markers
/// win over the prefix marker; among suffix markers the earliest occurrence
/// in the string is used.
pub fn deconfixicate(meaning: &str) -> Decomposition {
    if meaning.ends_with('.') {
        return Decomposition::bare(meaning);
    }

    let split = SUFFIX_MARKERS
        .iter()
        .filter_map(|marker| meaning.find(marker))
        .min();
    if let Some(pos) = split {
        let mut inner = deconfixicate(&meaning[..pos]);
        inner.suffix.push_str(&meaning[pos..]);
        return inner;
    }

    if let Some(idx) = meaning.find(PREFIX_MARKER) {
        let pos = idx + PREFIX_MARKER.len();
        let mut inner = deconfixicate(&meaning[pos..]);
        inner.prefix.insert_str(0, &meaning[..pos]);
        return inner;
    }

    Decomposition::bare(meaning)
}
