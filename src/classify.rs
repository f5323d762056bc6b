use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::normalize::{deconfixicate, Decomposition};
use crate::translations::TranslationMap;

/// Letters the font uses for non-handshape marks.
const RESERVED_LETTERS: &[char] = &['Z', 'J'];

/// Location spelled relative to the non-dominant hand, e.g. `^[B]` or `[5]c`.
static NDH_LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\^_'`,.~-]{0,2}\[[0-9A-Za-z]\][0-9A-Za-z]?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshapeBalance {
    NoHandshapes,
    HandshapesOnly,
    BothPresent,
}

pub fn is_handshape(c: char) -> bool {
    c.is_alphanumeric() && !RESERVED_LETTERS.contains(&c)
}

pub fn handshape_balance(transcription: &str) -> HandshapeBalance {
    if NDH_LOCATION_RE.is_match(transcription.trim()) {
        return HandshapeBalance::NoHandshapes;
    }

    let mut hs = false;
    let mut non_hs = false;
    for c in transcription.chars().filter(|c| !c.is_whitespace()) {
        if is_handshape(c) {
            hs = true;
        } else {
            non_hs = true;
        }
    }

    match (hs, non_hs) {
        (false, _) => HandshapeBalance::NoHandshapes,
        (true, false) => HandshapeBalance::HandshapesOnly,
        (true, true) => HandshapeBalance::BothPresent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Lexicon,
    SuspiciouslySimplified,
    Symbols,
    Phrases,
}

impl Category {
    /// Output order of the rendered sections.
    pub const ALL: [Category; 4] = [
        Category::Lexicon,
        Category::SuspiciouslySimplified,
        Category::Symbols,
        Category::Phrases,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Lexicon => "Lexicon",
            Category::SuspiciouslySimplified => "Suspiciously Simplified",
            Category::Symbols => "Symbols",
            Category::Phrases => "Phrases",
        }
    }

    /// Buckets whose meanings are linked to the external dictionary.
    pub fn is_linked(self) -> bool {
        matches!(self, Category::Lexicon | Category::SuspiciouslySimplified)
    }

    fn lowercases_root(self) -> bool {
        self.is_linked()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Facts about one (transcription, meaning) pair that the rules look at.
#[derive(Debug, Clone)]
pub struct PairFacts {
    pub char_len: usize,
    pub transcription_spaced: bool,
    pub root_blank: bool,
    pub root_spaced: bool,
    pub balance: HandshapeBalance,
}

impl PairFacts {
    pub fn new(transcription: &str, root: &str) -> Self {
        PairFacts {
            char_len: transcription.chars().count(),
            transcription_spaced: has_internal_space(transcription),
            root_blank: root.trim().is_empty(),
            root_spaced: has_internal_space(root),
            balance: handshape_balance(transcription),
        }
    }
}

fn has_internal_space(s: &str) -> bool {
    s.trim().contains(' ')
}

type Rule = (&'static str, fn(&PairFacts) -> bool, Category);

fn spaceless_handshapes_only(f: &PairFacts) -> bool {
    f.char_len > 1 && !f.transcription_spaced && f.balance == HandshapeBalance::HandshapesOnly
}

fn blank_meaning(f: &PairFacts) -> bool {
    f.root_blank
}

fn multi_word_both_sides(f: &PairFacts) -> bool {
    f.root_spaced && f.transcription_spaced
}

fn no_overlap(f: &PairFacts) -> bool {
    f.balance != HandshapeBalance::BothPresent
}

fn always(_: &PairFacts) -> bool {
    true
}

/// Evaluated top to bottom, first match wins. The last rule always matches.
const RULES: &[Rule] = &[
    ("spaceless handshape-only", spaceless_handshapes_only, Category::SuspiciouslySimplified),
    ("blank meaning", blank_meaning, Category::Symbols),
    ("multi-word on both sides", multi_word_both_sides, Category::Phrases),
    ("no handshape overlap", no_overlap, Category::Symbols),
    ("fallback", always, Category::Lexicon),
];

pub fn categorize_pair(transcription: &str, root: &str) -> Category {
    let facts = PairFacts::new(transcription, root);
    RULES
        .iter()
        .find(|(_, rule, _)| rule(&facts))
        .map(|(name, _, category)| {
            trace!(transcription, root, rule = *name, %category, "categorized");
            *category
        })
        .unwrap_or(Category::Lexicon)
}

/// One rendered row: every transcription of a meaning that fell into the
/// same bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub transcriptions: Vec<String>,
    pub meaning: Decomposition,
}

impl CategoryEntry {
    pub fn display_meaning(&self) -> String {
        self.meaning.joined()
    }
}

/// The four buckets, each in map order until the renderer sorts them.
#[derive(Debug, Default)]
pub struct Categories {
    lexicon: Vec<CategoryEntry>,
    simplified: Vec<CategoryEntry>,
    symbols: Vec<CategoryEntry>,
    phrases: Vec<CategoryEntry>,
}

impl Categories {
    pub fn get(&self, category: Category) -> &[CategoryEntry] {
        match category {
            Category::Lexicon => &self.lexicon,
            Category::SuspiciouslySimplified => &self.simplified,
            Category::Symbols => &self.symbols,
            Category::Phrases => &self.phrases,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<CategoryEntry> {
        match category {
            Category::Lexicon => &mut self.lexicon,
            Category::SuspiciouslySimplified => &mut self.simplified,
            Category::Symbols => &mut self.symbols,
            Category::Phrases => &mut self.phrases,
        }
    }

    pub fn pair_count(&self) -> usize {
        Category::ALL
            .iter()
            .flat_map(|c| self.get(*c))
            .map(|e| e.transcriptions.len())
            .sum()
    }

    pub fn sort_by_root(&mut self) {
        for category in Category::ALL {
            self.get_mut(category)
                .sort_by_cached_key(|e| e.meaning.root.to_lowercase());
        }
    }
}

/// Assign every (meaning, transcription) pair of the map to a bucket.
pub fn categorize(map: &TranslationMap) -> Categories {
    let mut out = Categories::default();

    for (meaning, transcriptions) in map.iter() {
        let decomposition = deconfixicate(meaning);
        let mut grouped: Vec<(Category, Vec<String>)> = Vec::new();

        for t in transcriptions {
            let category = categorize_pair(t, &decomposition.root);
            match grouped.iter_mut().find(|(c, _)| *c == category) {
                Some((_, ts)) => ts.push(t.clone()),
                None => grouped.push((category, vec![t.clone()])),
            }
        }

        for (category, transcriptions) in grouped {
            let mut meaning = decomposition.clone();
            if category.lowercases_root() {
                meaning.root = meaning.root.to_lowercase();
            }
            out.get_mut(category).push(CategoryEntry {
                transcriptions,
                meaning,
            });
        }
    }

    out
}
