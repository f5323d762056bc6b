use std::collections::{HashSet, VecDeque};

const DIRECTORY_INDEX: &str = "index.html";

/// Strip the fragment; a trailing `index.html` collapses to its directory.
/// Every other page keeps its full path.
pub fn canonicalize(url: &str) -> String {
    let url = url.split('#').next().unwrap_or_default();
    match url.strip_suffix(DIRECTORY_INDEX) {
        Some(dir) if dir.ends_with('/') => dir.to_string(),
        _ => url.to_string(),
    }
}

/// FIFO crawl queue plus the set of canonical URLs already seen.
#[derive(Debug)]
pub struct Frontier {
    base: String,
    queue: VecDeque<String>,
    /// canonical forms that are queued or visited
    known: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// A frontier seeded with `base`, which is also the scope prefix.
    pub fn new(base: &str) -> Self {
        let mut frontier = Frontier {
            base: base.to_string(),
            queue: VecDeque::new(),
            known: HashSet::new(),
            visited: HashSet::new(),
        };
        frontier.enqueue(base);
        frontier
    }

    /// Queue `url` unless it is out of scope, carries a fragment, or its
    /// canonical form is already known. Returns whether it was queued.
    pub fn enqueue(&mut self, url: &str) -> bool {
        if url.contains('#') || !url.starts_with(&self.base) {
            return false;
        }
        if !self.known.insert(canonicalize(url)) {
            return false;
        }
        self.queue.push_back(url.to_string());
        true
    }

    pub fn dequeue(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Record a fetched page. Returns false if it had already been visited,
    /// in which case its content must be discarded.
    pub fn mark_visited(&mut self, canonical: &str) -> bool {
        self.known.insert(canonical.to_string());
        self.visited.insert(canonical.to_string())
    }

    pub fn is_visited(&self, canonical: &str) -> bool {
        self.visited.contains(canonical)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://aslfont.github.io/Symbol-Font-For-ASL/";

    #[test]
    fn canonical_forms() {
        assert_eq!(canonicalize(BASE), BASE);
        assert_eq!(
            canonicalize("https://aslfont.github.io/Symbol-Font-For-ASL/lexicon/index.html"),
            "https://aslfont.github.io/Symbol-Font-For-ASL/lexicon/"
        );
        assert_eq!(
            canonicalize("https://aslfont.github.io/Symbol-Font-For-ASL/lexicon/#top"),
            "https://aslfont.github.io/Symbol-Font-For-ASL/lexicon/"
        );
        assert_eq!(
            canonicalize("https://aslfont.github.io/Symbol-Font-For-ASL/handshapes.html#b"),
            "https://aslfont.github.io/Symbol-Font-For-ASL/handshapes.html"
        );
        // only a whole path segment counts as a directory index
        assert_eq!(
            canonicalize("https://aslfont.github.io/Symbol-Font-For-ASL/mindex.html"),
            "https://aslfont.github.io/Symbol-Font-For-ASL/mindex.html"
        );
    }

    #[test]
    fn sibling_pages_are_distinct() {
        let mut f = Frontier::new(BASE);
        assert!(f.enqueue(&format!("{}handshapes.html", BASE)));
        assert!(f.enqueue(&format!("{}ways-to-write.html", BASE)));
        assert!(!f.enqueue(&format!("{}index.html", BASE)));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn seeded_with_base() {
        let mut f = Frontier::new(BASE);
        assert_eq!(f.len(), 1);
        assert_eq!(f.dequeue().as_deref(), Some(BASE));
        assert!(f.dequeue().is_none());
        assert!(f.is_empty());
    }

    #[test]
    fn reenqueue_visited_base_is_noop() {
        let mut f = Frontier::new(BASE);
        let url = f.dequeue().unwrap();
        assert!(f.mark_visited(&canonicalize(&url)));
        let before = f.len();
        assert!(!f.enqueue(BASE));
        assert_eq!(f.len(), before);
    }

    #[test]
    fn scope_and_fragments() {
        let mut f = Frontier::new(BASE);
        assert!(!f.enqueue("https://github.com/aslfont/"));
        assert!(!f.enqueue(&format!("{}lexicon/#verbs", BASE)));
        assert!(f.enqueue(&format!("{}lexicon/", BASE)));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn aliases_of_one_canonical_url_are_queued_once() {
        let mut f = Frontier::new(BASE);
        assert!(f.enqueue(&format!("{}lexicon/", BASE)));
        assert!(!f.enqueue(&format!("{}lexicon/index.html", BASE)));
        assert!(!f.enqueue(&format!("{}lexicon/", BASE)));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn visiting_twice_is_reported() {
        let mut f = Frontier::new(BASE);
        let lexicon = format!("{}lexicon/", BASE);
        assert!(f.mark_visited(&lexicon));
        assert!(!f.mark_visited(&lexicon));
        assert!(f.is_visited(&lexicon));
        assert!(!f.enqueue(&lexicon));
        assert_eq!(f.visited_count(), 1);
    }
}
