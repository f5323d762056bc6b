pub mod fetch;
pub mod frontier;

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::parse_page;
use crate::translations::TranslationMap;
use fetch::{Fetcher, Jitter};
use frontier::{canonicalize, Frontier};

pub struct CrawlOptions {
    pub base_url: String,
    /// Max fetches; `None` crawls until the frontier drains.
    pub budget: Option<usize>,
    pub jitter: Jitter,
    pub normalize_meanings: bool,
    pub checkpoint: Option<Checkpoint>,
}

/// Persist the partial map every `every` successful fetches.
pub struct Checkpoint {
    pub every: usize,
    pub path: PathBuf,
}

/// Crawl stats returned after completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub fetched: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub new_pairs: usize,
}

impl CrawlReport {
    pub fn print(&self, map: &TranslationMap) {
        println!(
            "Crawled {} pages ({} failed, {} redirect duplicates): {} meanings, {} pairs.",
            self.fetched,
            self.failed,
            self.duplicates,
            map.len(),
            self.new_pairs
        );
    }
}

enum Visit {
    Harvested { pairs: usize, links: usize },
    Failed,
    Duplicate,
}

/// Walk the site from `base_url`, fetching every canonical page once.
pub fn crawl<F: Fetcher>(fetcher: &mut F, opts: &CrawlOptions) -> (TranslationMap, CrawlReport) {
    let mut frontier = Frontier::new(&opts.base_url);
    let mut map = TranslationMap::default();
    let mut report = CrawlReport::default();
    let mut remaining = opts.budget;

    let pb = match opts.budget {
        Some(n) => ProgressBar::new(n as u64),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {pos} pages {msg}") {
        pb.set_style(style);
    }

    info!("Crawling from {}", opts.base_url);

    while !frontier.is_empty() && remaining != Some(0) {
        let Some(url) = frontier.dequeue() else {
            break;
        };
        if let Some(n) = remaining.as_mut() {
            *n -= 1;
        }
        pb.set_message(url.clone());

        match visit(fetcher, &mut frontier, &mut map, &url, opts.normalize_meanings) {
            Visit::Harvested { pairs, links } => {
                report.fetched += 1;
                report.new_pairs += pairs;
                debug!("{} new pairs, {} new links from {}", pairs, links, url);
                info!("Translated terms: {}", map.len());
                if let Some(cp) = &opts.checkpoint {
                    if cp.every > 0 && report.fetched % cp.every == 0 {
                        save_checkpoint(&map, cp);
                    }
                }
            }
            Visit::Failed => report.failed += 1,
            Visit::Duplicate => report.duplicates += 1,
        }

        pb.inc(1);
        opts.jitter.pause();
    }

    pb.finish_and_clear();
    info!(
        "Crawl finished: {} visited, {} still queued",
        frontier.visited_count(),
        frontier.len()
    );
    (map, report)
}

fn visit<F: Fetcher>(
    fetcher: &mut F,
    frontier: &mut Frontier,
    map: &mut TranslationMap,
    url: &str,
    normalize_meanings: bool,
) -> Visit {
    let page = match fetcher.fetch(url) {
        Ok(page) => page,
        Err(e) => {
            warn!("{}", e);
            frontier.mark_visited(&canonicalize(url));
            return Visit::Failed;
        }
    };

    if page.final_url == url {
        info!("{} {}", url, page.status);
    } else {
        info!("{} > {} {}", url, page.final_url, page.status);
    }

    let canonical = canonicalize(&page.final_url);
    if frontier.is_visited(&canonical) {
        info!("{} already visited, discarding", canonical);
        return Visit::Duplicate;
    }
    frontier.mark_visited(&canonical);

    if !page.is_success() {
        warn!("{} returned status {}", page.final_url, page.status);
        return Visit::Failed;
    }

    // relative links resolve against the final URL's directory
    let base = match Url::parse(&page.final_url) {
        Ok(base) => base,
        Err(e) => {
            warn!("Cannot resolve links against {}: {}", page.final_url, e);
            return Visit::Failed;
        }
    };

    let data = parse_page(&page.body, &base, normalize_meanings);
    let pairs = data
        .pairs
        .iter()
        .filter(|p| map.insert(&p.meaning, &p.transcription))
        .count();
    let links = data.links.iter().filter(|l| frontier.enqueue(l)).count();

    Visit::Harvested { pairs, links }
}

fn save_checkpoint(map: &TranslationMap, cp: &Checkpoint) {
    match map.save(&cp.path) {
        Ok(()) => debug!("Checkpoint: {} meanings -> {:?}", map.len(), cp.path),
        Err(e) => warn!("Checkpoint to {:?} failed: {:#}", cp.path, e),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::fetch::{FetchError, FetchedPage};
    use super::*;

    const BASE: &str = "https://aslfont.github.io/Symbol-Font-For-ASL/";

    /// Scripted site: requested url -> (final url, status, body).
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, (String, u16, String)>,
        /// urls whose fetch errors out before any response
        broken: HashSet<String>,
        requests: Vec<String>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), (url.to_string(), 200, body.to_string()));
            self
        }

        fn redirect(mut self, from: &str, to: &str, body: &str) -> Self {
            self.pages
                .insert(from.to_string(), (to.to_string(), 200, body.to_string()));
            self
        }

        fn status(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), (url.to_string(), status, body.to_string()));
            self
        }

        fn broken(mut self, url: &str) -> Self {
            self.broken.insert(url.to_string());
            self
        }
    }

    impl Fetcher for FakeSite {
        fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
            self.requests.push(url.to_string());
            if self.broken.contains(url) {
                return Err(FetchError::InvalidUrl {
                    url: url.to_string(),
                    source: url::ParseError::EmptyHost,
                });
            }
            let (final_url, status, body) = self
                .pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| (url.to_string(), 404, String::new()));
            Ok(FetchedPage {
                final_url,
                status,
                body,
            })
        }
    }

    fn opts(budget: Option<usize>) -> CrawlOptions {
        CrawlOptions {
            base_url: BASE.to_string(),
            budget,
            jitter: Jitter::new(0.0, 0.0),
            normalize_meanings: true,
            checkpoint: None,
        }
    }

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    fn example(t: &str, m: &str) -> String {
        format!(r#"<dl class="inline"><dt class="asl">{}</dt><dd>{}</dd></dl>"#, t, m)
    }

    #[test]
    fn each_canonical_page_fetched_once() {
        let home = format!(
            r#"<a href="lexicon/">a</a><a href="{}">b</a><a href="./lexicon/">c</a><a href="lexicon/index.html">d</a><a href="grammar/">e</a>"#,
            url("lexicon/")
        );
        let lexicon = format!(
            r#"{}<a href="../">home</a><a href="../grammar/">g</a><a href="../lexicon/#x">frag</a>"#,
            example("B^,", "house")
        );
        let grammar = format!(r#"{}<a href="../lexicon/">l</a>"#, example("S^,", "strike, as in a match"));
        let mut site = FakeSite::default()
            .page(BASE, &home)
            .page(&url("lexicon/"), &lexicon)
            .page(&url("grammar/"), &grammar);

        let (map, report) = crawl(&mut site, &opts(None));

        assert_eq!(site.requests, [url(""), url("lexicon/"), url("grammar/")]);
        assert_eq!(report.fetched, 3);
        assert_eq!(map.len(), 2);
        assert_eq!(report.new_pairs, 2);
    }

    #[test]
    fn out_of_scope_links_are_not_followed() {
        let home = r#"<a href="https://github.com/aslfont/">gh</a><a href="mailto:a@b.c">m</a>"#;
        let mut site = FakeSite::default().page(BASE, home);
        let (_, report) = crawl(&mut site, &opts(None));
        assert_eq!(site.requests.len(), 1);
        assert_eq!(report.fetched, 1);
    }

    #[test]
    fn redirect_to_visited_page_is_discarded() {
        let home = format!(r#"{}<a href="old/">old</a>"#, example("A^,", "apple"));
        let mut site = FakeSite::default()
            .page(BASE, &home)
            .redirect(&url("old/"), BASE, &format!(r#"{}<a href="new/">n</a>"#, example("Q^,", "queen")));

        let (map, report) = crawl(&mut site, &opts(None));

        assert_eq!(report.duplicates, 1);
        assert_eq!(map.len(), 1);
        // links on the discarded copy are never followed
        assert_eq!(site.requests, [url(""), url("old/")]);
    }

    #[test]
    fn redirect_to_new_page_uses_final_url_for_links() {
        let home = r#"<a href="old/">old</a>"#;
        let moved = format!(r#"{}<a href="sub/">s</a>"#, example("B^,", "house"));
        let mut site = FakeSite::default()
            .page(BASE, home)
            .redirect(&url("old/"), &url("moved/"), &moved)
            .page(&url("moved/sub/"), &example("H^,", "hat"));

        let (map, _) = crawl(&mut site, &opts(None));

        assert_eq!(site.requests, [url(""), url("old/"), url("moved/sub/")]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn failed_pages_yield_nothing() {
        let home = r#"<a href="gone/">gone</a><a href="ok/">ok</a>"#;
        let gone = format!(r#"{}<a href="../secret/">s</a>"#, example("B^,", "house"));
        let mut site = FakeSite::default()
            .page(BASE, home)
            .status(&url("gone/"), 500, &gone)
            .page(&url("ok/"), &format!(r#"{}<a href="../gone/">again</a>"#, example("A^,", "apple")));

        let (map, report) = crawl(&mut site, &opts(None));

        assert_eq!(report.failed, 1);
        assert_eq!(map.len(), 1);
        assert_eq!(site.requests, [url(""), url("gone/"), url("ok/")]);
    }

    #[test]
    fn fetch_errors_mark_the_page_visited() {
        let home = r#"<a href="down/">down</a><a href="ok/">ok</a>"#;
        let ok = format!(r#"{}<a href="../down/">again</a>"#, example("A^,", "apple"));
        let mut site = FakeSite::default()
            .page(BASE, home)
            .broken(&url("down/"))
            .page(&url("ok/"), &ok);

        let (map, report) = crawl(&mut site, &opts(None));

        assert_eq!(report.failed, 1);
        assert_eq!(report.fetched, 2);
        assert_eq!(site.requests, [url(""), url("down/"), url("ok/")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.pair_count(), 1);
    }

    #[test]
    fn sibling_html_pages_are_each_crawled() {
        let home = r#"<a href="handshapes.html">h</a><a href="ways-to-write.html">w</a><a href="index.html#top">top</a>"#;
        let handshapes = format!(r#"{}<a href="ways-to-write.html">w</a><a href="./">home</a>"#, example("B^,", "house"));
        let ways = format!(r#"{}<a href="handshapes.html#b">h</a>"#, example("S^,", "strike"));
        let mut site = FakeSite::default()
            .page(BASE, home)
            .page(&url("handshapes.html"), &handshapes)
            .page(&url("ways-to-write.html"), &ways);

        let (map, report) = crawl(&mut site, &opts(None));

        assert_eq!(
            site.requests,
            [url(""), url("handshapes.html"), url("ways-to-write.html")]
        );
        assert_eq!(report.fetched, 3);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn budget_bounds_fetches() {
        let links: String = (0..10).map(|i| format!(r#"<a href="p{}/">x</a>"#, i)).collect();
        let mut site = FakeSite::default().page(BASE, &links);
        let (_, report) = crawl(&mut site, &opts(Some(4)));
        assert_eq!(site.requests.len(), 4);
        assert_eq!(report.fetched + report.failed, 4);
    }

    #[test]
    fn checkpoint_writes_partial_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        let mut site = FakeSite::default().page(BASE, &example("B^,", "house"));
        let mut o = opts(None);
        o.checkpoint = Some(Checkpoint {
            every: 1,
            path: path.clone(),
        });

        let (map, _) = crawl(&mut site, &o);

        assert_eq!(TranslationMap::load(&path).unwrap(), map);
    }
}
