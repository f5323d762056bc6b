use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static DEFINITION_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl.inline").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const TERM_CLASS: &str = "asl";

/// A transcription and the meaning given for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub transcription: String,
    pub meaning: String,
}

/// Everything pulled out of one fetched page.
#[derive(Debug, Default)]
pub struct PageData {
    pub pairs: Vec<Pair>,
    pub links: Vec<String>,
}

pub fn parse_page(html: &str, base: &Url, normalize_meanings: bool) -> PageData {
    let doc = Html::parse_document(html);
    PageData {
        pairs: extract_pairs(&doc, normalize_meanings),
        links: extract_links(&doc, base),
    }
}

/// Collapse whitespace runs to one space and trim.
pub fn normalize_meaning(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_term(el: &ElementRef) -> bool {
    el.value().name() == "dt" && el.value().classes().any(|c| c == TERM_CLASS)
}

/// Pair each `dt.asl` with the `dd` that follows it inside `dl.inline`.
pub fn extract_pairs(doc: &Html, normalize_meanings: bool) -> Vec<Pair> {
    let mut pairs = Vec::new();

    for block in doc.select(&DEFINITION_BLOCK) {
        let mut term: Option<String> = None;

        for child in block.children() {
            let Some(el) = ElementRef::wrap(child) else {
                // text and comments between dt and dd don't break the pairing
                continue;
            };

            if is_term(&el) {
                // a blank term leaves nothing for the next dd to pair with
                term = Some(el.text().collect::<String>().trim().to_string())
                    .filter(|t| !t.is_empty());
                continue;
            }

            if el.value().name() == "dd" {
                if let Some(transcription) = term.take() {
                    let raw: String = el.text().collect();
                    let meaning = if normalize_meanings {
                        normalize_meaning(&raw)
                    } else {
                        raw
                    };
                    pairs.push(Pair {
                        transcription,
                        meaning,
                    });
                }
                continue;
            }

            term = None;
        }
    }

    pairs
}

/// Resolve every `href` against `base`; unresolvable ones are dropped.
pub fn extract_links(doc: &Html, base: &Url) -> Vec<String> {
    doc.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| match base.join(href.trim()) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                debug!("Dropping link {:?}: {}", href, e);
                None
            }
        })
        .collect()
}
