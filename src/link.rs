use thiserror::Error;
use url::Url;

use crate::normalize::Decomposition;

/// Applied in order when turning a root into a dictionary path segment.
const SLUG_SUBSTITUTIONS: &[(&str, &str)] = &[("'", ""), (" ", "-"), ("5", "five")];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn slug(root: &str) -> String {
    SLUG_SUBSTITUTIONS
        .iter()
        .fold(root.to_string(), |acc, (from, to)| acc.replace(from, to))
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid dictionary url {url:?}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("dictionary url {0:?} has no path to append to")]
    CannotBeABase(String),
}

/// Builds anchors into an external sign dictionary.
#[derive(Debug, Clone)]
pub struct LinkInjector {
    dictionary: Url,
}

impl LinkInjector {
    pub fn new(dictionary_url: &str) -> Result<Self, LinkError> {
        let dictionary = Url::parse(dictionary_url).map_err(|source| LinkError::Invalid {
            url: dictionary_url.to_string(),
            source,
        })?;
        if dictionary.cannot_be_a_base() {
            return Err(LinkError::CannotBeABase(dictionary_url.to_string()));
        }
        Ok(LinkInjector { dictionary })
    }

    /// Dictionary entry for `word`: its slug as one percent-encoded path
    /// segment, replacing the empty segment of a trailing `/`.
    fn href(&self, word: &str) -> Url {
        let mut href = self.dictionary.clone();
        if let Ok(mut segments) = href.path_segments_mut() {
            segments.pop_if_empty().push(&slug(word));
        }
        href
    }

    fn anchor(&self, word: &str) -> String {
        if word.trim().is_empty() {
            return escape_html(word);
        }
        format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(self.href(word).as_str()),
            escape_html(word)
        )
    }

    /// Link a root; `a/b` compounds get one anchor per side.
    pub fn link_root(&self, root: &str) -> String {
        root.split('/')
            .map(|side| self.anchor(side))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Full meaning markup: escaped prefix, linked root, escaped suffix.
    pub fn link_meaning(&self, meaning: &Decomposition) -> String {
        format!(
            "{}{}{}",
            escape_html(&meaning.prefix),
            self.link_root(&meaning.root),
            escape_html(&meaning.suffix)
        )
    }
}
