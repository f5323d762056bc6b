use std::fmt::Write;

use itertools::Itertools;
use regex::Regex;
use thiserror::Error;

use crate::classify::{Categories, Category, CategoryEntry};
use crate::link::{escape_html, LinkInjector};

const BOX_OPEN: &str = r#"<div class="medium boxshadow-p" style="font-family:monospace">"#;
const TWO_COLUMN: &str = "inline inline2b";
const ONE_COLUMN: &str = "inline";
const LINE_BREAK: &str = "<br/>";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template has no element with id {0:?}")]
    MissingInsertionPoint(String),
    #[error("element with id {0:?} is never closed")]
    UnclosedInsertionPoint(String),
}

pub struct Renderer {
    links: LinkInjector,
    section_id: String,
}

impl Renderer {
    pub fn new(links: LinkInjector, section_id: impl Into<String>) -> Self {
        Renderer {
            links,
            section_id: section_id.into(),
        }
    }

    fn meaning_markup(&self, category: Category, entry: &CategoryEntry) -> String {
        if category.is_linked() && !entry.meaning.root.trim().is_empty() {
            self.links.link_meaning(&entry.meaning)
        } else {
            escape_html(&entry.display_meaning())
        }
    }

    fn render_section(&self, category: Category, entries: &[CategoryEntry]) -> String {
        let list_class = match category {
            Category::Phrases => ONE_COLUMN,
            _ => TWO_COLUMN,
        };

        let mut out = String::new();
        let _ = writeln!(out, "<h4>{}</h4>", escape_html(category.title()));
        let _ = writeln!(out, "{}", BOX_OPEN);
        let _ = writeln!(out, r#"<dl class="{}">"#, list_class);
        for entry in entries {
            let transcriptions = entry.transcriptions.iter().map(|t| escape_html(t)).join(LINE_BREAK);
            let _ = writeln!(out, r#"<dt class="asl">{}</dt>"#, transcriptions);
            let _ = writeln!(out, "<dd>{}</dd>", self.meaning_markup(category, entry));
        }
        out.push_str("</dl>\n</div>\n");
        out
    }

    /// All four sections, sorted by root, in fixed category order.
    pub fn render_sections(&self, mut categories: Categories) -> String {
        categories.sort_by_root();
        Category::ALL
            .iter()
            .map(|c| self.render_section(*c, categories.get(*c)))
            .collect()
    }

    /// Append the rendered sections at the end of the insertion element.
    pub fn render_document(&self, template: &str, categories: Categories) -> Result<String, RenderError> {
        let at = insertion_point(template, &self.section_id)?;
        let sections = self.render_sections(categories);

        let mut doc = String::with_capacity(template.len() + sections.len() + 1);
        doc.push_str(&template[..at]);
        doc.push_str(&sections);
        doc.push_str(&template[at..]);
        Ok(doc)
    }
}

/// Byte offset of the closing tag of the element carrying `id`.
pub fn insertion_point(template: &str, id: &str) -> Result<usize, RenderError> {
    let open_re = Regex::new(&format!(
        r#"<([A-Za-z][A-Za-z0-9-]*)\b[^>]*\bid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(id)
    ))
    .map_err(|_| RenderError::MissingInsertionPoint(id.to_string()))?;

    let open = open_re
        .captures(template)
        .ok_or_else(|| RenderError::MissingInsertionPoint(id.to_string()))?;
    let whole = open.get(0).ok_or_else(|| RenderError::MissingInsertionPoint(id.to_string()))?;
    if whole.as_str().ends_with("/>") {
        return Err(RenderError::UnclosedInsertionPoint(id.to_string()));
    }

    let tag_re = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(&open[1])))
        .map_err(|_| RenderError::UnclosedInsertionPoint(id.to_string()))?;

    let mut depth = 1usize;
    for caps in tag_re.captures_iter(&template[whole.end()..]) {
        let tag = &caps[0];
        if !caps[1].is_empty() {
            depth -= 1;
            if depth == 0 {
                let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
                return Ok(whole.end() + start);
            }
        } else if !tag.ends_with("/>") {
            depth += 1;
        }
    }

    Err(RenderError::UnclosedInsertionPoint(id.to_string()))
}
