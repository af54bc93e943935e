//! The generator's on-disk layout: one markdown page per component.
//!
//! A repository directory holds `on_boarding.md` (the whole-project
//! overview) plus one `<component>.md` per component. Pages named
//! `<component>.code.md` carry code excerpts. Both the local and the remote
//! store turn such a listing into a `DocumentSet` through this module so
//! they rank documents identically.

use crate::markdown;
use onboardctx_core::document::Document;

/// File stem of the whole-project overview page.
pub const OVERVIEW_STEM: &str = "on_boarding";

const MARKDOWN_EXT: &str = ".md";
const CODE_SUFFIX: &str = ".code";

/// A markdown file name classified by the layout rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageName {
    /// Document id: the file name without `.md`.
    pub id: String,
    /// Component name (`on_boarding` for the overview).
    pub component: String,
    pub has_code: bool,
}

impl PageName {
    /// Classify a file name; `None` for anything that is not a markdown page.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(MARKDOWN_EXT)?;
        if stem.is_empty() {
            return None;
        }
        let (component, has_code) = match stem.strip_suffix(CODE_SUFFIX) {
            Some(component) if !component.is_empty() => (component, true),
            _ => (stem, false),
        };
        Some(Self {
            id: stem.to_string(),
            component: component.to_string(),
            has_code,
        })
    }

    pub fn is_overview(&self) -> bool {
        self.component == OVERVIEW_STEM
    }

    /// Ranking key: prose before code, overview before components, then by name.
    fn rank_key(&self) -> (bool, bool, &str) {
        (self.has_code, !self.is_overview(), self.component.as_str())
    }

    fn title(&self) -> String {
        match (self.is_overview(), self.has_code) {
            (true, false) => "System Architecture of the Whole Project".to_string(),
            (true, true) => "Code References of the Whole Project".to_string(),
            (false, false) => format!("System Architecture Overview of Component: {}", self.component),
            (false, true) => format!("Code References of Component: {}", self.component),
        }
    }
}

/// Turn raw pages into ranked, normalised documents.
///
/// Priorities are dense (0, 1, 2, ...) in rank order. The overview body is
/// prefixed with a repository-level heading; every body starts with its
/// section heading.
pub fn build_documents(repo_name: &str, pages: Vec<(PageName, String)>) -> Vec<Document> {
    let mut pages = pages;
    pages.sort_by(|(a, _), (b, _)| a.rank_key().cmp(&b.rank_key()));

    pages
        .into_iter()
        .enumerate()
        .map(|(rank, (page, raw))| {
            let title = page.title();
            let mut body = String::new();
            if page.is_overview() && !page.has_code {
                body.push_str(&format!("# {repo_name} Architecture Overview\n\n"));
            }
            body.push_str(&format!("## {title}\n\n"));
            body.push_str(markdown::normalize(&raw).trim());

            Document::new(page.id, title, body)
                .with_priority(rank as i64)
                .with_code(page.has_code)
        })
        .collect()
}
