//! Markdown normalisation for generated onboarding pages.
//!
//! Generated pages are written for humans browsing GitHub: mermaid
//! diagrams, HTML anchors into source files, badges, FAQ links. Before they
//! are handed to a model they are rewritten into plain, token-cheap text.

use regex_lite::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static MERMAID_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\n(.*?)```").expect("valid regex"));

static MERMAID_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)\["(.+?)"\]"#).expect("valid regex"));

static MERMAID_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s+--\s+"(.+?)"\s+-->\s+(\w+)"#).expect("valid regex")
});

static GITHUB_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<a href="https://github\.com/[^/]+/[^/]+/blob/[^/]+/(?P<path>[^#]+)#L(?P<start>\d+)-L(?P<end>\d+)"[^>]*>`(?P<symbol>[^`]+)` \(\d+:\d+\)</a>"#,
    )
    .expect("valid regex")
});

static FAQ_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"### \[FAQ\].*").expect("valid regex"));

static BADGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\[!\[[^\]]+\]\([^)]+\)\]\([^)]+\)\s*)+").expect("valid regex")
});

static CODE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\s*([A-Za-z0-9_\.]+)\s*\(\s*([^:()]+):\s*lines\s*(\d+)[–-](\d+)\s*\)")
        .expect("valid regex")
});

/// A pointer from prose into a line range of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRef {
    pub symbol: String,
    pub path: String,
    pub start: usize,
    pub end: usize,
}

/// Apply every rewrite: links, diagrams, then badge and FAQ removal.
pub fn normalize(markdown: &str) -> String {
    let text = format_github_links(markdown);
    let text = replace_mermaid_blocks(&text);
    let text = FAQ_LINE.replace_all(&text, "");
    BADGES.replace_all(&text, "").into_owned()
}

/// `<a href=".../blob/main/src/x.py#L10-L20">`sym` (10:20)</a>` → `sym  (src/x.py: lines 10–20)`
pub fn format_github_links(markdown: &str) -> String {
    GITHUB_LINK
        .replace_all(markdown, |caps: &Captures<'_>| {
            format!(
                "{}  ({}: lines {}–{})",
                &caps["symbol"], &caps["path"], &caps["start"], &caps["end"]
            )
        })
        .into_owned()
}

/// Replace each mermaid block with a component list a model can read.
pub fn replace_mermaid_blocks(markdown: &str) -> String {
    MERMAID_BLOCK
        .replace_all(markdown, |caps: &Captures<'_>| mermaid_to_component_list(&caps[1]))
        .into_owned()
}

/// Render a flowchart as "**Core Components:**" followed by one bullet per node.
///
/// Outgoing edges are listed under their label. Incoming edges are listed as
/// `<label> by:` unless the node already points back at the source.
pub fn mermaid_to_component_list(diagram: &str) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut names: HashMap<&str, &str> = HashMap::new();
    for caps in MERMAID_NODE.captures_iter(diagram) {
        let (Some(key), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if names.insert(key.as_str(), name.as_str()).is_none() {
            order.push(key.as_str());
        }
    }

    let mut forward: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    let mut reverse: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    for caps in MERMAID_EDGE.captures_iter(diagram) {
        let (Some(src), Some(label), Some(dst)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        forward
            .entry(src.as_str())
            .or_default()
            .push((label.as_str(), dst.as_str()));
        reverse
            .entry(dst.as_str())
            .or_default()
            .push((label.as_str(), src.as_str()));
    }

    let display = |key: &str| -> String { names.get(key).copied().unwrap_or(key).to_string() };

    let mut lines = vec!["**Core Components:**".to_string(), String::new()];
    for key in order {
        lines.push(format!("- {}", display(key)));
        let outgoing = forward.get(key).map(Vec::as_slice).unwrap_or_default();
        for (label, dst) in outgoing {
            lines.push(format!("  {label}:"));
            lines.push(format!("  - {}", display(*dst)));
        }
        for (label, src) in reverse.get(key).map(Vec::as_slice).unwrap_or_default() {
            if outgoing.iter().any(|(_, d)| d == src) {
                continue;
            }
            lines.push(format!("  {label} by:"));
            lines.push(format!("  - {}", display(*src)));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Every `- symbol (path: lines a–b)` reference in normalised markdown.
pub fn code_references(markdown: &str) -> Vec<CodeRef> {
    CODE_REF
        .captures_iter(markdown)
        .filter_map(|caps| {
            Some(CodeRef {
                symbol: caps.get(1)?.as_str().to_string(),
                path: caps.get(2)?.as_str().trim().to_string(),
                start: caps.get(3)?.as_str().parse().ok()?,
                end: caps.get(4)?.as_str().parse().ok()?,
            })
        })
        .collect()
}
