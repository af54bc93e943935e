//! Remote document store: generated onboarding pages hosted on GitHub.
//!
//! Lists the docs repository's git tree, fetches the `<repo_name>/*.md`
//! pages from the raw content host, and builds documents with the same
//! layout rules as the local store. When code is requested, every code
//! reference in a prose page is resolved against the code repository and
//! collected into a companion code document.

use crate::layout::{self, PageName};
use crate::markdown::{self, CodeRef};
use async_trait::async_trait;
use futures::future::join_all;
use onboardctx_config::RemoteConfig;
use onboardctx_core::document::{Document, DocumentSet};
use onboardctx_core::error::StoreError;
use onboardctx_core::store::DocumentStore;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, info, warn};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("onboardctx/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Fetches onboarding pages from a GitHub docs repository.
pub struct RemoteStore {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Remote(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: RemoteConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                raw_base: config.raw_base.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        })
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/git/trees/{}?recursive=1",
            self.config.api_base, self.config.docs_repo, self.config.branch
        )
    }

    fn page_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.raw_base, self.config.docs_repo, self.config.branch, path
        )
    }

    fn code_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.raw_base,
            self.config.code_repo(),
            self.config.code_branch,
            path
        )
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout {
                store: self.name().to_string(),
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            StoreError::Remote(format!("GET {url} failed: {e}"))
        }
    }

    async fn get_text(&self, url: &str, api: bool) -> Result<String, StoreError> {
        let mut request = self.client.get(url);
        if api {
            request = request.header("Accept", GITHUB_ACCEPT);
        }
        if let Some(token) = &self.config.github_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| self.map_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Remote(format!(
                "GET {url} returned status {}",
                status.as_u16()
            )));
        }
        response.text().await.map_err(|e| self.map_error(url, e))
    }

    async fn fetch_tree(&self) -> Result<Vec<TreeEntry>, StoreError> {
        let url = self.tree_url();
        let raw = self.get_text(&url, true).await?;
        let tree: TreeResponse = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Remote(format!("Failed to parse git tree: {e}")))?;
        Ok(tree.tree.into_iter().filter(|entry| entry.kind == "blob").collect())
    }

    /// Repositories with at least one page at the top of the docs repository.
    pub async fn repositories(&self) -> Result<Vec<String>, StoreError> {
        let repos: BTreeSet<String> = self
            .fetch_tree()
            .await?
            .into_iter()
            .filter_map(|entry| {
                let (repo, file_name) = entry.path.split_once('/')?;
                if file_name.contains('/') {
                    return None;
                }
                PageName::parse(file_name)?;
                Some(repo.to_string())
            })
            .collect();
        Ok(repos.into_iter().collect())
    }

    /// Paths of the markdown pages directly under `<repo_name>/`.
    async fn list_pages(&self, repo_name: &str) -> Result<Vec<(PageName, String)>, StoreError> {
        let prefix = format!("{repo_name}/");
        let pages = self
            .fetch_tree()
            .await?
            .into_iter()
            .filter_map(|entry| {
                let file_name = entry.path.strip_prefix(&prefix)?;
                if file_name.contains('/') {
                    return None;
                }
                let page = PageName::parse(file_name)?;
                Some((page, entry.path))
            })
            .collect();
        Ok(pages)
    }

    /// Cut the referenced line ranges out of the fetched files into one document.
    fn code_document(
        source: &Document,
        refs: &[CodeRef],
        files: &HashMap<String, String>,
        priority: i64,
    ) -> Option<Document> {
        let title = format!("Code References of Component: {}", source.id);
        let mut body = format!("## {title}\n");
        let mut snippets = 0;
        for r in refs {
            let Some(content) = files.get(&r.path) else {
                continue;
            };
            let snippet = extract_lines(content, r.start, r.end);
            if snippet.is_empty() {
                continue;
            }
            body.push_str(&format!(
                "\n### {} ({}: lines {}–{})\n\n```\n{}\n```\n",
                r.symbol, r.path, r.start, r.end, snippet
            ));
            snippets += 1;
        }
        if snippets == 0 {
            return None;
        }
        Some(
            Document::new(
                format!("{}.code", source.id),
                title,
                body.trim_end().to_string(),
            )
            .with_priority(priority)
            .with_code(true),
        )
    }

    async fn attach_code(&self, documents: &mut Vec<Document>) {
        let refs: Vec<(usize, Vec<CodeRef>)> = documents
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.has_code)
            .map(|(i, d)| (i, markdown::code_references(&d.body)))
            .filter(|(_, refs)| !refs.is_empty())
            .collect();
        if refs.is_empty() {
            return;
        }

        let paths: BTreeSet<String> = refs
            .iter()
            .flat_map(|(_, rs)| rs.iter().map(|r| r.path.clone()))
            .collect();
        let fetched = join_all(paths.into_iter().map(|path| async move {
            let url = self.code_url(&path);
            match self.get_text(&url, false).await {
                Ok(text) => Some((path, text)),
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping unreachable code reference");
                    None
                }
            }
        }))
        .await;
        let files: HashMap<String, String> = fetched.into_iter().flatten().collect();

        let mut next_priority = documents.iter().map(|d| d.priority).max().unwrap_or(0) + 1;
        let mut extra = Vec::new();
        for (idx, rs) in refs {
            let source = &documents[idx];
            let id = format!("{}.code", source.id);
            if documents.iter().any(|d| d.id == id) {
                continue;
            }
            if let Some(doc) = Self::code_document(source, &rs, &files, next_priority) {
                extra.push(doc);
                next_priority += 1;
            }
        }
        documents.extend(extra);
    }
}

/// Lines `start..=end` (1-based, clamped to the file).
fn extract_lines(content: &str, start: usize, end: usize) -> String {
    let skip = start.saturating_sub(1);
    let take = end.saturating_sub(skip);
    content
        .lines()
        .skip(skip)
        .take(take)
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl DocumentStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        let listed = self.list_pages(repo_name).await?;
        if listed.is_empty() {
            return Err(StoreError::not_found(repo_name));
        }
        info!(
            repo = %repo_name,
            docs_repo = %self.config.docs_repo,
            pages = listed.len(),
            "Found remote onboarding pages"
        );

        let wanted: Vec<(PageName, String)> = listed
            .into_iter()
            .filter(|(page, _)| include_code || !page.has_code)
            .collect();

        let results = join_all(wanted.into_iter().map(|(page, path)| async move {
            let url = self.page_url(&path);
            (page, path, self.get_text(&url, false).await)
        }))
        .await;

        let mut pages = Vec::with_capacity(results.len());
        let mut failures = 0;
        for (page, path, result) in results {
            match result {
                Ok(raw) => pages.push((page, raw)),
                Err(e @ StoreError::Timeout { .. }) => return Err(e),
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping page that failed to fetch");
                    failures += 1;
                }
            }
        }
        if pages.is_empty() && failures > 0 {
            return Err(StoreError::Remote(format!(
                "all {failures} pages for '{repo_name}' failed to fetch"
            )));
        }

        let mut documents = layout::build_documents(repo_name, pages);
        if include_code {
            self.attach_code(&mut documents).await;
        }

        debug!(repo = %repo_name, documents = documents.len(), "Built remote onboarding documents");
        DocumentSet::new(repo_name, documents)
    }
}
