use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::ArticleSource;
use crate::error::{CheckerError, Result};

pub(crate) const USER_AGENT: &str = concat!("chembox_checker/", env!("CARGO_PKG_VERSION"));

/// Article retrieval backed by the MediaWiki action API of each edition.
pub struct MediaWikiSource {
    client: reqwest::Client,
}

impl Default for MediaWikiSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaWikiSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_url(edition: &str) -> String {
        format!("https://{}.wikipedia.org/w/api.php", edition)
    }

    #[instrument(skip(self))]
    async fn query_page(&self, edition: &str, title: &str) -> Result<Option<PageInfo>> {
        let response = self
            .client
            .get(Self::api_url(edition))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("format", "json"),
                ("formatversion", "2"),
                ("titles", title),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CheckerError::Transient {
                edition: edition.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: QueryResponse = response.json().await?;
        let page = body.query.and_then(|q| q.pages.into_iter().next());
        debug!(found = page.is_some(), "queried page");
        Ok(page)
    }
}

#[async_trait]
impl ArticleSource for MediaWikiSource {
    async fn exists(&self, edition: &str, title: &str) -> Result<bool> {
        let page = self.query_page(edition, title).await?;
        Ok(page.map(|p| !p.missing).unwrap_or(false))
    }

    async fn fetch(&self, edition: &str, title: &str) -> Result<String> {
        match self.query_page(edition, title).await? {
            Some(page) if !page.missing => page
                .revisions
                .into_iter()
                .next()
                .map(|r| r.slots.main.content)
                .ok_or_else(|| CheckerError::Api {
                    message: format!("no revision content for '{}' on {}wiki", title, edition),
                }),
            _ => Err(CheckerError::PageMissing {
                edition: edition.to_string(),
                title: title.to_string(),
            }),
        }
    }

    async fn redirect_target(&self, edition: &str, title: &str) -> Result<Option<String>> {
        let markup = self.fetch(edition, title).await?;
        Ok(redirect_target_in(&markup))
    }
}

// Localized redirect markers all follow the `#WORD [[target]]` shape
// (#REDIRECT, #PŘESMĚRUJ, #WEITERLEITUNG, ...)
static REDIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*#\w+\s*:?\s*\[\[([^\]|#]+)").unwrap());

fn redirect_target_in(markup: &str) -> Option<String> {
    REDIRECT_RE
        .captures(markup)
        .map(|captures| captures[1].trim().to_string())
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: SlotContent,
}

#[derive(Debug, Deserialize)]
struct SlotContent {
    content: String,
}
