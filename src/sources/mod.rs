use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

pub mod mediawiki;
pub mod wikidata;

pub use mediawiki::MediaWikiSource;
pub use wikidata::WikidataLinks;

/// Retrieval of raw article markup and page status from one wiki edition.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn exists(&self, edition: &str, title: &str) -> Result<bool>;

    /// Raw wikitext of the page, or PageMissing.
    async fn fetch(&self, edition: &str, title: &str) -> Result<String>;

    /// Where the page redirects, if it is a redirect page.
    async fn redirect_target(&self, edition: &str, title: &str) -> Result<Option<String>>;
}

/// Cross-edition identity resolution: which titles cover the same subject on
/// the other editions.
#[async_trait]
pub trait EntityLinks: Send + Sync {
    /// Mapping edition -> linked article title. EntityUnresolvable when the
    /// article has no linked entity at all.
    async fn linked_titles(
        &self,
        source_edition: &str,
        title: &str,
    ) -> Result<HashMap<String, String>>;
}
