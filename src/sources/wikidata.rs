use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::mediawiki::USER_AGENT;
use super::EntityLinks;
use crate::error::{CheckerError, Result};

const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";

/// Sitelink resolution backed by the Wikidata wbgetentities API.
pub struct WikidataLinks {
    client: reqwest::Client,
}

impl Default for WikidataLinks {
    fn default() -> Self {
        Self::new()
    }
}

impl WikidataLinks {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EntityLinks for WikidataLinks {
    #[instrument(skip(self))]
    async fn linked_titles(
        &self,
        source_edition: &str,
        title: &str,
    ) -> Result<HashMap<String, String>> {
        let site = format!("{}wiki", source_edition);
        let response = self
            .client
            .get(WIKIDATA_API)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("action", "wbgetentities"),
                ("props", "sitelinks"),
                ("format", "json"),
                ("sites", site.as_str()),
                ("titles", title),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CheckerError::Transient {
                edition: "wikidata".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: EntitiesResponse = response.json().await?;
        let entity = body
            .entities
            .unwrap_or_default()
            .into_iter()
            // "-1" stands for "no entity matched the query"
            .filter(|(qid, _)| qid != "-1")
            .map(|(_, entity)| entity)
            .find(|entity| entity.missing.is_none())
            .ok_or_else(|| CheckerError::EntityUnresolvable {
                title: title.to_string(),
            })?;

        let mut titles = HashMap::new();
        for (site, link) in entity.sitelinks {
            if let Some(edition) = site.strip_suffix("wiki") {
                titles.insert(edition.to_string(), link.title);
            }
        }
        debug!(linked = titles.len(), "resolved sitelinks");
        Ok(titles)
    }
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    entities: Option<HashMap<String, Entity>>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    /// Present (as an empty string) when the entity does not exist.
    missing: Option<serde_json::Value>,
    #[serde(default)]
    sitelinks: HashMap<String, Sitelink>,
}

#[derive(Debug, Deserialize)]
struct Sitelink {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_response_with_sitelinks() {
        let raw = r#"{"entities":{"Q283":{"sitelinks":{"enwiki":{"title":"Water"},"dewiki":{"title":"Wasser"}}}}}"#;
        let body: EntitiesResponse = serde_json::from_str(raw).unwrap();
        let mut entities = body.entities.unwrap();
        let entity = entities.remove("Q283").unwrap();
        assert!(entity.missing.is_none());
        assert_eq!(entity.sitelinks["enwiki"].title, "Water");
        assert_eq!(entity.sitelinks["dewiki"].title, "Wasser");
    }

    #[test]
    fn test_missing_entity_marker() {
        let raw = r#"{"entities":{"-1":{"site":"cswiki","title":"Nonexistent","missing":""}}}"#;
        let body: EntitiesResponse = serde_json::from_str(raw).unwrap();
        let entities = body.entities.unwrap();
        assert!(entities["-1"].missing.is_some());
    }
}
