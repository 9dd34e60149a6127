use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use chembox_checker::channel::{ChannelEvent, Classification, RunSummary};
use chembox_checker::checker::CheckRunner;
use chembox_checker::config::RunConfig;
use chembox_checker::error::{CheckerError, Result as CheckerResult};
use chembox_checker::sources::{ArticleSource, EntityLinks};
use chembox_checker::wikitext::WikitextParser;

/// Canned wiki holding a handful of chemistry articles across three
/// editions, with realistic markup quirks (references, val templates,
/// nested Chembox sections, comma decimals).
#[derive(Clone, Default)]
struct CannedWiki {
    pages: HashMap<(String, String), String>,
    links: HashMap<String, HashMap<String, String>>,
}

impl CannedWiki {
    fn page(mut self, edition: &str, title: &str, markup: &str) -> Self {
        self.pages
            .insert((edition.to_string(), title.to_string()), markup.to_string());
        self
    }

    fn link(mut self, title: &str, pairs: &[(&str, &str)]) -> Self {
        self.links.insert(
            title.to_string(),
            pairs
                .iter()
                .map(|(e, t)| (e.to_string(), t.to_string()))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl ArticleSource for CannedWiki {
    async fn exists(&self, edition: &str, title: &str) -> CheckerResult<bool> {
        Ok(self
            .pages
            .contains_key(&(edition.to_string(), title.to_string())))
    }

    async fn fetch(&self, edition: &str, title: &str) -> CheckerResult<String> {
        self.pages
            .get(&(edition.to_string(), title.to_string()))
            .cloned()
            .ok_or_else(|| CheckerError::PageMissing {
                edition: edition.to_string(),
                title: title.to_string(),
            })
    }

    async fn redirect_target(&self, _edition: &str, _title: &str) -> CheckerResult<Option<String>> {
        Ok(None)
    }
}

#[async_trait]
impl EntityLinks for CannedWiki {
    async fn linked_titles(
        &self,
        _source_edition: &str,
        title: &str,
    ) -> CheckerResult<HashMap<String, String>> {
        self.links
            .get(title)
            .cloned()
            .ok_or_else(|| CheckerError::EntityUnresolvable {
                title: title.to_string(),
            })
    }
}

fn canned_wiki() -> CannedWiki {
    CannedWiki::default()
        .page(
            "cs",
            "Voda",
            "{{Infobox - chemická sloučenina\n\
             | číslo CAS = 7732-18-5<ref name=\"gestis\"/>\n\
             | molární hmotnost = {{val|18.015|u=g/mol}}\n\
             | teplota varu = 100 °C\n\
             | hustota = 0,997 g/cm³ <!-- při 25 °C -->\n\
             }}\n\
             '''Voda''' je chemická sloučenina.",
        )
        .link("Voda", &[("en", "Water"), ("de", "Wasser")])
        .page(
            "en",
            "Water",
            "{{Chembox\n\
             | Section1 = {{Chembox Identifiers\n\
             | CASNo = 7732-18-5\n\
             }}\n\
             | Section2 = {{Chembox Properties\n\
             | MolarMass = 18.015 g/mol\n\
             | BoilingPt = 373.15 K\n\
             | Density = 997 kg/m3\n\
             }}\n\
             }}",
        )
        .page(
            "de",
            "Wasser",
            "{{Infobox Chemikalie\n\
             | CAS = 7732-18-5\n\
             | Molare Masse = 18,015 g/mol\n\
             | Siedepunkt = 100 °C\n\
             | Dichte = 0,997 g/cm³\n\
             }}",
        )
        .page(
            "cs",
            "Ethanol",
            "{{Infobox - chemická sloučenina\n\
             | číslo CAS = 64-17-5\n\
             | teplota varu = 78,37 °C\n\
             }}",
        )
        .link("Ethanol", &[("en", "Ethanol")])
        .page(
            "en",
            "Ethanol",
            "{{Chembox\n\
             | Section1 = {{Chembox Identifiers\n\
             | CASNo = 64-17-7\n\
             }}\n\
             | Section2 = {{Chembox Properties\n\
             | BoilingPt = 78.37 °C\n\
             }}\n\
             }}",
        )
        .page("cs", "Bez infoboxu", "Článek bez šablony.")
}

async fn run_titles(wiki: CannedWiki, titles: &[&str]) -> (Vec<ChannelEvent>, RunSummary) {
    let shared = Arc::new(wiki);
    let runner = CheckRunner::new(
        shared.clone(),
        shared,
        Arc::new(WikitextParser),
        RunConfig::default(),
    );
    let mut session = runner
        .start(titles.iter().map(|t| t.to_string()).collect())
        .unwrap();

    let mut events = Vec::new();
    loop {
        let event = session.events.recv().await.expect("worker emits Done");
        if let ChannelEvent::Done(summary) = event {
            return (events, summary);
        }
        events.push(event);
    }
}

fn result_texts(events: &[ChannelEvent]) -> Vec<(Classification, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            ChannelEvent::Result {
                classification,
                text,
            } => Some((*classification, text.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_run_classifies_each_article_once() -> Result<()> {
    let (events, summary) = run_titles(
        canned_wiki(),
        &["Voda", "Ethanol", "Bez infoboxu", "Neexistuje"],
    )
    .await;

    let results = result_texts(&events);
    assert_eq!(results.len(), 4);

    // Water matches everywhere despite refs, val templates, comma decimals,
    // Kelvin boiling point and kg/m3 density
    assert_eq!(results[0].0, Classification::Ok);
    assert!(results[0].1.contains("EN: Water"));
    assert!(results[0].1.contains("DE: Wasser"));

    // Ethanol has a wrong CAS on enwiki; only that pair is reported
    assert_eq!(results[1].0, Classification::Error);
    assert!(results[1].1.contains("EN CAS: CS('64-17-5') vs EN('64-17-7')"));
    assert!(!results[1].1.contains("Boiling point"));

    // No infobox and no page both classify as missing
    assert_eq!(results[2].0, Classification::Missing);
    assert_eq!(results[3].0, Classification::Missing);

    assert_eq!((summary.ok, summary.errors, summary.missing), (1, 1, 2));
    assert_eq!(summary.total, 4);
    assert!(!summary.cancelled);
    Ok(())
}

#[tokio::test]
async fn test_progress_precedes_each_result() -> Result<()> {
    let (events, _) = run_titles(canned_wiki(), &["Voda", "Ethanol"]).await;

    let mut saw_progress = false;
    let mut ordered = true;
    for event in &events {
        match event {
            ChannelEvent::Progress { .. } => saw_progress = true,
            ChannelEvent::Result { .. } => {
                ordered &= saw_progress;
                saw_progress = false;
            }
            _ => {}
        }
    }
    assert!(ordered);
    Ok(())
}

#[tokio::test]
async fn test_identical_runs_are_idempotent() -> Result<()> {
    let titles = ["Voda", "Ethanol", "Bez infoboxu", "Neexistuje"];
    let (first_events, first_summary) = run_titles(canned_wiki(), &titles).await;
    let (second_events, second_summary) = run_titles(canned_wiki(), &titles).await;

    assert_eq!(result_texts(&first_events), result_texts(&second_events));
    assert_eq!(first_summary, second_summary);
    Ok(())
}
