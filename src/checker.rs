use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::channel::{channel, Classification, EventReceiver, EventSender, RunSummary};
use crate::config::RunConfig;
use crate::error::{CheckerError, Result};
use crate::fields::FIELD_REGISTRY;
use crate::infobox::{extract_infobox, Infobox};
use crate::matcher::compare_values;
use crate::normalize::normalize_value;
use crate::sources::{ArticleSource, EntityLinks};
use crate::wikitext::TemplateParser;

/// One failing (or, with report_missing_target, absent) field comparison
/// against one target edition.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub field: &'static str,
    pub edition: String,
    pub matched: bool,
    pub source_repr: String,
    pub target_repr: String,
}

impl ComparisonOutcome {
    fn render(&self, source_edition: &str) -> String {
        format!(
            "{} {}: {}('{}') vs {}('{}')",
            self.edition.to_uppercase(),
            self.field,
            source_edition.to_uppercase(),
            self.source_repr,
            self.edition.to_uppercase(),
            self.target_repr
        )
    }
}

/// Final verdict for one article: exactly one classification, plus the
/// failing comparisons when the verdict is Error.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleReport {
    pub classification: Classification,
    pub header: String,
    pub mismatches: Vec<ComparisonOutcome>,
}

impl ArticleReport {
    fn missing(header: impl Into<String>) -> Self {
        Self {
            classification: Classification::Missing,
            header: header.into(),
            mismatches: Vec::new(),
        }
    }

    pub fn render(&self, source_edition: &str) -> String {
        match self.classification {
            Classification::Ok => format!("{} -> OK", self.header),
            Classification::Missing => self.header.clone(),
            Classification::Error => {
                let mut lines = vec![self.header.clone()];
                lines.extend(self.mismatches.iter().map(|m| m.render(source_edition)));
                lines.join("\n")
            }
        }
    }
}

/// One target edition after resolution: the linked title (when the entity
/// had a sitelink) and the infobox (when the page had one).
struct ResolvedTarget {
    edition: String,
    title: Option<String>,
    infobox: Option<Infobox>,
}

/// A started run: the event stream, the cancellation flag, and the worker
/// handle. Dropped after the Done event has been consumed.
pub struct CheckSession {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub events: EventReceiver,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl CheckSession {
    /// Ask the worker to stop at the next article boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared flag for wiring external cancellation (e.g. a signal handler).
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Drives the per-article reconciliation workflow on a dedicated worker task
/// and reports through the event channel. Cloning shares the collaborators
/// and the running flag; the worker runs on its own clone, so the
/// configuration it sees cannot change mid-run.
#[derive(Clone)]
pub struct CheckRunner {
    source: Arc<dyn ArticleSource>,
    links: Arc<dyn EntityLinks>,
    parser: Arc<dyn TemplateParser>,
    config: RunConfig,
    running: Arc<AtomicBool>,
}

impl CheckRunner {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        links: Arc<dyn EntityLinks>,
        parser: Arc<dyn TemplateParser>,
        config: RunConfig,
    ) -> Self {
        Self {
            source,
            links,
            parser,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Spawns the background worker for one run. Refuses to start while a
    /// prior worker is still active.
    pub fn start(&self, titles: Vec<String>) -> Result<CheckSession> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CheckerError::Config(
                "a check run is already active".to_string(),
            ));
        }

        let (events, receiver) = channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let runner = self.clone();
        let worker_cancel = Arc::clone(&cancel);
        let handle = tokio::spawn(async move {
            runner.run(titles, events, worker_cancel).await;
            runner.running.store(false, Ordering::SeqCst);
        });

        Ok(CheckSession {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            events: receiver,
            cancel,
            handle,
        })
    }

    async fn run(&self, titles: Vec<String>, events: EventSender, cancel: Arc<AtomicBool>) {
        let total = titles.len();
        let mut summary = RunSummary::new(total);
        events.log(format!(
            "Checking {} articles against {} target edition(s)",
            total,
            self.config.targets.len()
        ));

        for (index, title) in titles.iter().enumerate() {
            // Cancellation is observed between articles only, never
            // mid-comparison
            if cancel.load(Ordering::SeqCst) {
                events.log("Stop requested, no further articles will be checked");
                summary.cancelled = true;
                break;
            }

            events.progress(index as f64 / total as f64, format!("Checking: {}", title));

            match self.check_article(title, &events).await {
                Ok(report) => {
                    summary.record(report.classification);
                    events.result(
                        report.classification,
                        report.render(&self.config.source.edition),
                    );
                }
                Err(e) if e.is_systemic() => {
                    error!("aborting run: {}", e);
                    events.log(format!("Aborting run: {}", e));
                    summary.aborted = true;
                    break;
                }
                Err(e) => {
                    // The article still gets exactly one classification
                    warn!(article = %title, "check failed: {}", e);
                    events.log(format!("{}: {}", title, e));
                    summary.record(Classification::Missing);
                    events.result(Classification::Missing, format!("{}: {}", title, e));
                }
            }
        }

        events.progress(1.0, "Done");
        events.done(summary);
    }

    #[instrument(skip(self, events))]
    async fn check_article(&self, title: &str, events: &EventSender) -> Result<ArticleReport> {
        let source_edition = &self.config.source.edition;

        // 1. The source page has to exist
        if !self.source.exists(source_edition, title).await? {
            return Ok(ArticleReport::missing(format!(
                "{}: does not exist on {}wiki",
                title, source_edition
            )));
        }

        // 2. Follow a redirect once, never chase further
        let resolved_title = match self.source.redirect_target(source_edition, title).await? {
            Some(target) => {
                debug!(from = %title, to = %target, "following redirect");
                target
            }
            None => title.to_string(),
        };

        // 3. Source infobox
        let markup = self.source.fetch(source_edition, &resolved_title).await?;
        let source_box = match extract_infobox(
            self.parser.as_ref(),
            &markup,
            &self.config.source.templates,
        ) {
            Some(infobox) => infobox,
            None => {
                return Ok(ArticleReport::missing(format!(
                    "{}: no infobox found",
                    title
                )))
            }
        };

        // 4. Cross-edition identity; failure here only means no linked titles
        let linked = match self.links.linked_titles(source_edition, &resolved_title).await {
            Ok(titles) => titles,
            Err(e) if e.is_systemic() => return Err(e),
            Err(e) => {
                events.log(format!("{}: {}", title, e));
                HashMap::new()
            }
        };

        // Each target edition resolves independently; a failure degrades
        // that edition to "no infobox"
        let mut targets = Vec::new();
        for target in &self.config.targets {
            let linked_title = linked.get(&target.edition).cloned();
            let infobox = match &linked_title {
                Some(target_title) => {
                    match self
                        .fetch_target_infobox(&target.edition, target_title, &target.templates)
                        .await
                    {
                        Ok(infobox) => infobox,
                        Err(e) if e.is_systemic() => return Err(e),
                        Err(e) => {
                            events.log(format!("{}: {}", title, e));
                            None
                        }
                    }
                }
                None => None,
            };
            targets.push(ResolvedTarget {
                edition: target.edition.clone(),
                title: linked_title,
                infobox,
            });
        }

        // 5. Give up when no target edition yielded an infobox
        if targets.iter().all(|t| t.infobox.is_none()) {
            let editions = targets
                .iter()
                .map(|t| t.edition.to_uppercase())
                .collect::<Vec<_>>()
                .join("/");
            return Ok(ArticleReport::missing(format!(
                "{}: no {} infobox found",
                title, editions
            )));
        }

        let header = render_header(title, &targets);

        // 6. Compare every enabled field with a non-empty source value
        let mut mismatches = Vec::new();
        for spec in FIELD_REGISTRY {
            let field_config = self.config.field(spec.key);
            if !field_config.enabled {
                continue;
            }
            let source_value = match source_box.get(spec.source_key) {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };

            for target in &targets {
                let infobox = match &target.infobox {
                    Some(infobox) => infobox,
                    None => continue,
                };
                match infobox
                    .lookup(spec.candidate_keys(&target.edition))
                    .filter(|value| !value.is_empty())
                {
                    Some(target_value) => {
                        let outcome =
                            compare_values(source_value, target_value, field_config, spec.kind);
                        if !outcome.matched {
                            mismatches.push(ComparisonOutcome {
                                field: spec.label,
                                edition: target.edition.clone(),
                                matched: false,
                                source_repr: outcome.source_repr,
                                target_repr: outcome.target_repr,
                            });
                        }
                    }
                    None if field_config.report_missing_target => {
                        mismatches.push(ComparisonOutcome {
                            field: spec.label,
                            edition: target.edition.clone(),
                            matched: false,
                            source_repr: normalize_value(source_value, spec.kind),
                            target_repr: "(missing)".to_string(),
                        });
                    }
                    None => {}
                }
            }
        }

        // 7.-8. Exactly one classification per article
        let classification = if mismatches.is_empty() {
            Classification::Ok
        } else {
            Classification::Error
        };
        Ok(ArticleReport {
            classification,
            header,
            mismatches,
        })
    }

    async fn fetch_target_infobox(
        &self,
        edition: &str,
        title: &str,
        templates: &[String],
    ) -> Result<Option<Infobox>> {
        let markup = self.source.fetch(edition, title).await?;
        Ok(extract_infobox(self.parser.as_ref(), &markup, templates))
    }
}

fn render_header(title: &str, targets: &[ResolvedTarget]) -> String {
    let resolved = targets
        .iter()
        .map(|t| {
            format!(
                "{}: {}",
                t.edition.to_uppercase(),
                t.title.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("Article: [[{}]] ({})", title, resolved)
}
