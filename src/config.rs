use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{CheckerError, Result};
use crate::fields::{FieldKey, FIELD_REGISTRY};
use crate::matcher::CompareMode;
use crate::normalize::ValueKind;

/// How one field is compared during a run. Immutable once the run starts;
/// the worker owns its own copy of the whole RunConfig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub enabled: bool,
    pub mode: CompareMode,
    pub tolerance: f64,
    pub smart_units: bool,
    /// Report a source value whose target counterpart is absent as a
    /// discrepancy instead of silently skipping the pair.
    pub report_missing_target: bool,
}

/// One wiki edition and the template-name fragments that mark its chemical
/// infobox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditionConfig {
    /// Language code, e.g. "en".
    pub edition: String,
    pub templates: Vec<String>,
}

/// Full configuration of one check run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: EditionConfig,
    /// Up to two target editions compared against the source.
    pub targets: Vec<EditionConfig>,
    /// Polling period of the event consumer, in milliseconds.
    pub poll_ms: u64,
    pub fields: HashMap<FieldKey, FieldConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let fields = FIELD_REGISTRY
            .iter()
            .map(|spec| {
                let (mode, tolerance) = match spec.kind {
                    ValueKind::Identifier => (CompareMode::Standard, 0.0),
                    // Physical quantities get a little slack out of the box
                    ValueKind::FreeText => (CompareMode::FirstNumeric, 0.5),
                };
                let config = FieldConfig {
                    enabled: true,
                    mode,
                    tolerance,
                    smart_units: spec.smart_units_default,
                    report_missing_target: false,
                };
                (spec.key, config)
            })
            .collect();

        Self {
            source: EditionConfig {
                edition: "cs".to_string(),
                templates: vec!["Infobox - chemická sloučenina".to_string()],
            },
            targets: vec![
                EditionConfig {
                    edition: "en".to_string(),
                    templates: [
                        "Chembox",
                        "Infobox chemical",
                        "Chembox Identifiers",
                        "Chembox Properties",
                        "Chembox Hazards",
                        "Chembox Thermochemistry",
                    ]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                },
                EditionConfig {
                    edition: "de".to_string(),
                    templates: vec!["Infobox Chemikalie".to_string()],
                },
            ],
            poll_ms: 100,
            fields,
        }
    }
}

/// On-disk layout: every section optional, unset values fall back to the
/// defaults above.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    source: Option<EditionConfig>,
    targets: Option<Vec<EditionConfig>>,
    poll_ms: Option<u64>,
    #[serde(default)]
    fields: HashMap<FieldKey, FieldOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldOverride {
    enabled: Option<bool>,
    mode: Option<CompareMode>,
    tolerance: Option<f64>,
    smart_units: Option<bool>,
    report_missing_target: Option<bool>,
}

impl RunConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CheckerError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;
        let file: ConfigFile = toml::from_str(&content)?;

        let mut config = RunConfig::default();
        if let Some(source) = file.source {
            config.source = source;
        }
        if let Some(targets) = file.targets {
            config.targets = targets;
        }
        if let Some(poll_ms) = file.poll_ms {
            config.poll_ms = poll_ms;
        }
        for (key, over) in file.fields {
            let field = config
                .fields
                .get_mut(&key)
                .expect("defaults cover every field key");
            if let Some(enabled) = over.enabled {
                field.enabled = enabled;
            }
            if let Some(mode) = over.mode {
                field.mode = mode;
            }
            if let Some(tolerance) = over.tolerance {
                field.tolerance = tolerance;
            }
            if let Some(smart_units) = over.smart_units {
                field.smart_units = smart_units;
            }
            if let Some(report) = over.report_missing_target {
                field.report_missing_target = report;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() || self.targets.len() > 2 {
            return Err(CheckerError::Config(
                "between one and two target editions must be configured".to_string(),
            ));
        }
        if self.source.templates.is_empty() {
            return Err(CheckerError::Config(
                "the source edition needs at least one template candidate".to_string(),
            ));
        }
        for target in &self.targets {
            if target.templates.is_empty() {
                return Err(CheckerError::Config(format!(
                    "target edition '{}' needs at least one template candidate",
                    target.edition
                )));
            }
        }
        for (key, field) in &self.fields {
            // Rejects negative values and NaN in one go
            if !(field.tolerance >= 0.0) {
                return Err(CheckerError::Config(format!(
                    "tolerance for field {:?} must be >= 0",
                    key
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, key: FieldKey) -> &FieldConfig {
        self.fields.get(&key).expect("defaults cover every field key")
    }
}

/// Splits a newline-delimited title list, dropping blank lines and
/// surrounding whitespace.
pub fn parse_title_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
