use serde::{Deserialize, Serialize};

use crate::normalize::ValueKind;

/// Stable identifier for a comparable infobox attribute. Keying the per-run
/// configuration on this enum keeps lookups typo-proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Cas,
    Einecs,
    #[serde(rename = "pubchem")]
    PubChem,
    MolarMass,
    Solubility,
    MeltingPoint,
    BoilingPoint,
    Density,
}

/// Where to find one comparable attribute in each edition's infobox, and how
/// its values are expected to read.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    /// Parameter name in the source edition's infobox.
    pub source_key: &'static str,
    /// Candidate parameter names per target edition, in lookup order.
    pub target_keys: &'static [(&'static str, &'static [&'static str])],
    pub kind: ValueKind,
    /// Whether unit heuristics make sense for this field by default.
    pub smart_units_default: bool,
}

impl FieldSpec {
    /// Candidate parameter keys for a target edition, first match wins.
    pub fn candidate_keys(&self, edition: &str) -> &'static [&'static str] {
        self.target_keys
            .iter()
            .find(|(ed, _)| *ed == edition)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// The comparable attributes of a chemical infobox, with their parameter
/// names on cswiki (source) and enwiki/dewiki (targets).
pub const FIELD_REGISTRY: &[FieldSpec] = &[
    FieldSpec {
        key: FieldKey::Cas,
        label: "CAS",
        source_key: "číslo CAS",
        target_keys: &[
            ("en", &["CASNo", "CAS-No", "CASNo1", "CASNoOther", "CASNo2"]),
            ("de", &["CAS"]),
        ],
        kind: ValueKind::Identifier,
        smart_units_default: false,
    },
    FieldSpec {
        key: FieldKey::Einecs,
        label: "EINECS",
        source_key: "číslo EINECS",
        target_keys: &[
            ("en", &["EINECS", "EC_number", "EC-no"]),
            ("de", &["EG-Nummer"]),
        ],
        kind: ValueKind::Identifier,
        smart_units_default: false,
    },
    FieldSpec {
        key: FieldKey::PubChem,
        label: "PubChem",
        source_key: "PubChem",
        target_keys: &[("en", &["PubChem"]), ("de", &["PubChem"])],
        kind: ValueKind::Identifier,
        smart_units_default: false,
    },
    FieldSpec {
        key: FieldKey::MolarMass,
        label: "Molar mass",
        source_key: "molární hmotnost",
        target_keys: &[("en", &["MolarMass"]), ("de", &["Molare Masse"])],
        kind: ValueKind::FreeText,
        smart_units_default: false,
    },
    FieldSpec {
        key: FieldKey::Solubility,
        label: "Solubility",
        source_key: "rozpustnost",
        // Often recorded as g/l on one wiki and g/100ml on another
        target_keys: &[("en", &["Solubility"]), ("de", &["Löslichkeit"])],
        kind: ValueKind::FreeText,
        smart_units_default: true,
    },
    FieldSpec {
        key: FieldKey::MeltingPoint,
        label: "Melting point",
        source_key: "teplota tání",
        target_keys: &[("en", &["MeltingPt", "MeltingPtC"]), ("de", &["Schmelzpunkt"])],
        kind: ValueKind::FreeText,
        smart_units_default: true,
    },
    FieldSpec {
        key: FieldKey::BoilingPoint,
        label: "Boiling point",
        source_key: "teplota varu",
        target_keys: &[("en", &["BoilingPt", "BoilingPtC"]), ("de", &["Siedepunkt"])],
        kind: ValueKind::FreeText,
        smart_units_default: true,
    },
    FieldSpec {
        key: FieldKey::Density,
        label: "Density",
        source_key: "hustota",
        // Often recorded as g/cm3 on one wiki and kg/m3 on another
        target_keys: &[("en", &["Density"]), ("de", &["Dichte"])],
        kind: ValueKind::FreeText,
        smart_units_default: true,
    },
];

/// Look up the registry entry for a field key.
pub fn field_spec(key: FieldKey) -> &'static FieldSpec {
    FIELD_REGISTRY
        .iter()
        .find(|spec| spec.key == key)
        .expect("every FieldKey has a registry entry")
}
