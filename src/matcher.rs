use serde::{Deserialize, Serialize};

use crate::config::FieldConfig;
use crate::normalize::{extract_numbers, normalize_value, ValueKind};

/// How two field values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Exact equality of the normalized strings.
    Standard,
    /// Compare only the first number extracted from each side.
    FirstNumeric,
    /// Compare every extracted number pairwise, in order.
    AllNumeric,
}

/// Outcome of one value comparison, with the normalized representations of
/// both sides for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub source_repr: String,
    pub target_repr: String,
}

/// Bounded heuristic equivalence test for two numbers that differ by a
/// plausible unit or scale mismatch. Checks, in order and short-circuiting:
/// direct tolerance, decimal-magnitude factors, the Kelvin/Celsius offset,
/// and both directions of the Celsius/Fahrenheit conversion. Explicitly a
/// guess with known bounds, not a unit-conversion system.
pub fn units_match(n1: f64, n2: f64, tolerance: f64) -> bool {
    // Usually already checked by the caller, kept here for standalone reuse
    if (n1 - n2).abs() <= tolerance {
        return true;
    }

    // Decimal magnitudes: g/cm3 vs kg/m3, g/l vs g/100ml and the like
    const FACTORS: [f64; 6] = [10.0, 100.0, 1000.0, 0.1, 0.01, 0.001];
    if n2 != 0.0 {
        for factor in FACTORS {
            if (n1 - n2 * factor).abs() <= tolerance {
                return true;
            }
        }
    }

    // Kelvin vs Celsius, one unit of slack for rounding
    let diff = (n1 - n2).abs();
    if (diff - 273.15).abs() <= 1.0 {
        return true;
    }

    // Celsius vs Fahrenheit, tried in both directions
    let slack = tolerance.max(1.0);
    if (n1 * 1.8 + 32.0 - n2).abs() <= slack {
        return true;
    }
    if ((n1 - 32.0) / 1.8 - n2).abs() <= slack {
        return true;
    }

    false
}

fn join_numbers(numbers: &[f64]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compares a raw source value against a raw target value under the field's
/// configured mode, tolerance, and smart-units setting.
pub fn compare_values(
    raw_source: &str,
    raw_target: &str,
    config: &FieldConfig,
    kind: ValueKind,
) -> MatchOutcome {
    if config.mode == CompareMode::Standard {
        let source = normalize_value(raw_source, kind);
        let target = normalize_value(raw_target, kind);
        return MatchOutcome {
            matched: source == target,
            source_repr: source,
            target_repr: target,
        };
    }

    let source_nums = extract_numbers(raw_source);
    let target_nums = extract_numbers(raw_target);

    // A side without numbers degrades to string comparison of the lists
    if source_nums.is_empty() || target_nums.is_empty() {
        let source = join_numbers(&source_nums);
        let target = join_numbers(&target_nums);
        return MatchOutcome {
            matched: source == target,
            source_repr: source,
            target_repr: target,
        };
    }

    let pair_matches = |a: f64, b: f64| {
        (a - b).abs() <= config.tolerance
            || (config.smart_units && units_match(a, b, config.tolerance))
    };

    match config.mode {
        CompareMode::FirstNumeric => {
            let (n1, n2) = (source_nums[0], target_nums[0]);
            MatchOutcome {
                matched: pair_matches(n1, n2),
                source_repr: n1.to_string(),
                target_repr: n2.to_string(),
            }
        }
        CompareMode::AllNumeric => {
            // A length mismatch is never a match, whatever the tolerance
            let matched = source_nums.len() == target_nums.len()
                && source_nums
                    .iter()
                    .zip(&target_nums)
                    .all(|(a, b)| pair_matches(*a, *b));
            MatchOutcome {
                matched,
                source_repr: format!("{:?}", source_nums),
                target_repr: format!("{:?}", target_nums),
            }
        }
        CompareMode::Standard => unreachable!("handled above"),
    }
}
