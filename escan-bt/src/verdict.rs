//! Verdict computation for scanned items
//!
//! Clients report each scanner field either as a `{value, valid}` object or
//! as a bare string, and may omit fields entirely. That shape tolerance is
//! resolved exactly once, at this boundary, into [`ScannerReading`]; the
//! verdict walk below only ever sees the resolved form.
//!
//! The verdict itself considers only the scanner slots configured for the
//! owning batch, in ascending slot order: a missing reading marks the item
//! as a fallback measurement, the first explicitly invalid reading fails the
//! item outright. Slots outside the configuration are carried through to
//! storage untouched and never influence the outcome.

use escan_common::db::models::ItemVerdict;
use serde::Deserialize;

/// The three hardware scanner slots.
pub const SCANNER_SLOTS: [u8; 3] = [1, 2, 3];

/// Validity reported for a reading: explicitly good, explicitly bad, or
/// unreported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    Unknown,
}

/// One scanner slot's reading after boundary resolution.
///
/// A validity flag without a reading carries no information, so a null or
/// empty value resolves to `Absent` regardless of any `valid` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerReading {
    Present { value: String, validity: Validity },
    Absent,
}

impl ScannerReading {
    /// Reading text, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            ScannerReading::Present { value, .. } => Some(value.as_str()),
            ScannerReading::Absent => None,
        }
    }

    /// Tri-state validity flag as stored: true/false when explicitly
    /// reported, None otherwise.
    pub fn validity_flag(&self) -> Option<bool> {
        match self {
            ScannerReading::Present {
                validity: Validity::Valid,
                ..
            } => Some(true),
            ScannerReading::Present {
                validity: Validity::Invalid,
                ..
            } => Some(false),
            _ => None,
        }
    }
}

/// Raw scanner field as sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawReading {
    Structured {
        value: Option<String>,
        #[serde(default)]
        valid: Option<bool>,
    },
    Bare(Option<String>),
}

impl Default for RawReading {
    fn default() -> Self {
        RawReading::Bare(None)
    }
}

impl RawReading {
    /// Resolve the client shape into a [`ScannerReading`].
    pub fn resolve(&self) -> ScannerReading {
        let (value, valid) = match self {
            RawReading::Structured { value, valid } => (value.clone(), *valid),
            RawReading::Bare(value) => (value.clone(), None),
        };

        match value.filter(|v| !v.is_empty()) {
            Some(value) => ScannerReading::Present {
                value,
                validity: match valid {
                    Some(true) => Validity::Valid,
                    Some(false) => Validity::Invalid,
                    None => Validity::Unknown,
                },
            },
            None => ScannerReading::Absent,
        }
    }
}

/// One raw item as submitted to the finish operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub scanner_1: RawReading,
    #[serde(default)]
    pub scanner_2: RawReading,
    #[serde(default)]
    pub scanner_3: RawReading,
}

impl RawItem {
    /// Resolve all three slots, indexed by slot number minus one.
    pub fn resolve_readings(&self) -> [ScannerReading; 3] {
        [
            self.scanner_1.resolve(),
            self.scanner_2.resolve(),
            self.scanner_3.resolve(),
        ]
    }
}

/// An item with its computed verdict, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub item_id: i64,
    pub readings: [ScannerReading; 3],
    pub result: ItemVerdict,
    pub fallback: bool,
}

impl NormalizedItem {
    /// Reading for one scanner slot (1-3).
    pub fn reading(&self, slot: u8) -> &ScannerReading {
        &self.readings[(slot - 1) as usize]
    }
}

/// Compute the verdict for one item against the batch's scanner
/// configuration.
///
/// Walks the configured slots in ascending order: an absent reading sets
/// `fallback` (and evaluation continues), the first invalid reading fails
/// the item and stops the walk. If no configured reading is invalid the
/// item passes, fallback or not. An empty configuration passes vacuously;
/// the lifecycle layer rejects such configurations before any item reaches
/// this point.
pub fn normalize(item_id: i64, readings: [ScannerReading; 3], scanners_configured: &[u8]) -> NormalizedItem {
    let mut result = ItemVerdict::Pass;
    let mut fallback = false;

    for slot in SCANNER_SLOTS {
        if !scanners_configured.contains(&slot) {
            continue;
        }
        match &readings[(slot - 1) as usize] {
            ScannerReading::Absent => fallback = true,
            ScannerReading::Present {
                validity: Validity::Invalid,
                ..
            } => {
                result = ItemVerdict::Fail;
                break;
            }
            ScannerReading::Present { .. } => {}
        }
    }

    NormalizedItem {
        item_id,
        readings,
        result,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(value: &str, validity: Validity) -> ScannerReading {
        ScannerReading::Present {
            value: value.to_string(),
            validity,
        }
    }

    #[test]
    fn all_present_and_not_invalid_passes_without_fallback() {
        let readings = [
            present("A", Validity::Valid),
            present("B", Validity::Unknown),
            ScannerReading::Absent,
        ];
        let item = normalize(1, readings, &[1, 2]);
        assert_eq!(item.result, ItemVerdict::Pass);
        assert!(!item.fallback);
    }

    #[test]
    fn absent_configured_reading_sets_fallback_but_still_passes() {
        let readings = [
            ScannerReading::Absent,
            present("C", Validity::Valid),
            ScannerReading::Absent,
        ];
        let item = normalize(2, readings, &[1, 2]);
        assert_eq!(item.result, ItemVerdict::Pass);
        assert!(item.fallback);
    }

    #[test]
    fn any_invalid_configured_reading_fails() {
        let readings = [
            present("X", Validity::Invalid),
            present("Y", Validity::Valid),
            ScannerReading::Absent,
        ];
        let item = normalize(3, readings, &[1, 2]);
        assert_eq!(item.result, ItemVerdict::Fail);
    }

    #[test]
    fn invalid_reading_fails_regardless_of_position() {
        let readings = [
            present("A", Validity::Valid),
            present("B", Validity::Valid),
            present("C", Validity::Invalid),
        ];
        let item = normalize(4, readings, &[1, 2, 3]);
        assert_eq!(item.result, ItemVerdict::Fail);
    }

    #[test]
    fn invalid_short_circuits_before_later_absent_slots() {
        // Scanner 1 invalid stops the walk; scanner 2's absence is never
        // observed, so fallback stays clear.
        let readings = [
            present("A", Validity::Invalid),
            ScannerReading::Absent,
            ScannerReading::Absent,
        ];
        let item = normalize(5, readings, &[1, 2]);
        assert_eq!(item.result, ItemVerdict::Fail);
        assert!(!item.fallback);
    }

    #[test]
    fn unconfigured_slots_never_affect_the_outcome() {
        let base = [
            present("A", Validity::Valid),
            present("B", Validity::Valid),
            ScannerReading::Absent,
        ];
        let with_bad_slot3 = [
            present("A", Validity::Valid),
            present("B", Validity::Valid),
            present("Z", Validity::Invalid),
        ];

        let a = normalize(6, base, &[1, 2]);
        let b = normalize(6, with_bad_slot3, &[1, 2]);
        assert_eq!(a.result, b.result);
        assert_eq!(a.fallback, b.fallback);
    }

    #[test]
    fn empty_configuration_is_a_vacuous_pass() {
        let readings = [
            present("A", Validity::Invalid),
            ScannerReading::Absent,
            ScannerReading::Absent,
        ];
        let item = normalize(7, readings, &[]);
        assert_eq!(item.result, ItemVerdict::Pass);
        assert!(!item.fallback);
    }

    #[test]
    fn structured_reading_resolves_value_and_validity() {
        let raw: RawReading = serde_json::from_str(r#"{"value": "A", "valid": true}"#).unwrap();
        assert_eq!(raw.resolve(), present("A", Validity::Valid));

        let raw: RawReading = serde_json::from_str(r#"{"value": "B", "valid": false}"#).unwrap();
        assert_eq!(raw.resolve(), present("B", Validity::Invalid));

        let raw: RawReading = serde_json::from_str(r#"{"value": "C"}"#).unwrap();
        assert_eq!(raw.resolve(), present("C", Validity::Unknown));
    }

    #[test]
    fn bare_string_resolves_with_unknown_validity() {
        let raw: RawReading = serde_json::from_str(r#""E123""#).unwrap();
        assert_eq!(raw.resolve(), present("E123", Validity::Unknown));
    }

    #[test]
    fn null_and_empty_values_resolve_to_absent() {
        let raw: RawReading = serde_json::from_str("null").unwrap();
        assert_eq!(raw.resolve(), ScannerReading::Absent);

        let raw: RawReading = serde_json::from_str(r#"{"value": null, "valid": null}"#).unwrap();
        assert_eq!(raw.resolve(), ScannerReading::Absent);

        let raw: RawReading = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(raw.resolve(), ScannerReading::Absent);
    }

    #[test]
    fn validity_without_a_reading_resolves_to_absent() {
        let raw: RawReading = serde_json::from_str(r#"{"value": null, "valid": false}"#).unwrap();
        assert_eq!(raw.resolve(), ScannerReading::Absent);
    }

    #[test]
    fn raw_item_defaults_missing_scanner_fields() {
        let raw: RawItem = serde_json::from_str(r#"{"item_id": 9, "scanner_2": "B"}"#).unwrap();
        let readings = raw.resolve_readings();
        assert_eq!(readings[0], ScannerReading::Absent);
        assert_eq!(readings[1], present("B", Validity::Unknown));
        assert_eq!(readings[2], ScannerReading::Absent);
    }
}
