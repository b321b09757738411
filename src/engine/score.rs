use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Non-blocking per-QSO tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notice {
    /// First contact with this station on this band.
    NewBand,
    /// First contact with this station on this mode.
    NewMode,
    /// First contact with this station on this UTC day.
    NewDay,
    /// First contact with this station for this program reference.
    NewRef,
    /// Possible duplicate; the reference may not have been entered yet.
    MaybeDupe,
    /// Handler-specific message.
    Other(String),
}

/// Blocking per-QSO tag. A QSO carrying an alert does not count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alert {
    /// Already worked under this program's uniqueness rules.
    Duplicate,
    /// Band not allowed by this program.
    InvalidBand,
    /// Handler-specific message.
    Other(String),
}

/// What one handler says about one QSO.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contribution {
    /// Points or count toward the program. Zero means the QSO does not count.
    pub value: i64,
    /// Non-blocking tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    /// Blocking tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    /// Keys this QSO counted toward (references, entities, bands).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl Contribution {
    /// Counts nothing.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Counts `value` with no tags.
    pub fn counted(value: i64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Blocking alert, value zero.
    pub fn alerted(alert: Alert) -> Self {
        Self {
            alerts: vec![alert],
            ..Self::default()
        }
    }

    /// Adds a notice.
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }

    /// Sets the counted keys.
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }

    /// True when this contribution carries the duplicate alert.
    pub fn is_duplicate(&self) -> bool {
        self.alerts.contains(&Alert::Duplicate)
    }
}

/// Presentation fields attached once a section closes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presentation {
    /// Short label, e.g. `"POTA US-0001"`.
    pub label: String,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// One-line summary.
    pub summary: String,
    /// Whole-operation roll-up, filled on the last section only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_summary: Option<String>,
}

/// Handler-defined running aggregate.
///
/// Scores are values: every accumulate call returns a new `Score`, and
/// cloning copies every nested tally.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Headline number.
    pub value: i64,
    /// Number of QSOs that counted.
    pub qsos: u64,
    /// Per-key counts (references, entities, bands, modes).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tallies: BTreeMap<String, u64>,
    /// Activation threshold reached, for activation programs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated: Option<bool>,
    /// Present only after summarization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<Presentation>,
}

impl Score {
    /// Copy without presentation fields.
    pub fn undecorated(&self) -> Self {
        Self {
            presentation: None,
            ..self.clone()
        }
    }

    /// Adds one to the tally at `key`, returning the new count.
    pub fn bump(&mut self, key: &str) -> u64 {
        let slot = self.tallies.entry(key.to_string()).or_insert(0);
        *slot += 1;
        *slot
    }

    /// Current tally at `key`.
    pub fn tally(&self, key: &str) -> u64 {
        self.tallies.get(key).copied().unwrap_or(0)
    }

    /// True when the tally at `key` is non-zero.
    pub fn has_tally(&self, key: &str) -> bool {
        self.tally(key) > 0
    }

    /// Number of distinct tally keys starting with `prefix`.
    pub fn distinct_with_prefix(&self, prefix: &str) -> usize {
        self.tallies.keys().filter(|k| k.starts_with(prefix)).count()
    }
}
