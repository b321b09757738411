use serde::{Deserialize, Serialize};

use crate::{config::Settings, qso::Reference};

/// The operating session a log belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Operator's own callsign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_call: Option<String>,
    /// Maidenhead grid of the operating location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    /// References describing what this operation activates.
    #[serde(default)]
    pub refs: Vec<Reference>,
}

impl Operation {
    /// Builds an operation from references only.
    pub fn with_refs(refs: Vec<Reference>) -> Self {
        Self {
            refs,
            ..Self::default()
        }
    }
}

/// Sparse patch where each `Some` field overwrites the operation value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationPatch {
    /// Optional replacement for station callsign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_call: Option<String>,
    /// Optional replacement for grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<String>,
    /// Optional replacement for the whole reference list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<Reference>>,
    /// Optional replacement for the run-wide settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl OperationPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns `base` with this patch applied.
    pub fn applied_to(&self, base: &Operation) -> Operation {
        let mut out = base.clone();
        if let Some(v) = &self.station_call {
            out.station_call = Some(v.clone());
        }
        if let Some(v) = &self.grid {
            out.grid = Some(v.clone());
        }
        if let Some(v) = &self.refs {
            out.refs = v.clone();
        }
        out
    }
}

/// Operation context in force after `event`, relative to `base`.
///
/// A `break` or `start` without a patch returns to the base operation.
pub fn context_after_event(base: &Operation, patch: Option<&OperationPatch>) -> Operation {
    match patch {
        Some(p) => p.applied_to(base),
        None => base.clone(),
    }
}

/// Settings in force after `event`, relative to `base`.
pub fn settings_after_event(base: &Settings, patch: Option<&OperationPatch>) -> Settings {
    patch
        .and_then(|p| p.settings.clone())
        .unwrap_or_else(|| base.clone())
}
