//! QSO domain record, reference tags, log events, and spot markers.

use serde::{Deserialize, Serialize};

use crate::{
    operation::OperationPatch,
    types::{Band, Mode, QsoId, TimestampMs},
};

/// Tagged key identifying participation in one award-program instance.
///
/// `ref_type` selects the program (`"pota"`, `"potaActivation"`, ...) and
/// `reference` names the instance (`"US-0001"`). Programs may attach extra
/// decoration (names, grids) which is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Program type tag.
    #[serde(rename = "type")]
    pub ref_type: String,
    /// Program instance key. Empty for bare type markers.
    #[serde(rename = "ref", default)]
    pub reference: String,
    /// Optional human-readable name, usually filled from a lookup source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Program-specific decoration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Reference {
    /// Builds a reference with no decoration.
    pub fn new(ref_type: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            reference: reference.into(),
            ..Self::default()
        }
    }

    /// Builds a type-only reference, used to bind synthetic handlers.
    pub fn of_type(ref_type: impl Into<String>) -> Self {
        Self::new(ref_type, "")
    }

    /// True when the reference carries no type and cannot select a handler.
    pub fn is_blank(&self) -> bool {
        self.ref_type.is_empty()
    }

    /// Compares identity (`type` and `ref`), ignoring decoration.
    pub fn same_as(&self, other: &Reference) -> bool {
        self.ref_type == other.ref_type && self.reference == other.reference
    }
}

/// The other station in a contact, with best-effort decoration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Station {
    /// Normalized callsign.
    pub call: String,
    /// Entity (country) prefix, when already known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_prefix: Option<String>,
    /// First-level subdivision (state, province), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Kind of non-contact marker stored in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Operator paused; context may change.
    Break,
    /// Operator (re)started, possibly somewhere else.
    Start,
    /// Free-form annotation. Does not affect handler resolution.
    Note,
}

impl EventKind {
    /// True for kinds that re-resolve scoring handlers.
    pub fn changes_context(&self) -> bool {
        matches!(self, Self::Break | Self::Start)
    }
}

/// Sectioning marker carrying an optional operation override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Marker kind.
    pub kind: EventKind,
    /// Operation override active from this marker on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationPatch>,
}

/// Live-spot payload marking a pseudo-QSO.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpotInfo {
    /// Spot network or cluster name.
    pub source: String,
    /// Spotter comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// One log entry: a contact, an event marker, or a spot pseudo-QSO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qso {
    /// Stable QSO identifier.
    pub id: QsoId,
    /// Start time. Absent while the QSO is still being entered.
    #[serde(default)]
    pub start_at_ms: Option<TimestampMs>,
    /// Band bucket.
    pub band: Band,
    /// Mode bucket.
    pub mode: Mode,
    /// Other station.
    pub their: Station,
    /// Program references attached to this contact.
    #[serde(default)]
    pub refs: Vec<Reference>,
    /// Soft-delete flag.
    #[serde(default)]
    pub deleted: bool,
    /// Present on event markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<LogEvent>,
    /// Present on spot pseudo-QSOs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot: Option<SpotInfo>,
}

impl Qso {
    /// Builds a plain contact.
    pub fn contact(
        id: QsoId,
        call: impl Into<String>,
        band: Band,
        mode: Mode,
        start_at_ms: Option<TimestampMs>,
    ) -> Self {
        Self {
            id,
            start_at_ms,
            band,
            mode,
            their: Station {
                call: call.into(),
                ..Station::default()
            },
            refs: Vec::new(),
            deleted: false,
            event: None,
            spot: None,
        }
    }

    /// Builds an event marker.
    pub fn marker(
        id: QsoId,
        kind: EventKind,
        start_at_ms: Option<TimestampMs>,
        operation: Option<OperationPatch>,
    ) -> Self {
        Self {
            event: Some(LogEvent { kind, operation }),
            ..Self::contact(id, "", Band::Other, Mode::Other, start_at_ms)
        }
    }

    /// Adds a program reference.
    pub fn with_ref(mut self, reference: Reference) -> Self {
        self.refs.push(reference);
        self
    }

    /// Sets entity and subdivision decoration for the other station.
    pub fn with_location(mut self, entity_prefix: &str, state: Option<&str>) -> Self {
        self.their.entity_prefix = Some(entity_prefix.to_string());
        self.their.state = state.map(str::to_string);
        self
    }

    /// True for real contacts (not events, not spots).
    pub fn is_contact(&self) -> bool {
        self.event.is_none() && self.spot.is_none()
    }

    /// Non-deleted event marker that re-resolves handlers.
    pub fn context_event(&self) -> Option<&LogEvent> {
        if self.deleted {
            return None;
        }
        self.event.as_ref().filter(|e| e.kind.changes_context())
    }
}
