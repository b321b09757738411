//! Declarative activation/hunting programs.
//!
//! Most park/summit style programs differ only in which reference types they
//! use, which dimensions make a repeat contact count again, and how many
//! contacts activate a reference. [`ActivityDescriptor`] captures that and
//! [`ActivityScoringPolicy`] turns it into a full handler.

use serde::{Deserialize, Serialize};

use crate::{
    config::{ConfigError, Settings},
    engine::{
        dupes::{NearDupeOptions, TimeComparison},
        errors::HandlerResult,
        score::{Alert, Contribution, Notice, Presentation, Score},
        traits::{
            AccumulateInput, Accumulator, DayAccumulator, Handler, OperationAccumulator,
            QsoScorer, ScoringInput, SummarizeInput, Summarizer,
        },
    },
    operation::Operation,
    qso::{Qso, Reference},
    refs::{has_ref_type, ref_keys},
    types::{day_start, Band},
};

/// Dimension along which a repeat contact may count again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// UTC day.
    Day,
    /// Band.
    Band,
    /// Mode.
    Mode,
    /// Program reference.
    Ref,
}

/// Order in which near-dupes are narrowed.
pub const DIMENSION_ORDER: [Dimension; 4] =
    [Dimension::Day, Dimension::Band, Dimension::Mode, Dimension::Ref];

impl Dimension {
    /// Notice emitted when this dimension makes a contact new.
    pub fn notice(&self) -> Notice {
        match self {
            Self::Day => Notice::NewDay,
            Self::Band => Notice::NewBand,
            Self::Mode => Notice::NewMode,
            Self::Ref => Notice::NewRef,
        }
    }
}

/// Outcome of narrowing a near-dupe set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupeVerdict {
    /// No earlier contact with this station.
    Unique,
    /// Earlier contacts exist but this one differs along a dimension.
    New(Dimension),
    /// Earlier contacts carried references and this one has none yet.
    MaybeDupe,
    /// Same along every unique dimension.
    Duplicate,
}

/// Narrows `dupes` dimension by dimension in [`DIMENSION_ORDER`].
///
/// The first dimension that empties the set decides the verdict.
/// `refs_of` yields the program reference keys of a QSO.
pub fn classify_near_dupes(
    qso: &Qso,
    mut dupes: Vec<&Qso>,
    unique_per: &[Dimension],
    refs_of: &dyn Fn(&Qso) -> Vec<String>,
) -> DupeVerdict {
    if dupes.is_empty() {
        return DupeVerdict::Unique;
    }
    let target_refs = refs_of(qso);

    for dim in DIMENSION_ORDER {
        if !unique_per.contains(&dim) {
            continue;
        }
        if dim == Dimension::Ref
            && target_refs.is_empty()
            && dupes.iter().any(|q| !refs_of(*q).is_empty())
        {
            return DupeVerdict::MaybeDupe;
        }
        dupes.retain(|q| match dim {
            Dimension::Day => match qso.start_at_ms {
                None => true,
                Some(t) => q.start_at_ms.is_some_and(|u| day_start(u) == day_start(t)),
            },
            Dimension::Band => q.band == qso.band,
            Dimension::Mode => q.mode == qso.mode,
            Dimension::Ref => {
                let theirs = refs_of(*q);
                target_refs.iter().all(|r| theirs.contains(r))
            }
        });
        if dupes.is_empty() {
            return DupeVerdict::New(dim);
        }
    }

    DupeVerdict::Duplicate
}

/// Accumulation style declared by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationStyle {
    /// Resets every section.
    #[default]
    Day,
    /// Carries over between sections.
    Operation,
}

/// Display labels for an activity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLabels {
    /// Short program name, e.g. `"POTA"`.
    pub short: String,
    /// Label for the hunting score.
    pub hunting: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_qsos_to_activate() -> u32 {
    1
}

/// Declarative description of one activity program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDescriptor {
    /// Handler key.
    pub key: String,
    /// Operation reference type that marks an activation.
    pub activation_type: String,
    /// QSO reference type carried by hunted contacts.
    #[serde(default)]
    pub hunting_type: Option<String>,
    /// Whether one QSO may count for several references.
    #[serde(default)]
    pub allows_multiple_references: bool,
    /// Dimensions that make a repeat contact count again.
    #[serde(default)]
    pub unique_per: Vec<Dimension>,
    /// Contacts needed to activate.
    #[serde(default = "default_qsos_to_activate")]
    pub qsos_to_activate: u32,
    /// Lifecycle of the aggregate.
    #[serde(default)]
    pub accumulation: AccumulationStyle,
    /// Allowed bands. `None` allows any band.
    #[serde(default)]
    pub valid_bands: Option<Vec<Band>>,
    /// Whether hunting applies when not activating.
    #[serde(default = "default_true")]
    pub general_hunting: bool,
    /// Display labels.
    #[serde(default)]
    pub labels: ActivityLabels,
}

impl ActivityDescriptor {
    /// Minimal descriptor for `key` activated through `activation_type`.
    pub fn new(key: impl Into<String>, activation_type: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            labels: ActivityLabels {
                short: key.to_ascii_uppercase(),
                ..ActivityLabels::default()
            },
            key,
            activation_type: activation_type.into(),
            hunting_type: None,
            allows_multiple_references: false,
            unique_per: Vec::new(),
            qsos_to_activate: 1,
            accumulation: AccumulationStyle::Day,
            valid_bands: None,
            general_hunting: true,
        }
    }

    /// Checks structural constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: &str| ConfigError::InvalidDescriptor {
            key: self.key.clone(),
            reason: reason.to_string(),
        };
        if self.key.trim().is_empty() {
            return Err(fail("empty key"));
        }
        if self.activation_type.trim().is_empty() {
            return Err(fail("empty activation type"));
        }
        if self.hunting_type.as_deref() == Some(self.activation_type.as_str()) {
            return Err(fail("hunting type equals activation type"));
        }
        let mut dims = self.unique_per.clone();
        dims.sort();
        dims.dedup();
        if dims.len() != self.unique_per.len() {
            return Err(fail("repeated unique_per dimension"));
        }
        if self.unique_per.contains(&Dimension::Ref) && self.hunting_type.is_none() {
            return Err(fail("unique per ref needs a hunting type"));
        }
        Ok(())
    }
}

/// Handler generated from an [`ActivityDescriptor`].
#[derive(Debug, Clone)]
pub struct ActivityScoringPolicy {
    descriptor: ActivityDescriptor,
    time_comparison: TimeComparison,
}

/// Builder for [`ActivityScoringPolicy`].
#[derive(Debug, Clone)]
pub struct ActivityPolicyBuilder {
    descriptor: ActivityDescriptor,
    time_comparison: TimeComparison,
}

impl ActivityPolicyBuilder {
    /// Sets the hunted reference type.
    pub fn hunting_type(mut self, ref_type: impl Into<String>) -> Self {
        self.descriptor.hunting_type = Some(ref_type.into());
        self
    }

    /// Sets the uniqueness dimensions.
    pub fn unique_per(mut self, dims: impl IntoIterator<Item = Dimension>) -> Self {
        self.descriptor.unique_per = dims.into_iter().collect();
        self
    }

    /// Sets the activation threshold.
    pub fn qsos_to_activate(mut self, n: u32) -> Self {
        self.descriptor.qsos_to_activate = n;
        self
    }

    /// Lets one QSO count for several references.
    pub fn allows_multiple_references(mut self, yes: bool) -> Self {
        self.descriptor.allows_multiple_references = yes;
        self
    }

    /// Sets the accumulation style.
    pub fn accumulation(mut self, style: AccumulationStyle) -> Self {
        self.descriptor.accumulation = style;
        self
    }

    /// Restricts allowed bands.
    pub fn valid_bands(mut self, bands: impl IntoIterator<Item = Band>) -> Self {
        self.descriptor.valid_bands = Some(bands.into_iter().collect());
        self
    }

    /// Sets display labels.
    pub fn labels(mut self, labels: ActivityLabels) -> Self {
        self.descriptor.labels = labels;
        self
    }

    /// Sets the near-dupe time comparison.
    pub fn time_comparison(mut self, cmp: TimeComparison) -> Self {
        self.time_comparison = cmp;
        self
    }

    /// Validates and builds.
    pub fn build(self) -> Result<ActivityScoringPolicy, ConfigError> {
        self.descriptor.validate()?;
        Ok(ActivityScoringPolicy {
            descriptor: self.descriptor,
            time_comparison: self.time_comparison,
        })
    }
}

impl ActivityScoringPolicy {
    /// Starts a builder for `key` activated through `activation_type`.
    pub fn builder(
        key: impl Into<String>,
        activation_type: impl Into<String>,
    ) -> ActivityPolicyBuilder {
        ActivityPolicyBuilder {
            descriptor: ActivityDescriptor::new(key, activation_type),
            time_comparison: TimeComparison::Strict,
        }
    }

    /// Validates `descriptor` and wraps it.
    pub fn from_descriptor(descriptor: ActivityDescriptor) -> Result<Self, ConfigError> {
        ActivityPolicyBuilder {
            descriptor,
            time_comparison: TimeComparison::Strict,
        }
        .build()
    }

    /// The source descriptor.
    pub fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    fn is_activation(&self, reference: &Reference) -> bool {
        reference.ref_type == self.descriptor.activation_type
    }

    fn hunted_keys(&self, qso: &Qso) -> Vec<String> {
        match &self.descriptor.hunting_type {
            Some(t) => ref_keys(&qso.refs, t),
            None => Vec::new(),
        }
    }

    fn activation_keys(&self, operation: &Operation, reference: &Reference) -> Vec<String> {
        if self.descriptor.allows_multiple_references {
            let keys = ref_keys(&operation.refs, &self.descriptor.activation_type);
            if !keys.is_empty() {
                return keys;
            }
        }
        vec![reference.reference.clone()]
    }

    fn name_type(&self) -> &str {
        self.descriptor
            .hunting_type
            .as_deref()
            .unwrap_or(&self.descriptor.activation_type)
    }

    /// Hunting handler, QSO without program references: counts nothing but
    /// flags a possible dupe when earlier contacts carried references.
    fn unreferenced_hunt(&self, input: &ScoringInput<'_>) -> Contribution {
        if !self.descriptor.unique_per.contains(&Dimension::Ref) {
            return Contribution::zero();
        }
        let dupes = input.log.near_dupes(
            input.qso,
            &NearDupeOptions {
                time_comparison: self.time_comparison,
                ..NearDupeOptions::default()
            },
        );
        let refs_of = |q: &Qso| self.hunted_keys(q);
        match classify_near_dupes(input.qso, dupes, &self.descriptor.unique_per, &refs_of) {
            DupeVerdict::MaybeDupe => Contribution::zero().with_notice(Notice::MaybeDupe),
            _ => Contribution::zero(),
        }
    }

    fn fold(&self, input: &AccumulateInput<'_>) -> Score {
        let mut score = input.score.clone();
        let c = input.contribution;
        if c.value > 0 {
            score.value += c.value;
            score.qsos += 1;
            for key in &c.keys {
                score.bump(key);
            }
        }
        if self.is_activation(input.reference) {
            score.activated = Some(score.qsos >= u64::from(self.descriptor.qsos_to_activate));
        }
        score
    }

    fn empty_for(&self, reference: &Reference) -> Score {
        Score {
            activated: self.is_activation(reference).then_some(false),
            ..Score::default()
        }
    }
}

impl QsoScorer for ActivityScoringPolicy {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        let d = &self.descriptor;
        let qso = input.qso;
        let activating = self.is_activation(input.reference);
        let hunted = self.hunted_keys(qso);

        if !activating && hunted.is_empty() {
            return Ok(self.unreferenced_hunt(input));
        }
        if let Some(valid) = &d.valid_bands {
            if !valid.contains(&qso.band) {
                return Ok(Contribution::alerted(Alert::InvalidBand));
            }
        }

        let (value, keys) = if activating {
            (1, self.activation_keys(input.operation, input.reference))
        } else if d.allows_multiple_references {
            (hunted.len() as i64, hunted.clone())
        } else {
            (1, hunted[..1].to_vec())
        };

        let section_refs = if activating {
            vec![input.reference.clone()]
        } else {
            Vec::new()
        };
        let dupes = input.log.near_dupes(
            qso,
            &NearDupeOptions {
                with_section_refs: &section_refs,
                time_comparison: self.time_comparison,
                extra: None,
            },
        );

        let refs_of = |q: &Qso| self.hunted_keys(q);
        let base = Contribution::counted(value).with_keys(keys);
        Ok(match classify_near_dupes(qso, dupes, &d.unique_per, &refs_of) {
            DupeVerdict::Unique => base,
            DupeVerdict::New(dim) => base.with_notice(dim.notice()),
            DupeVerdict::MaybeDupe => base.with_notice(Notice::MaybeDupe),
            DupeVerdict::Duplicate => Contribution::alerted(Alert::Duplicate),
        })
    }
}

impl DayAccumulator for ActivityScoringPolicy {
    fn empty_score(&self, reference: &Reference) -> Score {
        self.empty_for(reference)
    }

    fn accumulate_for_day(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        Ok(self.fold(input))
    }
}

impl OperationAccumulator for ActivityScoringPolicy {
    fn empty_score(&self, reference: &Reference) -> Score {
        self.empty_for(reference)
    }

    fn accumulate_for_operation(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        Ok(self.fold(input))
    }
}

impl Summarizer for ActivityScoringPolicy {
    fn summarize(&self, input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        let d = &self.descriptor;
        let score = input.score;
        let mut out = score.undecorated();

        let mut presentation = if self.is_activation(input.reference) {
            let need = u64::from(d.qsos_to_activate);
            let summary = if score.activated == Some(true) {
                format!("{} QSOs, activated", score.qsos)
            } else {
                format!("{}/{} QSOs", score.qsos, need)
            };
            let long_summary = input.all_section_scores.map(|all| {
                let rollup = match d.accumulation {
                    AccumulationStyle::Day => {
                        let days = all.iter().filter(|s| s.activated == Some(true)).count();
                        format!("{days} of {} days activated", all.len())
                    }
                    // scores are cumulative, so a day counts only if it added QSOs
                    AccumulationStyle::Operation => {
                        let mut before = 0;
                        let worked = all
                            .iter()
                            .filter(|s| {
                                let added = s.qsos > before;
                                before = s.qsos;
                                added
                            })
                            .count();
                        let status = if score.activated == Some(true) {
                            "activated"
                        } else {
                            "not activated"
                        };
                        format!("{} QSOs on {worked} of {} days, {status}", score.qsos, all.len())
                    }
                };
                match input
                    .lookup
                    .reference_name(self.name_type(), &input.reference.reference)
                {
                    Some(name) => format!("{name}: {rollup}"),
                    None => rollup,
                }
            });
            Presentation {
                label: format!("{} {}", d.labels.short, input.reference.reference),
                icon: d.labels.icon.clone(),
                summary,
                long_summary,
            }
        } else {
            let long_summary = input.all_section_scores.map(|all| {
                let mut refs: Vec<&String> = all.iter().flat_map(|s| s.tallies.keys()).collect();
                refs.sort();
                refs.dedup();
                format!("{} refs hunted", refs.len())
            });
            Presentation {
                label: d
                    .labels
                    .hunting
                    .clone()
                    .unwrap_or_else(|| format!("{} Hunter", d.labels.short)),
                icon: d.labels.icon.clone(),
                summary: format!("{} refs, {} pts", score.tallies.len(), score.value),
                long_summary,
            }
        };
        if presentation.label.trim().is_empty() {
            presentation.label = d.key.clone();
        }
        out.presentation = Some(presentation);
        Ok(out)
    }
}

impl Handler for ActivityScoringPolicy {
    fn key(&self) -> &str {
        &self.descriptor.key
    }

    fn scorer(&self) -> Option<&dyn QsoScorer> {
        Some(self)
    }

    fn accumulator(&self) -> Option<Accumulator<'_>> {
        Some(match self.descriptor.accumulation {
            AccumulationStyle::Day => Accumulator::ForDay(self),
            AccumulationStyle::Operation => Accumulator::ForOperation(self),
        })
    }

    fn summarizer(&self) -> Option<&dyn Summarizer> {
        Some(self)
    }

    fn general_hunting_type(&self, operation: &Operation, settings: &Settings) -> Option<&str> {
        if !self.descriptor.general_hunting
            || !settings.hunting_enabled_for(&self.descriptor.key)
            || has_ref_type(&operation.refs, &self.descriptor.activation_type)
        {
            return None;
        }
        self.descriptor.hunting_type.as_deref()
    }
}
