//! Live award and contest scoring over an amateur-radio QSO log.
//!
//! A log is walked once, cut into UTC-day sections, and folded through the
//! scoring handlers resolved for the operation: declarative activity
//! programs, a baseline duplicate checker, and always-on entity,
//! subdivision, and band/mode awards.
//!
//! # Examples
//!
//! ```
//! use qsoscore::{
//!     config::Settings,
//!     engine::{
//!         registry::Registry,
//!         sections::{analyze_and_section_qsos, AnalyzeInput},
//!     },
//!     handlers::activity::{ActivityScoringPolicy, Dimension},
//!     operation::Operation,
//!     qso::{Qso, Reference},
//!     types::{Band, Mode},
//! };
//!
//! let mut registry = Registry::with_builtins();
//! registry.register_activity(
//!     ActivityScoringPolicy::builder("pota", "potaActivation")
//!         .hunting_type("pota")
//!         .unique_per([Dimension::Day, Dimension::Band, Dimension::Mode])
//!         .qsos_to_activate(10)
//!         .build()
//!         .expect("valid descriptor"),
//! );
//!
//! let operation = Operation::with_refs(vec![Reference::new("potaActivation", "US-0001")]);
//! let qsos = vec![
//!     Qso::contact(1, "K1ABC", Band::B20m, Mode::SSB, Some(1_000)),
//!     Qso::contact(2, "K1ABC", Band::B20m, Mode::SSB, Some(2_000)),
//! ];
//! let settings = Settings::default();
//! let analysis = analyze_and_section_qsos(
//!     &registry,
//!     &AnalyzeInput {
//!         qsos: &qsos,
//!         operation: &operation,
//!         settings: &settings,
//!         show_deleted_qsos: false,
//!     },
//! );
//! assert_eq!(analysis.sections.len(), 1);
//! assert_eq!(analysis.sections[0].scores["potaActivation"].qsos, 1);
//! ```
#![deny(missing_docs)]

/// Scoring settings and program descriptors.
pub mod config;
/// Caller-owned QSO log and index helpers.
pub mod core;
/// Handler contract, registry, near-dupes, and sectioning.
pub mod engine;
/// Activity factory and built-in award handlers.
pub mod handlers;
/// Operating session and mid-log overrides.
pub mod operation;
/// QSO records, references, events, and spots.
pub mod qso;
/// Reference tag helpers.
pub mod refs;
/// Async scoring service.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
