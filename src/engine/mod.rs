/// Near-dupe filtering and the per-entry log view.
pub mod dupes;
/// Handler failures and error sinks.
pub mod errors;
/// Reference-decoration lookups.
pub mod lookup;
/// Handler registry and resolution.
pub mod registry;
/// Contributions and score aggregates.
pub mod score;
/// Sectioning engine.
pub mod sections;
/// Live-spot classification.
pub mod spots;
/// Handler capability traits.
pub mod traits;
