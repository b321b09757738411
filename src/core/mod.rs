/// Helper index aliases.
pub mod indices;
/// Append-only, soft-deletable QSO log.
pub mod log;
