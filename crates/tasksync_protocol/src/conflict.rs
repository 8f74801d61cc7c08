//! Deterministic conflict resolution.

use chrono::{DateTime, Utc};

/// Which side of a conflict wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    /// The local copy wins; local content stands.
    Local,
    /// The authority's copy wins; its content is applied locally.
    Remote,
}

/// Resolves a conflict by timestamp precedence.
///
/// The side with the strictly later `updated_at` wins; ties favor the local
/// copy. This is a pure function of the two timestamps, so a pass replayed
/// after a crash resolves the same conflict the same way.
pub fn resolve(local_updated_at: DateTime<Utc>, remote_updated_at: DateTime<Utc>) -> ConflictSide {
    if remote_updated_at > local_updated_at {
        ConflictSide::Remote
    } else {
        ConflictSide::Local
    }
}
