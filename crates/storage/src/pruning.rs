//! Version retention policies for mounted stores.

/// How many historical versions a backing engine retains after each commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PruningStrategy {
    /// Keep every version.
    #[default]
    Nothing,
    /// Keep only the latest version.
    Everything,
    /// Keep the last 100 versions plus every 10 000th for state sync.
    Syncable,
}

impl PruningStrategy {
    const SYNCABLE_KEEP_RECENT: i64 = 100;
    const SYNCABLE_KEEP_EVERY: i64 = 10_000;

    /// Whether `version` should be retained when `latest` is the newest
    /// committed version.
    pub fn should_keep(&self, version: i64, latest: i64) -> bool {
        match self {
            PruningStrategy::Nothing => true,
            PruningStrategy::Everything => version == latest,
            PruningStrategy::Syncable => {
                version > latest - Self::SYNCABLE_KEEP_RECENT
                    || version % Self::SYNCABLE_KEEP_EVERY == 0
            }
        }
    }
}
