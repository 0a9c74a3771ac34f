/// Failures surfaced by the simulation core.
///
/// None of these abort a run: the scheduler decides whether to truncate,
/// skip or stop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Adding {requested} players exceeds pool capacity {cap} ({available} slots left)")]
    CapacityExceeded {
        requested: usize,
        available: usize,
        cap: usize,
    },
    #[error("No match of {needed} players found after {anchors_tried} anchors and {samples_drawn} samples")]
    MatchBuildFailure {
        anchors_tried: usize,
        samples_drawn: usize,
        needed: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type SimResult<T> = Result<T, SimError>;
