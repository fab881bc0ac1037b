//! Status returned from each controller step.

/// Public status of a single step of the dissociation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// Keep going.
    Running,
    /// The stop predicate accepted the series after the latest reading.
    Stopped,
    /// Cancellation was observed at a tumble checkpoint.
    Cancelled,
}
