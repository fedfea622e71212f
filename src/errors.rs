use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::sequence_registry::LaneId;

/// Structured failures raised while building or ordering the alignment graph.
#[derive(Clone, Debug, PartialEq)]
pub enum PinchConError {
    /// A lane id was registered twice
    DuplicateLane(LaneId),

    /// A pinch or lookup referenced a lane that was never registered
    UnknownLane(LaneId),

    /// A pinch window runs past the end of its lane
    PinchOutOfBounds { lane: LaneId, start: usize, length: usize, lane_length: usize },

    /// A sequence record name could not be parsed as an integer lane id
    InvalidLaneName(String),

    /// The block precedence graph contains a cycle, so no block order exists
    InconsistentAlignment { ordered: usize, total: usize },
}

impl Error for PinchConError {}

impl Display for PinchConError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLane(id) =>
                write!(f, "Lane {id} was registered more than once."),
            Self::UnknownLane(id) =>
                write!(f, "Lane {id} is not registered."),
            Self::PinchOutOfBounds { lane, start, length, lane_length } =>
                write!(f, "Pinch window {start}+{length} is out of bounds for lane {lane} of length {lane_length}."),
            Self::InvalidLaneName(name) =>
                write!(f, "Sequence name {name:?} is not an integer lane id."),
            Self::InconsistentAlignment { ordered, total } =>
                write!(f, "Block precedence graph has a cycle: only {ordered} of {total} blocks could be ordered."),
        }
    }
}
