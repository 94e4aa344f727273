//! Contract violations raised by the model
//!
//! These indicate a defect in the caller, not a user-facing condition.
//! Expected runtime conditions (a full plate, an integer overflow) are
//! reported through `SceneEvent`s instead.

use thiserror::Error;

use crate::drag::DragId;
use crate::model::{CreatorId, Side, TermId};

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("cell {index} is outside a {rows}x{columns} grid")]
    InvalidCell {
        index: usize,
        rows: usize,
        columns: usize,
    },

    #[error("row {row}, column {column} is outside a {rows}x{columns} grid")]
    InvalidRowColumn {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("cell {0} is already occupied")]
    CellOccupied(usize),

    #[error("term {0} is not in the grid")]
    TermNotInGrid(TermId),

    #[error("term {0} is already on the plate")]
    AlreadyOnPlate(TermId),

    #[error("term {0} is not on the plate")]
    NotOnPlate(TermId),

    #[error("term {0} has been disposed")]
    TermDisposed(TermId),

    #[error("unknown term {0}")]
    UnknownTerm(TermId),

    #[error("unknown term creator {0}")]
    UnknownCreator(CreatorId),

    #[error("no creator at index {index} of the {side} toolbox")]
    UnknownToolboxIndex { side: Side, index: usize },

    #[error("unknown drag {0}")]
    UnknownDrag(DragId),

    #[error("term {term} is not managed by creator {creator}")]
    NotManaged { term: TermId, creator: CreatorId },

    #[error("{field} was already set")]
    AlreadySet { field: &'static str },

    #[error("{field} has not been initialized")]
    NotInitialized { field: &'static str },

    #[error("creator {0} combines like terms and already has a term on the plate")]
    LikeTermsCellOccupied(CreatorId),

    #[error("creator {0} does not combine like terms")]
    NotCombineMode(CreatorId),

    #[error("creators {first} and {second} on the {side} side create like terms")]
    DuplicateLikeTermCreators {
        side: Side,
        first: CreatorId,
        second: CreatorId,
    },

    #[error("left and right creators at index {0} do not create like terms")]
    UnpairedCreators(usize),

    #[error("left has {left} creators but right has {right}")]
    UnbalancedCreators { left: usize, right: usize },

    #[error("no empty cell on the {0} plate")]
    PlateFull(Side),

    #[error("terms of creator {0} cannot be combined")]
    NotCombinable(CreatorId),

    #[error("universal operations need a scene that combines like terms")]
    NotCombineScene,

    #[error("invalid scene config: {0}")]
    InvalidConfig(String),

    #[error("a term cannot be created with a zero sign")]
    ZeroSign,

    #[error("unknown variable {0}")]
    UnknownVariable(usize),

    #[error("snapshot slot {index} is outside 0..{slots}")]
    InvalidSnapshotSlot { index: usize, slots: usize },

    #[error("snapshot does not match this scene: {0}")]
    SnapshotMismatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = ModelError::InvalidCell {
            index: 40,
            rows: 6,
            columns: 6,
        };
        assert_eq!(err.to_string(), "cell 40 is outside a 6x6 grid");

        let err = ModelError::AlreadySet {
            field: "equivalent term creator",
        };
        assert_eq!(err.to_string(), "equivalent term creator was already set");
    }
}
