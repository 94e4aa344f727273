//! Notifications for the presentation layer
//!
//! Queued in order of occurrence and drained by the host after each call
//! into the scene.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::balance_scale::Side;
use super::term::TermId;
use super::term_creator::CreatorId;

/// The pointer gesture that caused a term to be created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub pointer: u32,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// A term now exists and needs a visual
    TermCreated {
        creator: CreatorId,
        term: TermId,
        interaction: Option<Interaction>,
    },
    /// A term is gone and its visual should be removed
    TermDisposed { creator: CreatorId, term: TermId },
    /// Terms were added to, removed from or rearranged on a plate
    ContentsChanged { side: Side },
    /// A combination or operation was refused because a value got too large
    MaxIntegerExceeded { creator: CreatorId },
    /// The lock needed room on a plate that has none
    SideFull { side: Side },
    /// Terms cancelled out; show a fading "0" here
    SumToZero { side: Side, position: Vec2 },
}
