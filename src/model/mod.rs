//! Balance-scale model: terms, creators, grids, plates and the scene that owns them

pub mod balance_scale;
pub mod events;
pub mod fraction;
pub mod grid;
pub mod operation;
pub mod plate;
pub mod scene;
pub mod snapshot;
pub mod term;
pub mod term_creator;
pub mod variable;

pub use balance_scale::{BalanceScale, Side};
pub use events::{Interaction, SceneEvent};
pub use fraction::Fraction;
pub use grid::Grid;
pub use operation::{Operand, Operator, UniversalOperation};
pub use plate::Plate;
pub use scene::{OperationOutcome, Scene};
pub use snapshot::{SceneSnapshot, SnapshotEntry, Snapshots, TermCreatorSnapshot};
pub use term::{Motion, MotionStatus, Sign, Term, TermId, TermKind, TermOptions, TermPool, TermValue};
pub use term_creator::{CreatorContext, CreatorId, TermCreator, ToolboxAnchors};
pub use variable::{Variable, VariableId};
