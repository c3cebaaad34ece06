//! Shared data model for Isle world content.
//!
//! A [`WorldDef`] is the serialized form of a story: the scenes, their
//! actions and effects, and the items the player can carry. The engine builds
//! its runtime scene graph from it after [`validate_world`] finds no problems.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{RESERVED_KEYWORDS, ValidationError, validate_world};
