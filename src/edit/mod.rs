//! Page editing: pending edits, rewriting, resizing and censoring.

mod censor;
mod generation;
mod resize;
mod rewriter;
mod store;

pub use censor::{censor, CensorOptions, CensorRegion};
pub use generation::{GenerationCounter, GenerationToken};
pub use resize::{resize, PageFormat};
pub use rewriter::{validate_permutation, PageRewriter, Replacement, RewritePlan};
pub use store::{CommitTicket, EditState, PageTransformStore, RotationTarget};
