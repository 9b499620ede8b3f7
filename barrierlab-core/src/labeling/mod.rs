//! Forward-looking outcome labels.
//!
//! The barrier labeler assigns each eligible row the percentage return realized
//! by whichever of two price barriers is touched first within a bounded horizon,
//! or by the horizon's final close when neither is touched.

pub mod barrier;

pub use barrier::{BarrierLabeler, BarrierOutcome, ExitKind, LabelStats, LabeledTable};
