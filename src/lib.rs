//! Sparse linear-algebra engine for LDBC social-network analytics.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod algebra;
pub mod bench_utils;
pub mod config;
pub mod errors;
pub mod index;
pub mod loader;
pub mod mask;
pub mod matrix;
pub mod ops;
pub mod queries;
pub mod score;
pub mod traversal;
pub mod vector;

pub use crate::algebra::{
    Lor, LorLand, Max, Min, MinPlus, Monoid, Ordered, Plus, PlusTimes, Rational, Scalar, Semiring,
    Times, reciprocal,
};
pub use crate::config::{EngineConfig, ScoreWeights, ShortestPathStrategy};
pub use crate::errors::SnbGraphError;
pub use crate::index::{SparseId, VertexIndex};
pub use crate::loader::{DuplicateRule, EdgeRow, LoadReport, LoadedRelation, RelationLoader};
pub use crate::mask::Mask;
pub use crate::matrix::SparseMatrix;
pub use crate::ops::Axis;
pub use crate::score::{ComponentValue, ScoreBoard, ScoreComponent, ScoreRow};
pub use crate::traversal::{Closure, TraversalEngine};
pub use crate::vector::SparseVector;
