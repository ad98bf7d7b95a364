use tracing::{debug, instrument};

use crate::{
    SnbGraphError,
    algebra::{Lor, Min, MinPlus, Monoid, Ordered, Plus, PlusTimes, Scalar, Semiring},
    config::{EngineConfig, ShortestPathStrategy},
    mask::Mask,
    matrix::SparseMatrix,
    ops,
};

/// Everything reachable from a seed frontier, plus how many expansion steps
/// it took to run dry.
#[derive(Clone, Debug, PartialEq)]
pub struct Closure<T> {
    pub reachable: SparseMatrix<T>,
    pub iterations: usize,
}

// Accumulates with the semiring's own aggregate.
struct Aggregate<'a, S>(&'a S);

impl<T, S: Semiring<T>> Monoid<T> for Aggregate<'_, S> {
    fn identity(&self) -> T {
        self.0.zero()
    }

    fn combine(&self, a: T, b: T) -> T {
        self.0.add(a, b)
    }
}

#[derive(Clone, Debug, Default)]
pub struct TraversalEngine {
    config: EngineConfig,
}

impl TraversalEngine {
    pub fn new(config: EngineConfig) -> Result<Self, SnbGraphError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Expands `seed` through `relation` until the frontier is empty.
    ///
    /// `relation` is stored child -> parent (as reply-of edges are), so each
    /// step computes `frontier · relationᵀ`. The seed itself is part of the
    /// result.
    #[instrument(skip_all, fields(seed = seed.nvals(), relation = relation.nvals()))]
    pub fn transitive_closure<T, S>(
        &self,
        seed: &SparseMatrix<T>,
        relation: &SparseMatrix<T>,
        semiring: &S,
    ) -> Result<Closure<T>, SnbGraphError>
    where
        T: Scalar,
        S: Semiring<T>,
    {
        if !relation.is_square() || seed.ncols() != relation.nrows() {
            return Err(SnbGraphError::dimension(format!(
                "closure of {}x{} seed over {}x{} relation",
                seed.nrows(),
                seed.ncols(),
                relation.nrows(),
                relation.ncols()
            )));
        }
        let transposed = relation.transpose();
        let aggregate = Aggregate(semiring);
        let mut reachable = seed.clone();
        let mut frontier = seed.clone();
        let mut iterations = 0;
        while !frontier.is_empty() {
            if iterations >= self.config.max_iterations {
                return Err(SnbGraphError::NonConvergence { iterations });
            }
            let next = ops::mxm(&frontier, &transposed, semiring)?;
            reachable = ops::ewise_add(&reachable, &next, &aggregate)?;
            frontier = next;
            iterations += 1;
        }
        debug!(iterations, reachable = reachable.nvals(), "closure converged");
        Ok(Closure {
            reachable,
            iterations,
        })
    }

    /// Distances from every vertex in `sources` to every vertex in
    /// `destinations` (all vertices when `None`), using the configured
    /// strategy. Unreachable pairs stay absent; the shape is `n x n`.
    pub fn shortest_paths<T: Ordered>(
        &self,
        weights: &SparseMatrix<T>,
        sources: &Mask,
        destinations: Option<&Mask>,
    ) -> Result<SparseMatrix<T>, SnbGraphError> {
        match self.config.shortest_path {
            ShortestPathStrategy::Exact => {
                self.shortest_paths_exact(weights, sources, destinations)
            }
            ShortestPathStrategy::Batched => {
                self.shortest_paths_batched(weights, sources, destinations)
            }
        }
    }

    /// All-pairs relaxation, one pivot at a time.
    #[instrument(skip_all, fields(vertices = weights.nrows()))]
    pub fn shortest_paths_exact<T: Ordered>(
        &self,
        weights: &SparseMatrix<T>,
        sources: &Mask,
        destinations: Option<&Mask>,
    ) -> Result<SparseMatrix<T>, SnbGraphError> {
        let n = weights.nrows();
        let mut distances = weights.with_diagonal(T::ZERO)?;
        for pivot in 0..n {
            let column = distances.extract_col(pivot)?;
            let row = distances.extract_row(pivot)?;
            let into_pivot =
                SparseMatrix::from_triplets(n, 1, column.iter().map(|(i, v)| (i, 0, v)), |_, v| v)?;
            let out_of_pivot =
                SparseMatrix::from_triplets(1, n, row.iter().map(|(j, v)| (0, j, v)), |_, v| v)?;
            let through = ops::mxm(&into_pivot, &out_of_pivot, &MinPlus)?;
            distances = ops::ewise_add(&distances, &through, &Min)?;
        }
        debug!(pivots = n, "exact shortest paths done");
        ops::select(&distances, Some(sources), destinations)
    }

    /// Min-plus fixpoint from the source rows only.
    #[instrument(skip_all, fields(vertices = weights.nrows(), sources = sources.len()))]
    pub fn shortest_paths_batched<T: Ordered>(
        &self,
        weights: &SparseMatrix<T>,
        sources: &Mask,
        destinations: Option<&Mask>,
    ) -> Result<SparseMatrix<T>, SnbGraphError> {
        let closed = weights.with_diagonal(T::ZERO)?;
        let mut paths = ops::select(&closed, Some(sources), None)?;
        let mut iterations = 0;
        loop {
            if iterations >= self.config.max_iterations {
                return Err(SnbGraphError::NonConvergence { iterations });
            }
            let next = ops::mxm(&paths, &closed, &MinPlus)?;
            iterations += 1;
            if next == paths {
                break;
            }
            paths = next;
        }
        debug!(iterations, "batched shortest paths converged");
        ops::select(&paths, None, destinations)
    }

    /// Triangles in the undirected graph underlying `relation`, optionally
    /// restricted to the vertices in `mask`. Self-loops are ignored.
    #[instrument(skip_all, fields(edges = relation.nvals()))]
    pub fn triangle_count<T: Scalar>(
        &self,
        relation: &SparseMatrix<T>,
        mask: Option<&Mask>,
    ) -> Result<u64, SnbGraphError> {
        let undirected = ops::symmetrize(&relation.pattern(), &Lor)?;
        let undirected = match mask {
            Some(mask) => ops::select(&undirected, Some(mask), Some(mask))?,
            None => undirected,
        };
        let (nrows, ncols) = undirected.shape();
        let adjacency = SparseMatrix::from_triplets(
            nrows,
            ncols,
            undirected
                .iter()
                .filter(|(row, col, _)| row != col)
                .map(|(row, col, _)| (row, col, 1u64)),
            |_, v| v,
        )?;
        let wedges = ops::mxm(&adjacency, &adjacency, &PlusTimes)?;
        let closed = ops::ewise_mult(&wedges, &adjacency, |paths, _| paths)?;
        let triangles = ops::reduce_scalar(&closed, &Plus) / 6;
        debug!(triangles, "triangles counted");
        Ok(triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::LorLand;

    fn chain(n: usize) -> SparseMatrix<bool> {
        SparseMatrix::from_triplets(n, n, (1..n).map(|i| (i, i - 1, true)), |_, v| v)
            .expect("chain")
    }

    #[test]
    fn closure_iterations_track_depth() {
        let engine = TraversalEngine::default();
        let relation = chain(4);
        let closure = engine
            .transitive_closure(&relation.transpose(), &relation, &LorLand)
            .expect("closure");
        // depth 2, depth 3, then the step that empties the frontier
        assert_eq!(closure.iterations, 3);
        assert_eq!(closure.reachable.nvals(), 6);
    }

    #[test]
    fn closure_rejects_non_square_relation() {
        let engine = TraversalEngine::default();
        let seed = SparseMatrix::<bool>::new(2, 3);
        let relation = SparseMatrix::<bool>::new(3, 2);
        let err = engine
            .transitive_closure(&seed, &relation, &LorLand)
            .unwrap_err();
        assert!(matches!(err, SnbGraphError::DimensionMismatch(_)));
    }
}
