use serde::Serialize;

use crate::{
    SnbGraphError,
    algebra::{Plus, Scalar},
    vector::SparseVector,
};

/// One weighted contribution to a score, kept raw and scaled.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreComponent<T> {
    pub name: String,
    pub weight: T,
    pub raw: SparseVector<T>,
    pub scaled: SparseVector<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComponentValue<T> {
    pub name: String,
    pub raw: T,
    pub scaled: T,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreRow<T> {
    pub vertex: usize,
    pub total: T,
    pub breakdown: Vec<ComponentValue<T>>,
}

/// Weighted sum of per-vertex contribution vectors over one dense space.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreBoard<T> {
    size: usize,
    components: Vec<ScoreComponent<T>>,
}

impl<T: Scalar> ScoreBoard<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            components: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn add_component<N: Into<String>>(
        &mut self,
        name: N,
        raw: SparseVector<T>,
        weight: T,
    ) -> Result<(), SnbGraphError> {
        let name = name.into();
        if raw.size() != self.size {
            return Err(SnbGraphError::dimension(format!(
                "score component '{name}' has size {}, board has {}",
                raw.size(),
                self.size
            )));
        }
        let (indices, values) = raw
            .iter()
            .map(|(vertex, value)| (vertex, value.times(weight)))
            .filter(|(_, scaled)| *scaled != T::ZERO)
            .unzip();
        let scaled = SparseVector::from_sorted(self.size, indices, values);
        self.components.push(ScoreComponent {
            name,
            weight,
            raw,
            scaled,
        });
        Ok(())
    }

    pub fn components(&self) -> &[ScoreComponent<T>] {
        &self.components
    }

    /// Sum of the scaled components. A vertex absent from every component
    /// stays absent.
    pub fn total(&self) -> Result<SparseVector<T>, SnbGraphError> {
        let mut total = SparseVector::new(self.size);
        for component in &self.components {
            total = total.ewise_add(&component.scaled, &Plus)?;
        }
        Ok(total)
    }

    /// One row per scored vertex; components missing for a vertex read as zero.
    pub fn rows(&self) -> Result<Vec<ScoreRow<T>>, SnbGraphError> {
        let total = self.total()?;
        Ok(total
            .iter()
            .map(|(vertex, total)| ScoreRow {
                vertex,
                total,
                breakdown: self
                    .components
                    .iter()
                    .map(|component| ComponentValue {
                        name: component.name.clone(),
                        raw: component.raw.get(vertex).unwrap_or(T::ZERO),
                        scaled: component.scaled.get(vertex).unwrap_or(T::ZERO),
                    })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(size: usize, pairs: &[(usize, u64)]) -> SparseVector<u64> {
        SparseVector::from_pairs(size, pairs.iter().copied(), |_, v| v).expect("vector")
    }

    #[test]
    fn total_is_weighted_sum() {
        let mut board = ScoreBoard::new(3);
        board
            .add_component("replies", vector(3, &[(0, 2), (2, 1)]), 2)
            .expect("replies");
        board
            .add_component("likes", vector(3, &[(0, 1)]), 10)
            .expect("likes");
        let total = board.total().expect("total");
        assert_eq!(total.get(0), Some(14));
        assert_eq!(total.get(1), None);
        assert_eq!(total.get(2), Some(2));

        let rows = board.rows().expect("rows");
        assert_eq!(rows[1].vertex, 2);
        assert_eq!(rows[1].breakdown[1].raw, 0);
    }

    #[test]
    fn zero_weight_stores_nothing() {
        let mut board = ScoreBoard::new(3);
        board
            .add_component("replies", vector(3, &[(0, 2)]), 1)
            .expect("replies");
        board
            .add_component("likes", vector(3, &[(0, 4), (1, 3)]), 0)
            .expect("likes");
        assert_eq!(board.components()[1].raw.nvals(), 2);
        assert!(board.components()[1].scaled.is_empty());

        let total = board.total().expect("total");
        assert_eq!(total.indices(), &[0]);
        let rows = board.rows().expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].breakdown[1].raw, 4);
        assert_eq!(rows[0].breakdown[1].scaled, 0);
    }

    #[test]
    fn component_size_must_match() {
        let mut board = ScoreBoard::<u64>::new(3);
        let err = board
            .add_component("likes", vector(4, &[]), 10)
            .unwrap_err();
        assert!(matches!(err, SnbGraphError::DimensionMismatch(_)));
    }
}
