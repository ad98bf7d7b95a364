use ahash::AHashSet;

use crate::{SnbGraphError, algebra::Scalar, index::VertexIndex, vector::SparseVector};

/// A set of dense indices restricting which rows or columns take part in an
/// operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mask {
    members: AHashSet<usize>,
    upper: usize,
}

impl Mask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        let mut mask = Self::new();
        for index in indices {
            mask.insert(index);
        }
        mask
    }

    /// Dense ids of `index` whose attribute row satisfies `predicate`.
    pub fn from_attributes<F>(index: &VertexIndex, predicate: F) -> Result<Self, SnbGraphError>
    where
        F: Fn(&[String]) -> bool,
    {
        let mut mask = Self::new();
        for dense in 0..index.len() {
            if let Some(row) = index.attributes(dense)? {
                if predicate(row) {
                    mask.insert(dense);
                }
            }
        }
        Ok(mask)
    }

    /// Positions stored in `vector`.
    pub fn from_vector<T: Scalar>(vector: &SparseVector<T>) -> Self {
        vector.indices().iter().copied().collect()
    }

    pub fn insert(&mut self, index: usize) {
        if self.members.insert(index) {
            self.upper = self.upper.max(index + 1);
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// One past the largest member; zero for an empty mask.
    pub fn bound(&self) -> usize {
        self.upper
    }

    /// Members in ascending order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.members.iter().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Fails when any member is not below `bound`.
    pub fn check_bound(&self, bound: usize) -> Result<(), SnbGraphError> {
        if self.upper > bound {
            return Err(SnbGraphError::MaskOutOfBounds {
                element: self.upper - 1,
                bound,
            });
        }
        Ok(())
    }
}

impl FromIterator<usize> for Mask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_indices(iter)
    }
}
