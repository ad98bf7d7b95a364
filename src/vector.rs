use serde::Serialize;

use crate::{
    SnbGraphError,
    algebra::{Monoid, Plus, Scalar},
    mask::Mask,
};

/// Sparse vector over dense indices, entries kept sorted by index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SparseVector<T> {
    size: usize,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseVector<T> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from `(index, value)` pairs; duplicates are combined with `dup`.
    pub fn from_pairs<I, F>(size: usize, pairs: I, mut dup: F) -> Result<Self, SnbGraphError>
    where
        I: IntoIterator<Item = (usize, T)>,
        F: FnMut(T, T) -> T,
    {
        let mut entries: Vec<(usize, T)> = pairs.into_iter().collect();
        if let Some(&(index, _)) = entries.iter().find(|(index, _)| *index >= size) {
            return Err(SnbGraphError::out_of_bounds(format!(
                "vector index {index} >= size {size}"
            )));
        }
        entries.sort_by_key(|(index, _)| *index);
        let mut indices: Vec<usize> = Vec::with_capacity(entries.len());
        let mut values: Vec<T> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            if indices.last() == Some(&index) {
                if let Some(last) = values.last_mut() {
                    *last = dup(*last, value);
                }
            } else {
                indices.push(index);
                values.push(value);
            }
        }
        Ok(Self {
            size,
            indices,
            values,
        })
    }

    pub(crate) fn from_sorted(size: usize, indices: Vec<usize>, values: Vec<T>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self {
            size,
            indices,
            values,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nvals(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.indices
            .binary_search(&index)
            .ok()
            .map(|pos| self.values[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn apply<U: Scalar, F: Fn(T) -> U>(&self, f: F) -> SparseVector<U> {
        SparseVector::from_sorted(
            self.size,
            self.indices.clone(),
            self.values.iter().map(|v| f(*v)).collect(),
        )
    }

    /// Keeps only entries whose index is in `mask`.
    pub fn select(&self, mask: &Mask) -> Result<Self, SnbGraphError> {
        mask.check_bound(self.size)?;
        let (indices, values) = self.iter().filter(|(index, _)| mask.contains(*index)).unzip();
        Ok(Self::from_sorted(self.size, indices, values))
    }

    /// Keeps only entries whose index is not in `mask`.
    pub fn select_complement(&self, mask: &Mask) -> Self {
        let (indices, values) = self
            .iter()
            .filter(|(index, _)| !mask.contains(*index))
            .unzip();
        Self::from_sorted(self.size, indices, values)
    }

    /// Changes the logical size; entries beyond the new size are dropped.
    pub fn resize(&self, size: usize) -> Self {
        let (indices, values) = self.iter().filter(|(index, _)| *index < size).unzip();
        Self::from_sorted(size, indices, values)
    }

    /// Union of the stored positions, overlapping values combined under `monoid`.
    pub fn ewise_add<M: Monoid<T>>(&self, other: &Self, monoid: &M) -> Result<Self, SnbGraphError> {
        if self.size != other.size {
            return Err(SnbGraphError::dimension(format!(
                "vector sizes differ: {} != {}",
                self.size, other.size
            )));
        }
        let mut indices = Vec::with_capacity(self.nvals() + other.nvals());
        let mut values = Vec::with_capacity(self.nvals() + other.nvals());
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() || j < other.indices.len() {
            let left = self.indices.get(i).copied();
            let right = other.indices.get(j).copied();
            match (left, right) {
                (Some(a), Some(b)) if a == b => {
                    indices.push(a);
                    values.push(monoid.combine(self.values[i], other.values[j]));
                    i += 1;
                    j += 1;
                }
                (Some(a), Some(b)) if a < b => {
                    indices.push(a);
                    values.push(self.values[i]);
                    i += 1;
                }
                (Some(a), None) => {
                    indices.push(a);
                    values.push(self.values[i]);
                    i += 1;
                }
                (_, Some(b)) => {
                    indices.push(b);
                    values.push(other.values[j]);
                    j += 1;
                }
                (None, None) => break,
            }
        }
        Ok(Self::from_sorted(self.size, indices, values))
    }

    /// Intersection of the stored positions combined with `op`.
    pub fn ewise_mult<U, V, F>(
        &self,
        other: &SparseVector<U>,
        op: F,
    ) -> Result<SparseVector<V>, SnbGraphError>
    where
        U: Scalar,
        V: Scalar,
        F: Fn(T, U) -> V,
    {
        if self.size != other.size() {
            return Err(SnbGraphError::dimension(format!(
                "vector sizes differ: {} != {}",
                self.size,
                other.size()
            )));
        }
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (index, value) in self.iter() {
            if let Some(rhs) = other.get(index) {
                indices.push(index);
                values.push(op(value, rhs));
            }
        }
        Ok(SparseVector::from_sorted(self.size, indices, values))
    }

    pub fn reduce<M: Monoid<T>>(&self, monoid: &M) -> T {
        self.values
            .iter()
            .fold(monoid.identity(), |acc, v| monoid.combine(acc, *v))
    }

    pub fn sum(&self) -> T {
        self.reduce(&Plus)
    }

    /// Structural mask of the stored positions.
    pub fn to_mask(&self) -> Mask {
        Mask::from_indices(self.indices.iter().copied())
    }
}
