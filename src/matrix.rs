use std::ops::Range;

use serde::Serialize;

use crate::{SnbGraphError, algebra::Scalar, vector::SparseVector};

/// Sparse matrix in compressed sparse row form.
///
/// Column indices are strictly increasing within a row and every stored
/// coordinate lies inside `nrows x ncols`. Values are immutable; every
/// transform returns a new matrix.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SparseMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseMatrix<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_ptr: vec![0; nrows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a matrix from `(row, col, value)` triplets. Duplicate
    /// coordinates are folded in input order with `dup(previous, next)`.
    pub fn from_triplets<I, F>(
        nrows: usize,
        ncols: usize,
        triplets: I,
        mut dup: F,
    ) -> Result<Self, SnbGraphError>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
        F: FnMut(T, T) -> T,
    {
        let mut rows: Vec<Vec<(usize, T)>> = vec![Vec::new(); nrows];
        for (row, col, value) in triplets {
            if row >= nrows || col >= ncols {
                return Err(SnbGraphError::out_of_bounds(format!(
                    "entry ({row}, {col}) outside {nrows}x{ncols}"
                )));
            }
            rows[row].push((col, value));
        }
        for row in rows.iter_mut() {
            // stable: duplicates stay in input order for `dup`
            row.sort_by_key(|(col, _)| *col);
            let mut folded: Vec<(usize, T)> = Vec::with_capacity(row.len());
            for &(col, value) in row.iter() {
                match folded.last_mut() {
                    Some(last) if last.0 == col => last.1 = dup(last.1, value),
                    _ => folded.push((col, value)),
                }
            }
            *row = folded;
        }
        Ok(Self::from_rows(nrows, ncols, rows))
    }

    /// `rows` must hold `nrows` rows, each sorted by column without duplicates.
    pub(crate) fn from_rows(nrows: usize, ncols: usize, rows: Vec<Vec<(usize, T)>>) -> Self {
        debug_assert_eq!(rows.len(), nrows);
        let nnz = rows.iter().map(Vec::len).sum();
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptr.push(0);
        for row in rows {
            for (col, value) in row {
                col_idx.push(col);
                values.push(value);
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn nvals(&self) -> usize {
        self.col_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.col_idx.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptr[row]..self.row_ptr[row + 1]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.nrows {
            return None;
        }
        let range = self.row_range(row);
        self.col_idx[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|pos| self.values[range.start + pos])
    }

    /// Stored entries of one row. Rows past the end are empty.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = if row < self.nrows {
            self.row_range(row)
        } else {
            0..0
        };
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows)
            .flat_map(move |row| self.row(row).map(move |(col, value)| (row, col, value)))
    }

    pub(crate) fn to_rows(&self) -> Vec<Vec<(usize, T)>> {
        (0..self.nrows).map(|row| self.row(row).collect()).collect()
    }

    /// Counting-sort transpose, linear in `nvals + ncols`.
    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.ncols + 1];
        for &col in &self.col_idx {
            counts[col + 1] += 1;
        }
        for col in 0..self.ncols {
            counts[col + 1] += counts[col];
        }
        let row_ptr = counts.clone();
        let mut next = counts;
        let mut col_idx = vec![0usize; self.nvals()];
        let mut values = Vec::with_capacity(self.nvals());
        values.resize(self.nvals(), T::ZERO);
        for (row, col, value) in self.iter() {
            let slot = next[col];
            col_idx[slot] = row;
            values[slot] = value;
            next[col] += 1;
        }
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// New matrix with the given shape; entries that fall outside are dropped.
    pub fn resize(&self, nrows: usize, ncols: usize) -> Self {
        let rows: Vec<Vec<(usize, T)>> = (0..nrows)
            .map(|row| self.row(row).filter(|(col, _)| *col < ncols).collect())
            .collect();
        Self::from_rows(nrows, ncols, rows)
    }

    /// Writes `block` with its origin at `(row_offset, col_offset)`, replacing
    /// every entry previously stored in the covered region.
    pub fn assign(
        &self,
        block: &SparseMatrix<T>,
        row_offset: usize,
        col_offset: usize,
    ) -> Result<Self, SnbGraphError> {
        if row_offset + block.nrows > self.nrows || col_offset + block.ncols > self.ncols {
            return Err(SnbGraphError::dimension(format!(
                "{}x{} block at ({row_offset}, {col_offset}) exceeds {}x{}",
                block.nrows, block.ncols, self.nrows, self.ncols
            )));
        }
        let cols = col_offset..col_offset + block.ncols;
        let mut rows = self.to_rows();
        for (offset, row) in rows
            .iter_mut()
            .enumerate()
            .skip(row_offset)
            .take(block.nrows)
        {
            row.retain(|(col, _)| !cols.contains(col));
            row.extend(block.row(offset - row_offset).map(|(col, v)| (col + col_offset, v)));
            row.sort_by_key(|(col, _)| *col);
        }
        Ok(Self::from_rows(self.nrows, self.ncols, rows))
    }

    pub fn extract_row(&self, row: usize) -> Result<SparseVector<T>, SnbGraphError> {
        if row >= self.nrows {
            return Err(SnbGraphError::out_of_bounds(format!(
                "row {row} >= {}",
                self.nrows
            )));
        }
        let (indices, values) = self.row(row).unzip();
        Ok(SparseVector::from_sorted(self.ncols, indices, values))
    }

    pub fn extract_col(&self, col: usize) -> Result<SparseVector<T>, SnbGraphError> {
        if col >= self.ncols {
            return Err(SnbGraphError::out_of_bounds(format!(
                "column {col} >= {}",
                self.ncols
            )));
        }
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for row in 0..self.nrows {
            if let Some(value) = self.get(row, col) {
                indices.push(row);
                values.push(value);
            }
        }
        Ok(SparseVector::from_sorted(self.nrows, indices, values))
    }

    pub fn apply<U: Scalar, F: Fn(T) -> U>(&self, f: F) -> SparseMatrix<U> {
        SparseMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Boolean structure of the stored entries.
    pub fn pattern(&self) -> SparseMatrix<bool> {
        self.apply(|_| true)
    }

    /// Square matrix with every diagonal entry set to `value`.
    pub fn with_diagonal(&self, value: T) -> Result<Self, SnbGraphError> {
        if !self.is_square() {
            return Err(SnbGraphError::dimension(format!(
                "diagonal of non-square {}x{} matrix",
                self.nrows, self.ncols
            )));
        }
        let mut rows = self.to_rows();
        for (index, row) in rows.iter_mut().enumerate() {
            match row.binary_search_by_key(&index, |(col, _)| *col) {
                Ok(pos) => row[pos].1 = value,
                Err(pos) => row.insert(pos, (index, value)),
            }
        }
        Ok(Self::from_rows(self.nrows, self.ncols, rows))
    }
}
