use crate::{
    SnbGraphError,
    algebra::{Monoid, Scalar, Semiring},
    mask::Mask,
    matrix::SparseMatrix,
    vector::SparseVector,
};

/// Direction of a merge or reduction. `Rows` appends rows when merging and
/// yields one value per row when reducing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Columns,
}

/// Drops entries whose row or column is outside the given masks. The shape is
/// kept so dense index spaces stay comparable across operations.
pub fn select<T: Scalar>(
    matrix: &SparseMatrix<T>,
    row_mask: Option<&Mask>,
    col_mask: Option<&Mask>,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    if let Some(mask) = row_mask {
        mask.check_bound(matrix.nrows())?;
    }
    if let Some(mask) = col_mask {
        mask.check_bound(matrix.ncols())?;
    }
    let rows: Vec<Vec<(usize, T)>> = (0..matrix.nrows())
        .map(|row| {
            if row_mask.is_some_and(|mask| !mask.contains(row)) {
                return Vec::new();
            }
            matrix
                .row(row)
                .filter(|(col, _)| col_mask.is_none_or(|mask| mask.contains(*col)))
                .collect()
        })
        .collect();
    Ok(SparseMatrix::from_rows(matrix.nrows(), matrix.ncols(), rows))
}

/// Concatenates `b` after `a` along `axis`.
pub fn merge<T: Scalar>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<T>,
    axis: Axis,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    let mut result = a.clone();
    merge_into(&mut result, b, axis)?;
    Ok(result)
}

/// In-place form of [`merge`]. The original extent of `target` is captured
/// before it is resized, and only then is `b` written past it.
pub fn merge_into<T: Scalar>(
    target: &mut SparseMatrix<T>,
    b: &SparseMatrix<T>,
    axis: Axis,
) -> Result<(), SnbGraphError> {
    match axis {
        Axis::Rows => {
            if target.ncols() != b.ncols() {
                return Err(SnbGraphError::dimension(format!(
                    "row-wise merge needs equal column counts: {} != {}",
                    target.ncols(),
                    b.ncols()
                )));
            }
            let original_rows = target.nrows();
            let resized = target.resize(original_rows + b.nrows(), target.ncols());
            *target = resized.assign(b, original_rows, 0)?;
        }
        Axis::Columns => {
            if target.nrows() != b.nrows() {
                return Err(SnbGraphError::dimension(format!(
                    "column-wise merge needs equal row counts: {} != {}",
                    target.nrows(),
                    b.nrows()
                )));
            }
            let original_cols = target.ncols();
            let resized = target.resize(target.nrows(), original_cols + b.ncols());
            *target = resized.assign(b, 0, original_cols)?;
        }
    }
    Ok(())
}

fn check_same_shape<T: Scalar, U: Scalar>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<U>,
) -> Result<(), SnbGraphError> {
    if a.shape() != b.shape() {
        return Err(SnbGraphError::dimension(format!(
            "element-wise operands differ: {}x{} vs {}x{}",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    Ok(())
}

/// Union of stored positions; overlapping values are combined under `monoid`.
pub fn ewise_add<T: Scalar, M: Monoid<T>>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<T>,
    monoid: &M,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    check_same_shape(a, b)?;
    let rows: Vec<Vec<(usize, T)>> = (0..a.nrows())
        .map(|row| {
            let mut left = a.row(row).peekable();
            let mut right = b.row(row).peekable();
            let mut merged = Vec::new();
            loop {
                let entry = match (left.peek().copied(), right.peek().copied()) {
                    (Some((lc, lv)), Some((rc, rv))) if lc == rc => {
                        left.next();
                        right.next();
                        (lc, monoid.combine(lv, rv))
                    }
                    (Some((lc, lv)), Some((rc, _))) if lc < rc => {
                        left.next();
                        (lc, lv)
                    }
                    (Some(entry), None) => {
                        left.next();
                        entry
                    }
                    (_, Some(entry)) => {
                        right.next();
                        entry
                    }
                    (None, None) => break,
                };
                merged.push(entry);
            }
            merged
        })
        .collect();
    Ok(SparseMatrix::from_rows(a.nrows(), a.ncols(), rows))
}

/// Intersection of stored positions combined with `op`.
pub fn ewise_mult<T, U, V, F>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<U>,
    op: F,
) -> Result<SparseMatrix<V>, SnbGraphError>
where
    T: Scalar,
    U: Scalar,
    V: Scalar,
    F: Fn(T, U) -> V,
{
    check_same_shape(a, b)?;
    let rows: Vec<Vec<(usize, V)>> = (0..a.nrows())
        .map(|row| {
            a.row(row)
                .filter_map(|(col, lv)| b.get(row, col).map(|rv| (col, op(lv, rv))))
                .collect()
        })
        .collect();
    Ok(SparseMatrix::from_rows(a.nrows(), a.ncols(), rows))
}

/// Keeps the entries of `a` whose coordinate is stored in `structure`.
pub fn mask_structure<T: Scalar, U: Scalar>(
    a: &SparseMatrix<T>,
    structure: &SparseMatrix<U>,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    ewise_mult(a, structure, |value, _| value)
}

/// `a ⊕.⊗ b` under `semiring`, row by row with a dense accumulator.
pub fn mxm<T: Scalar, S: Semiring<T>>(
    a: &SparseMatrix<T>,
    b: &SparseMatrix<T>,
    semiring: &S,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    if a.ncols() != b.nrows() {
        return Err(SnbGraphError::dimension(format!(
            "cannot multiply {}x{} by {}x{}",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    let mut accumulator: Vec<Option<T>> = vec![None; b.ncols()];
    let mut touched: Vec<usize> = Vec::new();
    let mut rows = Vec::with_capacity(a.nrows());
    for row in 0..a.nrows() {
        for (k, lv) in a.row(row) {
            for (col, rv) in b.row(k) {
                let product = semiring.multiply(lv, rv);
                accumulator[col] = match accumulator[col] {
                    Some(current) => Some(semiring.add(current, product)),
                    None => {
                        touched.push(col);
                        Some(product)
                    }
                };
            }
        }
        touched.sort_unstable();
        let mut out = Vec::with_capacity(touched.len());
        for &col in &touched {
            if let Some(value) = accumulator[col].take() {
                out.push((col, value));
            }
        }
        touched.clear();
        rows.push(out);
    }
    Ok(SparseMatrix::from_rows(a.nrows(), b.ncols(), rows))
}

/// Matrix times column vector.
pub fn mxv<T: Scalar, S: Semiring<T>>(
    a: &SparseMatrix<T>,
    v: &SparseVector<T>,
    semiring: &S,
) -> Result<SparseVector<T>, SnbGraphError> {
    if a.ncols() != v.size() {
        return Err(SnbGraphError::dimension(format!(
            "cannot multiply {}x{} by vector of size {}",
            a.nrows(),
            a.ncols(),
            v.size()
        )));
    }
    let mut indices = Vec::new();
    let mut values = Vec::new();
    for row in 0..a.nrows() {
        let mut acc: Option<T> = None;
        for (col, lv) in a.row(row) {
            if let Some(rv) = v.get(col) {
                let product = semiring.multiply(lv, rv);
                acc = Some(acc.map_or(product, |current| semiring.add(current, product)));
            }
        }
        if let Some(value) = acc {
            indices.push(row);
            values.push(value);
        }
    }
    Ok(SparseVector::from_sorted(a.nrows(), indices, values))
}

/// Row vector times matrix.
pub fn vxm<T: Scalar, S: Semiring<T>>(
    v: &SparseVector<T>,
    a: &SparseMatrix<T>,
    semiring: &S,
) -> Result<SparseVector<T>, SnbGraphError> {
    if v.size() != a.nrows() {
        return Err(SnbGraphError::dimension(format!(
            "cannot multiply vector of size {} by {}x{}",
            v.size(),
            a.nrows(),
            a.ncols()
        )));
    }
    let mut accumulator: Vec<Option<T>> = vec![None; a.ncols()];
    for (row, lv) in v.iter() {
        for (col, rv) in a.row(row) {
            let product = semiring.multiply(lv, rv);
            accumulator[col] = Some(match accumulator[col] {
                Some(current) => semiring.add(current, product),
                None => product,
            });
        }
    }
    let (indices, values) = accumulator
        .into_iter()
        .enumerate()
        .filter_map(|(col, value)| value.map(|value| (col, value)))
        .unzip();
    Ok(SparseVector::from_sorted(a.ncols(), indices, values))
}

/// One value per row (`Axis::Rows`) or per column (`Axis::Columns`); rows or
/// columns without entries stay absent.
pub fn reduce<T: Scalar, M: Monoid<T>>(
    matrix: &SparseMatrix<T>,
    axis: Axis,
    monoid: &M,
) -> SparseVector<T> {
    match axis {
        Axis::Rows => reduce_rows(matrix, monoid),
        Axis::Columns => reduce_cols(matrix, monoid),
    }
}

pub fn reduce_rows<T: Scalar, M: Monoid<T>>(
    matrix: &SparseMatrix<T>,
    monoid: &M,
) -> SparseVector<T> {
    let mut indices = Vec::new();
    let mut values = Vec::new();
    for row in 0..matrix.nrows() {
        let folded = matrix
            .row(row)
            .map(|(_, value)| value)
            .reduce(|acc, value| monoid.combine(acc, value));
        if let Some(value) = folded {
            indices.push(row);
            values.push(value);
        }
    }
    SparseVector::from_sorted(matrix.nrows(), indices, values)
}

pub fn reduce_cols<T: Scalar, M: Monoid<T>>(
    matrix: &SparseMatrix<T>,
    monoid: &M,
) -> SparseVector<T> {
    let mut accumulator: Vec<Option<T>> = vec![None; matrix.ncols()];
    for (_, col, value) in matrix.iter() {
        accumulator[col] = Some(match accumulator[col] {
            Some(current) => monoid.combine(current, value),
            None => value,
        });
    }
    let (indices, values) = accumulator
        .into_iter()
        .enumerate()
        .filter_map(|(col, value)| value.map(|value| (col, value)))
        .unzip();
    SparseVector::from_sorted(matrix.ncols(), indices, values)
}

pub fn reduce_scalar<T: Scalar, M: Monoid<T>>(matrix: &SparseMatrix<T>, monoid: &M) -> T {
    matrix
        .iter()
        .fold(monoid.identity(), |acc, (_, _, value)| monoid.combine(acc, value))
}

pub fn transpose<T: Scalar>(matrix: &SparseMatrix<T>) -> SparseMatrix<T> {
    matrix.transpose()
}

/// `m ⊕ mᵀ` under `monoid`.
pub fn symmetrize<T: Scalar, M: Monoid<T>>(
    matrix: &SparseMatrix<T>,
    monoid: &M,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    if !matrix.is_square() {
        return Err(SnbGraphError::dimension(format!(
            "cannot symmetrize {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    ewise_add(matrix, &matrix.transpose(), monoid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Min, MinPlus, Plus};

    fn matrix(nrows: usize, ncols: usize, entries: &[(usize, usize, i64)]) -> SparseMatrix<i64> {
        SparseMatrix::from_triplets(nrows, ncols, entries.iter().copied(), |_, next| next)
            .expect("matrix")
    }

    #[test]
    fn select_keeps_shape() {
        let m = matrix(3, 3, &[(0, 0, 1), (1, 2, 2), (2, 1, 3)]);
        let selected = select(&m, Some(&Mask::from_indices([1, 2])), Some(&Mask::from_indices([2])))
            .expect("select");
        assert_eq!(selected.shape(), (3, 3));
        assert_eq!(selected.iter().collect::<Vec<_>>(), vec![(1, 2, 2)]);
    }

    #[test]
    fn select_rejects_mask_past_bound() {
        let m = matrix(2, 2, &[(0, 0, 1)]);
        let err = select(&m, Some(&Mask::from_indices([5])), None).unwrap_err();
        assert_eq!(
            err,
            SnbGraphError::MaskOutOfBounds {
                element: 5,
                bound: 2
            }
        );
    }

    #[test]
    fn min_plus_product_never_reads_absent_as_zero() {
        let a = matrix(2, 2, &[(0, 1, 4)]);
        let b = matrix(2, 2, &[(1, 0, 3), (0, 1, 0)]);
        let product = mxm(&a, &b, &MinPlus).expect("mxm");
        assert_eq!(product.iter().collect::<Vec<_>>(), vec![(0, 0, 7)]);
    }

    #[test]
    fn reductions_skip_empty_lines() {
        let m = matrix(3, 3, &[(0, 1, 2), (0, 2, 5), (2, 2, 1)]);
        let rows = reduce_rows(&m, &Plus);
        assert_eq!(rows.iter().collect::<Vec<_>>(), vec![(0, 7), (2, 1)]);
        let cols = reduce_cols(&m, &Min);
        assert_eq!(cols.iter().collect::<Vec<_>>(), vec![(1, 2), (2, 1)]);
        assert_eq!(reduce_scalar(&m, &Plus), 8);
    }
}
