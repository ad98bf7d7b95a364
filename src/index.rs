use std::cell::OnceCell;

use ahash::AHashMap;

use crate::SnbGraphError;

/// External vertex identifier as it appears in the source data.
pub type SparseId = u64;

/// Bidirectional mapping between sparse external ids and contiguous dense
/// indices for one vertex type.
///
/// Dense ids are handed out in first-seen order starting at 0. A sealed index
/// was populated from a complete vertex source and is never grown by relation
/// loading; an open index grows whenever a loader sees a new id.
#[derive(Clone, Debug)]
pub struct VertexIndex {
    name: String,
    dense_to_sparse: Vec<SparseId>,
    sparse_to_dense: AHashMap<SparseId, usize>,
    sealed: bool,
    attribute_rows: Vec<(SparseId, Vec<String>)>,
    // dense id -> position in `attribute_rows`, rebuilt after growth
    attribute_table: OnceCell<Vec<Option<usize>>>,
}

impl VertexIndex {
    /// Empty, growable index.
    pub fn open<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            dense_to_sparse: Vec::new(),
            sparse_to_dense: AHashMap::new(),
            sealed: false,
            attribute_rows: Vec::new(),
            attribute_table: OnceCell::new(),
        }
    }

    /// Sealed index built from a complete vertex stream.
    pub fn from_rows<N, I>(name: N, rows: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (SparseId, Vec<String>)>,
    {
        let mut index = Self::open(name);
        for (sparse, attributes) in rows {
            index.resolve(sparse, true);
            if !attributes.is_empty() {
                index.attribute_rows.push((sparse, attributes));
            }
        }
        index.sealed = true;
        index
    }

    /// Loads attribute rows for an index that was grown during relation
    /// loading. Rows for ids the index never saw are kept but unreachable.
    pub fn attach_attributes<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (SparseId, Vec<String>)>,
    {
        self.attribute_rows
            .extend(rows.into_iter().filter(|(_, attributes)| !attributes.is_empty()));
        self.attribute_table.take();
    }

    /// Marks the index as fully populated.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.dense_to_sparse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense_to_sparse.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn sparse_ids(&self) -> &[SparseId] {
        &self.dense_to_sparse
    }

    pub fn contains(&self, sparse: SparseId) -> bool {
        self.sparse_to_dense.contains_key(&sparse)
    }

    /// Dense index of `sparse`. Unseen ids get the next dense id when
    /// `auto_create` is set and yield `None` otherwise.
    pub fn resolve(&mut self, sparse: SparseId, auto_create: bool) -> Option<usize> {
        if let Some(&dense) = self.sparse_to_dense.get(&sparse) {
            return Some(dense);
        }
        if !auto_create {
            return None;
        }
        let dense = self.dense_to_sparse.len();
        self.dense_to_sparse.push(sparse);
        self.sparse_to_dense.insert(sparse, dense);
        self.attribute_table.take();
        Some(dense)
    }

    /// Read-only lookup, never grows the index.
    pub fn lookup(&self, sparse: SparseId) -> Option<usize> {
        self.sparse_to_dense.get(&sparse).copied()
    }

    pub fn reverse(&self, dense: usize) -> Result<SparseId, SnbGraphError> {
        self.dense_to_sparse
            .get(dense)
            .copied()
            .ok_or_else(|| SnbGraphError::UnknownDenseIndex {
                name: self.name.clone(),
                index: dense,
            })
    }

    /// Attribute row of a dense id, `None` when that vertex had no row.
    pub fn attributes(&self, dense: usize) -> Result<Option<&[String]>, SnbGraphError> {
        if dense >= self.len() {
            return Err(SnbGraphError::UnknownDenseIndex {
                name: self.name.clone(),
                index: dense,
            });
        }
        if self.attribute_rows.is_empty() {
            return Err(SnbGraphError::MissingAttributes(self.name.clone()));
        }
        let table = self.attribute_table.get_or_init(|| self.build_attribute_table());
        Ok(table[dense].map(|pos| self.attribute_rows[pos].1.as_slice()))
    }

    /// First dense id whose attribute row satisfies `predicate`.
    pub fn position<F>(&self, predicate: F) -> Result<Option<usize>, SnbGraphError>
    where
        F: Fn(&[String]) -> bool,
    {
        for dense in 0..self.len() {
            if let Some(row) = self.attributes(dense)? {
                if predicate(row) {
                    return Ok(Some(dense));
                }
            }
        }
        Ok(None)
    }

    /// Like [`position`](Self::position), but a missing match is a
    /// configuration error naming `what` was looked up.
    pub fn require<F>(&self, what: &str, predicate: F) -> Result<usize, SnbGraphError>
    where
        F: Fn(&[String]) -> bool,
    {
        self.position(predicate)?.ok_or_else(|| {
            SnbGraphError::configuration(format!("{what} not found in '{}'", self.name))
        })
    }

    fn build_attribute_table(&self) -> Vec<Option<usize>> {
        let mut table = vec![None; self.len()];
        for (pos, (sparse, _)) in self.attribute_rows.iter().enumerate() {
            if let Some(&dense) = self.sparse_to_dense.get(sparse) {
                if table[dense].is_none() {
                    table[dense] = Some(pos);
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_table_is_rebuilt_after_growth() {
        let mut index = VertexIndex::open("person");
        index.resolve(10, true);
        index.attach_attributes(vec![(10, vec!["Ada".into()]), (20, vec!["Bob".into()])]);
        assert_eq!(index.attributes(0).unwrap(), Some(&["Ada".to_string()][..]));

        let bob = index.resolve(20, true).unwrap();
        assert_eq!(index.attributes(bob).unwrap(), Some(&["Bob".to_string()][..]));
    }
}
