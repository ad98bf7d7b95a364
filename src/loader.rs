use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{
    SnbGraphError,
    algebra::{Plus, Scalar},
    index::{SparseId, VertexIndex},
    mask::Mask,
    matrix::SparseMatrix,
    ops,
};

/// One row of a relation stream: `left -[relation]-> right`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRow {
    pub left: SparseId,
    pub right: SparseId,
    pub attributes: Vec<String>,
}

impl EdgeRow {
    pub fn new(left: SparseId, right: SparseId) -> Self {
        Self {
            left,
            right,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

impl From<(SparseId, SparseId)> for EdgeRow {
    fn from((left, right): (SparseId, SparseId)) -> Self {
        Self::new(left, right)
    }
}

/// How repeated `(left, right)` pairs are folded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateRule {
    /// The last occurrence wins.
    #[default]
    Overwrite,
    /// Occurrences are summed (OR for boolean relations).
    Accumulate,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub relation: String,
    pub rows_read: usize,
    pub edges_loaded: usize,
    pub dangling_edges: usize,
    pub masked_out: usize,
}

impl LoadReport {
    pub fn has_dangling(&self) -> bool {
        self.dangling_edges > 0
    }

    /// Escalates dropped dangling edges for callers that want strict input.
    pub fn ensure_no_dangling(&self) -> Result<(), SnbGraphError> {
        if self.has_dangling() {
            return Err(SnbGraphError::dangling(format!(
                "{} dangling edges dropped from '{}'",
                self.dangling_edges, self.relation
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedRelation<T> {
    pub matrix: SparseMatrix<T>,
    pub report: LoadReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

enum Endpoints<'a> {
    Between(&'a mut VertexIndex, &'a mut VertexIndex),
    Within(&'a mut VertexIndex),
}

impl Endpoints<'_> {
    fn side(&mut self, side: Side) -> &mut VertexIndex {
        match (self, side) {
            (Endpoints::Between(left, _), Side::Left) => left,
            (Endpoints::Between(_, right), Side::Right) => right,
            (Endpoints::Within(index), _) => index,
        }
    }

    fn peek(&self, side: Side) -> &VertexIndex {
        match (self, side) {
            (Endpoints::Between(left, _), Side::Left) => left,
            (Endpoints::Between(_, right), Side::Right) => right,
            (Endpoints::Within(index), _) => index,
        }
    }
}

enum Resolution {
    Found(usize),
    Pending,
    Masked,
    Dangling,
}

/// Turns a relation stream into a sparse matrix over the dense spaces of two
/// vertex indices.
pub struct RelationLoader<'a> {
    name: String,
    endpoints: Endpoints<'a>,
    left_mask: Option<&'a Mask>,
    right_mask: Option<&'a Mask>,
    undirected: bool,
    duplicates: DuplicateRule,
    filter: Option<Box<dyn Fn(&EdgeRow) -> bool + 'a>>,
}

impl<'a> RelationLoader<'a> {
    pub fn between<N: Into<String>>(
        name: N,
        left: &'a mut VertexIndex,
        right: &'a mut VertexIndex,
    ) -> Self {
        Self::with_endpoints(name.into(), Endpoints::Between(left, right))
    }

    /// Relation whose both endpoints live in the same vertex index.
    pub fn within<N: Into<String>>(name: N, index: &'a mut VertexIndex) -> Self {
        Self::with_endpoints(name.into(), Endpoints::Within(index))
    }

    fn with_endpoints(name: String, endpoints: Endpoints<'a>) -> Self {
        Self {
            name,
            endpoints,
            left_mask: None,
            right_mask: None,
            undirected: false,
            duplicates: DuplicateRule::Overwrite,
            filter: None,
        }
    }

    pub fn left_mask(mut self, mask: &'a Mask) -> Self {
        self.left_mask = Some(mask);
        self
    }

    pub fn right_mask(mut self, mask: &'a Mask) -> Self {
        self.right_mask = Some(mask);
        self
    }

    pub fn undirected(mut self, undirected: bool) -> Self {
        self.undirected = undirected;
        self
    }

    pub fn duplicates(mut self, rule: DuplicateRule) -> Self {
        self.duplicates = rule;
        self
    }

    /// Rows rejected by `keep` (for example on an edge date attribute) are
    /// counted as masked out.
    pub fn filter<F>(mut self, keep: F) -> Self
    where
        F: Fn(&EdgeRow) -> bool + 'a,
    {
        self.filter = Some(Box::new(keep));
        self
    }

    #[instrument(skip_all, fields(relation = %self.name))]
    pub fn load<T, I>(mut self, rows: I) -> Result<LoadedRelation<T>, SnbGraphError>
    where
        T: Scalar,
        I: IntoIterator<Item = EdgeRow>,
    {
        if let Some(mask) = self.left_mask {
            mask.check_bound(self.endpoints.peek(Side::Left).len())?;
        }
        if let Some(mask) = self.right_mask {
            mask.check_bound(self.endpoints.peek(Side::Right).len())?;
        }

        let mut report = LoadReport {
            relation: self.name.clone(),
            ..LoadReport::default()
        };
        let mut triplets: Vec<(usize, usize, T)> = Vec::new();

        for row in rows {
            report.rows_read += 1;
            if self.filter.as_ref().is_some_and(|keep| !keep(&row)) {
                report.masked_out += 1;
                continue;
            }
            let left = self.check(Side::Left, row.left);
            let right = self.check(Side::Right, row.right);
            match (&left, &right) {
                (Resolution::Dangling, _) | (_, Resolution::Dangling) => {
                    debug!(
                        left = row.left,
                        right = row.right,
                        "dropping dangling edge ({}:{})-[{}]-({}:{})",
                        self.endpoints.peek(Side::Left).name(),
                        row.left,
                        self.name,
                        self.endpoints.peek(Side::Right).name(),
                        row.right
                    );
                    report.dangling_edges += 1;
                    continue;
                }
                (Resolution::Masked, _) | (_, Resolution::Masked) => {
                    report.masked_out += 1;
                    continue;
                }
                _ => {}
            }
            let (Some(from), Some(to)) = (
                self.finish(Side::Left, row.left, left),
                self.finish(Side::Right, row.right, right),
            ) else {
                report.dangling_edges += 1;
                continue;
            };
            triplets.push((from, to, T::ONE));
        }

        let nrows = self.endpoints.peek(Side::Left).len();
        let ncols = self.endpoints.peek(Side::Right).len();
        let mut matrix = match self.duplicates {
            DuplicateRule::Overwrite => {
                SparseMatrix::from_triplets(nrows, ncols, triplets, |_, next| next)?
            }
            DuplicateRule::Accumulate => {
                SparseMatrix::from_triplets(nrows, ncols, triplets, |acc: T, next| acc.plus(next))?
            }
        };
        if self.undirected {
            matrix = ops::symmetrize(&matrix, &Plus)?;
        }
        report.edges_loaded = matrix.nvals();

        if report.has_dangling() {
            warn!(
                relation = %self.name,
                dangling = report.dangling_edges,
                "dropped dangling edges"
            );
        }
        debug!(
            rows = report.rows_read,
            edges = report.edges_loaded,
            masked_out = report.masked_out,
            nrows,
            ncols,
            "relation loaded"
        );
        Ok(LoadedRelation { matrix, report })
    }

    /// Mask checks run against the index as it stands, never creating ids.
    fn check(&self, side: Side, sparse: SparseId) -> Resolution {
        let index = self.endpoints.peek(side);
        let mask = match side {
            Side::Left => self.left_mask,
            Side::Right => self.right_mask,
        };
        match (index.lookup(sparse), mask) {
            (Some(dense), Some(mask)) if mask.contains(dense) => Resolution::Found(dense),
            (Some(_), Some(_)) => Resolution::Masked,
            (None, Some(_)) if index.is_sealed() => Resolution::Dangling,
            (None, Some(_)) => Resolution::Masked,
            (Some(dense), None) => Resolution::Found(dense),
            (None, None) if index.is_sealed() => Resolution::Dangling,
            (None, None) => Resolution::Pending,
        }
    }

    fn finish(&mut self, side: Side, sparse: SparseId, resolution: Resolution) -> Option<usize> {
        match resolution {
            Resolution::Found(dense) => Some(dense),
            Resolution::Pending => {
                let index = self.endpoints.side(side);
                let auto_create = !index.is_sealed();
                index.resolve(sparse, auto_create)
            }
            Resolution::Masked | Resolution::Dangling => None,
        }
    }
}
