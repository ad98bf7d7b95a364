use snbgraph::{
    DuplicateRule, EdgeRow, Mask, RelationLoader, SnbGraphError, SparseId, VertexIndex,
};

fn persons(ids: &[SparseId]) -> VertexIndex {
    VertexIndex::from_rows("person", ids.iter().map(|&id| (id, Vec::new())))
}

fn rows(pairs: &[(SparseId, SparseId)]) -> Vec<EdgeRow> {
    pairs.iter().copied().map(EdgeRow::from).collect()
}

#[test]
fn test_open_sides_grow_on_first_sight() {
    let mut posts = VertexIndex::open("post");
    let mut people = persons(&[10, 20, 30]);
    let loaded = RelationLoader::between("hasCreator", &mut posts, &mut people)
        .load::<bool, _>(rows(&[(500, 20), (501, 10), (500, 30)]))
        .expect("load");
    assert_eq!(posts.len(), 2);
    assert_eq!(loaded.matrix.shape(), (2, 3));
    assert_eq!(loaded.matrix.get(0, 1), Some(true));
    assert_eq!(loaded.matrix.get(1, 0), Some(true));
    assert_eq!(loaded.matrix.get(0, 2), Some(true));
    assert_eq!(loaded.report.edges_loaded, 3);
}

#[test]
fn test_dangling_edges_are_dropped_and_counted() {
    let mut posts = VertexIndex::open("post");
    let mut people = persons(&[10, 20]);
    let loaded = RelationLoader::between("hasCreator", &mut posts, &mut people)
        .load::<u64, _>(rows(&[(1, 10), (2, 99), (3, 20)]))
        .expect("load");
    assert_eq!(loaded.report.rows_read, 3);
    assert_eq!(loaded.report.dangling_edges, 1);
    assert_eq!(loaded.report.edges_loaded, 2);
    // the post of the dangling edge is never assigned a dense id
    assert_eq!(posts.len(), 2);
    assert!(!posts.contains(2));
    assert!(matches!(
        loaded.report.ensure_no_dangling(),
        Err(SnbGraphError::DanglingReference(_))
    ));
}

#[test]
fn test_right_mask_keeps_index_and_columns() {
    let mut people = VertexIndex::open("person");
    let mut places = VertexIndex::open("place");
    for id in [100, 200, 300] {
        places.resolve(id, true);
    }
    let cities = Mask::from_indices([0, 2]);
    let loaded = RelationLoader::between("isLocatedIn", &mut people, &mut places)
        .right_mask(&cities)
        .load::<bool, _>(rows(&[(1, 100), (2, 200), (3, 300), (4, 999)]))
        .expect("load");
    assert_eq!(places.len(), 3);
    assert!(!places.contains(999));
    assert_eq!(loaded.report.masked_out, 2);
    assert!(loaded.matrix.iter().all(|(_, col, _)| cities.contains(col)));
    assert_eq!(loaded.matrix.nvals(), 2);
    // masked-out rows never reach the open left side either
    assert_eq!(people.len(), 2);
}

#[test]
fn test_left_mask_on_sealed_index() {
    let mut people = persons(&[10, 20, 30]);
    let mut forums = VertexIndex::open("forum");
    let members = Mask::from_indices([1]);
    let loaded = RelationLoader::between("hasMember", &mut people, &mut forums)
        .left_mask(&members)
        .load::<bool, _>(rows(&[(10, 7), (20, 7), (40, 8)]))
        .expect("load");
    assert_eq!(loaded.report.masked_out, 1);
    assert_eq!(loaded.report.dangling_edges, 1);
    assert_eq!(forums.len(), 1);
    assert_eq!(loaded.matrix.iter().collect::<Vec<_>>(), vec![(1, 0, true)]);
}

#[test]
fn test_mask_beyond_index_is_rejected() {
    let mut people = persons(&[10]);
    let mut forums = VertexIndex::open("forum");
    let mask = Mask::from_indices([3]);
    let err = RelationLoader::between("hasMember", &mut people, &mut forums)
        .left_mask(&mask)
        .load::<bool, _>(rows(&[(10, 1)]))
        .unwrap_err();
    assert_eq!(
        err,
        SnbGraphError::MaskOutOfBounds {
            element: 3,
            bound: 1
        }
    );
}

#[test]
fn test_undirected_self_relation_is_symmetric() {
    let mut people = persons(&[1, 2, 3]);
    let loaded = RelationLoader::within("knows", &mut people)
        .undirected(true)
        .load::<bool, _>(rows(&[(1, 2), (3, 2)]))
        .expect("load");
    let knows = loaded.matrix;
    assert_eq!(knows.shape(), (3, 3));
    assert_eq!(knows.nvals(), 4);
    assert_eq!(knows.transpose(), knows);
}

#[test]
fn test_undirected_requires_equal_sides() {
    let mut people = persons(&[1, 2]);
    let mut tags = VertexIndex::open("tag");
    let err = RelationLoader::between("hasInterest", &mut people, &mut tags)
        .undirected(true)
        .load::<bool, _>(rows(&[(1, 50)]))
        .unwrap_err();
    assert!(matches!(err, SnbGraphError::DimensionMismatch(_)));
}

#[test]
fn test_duplicate_rules() {
    let pairs = [(1, 2), (1, 2), (2, 1)];
    let mut people = persons(&[1, 2]);
    let overwrite = RelationLoader::within("likes", &mut people)
        .load::<u64, _>(rows(&pairs))
        .expect("overwrite");
    assert_eq!(overwrite.matrix.get(0, 1), Some(1));

    let accumulate = RelationLoader::within("likes", &mut people)
        .duplicates(DuplicateRule::Accumulate)
        .load::<u64, _>(rows(&pairs))
        .expect("accumulate");
    assert_eq!(accumulate.matrix.get(0, 1), Some(2));
    assert_eq!(accumulate.matrix.get(1, 0), Some(1));
}

#[test]
fn test_report_serializes() {
    let mut people = persons(&[1, 2]);
    let loaded = RelationLoader::within("knows", &mut people)
        .load::<bool, _>(rows(&[(1, 2)]))
        .expect("load");
    let json = serde_json::to_value(&loaded.report).expect("json");
    assert_eq!(json["relation"], "knows");
    assert_eq!(json["edges_loaded"], 1);
}

#[test]
fn test_row_filter_on_edge_attributes() {
    let mut people = persons(&[1, 2, 3]);
    let dated = vec![
        EdgeRow::new(1, 2).with_attributes(vec!["2011-03-01".into()]),
        EdgeRow::new(2, 3).with_attributes(vec!["2012-07-15".into()]),
    ];
    let loaded = RelationLoader::within("knows", &mut people)
        .filter(|row| row.attributes.first().is_some_and(|date| date.as_str() < "2012"))
        .load::<bool, _>(dated)
        .expect("load");
    assert_eq!(loaded.report.masked_out, 1);
    assert_eq!(loaded.matrix.iter().collect::<Vec<_>>(), vec![(0, 1, true)]);
}
