use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use snbgraph::{
    EngineConfig, LorLand, Mask, Rational, RelationLoader, Scalar, SparseMatrix, TraversalEngine,
    VertexIndex, bench_utils::{KnowsShape, SocialDataset, generate_social},
};

const RING_SEED: u64 = 0xDD21;
const SF_SEED: u64 = 0xFF89;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

struct PreparedGraph {
    label: &'static str,
    knows: SparseMatrix<bool>,
    replies: SparseMatrix<bool>,
    hub: usize,
}

fn bench_scale() -> usize {
    #[cfg(feature = "bench-ci")]
    {
        500
    }
    #[cfg(not(feature = "bench-ci"))]
    {
        2_000
    }
}

fn prepared_graphs() -> Vec<PreparedGraph> {
    let persons = bench_scale();
    vec![
        materialize(
            generate_social(KnowsShape::Ring, persons, persons, persons * 4, RING_SEED),
            "ring",
        ),
        materialize(
            generate_social(
                KnowsShape::ScaleFree { m: 4 },
                persons,
                persons,
                persons * 4,
                SF_SEED,
            ),
            "scalefree",
        ),
    ]
}

fn materialize(dataset: SocialDataset, label: &'static str) -> PreparedGraph {
    let mut persons = VertexIndex::from_rows("person", dataset.person_rows());
    let knows = RelationLoader::within("knows", &mut persons)
        .undirected(true)
        .load::<bool, _>(dataset.person_knows_person.clone())
        .expect("knows")
        .matrix;
    let mut comments = VertexIndex::open("comment");
    let replies = RelationLoader::within("replyOf", &mut comments)
        .load::<bool, _>(dataset.comment_replyof_comment.clone())
        .expect("replies")
        .matrix;
    PreparedGraph {
        label,
        knows,
        replies,
        hub: dataset.hub_index(),
    }
}

fn bench_closure(c: &mut Criterion) {
    let graphs = prepared_graphs();
    let engine = TraversalEngine::default();
    let mut group = c.benchmark_group("reply_closure");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for prepared in &graphs {
        let seed = prepared.replies.transpose();
        group.bench_function(prepared.label, |b| {
            b.iter(|| {
                engine
                    .transitive_closure(&seed, &prepared.replies, &LorLand)
                    .expect("closure")
            });
        });
    }
    group.finish();
}

fn bench_shortest_paths(c: &mut Criterion) {
    let graphs = prepared_graphs();
    let engine = TraversalEngine::new(EngineConfig::default()).expect("engine");
    let mut group = c.benchmark_group("shortest_paths_batched");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for prepared in &graphs {
        let weights = prepared.knows.apply(|_| Rational::ONE);
        for sources in [1usize, 16] {
            let mask: Mask = (0..sources)
                .map(|offset| (prepared.hub + offset) % weights.nrows())
                .collect();
            group.bench_with_input(
                BenchmarkId::new(prepared.label, sources),
                &mask,
                |b, mask| {
                    b.iter(|| {
                        engine
                            .shortest_paths_batched(&weights, mask, None)
                            .expect("paths")
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(
    name = traversal_benches;
    config = Criterion::default();
    targets = bench_closure, bench_shortest_paths
);
criterion_main!(traversal_benches);
