use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{index::SparseId, loader::EdgeRow};

pub const PERSON_BASE: SparseId = 10_000_000;
pub const POST_BASE: SparseId = 20_000_000;
pub const COMMENT_BASE: SparseId = 30_000_000;

/// Synthetic social network as raw relation streams over sparse ids.
#[derive(Clone, Debug)]
pub struct SocialDataset {
    pub persons: usize,
    pub posts: usize,
    pub comments: usize,
    pub person_knows_person: Vec<EdgeRow>,
    pub post_hascreator_person: Vec<EdgeRow>,
    pub comment_hascreator_person: Vec<EdgeRow>,
    pub comment_replyof_post: Vec<EdgeRow>,
    pub comment_replyof_comment: Vec<EdgeRow>,
}

impl SocialDataset {
    pub fn person_rows(&self) -> Vec<(SparseId, Vec<String>)> {
        (0..self.persons)
            .map(|idx| (PERSON_BASE + idx as SparseId, vec![format!("Person{idx}")]))
            .collect()
    }

    pub fn knows_edges(&self) -> usize {
        self.person_knows_person.len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.persons];
        for edge in &self.person_knows_person {
            counts[(edge.left - PERSON_BASE) as usize] += 1;
            counts[(edge.right - PERSON_BASE) as usize] += 1;
        }
        counts
    }

    pub fn hub_index(&self) -> usize {
        let mut best = (0usize, 0usize);
        for (idx, deg) in self.degrees().into_iter().enumerate() {
            if deg > best.0 {
                best = (deg, idx);
            }
        }
        best.1
    }
}

#[derive(Clone, Debug)]
pub enum KnowsShape {
    Ring,
    RandomErdosRenyi { edges: usize },
    ScaleFree { m: usize },
}

/// Deterministic dataset: a friendship graph of the given shape, posts with
/// random creators, and comments that reply either to a post or to an
/// earlier comment.
pub fn generate_social(
    shape: KnowsShape,
    persons: usize,
    posts: usize,
    comments: usize,
    seed: u64,
) -> SocialDataset {
    assert!(persons > 2, "persons must exceed 2");
    assert!(posts > 0, "posts must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut person_knows_person = match shape {
        KnowsShape::Ring => ring_pairs(persons),
        KnowsShape::RandomErdosRenyi { edges } => random_pairs(persons, edges, &mut rng),
        KnowsShape::ScaleFree { m } => scale_free_pairs(persons, m, &mut rng),
    }
    .into_iter()
    .map(|(a, b)| EdgeRow::new(PERSON_BASE + a as SparseId, PERSON_BASE + b as SparseId))
    .collect::<Vec<_>>();
    person_knows_person.sort_by(|a, b| a.left.cmp(&b.left).then_with(|| a.right.cmp(&b.right)));

    let post_hascreator_person = (0..posts)
        .map(|post| {
            let creator = rng.gen_range(0..persons);
            EdgeRow::new(
                POST_BASE + post as SparseId,
                PERSON_BASE + creator as SparseId,
            )
        })
        .collect();

    let mut comment_hascreator_person = Vec::with_capacity(comments);
    let mut comment_replyof_post = Vec::new();
    let mut comment_replyof_comment = Vec::new();
    for comment in 0..comments {
        let id = COMMENT_BASE + comment as SparseId;
        let creator = rng.gen_range(0..persons);
        comment_hascreator_person.push(EdgeRow::new(id, PERSON_BASE + creator as SparseId));
        if comment == 0 || rng.gen_bool(0.4) {
            let post = rng.gen_range(0..posts);
            comment_replyof_post.push(EdgeRow::new(id, POST_BASE + post as SparseId));
        } else {
            let parent = rng.gen_range(0..comment);
            comment_replyof_comment.push(EdgeRow::new(id, COMMENT_BASE + parent as SparseId));
        }
    }

    SocialDataset {
        persons,
        posts,
        comments,
        person_knows_person,
        post_hascreator_person,
        comment_hascreator_person,
        comment_replyof_post,
        comment_replyof_comment,
    }
}

fn ring_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count).map(|idx| (idx, (idx + 1) % count)).collect()
}

fn random_pairs(node_count: usize, edge_count: usize, rng: &mut StdRng) -> Vec<(usize, usize)> {
    let total_pairs = pair_count(node_count);
    assert!(
        edge_count as u128 <= total_pairs,
        "edge_count exceeds possible pairs"
    );
    let mut pairs = Vec::with_capacity(edge_count);
    let mut idx = 0u64;
    let mut remaining_edges = edge_count as u64;
    while remaining_edges > 0 && idx < total_pairs as u64 {
        let remaining_pairs = total_pairs as u64 - idx;
        let p = remaining_edges as f64 / remaining_pairs as f64;
        idx += sample_geometric(rng, p);
        if idx >= total_pairs as u64 {
            break;
        }
        let (from, to) = pair_from_index(idx, node_count as u64);
        pairs.push((from as usize, to as usize));
        idx += 1;
        remaining_edges -= 1;
    }
    pairs
}

fn scale_free_pairs(node_count: usize, m: usize, rng: &mut StdRng) -> Vec<(usize, usize)> {
    assert!(m > 0, "m must be positive");
    assert!(node_count > m + 1, "node_count must exceed m + 1");
    let mut degrees = vec![0usize; node_count];
    let mut pairs = Vec::new();
    let seed_nodes = m + 1;
    for u in 0..seed_nodes {
        for v in (u + 1)..seed_nodes {
            pairs.push((u, v));
            degrees[u] += 1;
            degrees[v] += 1;
        }
    }
    let mut total_degree: usize = degrees.iter().sum();
    for new_node in seed_nodes..node_count {
        let mut targets = Vec::new();
        while targets.len() < m {
            let pick = rng.gen_range(0..total_degree);
            let mut cumulative = 0usize;
            for (candidate, degree) in degrees.iter().enumerate().take(new_node) {
                cumulative += degree;
                if pick < cumulative {
                    if !targets.contains(&candidate) {
                        targets.push(candidate);
                    }
                    break;
                }
            }
        }
        targets.sort_unstable();
        for target in targets {
            pairs.push((target, new_node));
            degrees[target] += 1;
            degrees[new_node] += 1;
            total_degree += 2;
        }
    }
    pairs
}

fn pair_count(nodes: usize) -> u128 {
    let n = nodes as u128;
    n * (n - 1) / 2
}

fn sample_geometric(rng: &mut StdRng, p: f64) -> u64 {
    let u = rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
    ((u.ln() / (1.0 - p).ln()).floor().max(0.0)) as u64
}

fn pair_from_index(idx: u64, nodes: u64) -> (u64, u64) {
    let mut left = 0;
    let mut start = 0u64;
    while left < nodes - 1 {
        let remaining = nodes - left - 1;
        if idx < start + remaining {
            return (left, left + 1 + (idx - start));
        }
        start += remaining;
        left += 1;
    }
    (nodes - 2, nodes - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = generate_social(KnowsShape::ScaleFree { m: 2 }, 50, 20, 100, 7);
        let b = generate_social(KnowsShape::ScaleFree { m: 2 }, 50, 20, 100, 7);
        assert_eq!(a.person_knows_person, b.person_knows_person);
        assert_eq!(a.comment_replyof_comment, b.comment_replyof_comment);
        assert_eq!(
            a.comment_replyof_post.len() + a.comment_replyof_comment.len(),
            100
        );
    }
}
