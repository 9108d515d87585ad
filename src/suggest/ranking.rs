//! Per-token ranking of the combined stage output.

use std::cmp::Ordering;

use ahash::AHashMap;

use crate::suggest::candidate::Candidate;

/// Candidate order within one original token: priority ascending, score
/// descending, suggestion ascending.
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.suggestion.cmp(&b.suggestion))
}

/// Partition `candidates` by original token, order each partition, keep the
/// top `max_per_token` with 1-based ranks, and emit the partitions in the
/// order given by `originals`.
pub fn rank(candidates: Vec<Candidate>, originals: &[String], max_per_token: usize) -> Vec<Candidate> {
    let mut partitions: AHashMap<String, Vec<Candidate>> = AHashMap::new();
    for candidate in candidates {
        partitions
            .entry(candidate.original.clone())
            .or_default()
            .push(candidate);
    }

    let mut ranked = Vec::new();
    for original in originals {
        let Some(mut group) = partitions.remove(original) else {
            continue;
        };
        group.sort_by(compare);
        group.truncate(max_per_token);
        for (index, mut candidate) in group.into_iter().enumerate() {
            candidate.rank = index + 1;
            ranked.push(candidate);
        }
    }
    ranked
}
