//! Pivot selection: a k-step bounded Bellman-Ford expansion that decides
//! which sources are worth recursing from.
//!
//! Relaxation here is `≤`, not `<`: an equal-length alternative still
//! re-parents the vertex in the local forest, so tree sizes count every
//! source that can reach a vertex at its current distance. Distance
//! improvements are permanent; the global predecessor is rewritten only on
//! strict improvement.

use std::collections::HashMap;

use crate::error::Result;
use crate::graph::{Graph, Vertex};
use crate::state::{SearchState, NO_PREDECESSOR};

/// Result of [`find_pivots`]: `pivots ⊆ S` worth recursing from, and
/// `reached`, every vertex within k relaxation rounds whose tentative
/// distance stayed below the bound. Both preserve discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSelection {
    pub pivots: Vec<Vertex>,
    pub reached: Vec<Vertex>,
}

/// Run k rounds of frontier-restricted relaxation from `sources` and pick
/// as pivots the sources whose local shortest-path tree over the reached
/// set has at least k vertices. Bails out early with all sources as pivots
/// once the reached set outgrows `k·|S|` — at that point no pruning helps.
pub fn find_pivots(
    graph: &Graph,
    bound: f64,
    sources: &[Vertex],
    state: &mut SearchState,
) -> Result<PivotSelection> {
    let n = graph.n() as usize;
    let k = graph.k();

    let mut in_reached = vec![false; n];
    let mut reached: Vec<Vertex> = Vec::with_capacity(sources.len());
    for &s in sources {
        graph.check_vertex(s)?;
        if !in_reached[s as usize] {
            in_reached[s as usize] = true;
            reached.push(s);
        }
    }
    let source_count = reached.len();

    let mut parent: Vec<i32> = vec![NO_PREDECESSOR; n];
    let mut in_next = vec![false; n];
    let mut frontier: Vec<Vertex> = reached.clone();

    for _ in 0..k {
        let mut next: Vec<Vertex> = Vec::new();
        for &u in &frontier {
            let du = state.distances[u as usize];
            if !du.is_finite() {
                continue;
            }
            for (v, w) in graph.neighbors(u) {
                if v == u {
                    continue;
                }
                let vi = v as usize;
                let nd = du + w;
                if nd <= state.distances[vi] {
                    if nd < state.distances[vi] {
                        state.predecessors[vi] = u as i32;
                    }
                    state.distances[vi] = nd;
                    parent[vi] = u as i32;
                    if nd < bound && !in_next[vi] {
                        in_next[vi] = true;
                        next.push(v);
                    }
                }
            }
        }
        for &v in &next {
            in_next[v as usize] = false;
            let vi = v as usize;
            if !in_reached[vi] {
                in_reached[vi] = true;
                reached.push(v);
            }
        }
        if reached.len() > k * source_count {
            let pivots = reached[..source_count].to_vec();
            return Ok(PivotSelection { pivots, reached });
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    // Count each root's tree over the reached set by walking the local
    // parent chains. Zero-weight ties can knot the chain into a cycle, so
    // the walk is capped at n hops and such vertices are left uncounted.
    let mut tree_sizes: HashMap<Vertex, usize> = HashMap::new();
    for &v in &reached {
        let mut current = v as usize;
        let mut hops = 0usize;
        let mut rooted = true;
        while parent[current] != NO_PREDECESSOR {
            if hops >= n {
                rooted = false;
                break;
            }
            current = parent[current] as usize;
            hops += 1;
        }
        if rooted {
            *tree_sizes.entry(current as Vertex).or_insert(0) += 1;
        }
    }

    let mut pivots: Vec<Vertex> = Vec::new();
    for &s in &reached[..source_count] {
        if tree_sizes.get(&s).copied().unwrap_or(0) >= k {
            pivots.push(s);
        }
    }
    Ok(PivotSelection { pivots, reached })
}
