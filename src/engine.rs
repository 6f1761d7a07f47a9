//! Bounded multi-source shortest path driver.
//!
//! A level-ℓ call explores the graph below a distance bound B from a set of
//! sources and returns a (possibly tighter) bound B' together with the
//! sequence of vertices whose distances became final under it. Level 0 is a
//! settlement-capped Dijkstra per source; higher levels select pivots,
//! feed them to a [`BatchHeap`] and recurse on the batches it hands back.

use std::collections::{BinaryHeap, HashSet};

use crate::batch_heap::BatchHeap;
use crate::dijkstra::QueueEntry;
use crate::error::{Error, Result};
use crate::graph::{Graph, Vertex};
use crate::pivots::find_pivots;
use crate::state::SearchState;

/// Bound and completed-vertex sequence returned by every driver call.
/// The sequence preserves first-completion order, which makes whole runs
/// reproducible bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct BmsspOutcome {
    /// Exploration is exhaustive below this bound
    pub bound: f64,
    /// Vertices finalized by this call, in completion order
    pub completed: Vec<Vertex>,
}

/// Result of a full single-source run.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub distances: Vec<f64>,
    pub predecessors: Vec<i32>,
    /// Completion order of every vertex the run finalized
    pub completed: Vec<Vertex>,
    /// Final bound; every finite distance at or below it is exact
    pub bound: f64,
}

/// Full single-source shortest paths from `source`.
pub fn shortest_paths(graph: &Graph, source: Vertex) -> Result<ShortestPaths> {
    graph.check_vertex(source)?;
    let mut state = SearchState::new(graph.n());
    state.seed(source);
    let outcome = bmssp(
        graph,
        &mut state,
        graph.max_level(),
        f64::INFINITY,
        &[source],
    )?;
    Ok(ShortestPaths {
        distances: state.distances,
        predecessors: state.predecessors,
        completed: outcome.completed,
        bound: outcome.bound,
    })
}

/// Dijkstra from `source` over the shared state, stopping after k+1
/// settlements. Relaxation is `≤` below the bound: equal-distance vertices
/// already relaxed by an earlier pivot scan must stay reachable, otherwise
/// they would never settle. If the settlement budget was exhausted, the
/// bound tightens to the k-th smallest settled distance and only vertices
/// at or below it count as complete.
pub fn base_case(
    graph: &Graph,
    source: Vertex,
    bound: f64,
    state: &mut SearchState,
) -> Result<BmsspOutcome> {
    graph.check_vertex(source)?;
    validate_bound(bound)?;
    validate_state(graph, state)?;

    let k = graph.k();
    let mut heap: BinaryHeap<QueueEntry> = BinaryHeap::new();
    let mut in_settled: HashSet<Vertex> = HashSet::with_capacity(k + 2);
    let mut settled: Vec<Vertex> = Vec::with_capacity(k + 1);

    heap.push(QueueEntry {
        distance: state.distances[source as usize],
        vertex: source,
    });

    while settled.len() < k + 1 {
        let Some(entry) = heap.pop() else { break };
        let u = entry.vertex;
        let ui = u as usize;
        if state.complete[ui] || entry.distance > state.distances[ui] {
            continue;
        }
        if !in_settled.insert(u) {
            continue;
        }
        settled.push(u);

        let du = state.distances[ui];
        if !du.is_finite() {
            continue; // unreached source: ∞ + w ≤ ∞ must not relax
        }
        for (v, w) in graph.neighbors(u) {
            let vi = v as usize;
            if state.complete[vi] {
                continue;
            }
            let nd = du + w;
            if nd <= state.distances[vi] && nd < bound {
                state.distances[vi] = nd;
                state.predecessors[vi] = u as i32;
                heap.push(QueueEntry { distance: nd, vertex: v });
            }
        }
    }

    let outcome = if settled.len() <= k {
        BmsspOutcome { bound, completed: settled }
    } else {
        let mut order: Vec<f64> = settled
            .iter()
            .map(|&v| state.distances[v as usize])
            .collect();
        order.sort_by(f64::total_cmp);
        let cutoff = order[k - 1];
        let completed: Vec<Vertex> = settled
            .into_iter()
            .filter(|&v| state.distances[v as usize] <= cutoff)
            .collect();
        BmsspOutcome { bound: cutoff, completed }
    };
    for &v in &outcome.completed {
        state.complete[v as usize] = true;
    }
    Ok(outcome)
}

/// Recursive bounded multi-source exploration.
///
/// Level 0 runs the base case per source. A level-ℓ call pulls batches of
/// the closest queued vertices, recurses one level down on each batch, and
/// routes freshly relaxed vertices either back into the queue (distance in
/// `[B_i, B)`) or into a prepend batch (distance below `B_i`). Sources of a
/// batch that came back incomplete are re-queued through the same batch.
/// The loop stops at the level's completion target or when the queue runs
/// dry.
pub fn bmssp(
    graph: &Graph,
    state: &mut SearchState,
    level: usize,
    bound: f64,
    sources: &[Vertex],
) -> Result<BmsspOutcome> {
    validate_bound(bound)?;
    validate_state(graph, state)?;
    if sources.is_empty() {
        return Err(Error::EmptySourceSet);
    }
    for &s in sources {
        graph.check_vertex(s)?;
    }

    if level == 0 {
        let mut completed: Vec<Vertex> = Vec::new();
        let mut seen: HashSet<Vertex> = HashSet::new();
        let mut new_bound = bound;
        for &s in sources {
            let outcome = base_case(graph, s, bound, state)?;
            new_bound = new_bound.min(outcome.bound);
            for v in outcome.completed {
                if seen.insert(v) {
                    completed.push(v);
                }
            }
        }
        return Ok(BmsspOutcome { bound: new_bound, completed });
    }

    let selection = find_pivots(graph, bound, sources, state)?;

    let t = graph.t();
    let mut queue = BatchHeap::new(pow2_saturating((level - 1) * t), bound);
    for &p in &selection.pivots {
        queue.insert(p, state.distances[p as usize]);
    }

    let target = (graph.n() as usize).min(graph.k().saturating_mul(pow2_saturating(level * t)));
    let mut completed: Vec<Vertex> = Vec::new();
    let mut seen: HashSet<Vertex> = HashSet::new();

    while completed.len() < target {
        let pulled = queue.pull();
        if pulled.vertices.is_empty() {
            break;
        }
        let inner_bound = pulled.new_bound;
        let outcome = bmssp(graph, state, level - 1, inner_bound, &pulled.vertices)?;

        for &u in &outcome.completed {
            if seen.insert(u) {
                completed.push(u);
            }
        }

        // Everything below the pull bound dominates what is still queued
        // (the pull bound is the minimum remaining value), so those
        // vertices go through the prepend batch; the rest rejoin the
        // queue through ordinary inserts.
        let mut batch: Vec<(Vertex, f64)> = Vec::new();
        for &u in &outcome.completed {
            let du = state.distances[u as usize];
            if !du.is_finite() {
                continue;
            }
            for (v, w) in graph.neighbors(u) {
                let vi = v as usize;
                if state.complete[vi] {
                    continue;
                }
                let nd = du + w;
                if nd <= state.distances[vi] {
                    state.distances[vi] = nd;
                    state.predecessors[vi] = u as i32;
                    if inner_bound <= nd && nd < bound {
                        queue.insert(v, nd);
                    } else if nd < inner_bound {
                        batch.push((v, nd));
                    }
                }
            }
        }
        for &x in &pulled.vertices {
            let xi = x as usize;
            if state.complete[xi] {
                continue;
            }
            let dx = state.distances[xi];
            if dx < inner_bound {
                batch.push((x, dx));
            }
        }
        if !batch.is_empty() {
            queue.batch_prepend(batch);
        }
    }

    let mut new_bound = bound;
    if !completed.is_empty() {
        let reach = completed
            .iter()
            .map(|&v| state.distances[v as usize])
            .fold(0.0_f64, f64::max);
        new_bound = new_bound.min(reach);
    }
    for &v in &selection.reached {
        let vi = v as usize;
        if !state.complete[vi] && state.distances[vi] <= new_bound && seen.insert(v) {
            completed.push(v);
            state.complete[vi] = true;
        }
    }
    Ok(BmsspOutcome { bound: new_bound, completed })
}

fn validate_bound(bound: f64) -> Result<()> {
    // Zero is legal: pulls over an all-zero frontier legitimately hand the
    // recursion a zero bound. Negative and NaN are caller mistakes.
    if bound >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidBound(bound))
    }
}

fn validate_state(graph: &Graph, state: &SearchState) -> Result<()> {
    if state.len() == graph.n() as usize {
        Ok(())
    } else {
        Err(Error::StateSizeMismatch {
            expected: graph.n() as usize,
            actual: state.len(),
        })
    }
}

fn pow2_saturating(exp: usize) -> usize {
    if exp >= usize::BITS as usize - 1 {
        usize::MAX
    } else {
        1usize << exp
    }
}
