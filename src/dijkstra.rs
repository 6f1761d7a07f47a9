//! Plain binary-heap Dijkstra, kept as the verification reference.
//!
//! The engine never calls this; tests, the `verify` command and the
//! benchmark use it as ground truth.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;
use crate::graph::{Graph, Vertex};
use crate::state::NO_PREDECESSOR;

/// Min-heap entry ordered by distance, ties by vertex id.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueEntry {
    pub distance: f64,
    pub vertex: Vertex,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we pop the smallest distance
        // (and on ties the smallest vertex id, keeping runs reproducible).
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Distances and predecessors of a full single-source Dijkstra run.
#[derive(Debug, Clone, PartialEq)]
pub struct DijkstraResult {
    pub distances: Vec<f64>,
    pub predecessors: Vec<i32>,
}

pub fn dijkstra(graph: &Graph, source: Vertex) -> Result<DijkstraResult> {
    graph.check_vertex(source)?;
    let n = graph.n() as usize;
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors = vec![NO_PREDECESSOR; n];
    let mut heap = BinaryHeap::new();

    distances[source as usize] = 0.0;
    heap.push(QueueEntry { distance: 0.0, vertex: source });

    while let Some(entry) = heap.pop() {
        let u = entry.vertex;
        if entry.distance > distances[u as usize] {
            continue; // stale entry
        }
        for (v, w) in graph.neighbors(u) {
            let nd = entry.distance + w;
            let vi = v as usize;
            if nd < distances[vi] {
                distances[vi] = nd;
                predecessors[vi] = u as i32;
                heap.push(QueueEntry { distance: nd, vertex: v });
            }
        }
    }

    Ok(DijkstraResult { distances, predecessors })
}
