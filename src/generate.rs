//! Seeded random graph generators for tests, verification and benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::graph::{Graph, Vertex};

/// Uniform random digraph: `m` edges with endpoints drawn uniformly and
/// weights in `[min_weight, max_weight)`. Same seed, same graph.
pub fn random_graph(
    n: u32,
    m: usize,
    min_weight: f64,
    max_weight: f64,
    seed: u64,
) -> Result<Graph> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = Graph::new(n);
    if n == 0 {
        return Ok(graph);
    }
    for _ in 0..m {
        let from: Vertex = rng.gen_range(0..n);
        let to: Vertex = rng.gen_range(0..n);
        let weight = rng.gen_range(min_weight..max_weight);
        graph.add_edge(from, to, weight)?;
    }
    Ok(graph)
}

/// Random digraph in which every vertex is reachable from vertex 0: a
/// random-parent spine (each vertex i > 0 gets an edge from some earlier
/// vertex) plus `extra_edges` uniform edges on top.
pub fn random_connected_graph(
    n: u32,
    extra_edges: usize,
    min_weight: f64,
    max_weight: f64,
    seed: u64,
) -> Result<Graph> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = Graph::new(n);
    if n == 0 {
        return Ok(graph);
    }
    for v in 1..n {
        let parent: Vertex = rng.gen_range(0..v);
        let weight = rng.gen_range(min_weight..max_weight);
        graph.add_edge(parent, v, weight)?;
    }
    for _ in 0..extra_edges {
        let from: Vertex = rng.gen_range(0..n);
        let to: Vertex = rng.gen_range(0..n);
        let weight = rng.gen_range(min_weight..max_weight);
        graph.add_edge(from, to, weight)?;
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dijkstra::dijkstra;

    #[test]
    fn generation_is_deterministic() {
        let a = random_graph(50, 200, 0.1, 10.0, 7).unwrap();
        let b = random_graph(50, 200, 0.1, 10.0, 7).unwrap();
        for v in 0..50 {
            let ea: Vec<_> = a.neighbors(v).collect();
            let eb: Vec<_> = b.neighbors(v).collect();
            assert_eq!(ea, eb);
        }
        let c = random_graph(50, 200, 0.1, 10.0, 8).unwrap();
        let differs = (0..50).any(|v| {
            a.neighbors(v).collect::<Vec<_>>() != c.neighbors(v).collect::<Vec<_>>()
        });
        assert!(differs);
    }

    #[test]
    fn connected_graph_reaches_every_vertex() {
        let graph = random_connected_graph(40, 60, 0.1, 5.0, 3).unwrap();
        let result = dijkstra(&graph, 0).unwrap();
        assert!(result.distances.iter().all(|d| d.is_finite()));
    }
}
