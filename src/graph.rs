//! Directed weighted graph with the derived exploration parameters.
//!
//! The adjacency store is append-only: edges are validated as they are
//! added and the structure is treated as immutable for the duration of a
//! search. Self-loops and parallel edges are allowed; relaxation simply
//! never improves through them.

use crate::error::{Error, Result};

/// Vertex id, `0..n`
pub type Vertex = u32;

/// One outgoing edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: Vertex,
    pub weight: f64,
}

/// Directed adjacency store plus the parameters k and t derived from n.
///
/// - `k = ⌊(ln n)^(1/3)⌋`, clamped to ≥ 1: settlement budget of the base
///   case and the pivot tree-size threshold.
/// - `t = ⌊(ln n)^(2/3)⌋`, clamped to ≥ 1: level width; a level-ℓ call works
///   with batches of `2^((ℓ-1)·t)` and targets `k·2^(ℓ·t)` completions.
#[derive(Debug, Clone)]
pub struct Graph {
    adjacency: Vec<Vec<Edge>>,
    num_edges: usize,
    k: usize,
    t: usize,
}

impl Graph {
    pub fn new(n: u32) -> Self {
        let (k, t) = derive_parameters(n);
        Self {
            adjacency: vec![Vec::new(); n as usize],
            num_edges: 0,
            k,
            t,
        }
    }

    /// Build a graph from `(from, to, weight)` triples.
    pub fn from_edges(n: u32, edges: &[(Vertex, Vertex, f64)]) -> Result<Self> {
        let mut graph = Self::new(n);
        for &(from, to, weight) in edges {
            graph.add_edge(from, to, weight)?;
        }
        Ok(graph)
    }

    pub fn add_edge(&mut self, from: Vertex, to: Vertex, weight: f64) -> Result<()> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        if !(weight >= 0.0) || !weight.is_finite() {
            return Err(Error::InvalidWeight { from, to, weight });
        }
        self.adjacency[from as usize].push(Edge { to, weight });
        self.num_edges += 1;
        Ok(())
    }

    /// Number of vertices
    pub fn n(&self) -> u32 {
        self.adjacency.len() as u32
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn t(&self) -> usize {
        self.t
    }

    /// Lazy view of the out-edges of `u` as `(dest, weight)` pairs.
    #[inline]
    pub fn neighbors(&self, u: Vertex) -> impl Iterator<Item = (Vertex, f64)> + '_ {
        self.adjacency[u as usize].iter().map(|e| (e.to, e.weight))
    }

    pub fn out_degree(&self, u: Vertex) -> usize {
        self.adjacency[u as usize].len()
    }

    pub fn check_vertex(&self, v: Vertex) -> Result<()> {
        if (v as usize) < self.adjacency.len() {
            Ok(())
        } else {
            Err(Error::VertexOutOfRange { vertex: v, vertices: self.n() })
        }
    }

    /// Recursion depth for a full single-source run: `⌈log2(n)/t⌉`, at
    /// least 1. Base-2 keeps the top-level completion target `k·2^(ℓ·t)`
    /// at or above n, so a full run only stops when the frontier is spent.
    pub fn max_level(&self) -> usize {
        let n = self.adjacency.len().max(2) as f64;
        let level = (n.log2() / self.t as f64).ceil() as usize;
        level.max(1)
    }
}

fn derive_parameters(n: u32) -> (usize, usize) {
    let ln_n = f64::ln(n.max(2) as f64);
    let k = ln_n.powf(1.0 / 3.0).floor() as usize;
    let t = ln_n.powf(2.0 / 3.0).floor() as usize;
    (k.max(1), t.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_clamped_for_small_graphs() {
        let graph = Graph::new(5);
        assert_eq!(graph.k(), 1);
        assert_eq!(graph.t(), 1);
        assert!(graph.max_level() >= 1);
    }

    #[test]
    fn parameters_grow_with_n() {
        // ln(10^6) ≈ 13.8: k = ⌊13.8^(1/3)⌋ = 2, t = ⌊13.8^(2/3)⌋ = 5
        let graph = Graph::new(1_000_000);
        assert_eq!(graph.k(), 2);
        assert_eq!(graph.t(), 5);
        assert_eq!(graph.max_level(), 4);
    }

    #[test]
    fn rejects_invalid_edges() {
        let mut graph = Graph::new(3);
        assert!(matches!(
            graph.add_edge(0, 7, 1.0),
            Err(Error::VertexOutOfRange { vertex: 7, .. })
        ));
        assert!(matches!(
            graph.add_edge(0, 1, -1.0),
            Err(Error::InvalidWeight { .. })
        ));
        assert!(matches!(
            graph.add_edge(0, 1, f64::NAN),
            Err(Error::InvalidWeight { .. })
        ));
    }

    #[test]
    fn neighbors_preserve_insertion_order() {
        let graph = Graph::from_edges(4, &[(0, 2, 1.5), (0, 1, 0.5), (0, 2, 1.5)]).unwrap();
        let out: Vec<_> = graph.neighbors(0).collect();
        assert_eq!(out, vec![(2, 1.5), (1, 0.5), (2, 1.5)]);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.out_degree(0), 3);
    }
}
