//! Many-source distance tables.
//!
//! Each source gets its own independent single-source run with a private
//! search state; rows are computed in parallel. A single run remains
//! strictly sequential.

use rayon::prelude::*;

use crate::engine::shortest_paths;
use crate::error::Result;
use crate::graph::{Graph, Vertex};

/// One row of final distances per source, in the order given.
pub fn distance_table(graph: &Graph, sources: &[Vertex]) -> Result<Vec<Vec<f64>>> {
    sources
        .par_iter()
        .map(|&s| shortest_paths(graph, s).map(|run| run.distances))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dijkstra::dijkstra;
    use crate::generate::random_connected_graph;

    #[test]
    fn rows_match_independent_runs() {
        let graph = random_connected_graph(60, 120, 0.1, 8.0, 11).unwrap();
        let sources = [0, 5, 17, 42];
        let table = distance_table(&graph, &sources).unwrap();
        assert_eq!(table.len(), sources.len());
        for (row, &s) in table.iter().zip(&sources) {
            let reference = dijkstra(&graph, s).unwrap();
            for v in 0..row.len() {
                let got = row[v];
                let want = reference.distances[v];
                assert!(
                    (got.is_infinite() && want.is_infinite()) || (got - want).abs() < 1e-9,
                    "source {s}, vertex {v}: {got} vs {want}"
                );
            }
        }
    }

    #[test]
    fn invalid_source_fails_the_table() {
        let graph = random_connected_graph(10, 5, 0.1, 2.0, 1).unwrap();
        assert!(distance_table(&graph, &[0, 99]).is_err());
    }
}
