//! Bounded multi-source shortest path (BMSSP) engine.
//!
//! Single-source shortest paths on directed graphs with non-negative
//! weights, organized around a bounded recursive driver instead of one
//! global priority queue:
//!
//! - [`pivots::find_pivots`] runs a k-step frontier relaxation and keeps
//!   only the sources whose local shortest-path trees are large enough to
//!   be worth recursing from.
//! - [`BatchHeap`] is a block-structured queue that hands the driver the M
//!   closest frontier vertices per pull and accepts bulk prepends of
//!   vertices that are known to come first.
//! - [`engine::bmssp`] composes the two level by level, falling through to
//!   a settlement-capped Dijkstra ([`engine::base_case`]) at level 0.
//!
//! Distances, shortest-path-tree parents and completion flags live in a
//! single [`SearchState`] shared by every recursive frame. Runs are fully
//! deterministic: same graph, same arguments, same completion sequence.
//!
//! ```
//! use bmssp::{shortest_paths, Graph};
//!
//! let graph = Graph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (0, 3, 5.0)]).unwrap();
//! let run = shortest_paths(&graph, 0).unwrap();
//! assert_eq!(run.distances, vec![0.0, 1.0, 2.0, 5.0]);
//! ```

pub mod batch_heap;
pub mod cli;
pub mod dijkstra;
pub mod engine;
pub mod error;
pub mod generate;
pub mod graph;
pub mod matrix;
pub mod pivots;
pub mod state;

pub use batch_heap::{BatchHeap, Pull};
pub use dijkstra::{dijkstra, DijkstraResult};
pub use engine::{base_case, bmssp, shortest_paths, BmsspOutcome, ShortestPaths};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, Vertex};
pub use pivots::{find_pivots, PivotSelection};
pub use state::{SearchState, NO_PREDECESSOR};
