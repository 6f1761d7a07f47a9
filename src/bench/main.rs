//! Benchmark harness: engine vs. reference Dijkstra on random graphs.
//!
//! Reports p50/p95/p99 per algorithm plus a sanity comparison of the
//! produced distances.

use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use hdrhistogram::Histogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bmssp::dijkstra::dijkstra;
use bmssp::engine::shortest_paths;
use bmssp::generate::random_connected_graph;
use bmssp::graph::Vertex;

#[derive(Parser)]
#[command(name = "bmssp-bench")]
#[command(about = "Benchmark the bmssp engine against reference Dijkstra")]
struct Cli {
    /// Number of vertices
    #[arg(short, long, default_value = "100000")]
    n: u32,

    /// Extra random edges on top of the reachability spine
    #[arg(short, long, default_value = "400000")]
    edges: usize,

    /// Number of query sources
    #[arg(short, long, default_value = "50")]
    queries: usize,

    /// Random seed for graph and source sampling
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn percentiles(label: &str, hist: &Histogram<u64>) {
    println!(
        "  {label}: p50={}us p95={}us p99={}us max={}us",
        hist.value_at_quantile(0.50),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!(
        "Building random graph: {} vertices, ~{} edges (seed {})",
        cli.n,
        cli.edges + cli.n as usize,
        cli.seed
    );
    let build_start = Instant::now();
    let graph = random_connected_graph(cli.n, cli.edges, 0.05, 10.0, cli.seed)?;
    println!(
        "Graph ready in {:.2}s (k={}, t={}, levels={})",
        build_start.elapsed().as_secs_f64(),
        graph.k(),
        graph.t(),
        graph.max_level()
    );

    let mut rng = StdRng::seed_from_u64(cli.seed ^ 0x5eed);
    let sources: Vec<Vertex> = (0..cli.queries).map(|_| rng.gen_range(0..cli.n)).collect();

    let mut engine_hist = Histogram::<u64>::new(3)?;
    let mut reference_hist = Histogram::<u64>::new(3)?;
    let mut disagreements = 0usize;

    for &source in &sources {
        let start = Instant::now();
        let run = shortest_paths(&graph, source)?;
        engine_hist.record(start.elapsed().as_micros() as u64)?;

        let start = Instant::now();
        let reference = dijkstra(&graph, source)?;
        reference_hist.record(start.elapsed().as_micros() as u64)?;

        let mismatch = run
            .distances
            .iter()
            .zip(&reference.distances)
            .any(|(&a, &b)| !((a.is_infinite() && b.is_infinite()) || (a - b).abs() < 1e-9));
        if mismatch {
            disagreements += 1;
        }
    }

    println!("\n=== RESULTS ({} queries) ===", cli.queries);
    percentiles("bmssp   ", &engine_hist);
    percentiles("dijkstra", &reference_hist);

    if disagreements > 0 {
        bail!("{disagreements} queries disagreed with the reference");
    }
    println!("✓ All queries agree with the reference");
    Ok(())
}
