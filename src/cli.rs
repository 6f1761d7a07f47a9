//! CLI commands for the bmssp binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::dijkstra::dijkstra;
use crate::engine::{bmssp, shortest_paths};
use crate::generate::{random_connected_graph, random_graph};
use crate::graph::{Graph, Vertex};
use crate::state::SearchState;

#[derive(Parser)]
#[command(name = "bmssp")]
#[command(about = "Bounded multi-source shortest path engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single-source query over a graph file
    Run {
        /// Graph file: first line "n m", then m lines "from to weight"
        #[arg(short, long)]
        graph: PathBuf,

        /// Source vertex
        #[arg(short, long)]
        source: Vertex,

        /// Optional exploration bound (default: unbounded)
        #[arg(short, long)]
        bound: Option<f64>,

        /// Emit the result as JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },

    /// Cross-check the engine against reference Dijkstra on random graphs
    Verify {
        /// Vertices per generated graph
        #[arg(short, long, default_value = "500")]
        n: u32,

        /// Extra random edges on top of the reachability spine
        #[arg(short, long, default_value = "2000")]
        edges: usize,

        /// Number of independent graphs to check
        #[arg(short, long, default_value = "20")]
        queries: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate a random graph file
    Gen {
        /// Number of vertices
        #[arg(short, long)]
        n: u32,

        /// Number of edges
        #[arg(short, long)]
        edges: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Minimum edge weight
        #[arg(long, default_value = "0.1")]
        min_weight: f64,

        /// Maximum edge weight
        #[arg(long, default_value = "10.0")]
        max_weight: f64,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct RunSummary {
    source: Vertex,
    bound: f64,
    completed: Vec<Vertex>,
    /// Unreachable vertices serialize as null
    distances: Vec<f64>,
    elapsed_ms: f64,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { graph, source, bound, json } => run_query(&graph, source, bound, json),
        Commands::Verify { n, edges, queries, seed } => run_verify(n, edges, queries, seed),
        Commands::Gen { n, edges, seed, min_weight, max_weight, output } => {
            run_gen(n, edges, seed, min_weight, max_weight, &output)
        }
    }
}

fn run_query(path: &Path, source: Vertex, bound: Option<f64>, json: bool) -> Result<()> {
    let graph = load_graph(path)?;
    let start = Instant::now();

    let (distances, completed, new_bound) = match bound {
        None => {
            let run = shortest_paths(&graph, source)?;
            (run.distances, run.completed, run.bound)
        }
        Some(bound) => {
            graph.check_vertex(source)?;
            let mut state = SearchState::new(graph.n());
            state.seed(source);
            let outcome = bmssp(&graph, &mut state, graph.max_level(), bound, &[source])?;
            (state.distances, outcome.completed, outcome.bound)
        }
    };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if json {
        let summary = RunSummary {
            source,
            bound: new_bound,
            completed,
            distances,
            elapsed_ms,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let reached = distances.iter().filter(|d| d.is_finite()).count();
    println!(
        "Graph: {} vertices, {} edges (k={}, t={})",
        graph.n(),
        graph.num_edges(),
        graph.k(),
        graph.t()
    );
    println!("Source {source}: {} reachable, {} completed", reached, completed.len());
    println!("Final bound: {new_bound}");
    println!("✓ Query completed in {elapsed_ms:.2}ms");
    Ok(())
}

fn run_verify(n: u32, edges: usize, queries: usize, seed: u64) -> Result<()> {
    if n == 0 {
        bail!("need at least one vertex");
    }
    println!("Verifying {queries} random graphs ({n} vertices, ~{edges} extra edges)...");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut failures = 0usize;

    for case in 0..queries {
        let graph = random_connected_graph(n, edges, 0.05, 10.0, seed.wrapping_add(case as u64))?;
        let source: Vertex = rng.gen_range(0..n);

        let run = shortest_paths(&graph, source)?;
        let reference = dijkstra(&graph, source)?;

        let mut mismatches = 0usize;
        for v in 0..n as usize {
            let got = run.distances[v];
            let want = reference.distances[v];
            let same = (got.is_infinite() && want.is_infinite()) || (got - want).abs() < 1e-9;
            if !same {
                mismatches += 1;
            }
        }
        if mismatches > 0 {
            failures += 1;
            println!("  ✗ case {case}: source {source}, {mismatches} mismatched distances");
        } else {
            println!("  ✓ case {case}: source {source}, all {n} distances agree");
        }
    }

    if failures > 0 {
        bail!("{failures} of {queries} cases disagreed with Dijkstra");
    }
    println!("✓ All {queries} cases match the reference");
    Ok(())
}

fn run_gen(
    n: u32,
    edges: usize,
    seed: u64,
    min_weight: f64,
    max_weight: f64,
    output: &Path,
) -> Result<()> {
    if !(min_weight >= 0.0) || !(max_weight > min_weight) {
        bail!("weights must satisfy 0 <= min < max, got [{min_weight}, {max_weight})");
    }
    let graph = random_graph(n, edges, min_weight, max_weight, seed)?;
    save_graph(&graph, output)?;
    println!("✓ Wrote {} vertices, {} edges to {}", n, graph.num_edges(), output.display());
    Ok(())
}

/// Parse a graph file: header "n m", then one "from to weight" line per
/// edge. Blank lines and lines starting with '#' are skipped.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading graph file {}", path.display()))?;
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'));

    let header = lines.next().context("graph file is empty")?;
    let mut parts = header.split_whitespace();
    let n: u32 = parts
        .next()
        .context("missing vertex count")?
        .parse()
        .context("vertex count is not a number")?;
    let m: usize = parts
        .next()
        .context("missing edge count")?
        .parse()
        .context("edge count is not a number")?;

    let mut graph = Graph::new(n);
    for (i, line) in lines.enumerate() {
        let mut parts = line.split_whitespace();
        let from: Vertex = parts
            .next()
            .with_context(|| format!("edge line {i}: missing source"))?
            .parse()?;
        let to: Vertex = parts
            .next()
            .with_context(|| format!("edge line {i}: missing destination"))?
            .parse()?;
        let weight: f64 = parts
            .next()
            .with_context(|| format!("edge line {i}: missing weight"))?
            .parse()?;
        graph.add_edge(from, to, weight)?;
    }
    if graph.num_edges() != m {
        bail!(
            "header promised {m} edges, file contains {}",
            graph.num_edges()
        );
    }
    Ok(graph)
}

pub fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", graph.n(), graph.num_edges()));
    for u in 0..graph.n() {
        for (v, w) in graph.neighbors(u) {
            out.push_str(&format!("{u} {v} {w}\n"));
        }
    }
    fs::write(path, out).with_context(|| format!("writing graph file {}", path.display()))?;
    Ok(())
}
