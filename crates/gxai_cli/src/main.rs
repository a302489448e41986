//! graphxai-rs CLI for k-hop subgraphs and attribution explanations.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use burn::prelude::*;
use gxai_core::backend::ExplainBackend;
use gxai_core::{
    EdgeIndex, Flow, ForwardArgs, Graph, GraphModel, GraphSpec, KHopExtractor, SubgraphExtractor,
    Target,
};
use gxai_explain::{
    AnyExplainer, CrossEntropyCriterion, Explainer, ExplainerKind, GradConfig, GradExplainer,
    GraphRequest, IntegratedGradExplainer, IntegratedGradientsConfig, NodeRequest, RandomConfig,
    RandomExplainer,
};
use gxai_models::{Gcn, GcnConfig};

use crate::config::ExplainConfig;

#[derive(Parser)]
#[command(name = "gxai")]
#[command(author, version)]
#[command(about = "Explain graph neural network predictions")]
#[command(long_about = "graphxai-rs: attribution explainers for graph neural networks.

EXAMPLES:
  # Print the 2-hop neighborhood of node 3
  gxai subgraph --graph ring.json --node 3 --hops 2

  # Explain node 3 with Integrated Gradients
  gxai explain --graph ring.json --node 3 --method ig --steps 40

  # Explain the whole graph with saliency
  gxai explain --graph ring.json --method grad

GRAPH FORMAT:
  { \"x\": [[f32, ...], ...], \"edge_index\": [[source, target], ...], \"y\": [class, ...] }

METHODS:
  ig      - Integrated Gradients [default]
  grad    - Input-gradient saliency
  random  - Seeded random scores")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the k-hop neighborhood of a node as JSON
    Subgraph {
        /// Graph JSON file
        #[arg(long, value_name = "FILE")]
        graph: PathBuf,

        /// Centre node
        #[arg(long, value_name = "N")]
        node: usize,

        /// Number of hops
        #[arg(long, default_value = "3", value_name = "K")]
        hops: usize,

        /// Edge direction to follow
        #[arg(long, value_enum, default_value = "s2t")]
        flow: FlowArg,
    },
    /// Explain a node or whole-graph prediction of a seeded GCN
    Explain {
        /// Graph JSON file
        #[arg(long, value_name = "FILE")]
        graph: PathBuf,

        /// Node to explain; the whole graph when omitted
        #[arg(long, value_name = "N")]
        node: Option<usize>,

        /// Explainer: ig, grad, random
        #[arg(long, value_name = "METHOD")]
        method: Option<ExplainerKind>,

        /// Integrated Gradients path intervals
        #[arg(long, value_name = "S")]
        steps: Option<usize>,

        /// Neighborhood size for node explanations
        #[arg(long, value_name = "K")]
        hops: Option<usize>,

        /// Hidden layer size, repeatable (e.g. --hidden 16 --hidden 16)
        #[arg(long, value_name = "H")]
        hidden: Vec<usize>,

        /// Random seed for model weights and random scores
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Min-max scale importances to [0, 1]
        #[arg(long)]
        normalize: bool,

        /// JSON config file; flags override its values
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    /// Follow edges from target back to source
    S2t,
    /// Follow edges from source to target
    T2s,
}

impl From<FlowArg> for Flow {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::S2t => Flow::SourceToTarget,
            FlowArg::T2s => Flow::TargetToSource,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Subgraph {
            graph,
            node,
            hops,
            flow,
        } => cmd_subgraph(&graph, node, hops, flow.into()),
        Commands::Explain {
            graph,
            node,
            method,
            steps,
            hops,
            hidden,
            seed,
            normalize,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => ExplainConfig::load(&path)?,
                None => ExplainConfig::default(),
            };
            if let Some(method) = method {
                cfg.method = method;
            }
            if let Some(steps) = steps {
                cfg.steps = steps;
            }
            if hops.is_some() {
                cfg.num_hops = hops;
            }
            if !hidden.is_empty() {
                cfg.hidden_sizes = hidden;
            }
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            cfg.normalize |= normalize;
            cmd_explain(&graph, node, &cfg)
        }
    }
}

fn load_graph(path: &Path) -> Result<GraphSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph {}", path.display()))?;
    let spec = GraphSpec::from_json(&text)
        .with_context(|| format!("Invalid graph JSON in {}", path.display()))?;
    tracing::info!(
        nodes = spec.x.len(),
        edges = spec.edge_index.len(),
        "Loaded graph from {}",
        path.display()
    );
    Ok(spec)
}

fn cmd_subgraph(path: &Path, node: usize, hops: usize, flow: Flow) -> Result<()> {
    let spec = load_graph(path)?;
    let ctx = KHopExtractor::new(flow)
        .extract(node, hops, &spec.edge_index, spec.x.len())
        .with_context(|| format!("Failed to extract {hops}-hop subgraph of node {node}"))?;

    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

/// Class predicted by `model` for every output row.
fn predicted_classes<M: GraphModel<ExplainBackend>>(
    model: &M,
    x: &Tensor<ExplainBackend, 2>,
    edge_index: &EdgeIndex,
    args: &ForwardArgs,
) -> Target<ExplainBackend> {
    let out = model.forward(x.clone(), edge_index, args);
    let [rows, _] = out.dims();
    Target::Classes(out.argmax(1).reshape([rows]))
}

fn build_explainer(
    model: Gcn<ExplainBackend>,
    cfg: &ExplainConfig,
) -> AnyExplainer<Gcn<ExplainBackend>, CrossEntropyCriterion> {
    match cfg.method {
        ExplainerKind::IntegratedGradients => {
            let mut ig = IntegratedGradientsConfig::new()
                .with_steps(cfg.steps)
                .with_baseline(cfg.baseline);
            ig.num_hops = cfg.num_hops;
            AnyExplainer::IntegratedGradients(IntegratedGradExplainer::with_config(
                model,
                CrossEntropyCriterion::new(),
                ig,
            ))
        }
        ExplainerKind::Grad => AnyExplainer::Grad(GradExplainer::with_config(
            model,
            CrossEntropyCriterion::new(),
            GradConfig { num_hops: cfg.num_hops },
        )),
        ExplainerKind::Random => AnyExplainer::Random(RandomExplainer::new(RandomConfig {
            seed: cfg.seed.into(),
            num_hops: cfg.num_hops,
        })),
    }
}

fn cmd_explain(path: &Path, node: Option<usize>, cfg: &ExplainConfig) -> Result<()> {
    let spec = load_graph(path)?;
    let device = Default::default();
    ExplainBackend::seed(cfg.seed);

    let graph = Graph::<ExplainBackend>::from_spec(&spec, &device).context("Invalid graph")?;
    if let Some(node) = node {
        if node >= graph.num_nodes() {
            bail!("Node {node} out of range for graph with {} nodes", graph.num_nodes());
        }
    }

    let num_classes = cfg.resolve_num_classes(spec.y.as_deref());
    let model = GcnConfig::new(graph.num_features(), num_classes)
        .with_hidden_sizes(cfg.hidden_sizes.clone())
        .with_pool(node.is_none())
        .init::<ExplainBackend>(&device);

    tracing::info!(
        method = %cfg.method,
        num_classes,
        layers = cfg.hidden_sizes.len() + 1,
        "Built GCN"
    );

    let args = ForwardArgs::new();
    let explanation = match node {
        Some(node_idx) => {
            let y = match &graph.y {
                Some(y) => y.clone(),
                None => predicted_classes(&model, &graph.x, &graph.edge_index, &args),
            };
            let explainer = build_explainer(model, cfg);
            let request = NodeRequest::new(node_idx, &graph.x, &graph.edge_index).with_y(&y);
            explainer.explain_node(&request)?
        }
        None => {
            let label = predicted_classes(&model, &graph.x, &graph.edge_index, &args);
            let explainer = build_explainer(model, cfg);
            let request = GraphRequest::new(&graph.x, &graph.edge_index).with_label(label);
            explainer.explain_graph(&request)?
        }
    };

    let explanation = if cfg.normalize {
        explanation.normalize()
    } else {
        explanation
    };
    let report = explanation.to_report()?;

    let top = explanation.top_nodes(3)?;
    tracing::info!(?top, "Most important nodes");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
