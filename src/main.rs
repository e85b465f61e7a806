//! CLI interface for descriptor sets

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use descset::{DescriptorSet, DescriptorSetConfig, EngineKind};

#[derive(Parser)]
#[command(name = "descset")]
#[command(about = "Labelled descriptor sets with k-NN search and quorum classification", long_about = None)]
struct Cli {
    /// Directory holding the descriptor set
    #[arg(long)]
    path: PathBuf,

    /// Engine kind: flat, ivf, dense or sparse
    #[arg(long, default_value = "flat")]
    engine: EngineKind,

    /// JSON configuration file. Missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty descriptor set
    Create {
        /// Descriptor dimension
        #[arg(long)]
        dim: usize,
    },
    /// Add a descriptor
    Add {
        /// Descriptor as comma-separated values (e.g., "1.0,2.0,3.0")
        #[arg(short, long)]
        vector: String,
        /// Label id for the descriptor
        #[arg(short, long)]
        label: Option<i64>,
    },
    /// Find the nearest stored descriptors
    Search {
        /// Query descriptor as comma-separated values
        query: String,
        /// Number of results to return
        #[arg(short, long, default_value = "5")]
        k: usize,
    },
    /// Classify a descriptor by quorum vote
    Classify {
        /// Descriptor as comma-separated values
        query: String,
    },
    /// Replace the label names (e.g., 1=dog 2=cat)
    SetLabels {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// List label names
    Labels,
    /// Print stored descriptors by position
    Get {
        #[arg(required = true, allow_negative_numbers = true)]
        positions: Vec<i64>,
    },
    /// Show a summary of the descriptor set
    Info,
}

fn parse_descriptor(s: &str) -> Result<Vec<f32>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .with_context(|| format!("invalid descriptor value {:?}", v))
        })
        .collect()
}

fn parse_labels(pairs: &[String]) -> Result<BTreeMap<i64, String>> {
    let mut labels = BTreeMap::new();
    for pair in pairs {
        let Some((id, name)) = pair.split_once('=') else {
            bail!("expected <id>=<name>, got {:?}", pair);
        };
        let id = id
            .trim()
            .parse::<i64>()
            .with_context(|| format!("invalid label id in {:?}", pair))?;
        labels.insert(id, name.trim().to_string());
    }
    Ok(labels)
}

fn run(set: &DescriptorSet, command: Commands) -> Result<()> {
    match command {
        Commands::Create { dim } => {
            set.store()?;
            println!("Created {} descriptor set (dimension {})", set.kind(), dim);
        }
        Commands::Add { vector, label } => {
            let descriptor = parse_descriptor(&vector)?;
            let labels = label.map(|l| vec![l]);
            set.add(&descriptor, labels.as_deref())?;
            set.store()?;
            println!("Added descriptor at position {}", set.len() - 1);
        }
        Commands::Search { query, k } => {
            let query = parse_descriptor(&query)?;
            let results = set.search(&query, k)?;

            if results.found(0) == 0 {
                println!("No results found (set is empty)");
            } else {
                println!("Top {} results:", results.found(0));
                let neighbors: Vec<(i64, f32)> = results
                    .neighbors(0)
                    .filter(|(position, _)| *position != descset::MISSING_ID)
                    .collect();
                let positions: Vec<i64> = neighbors.iter().map(|(p, _)| *p).collect();
                let names = set.get_labels(&positions)?;
                for (i, ((position, distance), name)) in neighbors.iter().zip(names).enumerate() {
                    println!(
                        "{}. position {} (distance: {:.4}) {}",
                        i + 1,
                        position,
                        distance,
                        name
                    );
                }
            }
        }
        Commands::Classify { query } => {
            let query = parse_descriptor(&query)?;
            let labels = set.classify(&query)?;
            let names = set.label_id_to_string(&labels);
            println!("Label {} {}", labels[0], names[0]);
        }
        Commands::SetLabels { labels } => {
            set.set_labels(parse_labels(&labels)?)?;
            set.store()?;
            println!("Stored {} label names", labels.len());
        }
        Commands::Labels => {
            let labels = set.get_labels_all();
            if labels.is_empty() {
                println!("No label names");
            } else {
                for (id, name) in labels {
                    println!("{} {}", id, name);
                }
            }
        }
        Commands::Get { positions } => {
            let descriptors = set.get_descriptors(&positions)?;
            let names = set.get_labels(&positions)?;
            for ((position, descriptor), name) in positions
                .iter()
                .zip(descriptors.chunks_exact(set.dimension()))
                .zip(names)
            {
                let values: Vec<String> = descriptor.iter().map(|v| v.to_string()).collect();
                println!("{}: [{}] {}", position, values.join(", "), name);
            }
        }
        Commands::Info => {
            println!("Location:   {}", set.location().display());
            println!("Engine:     {}", set.kind());
            println!("Dimension:  {}", set.dimension());
            println!("Count:      {}", set.len());
            println!("Trained:    {}", set.is_trained());
            println!("Labels:     {}", set.get_labels_all().len());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DescriptorSetConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DescriptorSetConfig::default(),
    };

    let set = match cli.command {
        Commands::Create { dim } => DescriptorSet::create(&cli.path, dim, cli.engine, config)?,
        _ => DescriptorSet::open(&cli.path, cli.engine, config)?,
    };
    run(&set, cli.command)
}
