//! Kindred CLI
//!
//! A beatmap similarity retrieval engine.
//!
//! # Usage
//!
//! ```bash
//! # Build a .kft shard from a JSON row dump
//! kindred pack --input rows.json --output catalog.kft
//!
//! # Inspect a shard
//! kindred stats --file catalog.kft
//!
//! # Find the nearest neighbors of a (map, mods) pair
//! kindred query --shard catalog.kft --map-id 2233275 --mods 64 --max-results 10
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kindred::engine::{EngineConfig, QueryRequest, SimilarityEngine};
use kindred::format::{ShardHeader, ShardWriter, COLUMNS};
use kindred::model::QueryOutcome;
use kindred::mods::Mods;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(about = "A beatmap similarity retrieval engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .kft shard from a JSON list of rows
    ///
    /// Input format: JSON array of 12-element arrays, one per (map, mods)
    /// pair, in shard column order
    Pack {
        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output .kft file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Display statistics about a .kft shard
    Stats {
        /// Path to the .kft file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Rank the nearest neighbors of a (map, mods) pair
    Query {
        /// Shard files, concatenated in the given order
        #[arg(short, long, required = true)]
        shard: Vec<PathBuf>,

        /// Map ID of the query row
        #[arg(short, long)]
        map_id: i64,

        /// Mod bitmask of the query row
        #[arg(long, default_value = "0")]
        mods: u32,

        /// Mod bitmasks to drop from the results (repeatable)
        #[arg(long)]
        exclude_mods: Vec<u32>,

        /// Number of results
        #[arg(short = 'n', long, default_value = "10")]
        max_results: usize,

        /// Optional JSON engine config (weights, caps, falloff)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack { input, output } => {
            tracing::info!("Reading rows from {:?}", input);
            let file = std::fs::File::open(&input)?;
            let reader = std::io::BufReader::new(file);
            let rows: Vec<Vec<f64>> = serde_json::from_reader(reader)?;

            if rows.is_empty() {
                anyhow::bail!("No rows found in input");
            }

            let mut writer = ShardWriter::new(&output)?;
            for (i, row) in rows.iter().enumerate() {
                if row.len() != COLUMNS {
                    anyhow::bail!("Row {} has {} columns, expected {}", i, row.len(), COLUMNS);
                }
                writer.write_row(row)?;
            }
            let written = writer.finish()?;
            tracing::info!("Wrote {} rows to {:?}", written, output);
        }

        Commands::Stats { file } => {
            let bytes = std::fs::read(&file)?;
            let header = ShardHeader::from_bytes(&bytes)?;

            println!("Shard File: {:?}", file);
            println!("  Rows: {}", header.rows);
            println!("  Columns: {}", header.columns);
            println!(
                "  File Size: {:.2} MB",
                header.file_size() as f64 / (1024.0 * 1024.0)
            );
            if bytes.len() != header.file_size() {
                println!(
                    "  WARNING: actual size {} bytes does not match header",
                    bytes.len()
                );
            }
        }

        Commands::Query {
            shard,
            map_id,
            mods,
            exclude_mods,
            max_results,
            config,
        } => {
            let config = match config {
                Some(path) => {
                    let file = std::fs::File::open(&path)?;
                    serde_json::from_reader(std::io::BufReader::new(file))?
                }
                None => EngineConfig::default(),
            };

            let engine = SimilarityEngine::load(&shard, config)?;
            let request = QueryRequest {
                map_id,
                mods: Mods(mods),
                exclude_mods: exclude_mods.into_iter().collect::<HashSet<u32>>(),
                max_results,
            };

            match engine.query(&request)? {
                QueryOutcome::NotFound => {
                    eprintln!("No entry for map {} with mods {}", map_id, Mods(mods));
                    std::process::exit(1);
                }
                QueryOutcome::Found { results } => {
                    println!(
                        "{:<12} {:<8} {:>6} {:>7} {:>5} {:>5} {:>10}",
                        "map_id", "mods", "stars", "bpm", "cs", "ar", "similarity"
                    );
                    for row in &results {
                        println!(
                            "{:<12} {:<8} {:>6.2} {:>7.1} {:>5.1} {:>5.1} {:>10.2}",
                            row.map_id,
                            row.mods.to_string(),
                            row.star_rating,
                            row.bpm,
                            row.size,
                            row.approach_rate,
                            row.similarity
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
