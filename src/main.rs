use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use pink_morsel_sales::config::{DEFAULT_DATA_DIR, DEFAULT_OUTPUT, DEFAULT_TARGET_PRODUCT};
use pink_morsel_sales::logging::init_logging;
use pink_morsel_sales::{read_dataset, PipelineConfig, QueryConfig, RegionSelector, SalesPipeline, SalesSnapshot};

#[derive(Parser)]
#[command(name = "pink-morsel")]
#[command(about = "Consolidate daily sales extracts and query pink morsel sales by region")]
#[command(version)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the extracts and write the derived dataset
    Build {
        /// Directory scanned for *.csv extracts when no --source is given
        #[arg(long, env = "PINK_MORSEL_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        /// Extract to merge (repeatable, merged in the given order)
        #[arg(long = "source")]
        sources: Vec<PathBuf>,
        /// Product to keep
        #[arg(long, env = "PINK_MORSEL_PRODUCT", default_value = DEFAULT_TARGET_PRODUCT)]
        product: String,
        /// Derived dataset to (over)write
        #[arg(long, env = "PINK_MORSEL_OUTPUT", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
    /// Show the rows for one region selector
    Query {
        /// Derived dataset written by `build`
        #[arg(long, env = "PINK_MORSEL_DATASET", default_value = DEFAULT_OUTPUT)]
        dataset: PathBuf,
        /// all, north, south, east or west
        #[arg(long, default_value = "all")]
        region: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build { data_dir, sources, product, output } => {
            let config = PipelineConfig::resolve(&data_dir, sources, &product, &output)
                .context("Failed to resolve source extracts")?;
            run_build(&config)
        }
        Commands::Query { dataset, region, json } => run_query(&QueryConfig { dataset, region, json }),
    }
}

fn run_build(config: &PipelineConfig) -> Result<()> {
    println!("🏭 Building '{}' sales dataset", config.target_product);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    info!(sources = config.sources.len(), "starting pipeline run");

    let report = SalesPipeline::new(&config.target_product)
        .run(&config.sources, &config.output)
        .with_context(|| format!("Pipeline aborted; {} left untouched", config.output.display()))?;

    for stat in &report.sources {
        println!(
            "📂 {}: {} rows, {} kept (sha256 {})",
            stat.path.display(),
            stat.rows_read,
            stat.rows_retained,
            &stat.sha256[..12]
        );
    }

    println!("\n✓ {}", report.summary());
    println!("✓ Written to {}", report.output.display());

    Ok(())
}

fn run_query(config: &QueryConfig) -> Result<()> {
    let selector: RegionSelector = config.region.parse()?;

    let records = read_dataset(&config.dataset)
        .with_context(|| format!("Failed to load dataset {}", config.dataset.display()))?;
    let snapshot = SalesSnapshot::new(records);
    let result = snapshot.query(selector);

    if config.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("📊 {}", result.label);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if result.is_empty() {
        println!("(no rows)");
        return Ok(());
    }

    for point in result.series() {
        println!("{}  {:>12}", point.date, point.sales);
    }
    println!("\n{} rows, total sales {}", result.rows.len(), result.total_sales());

    Ok(())
}
