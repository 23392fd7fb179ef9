//! docbind: generate C# bindings for NumPy from its HTML reference.
//!
//! Scrapes the routine overview pages, infers signatures and overloads from
//! the documentation text and emits a static `np` API, the `NDarray` instance
//! methods and worked-example test stubs:
//!
//! - `docbind -o src`
//! - `docbind -o src --tests test --offline --cache-dir .docbind-cache`

mod config;
mod infer;
mod loader;
mod overloads;
mod parser;
mod pipeline;
mod rules;
mod special;

use anyhow::{Context, Result};
use clap::Parser;
use config::{GeneratorConfig, OutputLayout, API_GROUPS, DEFAULT_BASE_URL, DEFAULT_REFERENCE_INDEX};
use loader::{DirStore, Fetcher, HttpFetcher, Loader, OfflineFetcher};
use pipeline::Pipeline;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Timeout of a single page request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "docbind",
    about = "Generate C# NumPy bindings from the NumPy reference documentation"
)]
struct Cli {
    /// Source root; static APIs go to <DIR>/Numpy, model classes to <DIR>/Numpy/Models
    #[arg(short = 'o', long, value_name = "DIR")]
    output: PathBuf,

    /// Test root [default: <output>/test]; stubs go to <DIR>/Numpy.UnitTest
    #[arg(long, value_name = "DIR")]
    tests: Option<PathBuf>,

    /// Directory of cached documentation pages
    #[arg(long, value_name = "DIR", default_value = ".docbind-cache")]
    cache_dir: PathBuf,

    /// Base URL of the reference pages
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Documentation index used for the completeness count
    #[arg(long, value_name = "URL", default_value = DEFAULT_REFERENCE_INDEX)]
    reference_index: String,

    /// Never touch the network; an uncached page is an error
    #[arg(long)]
    offline: bool,

    /// Retries per page fetch
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Delay before the first retry, doubled on every further one
    #[arg(long, value_name = "MS", default_value_t = 500)]
    backoff_ms: u64,

    /// Also write the declaration model as JSON next to the sources
    #[arg(long)]
    dump_json: bool,

    /// Append each declaration's JSON after its generated code
    #[arg(long)]
    print_model_json: bool,

    /// Log debug output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = DirStore::new(&cli.cache_dir)?;
    let fetcher: Box<dyn Fetcher> = if cli.offline {
        Box::new(OfflineFetcher)
    } else {
        Box::new(HttpFetcher::new(FETCH_TIMEOUT))
    };
    let loader = Loader::new(&cli.base_url, Box::new(store), fetcher)
        .with_retries(cli.retries, Duration::from_millis(cli.backoff_ms));

    let mut pipeline = Pipeline::new(loader);
    let model = pipeline.run(API_GROUPS)?;
    let generated = model.generated;

    let layout = OutputLayout::new(&cli.output, cli.tests.as_deref());
    let mut config = GeneratorConfig::numpy(layout);
    config.print_model_json = cli.print_model_json;
    let generator = config.into_generator(model);

    let report = generator.generate().context("code generation failed")?;
    info!(
        "wrote {} files, kept {} existing test files",
        report.written.len(),
        report.kept.len()
    );
    if cli.dump_json {
        let dumped = generator.generate_intermediate_json()?;
        info!("wrote {} model dumps", dumped.len());
    }

    let known = pipeline.reference_functions(&cli.reference_index)?;
    println!("Number of generated functions: {} / {}", generated, known.len());
    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
