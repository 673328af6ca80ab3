use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use docsplit::{
    config::{Config, ResponseShape},
    logging,
    processing::{PartitionResponse, PartitionService},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "docsplit-cli",
    about = "Partition local documents with the configured partitioner"
)]
struct Cli {
    /// File or directory to partition; directories are walked recursively.
    #[arg(long)]
    input: PathBuf,
    /// Response shape override (`chunks` or `elements`).
    #[arg(long)]
    shape: Option<String>,
    /// Write JSON here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_tracing();
    dotenvy::dotenv().ok();

    let mut config = Config::from_env().context("Failed to load config from environment")?;
    if let Some(shape) = cli.shape.as_deref() {
        config.response_shape = shape.parse::<ResponseShape>().map_err(|_| {
            anyhow!("Unknown response shape '{shape}' (expected chunks or elements)")
        })?;
    }
    let service =
        PartitionService::from_config(&config).context("Failed to initialize partitioner")?;

    let files = collect_files(&cli.input)?;
    if files.is_empty() {
        bail!("No files found under {}", cli.input.display());
    }

    let mut results: BTreeMap<String, PartitionResponse> = BTreeMap::new();
    for path in files {
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let response = service
            .partition_bytes(bytes)
            .await
            .with_context(|| format!("Failed to partition {}", path.display()))?;
        tracing::info!(path = %path.display(), elements = response.len(), "Partitioned file");
        results.insert(path.display().to_string(), response);
    }

    let json = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    match cli.output {
        Some(output) => write_output(&output, &json),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write to stdout")
        }
    }
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input path {} does not exist", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut file =
        fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writeln!(file, "{contents}").with_context(|| format!("Failed to write {}", path.display()))
}
