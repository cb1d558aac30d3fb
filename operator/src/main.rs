//! Renders a SlurmCluster manifest into the k8s objects running the cluster.
#![deny(missing_docs)]

use std::{
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kube::ResourceExt;
use rand::{rngs::StdRng, SeedableRng};
use slurm_common::telemetry::{self, LogFormat};
use tracing::info;

use slurm_operator::{
    cluster::{decode_manifest, synthesize, ClusterIdentity},
    render,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the SlurmCluster manifest, reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Namespace used when the manifest does not set one.
    #[arg(long, short, env = "SLURM_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Format of the rendered objects.
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,

    /// Format of the log lines written to stderr.
    #[arg(long, env = "SLURM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

/// Format of the rendered objects.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Multi document YAML stream
    Yaml,
    /// One JSON document per line
    Json,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    telemetry::init(args.log_format)?;

    let manifest = read_input(args.input.as_ref())?;
    let cluster = decode_manifest(&manifest).context("decoding SlurmCluster manifest")?;
    let identity = ClusterIdentity::new(
        cluster.name_any(),
        cluster.namespace().unwrap_or(args.namespace),
    );
    info!(cluster = %identity.name, namespace = %identity.namespace, "rendering cluster");

    let manifests = synthesize(&identity, &cluster.spec, &mut StdRng::from_entropy())
        .with_context(|| format!("rendering cluster {}", identity.name))?;
    let objects = render::cluster(&manifests);

    let mut stdout = io::stdout().lock();
    for (i, object) in objects.iter().enumerate() {
        match args.output {
            OutputFormat::Yaml => {
                if i > 0 {
                    writeln!(stdout, "---")?;
                }
                write!(stdout, "{}", serde_yaml::to_string(object)?)?;
            }
            OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string(object)?)?,
        }
    }
    stdout.flush()?;
    info!(objects = objects.len(), "rendered cluster");
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        _ => {
            let mut manifest = String::new();
            io::stdin()
                .read_to_string(&mut manifest)
                .context("reading manifest from stdin")?;
            Ok(manifest)
        }
    }
}
