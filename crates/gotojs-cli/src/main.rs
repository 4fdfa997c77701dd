use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gotojs_contracts::GOTOJS_MANIFEST_SCHEMA_VERSION;
use gotojs_core::{transform_with, TransformOptions, Transformed};

#[derive(Parser, Debug)]
#[command(name = "gotojs")]
#[command(about = "Rewrites goto/[lbl] pseudo-statements into labeled loops.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite a single source file.
    Rewrite {
        #[arg(long)]
        r#in: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Fail on warnings (unclosed blocks, undeclared or duplicate labels).
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Write a JSON report of labels, gotos and diagnostics.
        #[arg(long)]
        report: Option<PathBuf>,
        /// If set, fail if --out differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Rewrite multiple files listed in a manifest.
    Batch {
        #[arg(long)]
        manifest: PathBuf,
        /// If set, fail if any output differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Print the diagnostics catalog as markdown.
    Diagnostics,
}

fn main() -> Result<()> {
    try_main().map_err(|err| {
        eprintln!("{err:#}");
        err
    })
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rewrite {
            r#in,
            out,
            strict,
            report,
            check,
        } => {
            let opts = TransformOptions {
                strict,
                ..TransformOptions::default()
            };
            let t = rewrite_file(&r#in, &opts)?;
            if let Some(report) = &report {
                write_report(report, &t)?;
            }
            match &out {
                Some(out) => write_output(out, &t.code, check),
                None if check => anyhow::bail!("--check requires --out"),
                None => {
                    print!("{}", t.code);
                    Ok(())
                }
            }
        }
        Command::Batch { manifest, check } => run_batch(&manifest, check),
        Command::Diagnostics => {
            print!("{}", gotojs_core::diagnostics::render_diagnostics_md());
            Ok(())
        }
    }
}

fn rewrite_file(src_path: &Path, opts: &TransformOptions) -> Result<Transformed> {
    let src = std::fs::read_to_string(src_path)
        .with_context(|| format!("read source: {}", src_path.display()))?;
    let t = transform_with(&src, opts)
        .with_context(|| format!("rewrite failed: {}", src_path.display()))?;
    for d in &t.diagnostics {
        eprintln!("{}: {d}", src_path.display());
    }
    Ok(t)
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    schema_version: String,
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    source: String,
    out: String,
    #[serde(default)]
    strict: bool,
}

fn run_batch(manifest_path: &Path, check: bool) -> Result<()> {
    let bytes = std::fs::read(manifest_path)
        .with_context(|| format!("read manifest: {}", manifest_path.display()))?;
    let m: Manifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse manifest JSON: {}", manifest_path.display()))?;
    if m.schema_version.trim() != GOTOJS_MANIFEST_SCHEMA_VERSION {
        anyhow::bail!(
            "manifest schema_version mismatch: expected {GOTOJS_MANIFEST_SCHEMA_VERSION} got {:?}",
            m.schema_version
        );
    }

    // Relative paths resolve against the manifest's directory.
    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    for (idx, e) in m.entries.iter().enumerate() {
        let opts = TransformOptions {
            strict: e.strict,
            ..TransformOptions::default()
        };
        let t = rewrite_file(&base.join(&e.source), &opts)
            .with_context(|| format!("manifest entry[{idx}]"))?;
        write_output(&base.join(&e.out), &t.code, check)
            .with_context(|| format!("manifest entry[{idx}]"))?;
    }
    Ok(())
}

fn write_report(path: &Path, t: &Transformed) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(&t.to_report_json())?;
    bytes.push(b'\n');
    write_bytes(path, &bytes).with_context(|| format!("write report: {}", path.display()))
}

fn write_output(out_path: &Path, src: &str, check: bool) -> Result<()> {
    if check {
        let cur = std::fs::read_to_string(out_path)
            .with_context(|| format!("read existing output: {}", out_path.display()))?;
        if cur != src {
            anyhow::bail!("generated output differs: {}", out_path.display());
        }
        return Ok(());
    }
    write_bytes(out_path, src.as_bytes())
        .with_context(|| format!("write output: {}", out_path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
