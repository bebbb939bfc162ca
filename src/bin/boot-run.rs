//! CLI tool to run the application bootstrap against a headless document.
//!
//! Usage:
//!   boot-run
//!   boot-run <component.svelte>
//!   boot-run <component.svelte> -o <ast.json> --target app --element app
//!
//! Parses the component (or the built-in sample), writes the AST as JSON to
//! stdout or the output file, and mounts into an in-memory document.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::executor::block_on;
use rusvelte_boot::{
    BootConfig, BootPhase, Bootstrap, DEFAULT_TARGET_ID, HeadlessDocument, bundled_loader,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "boot-run", version, about = "Run the application bootstrap headlessly")]
struct Args {
    /// Component source to parse (defaults to the built-in sample)
    input: Option<PathBuf>,

    /// Write the AST here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Id of the element to mount into
    #[arg(long, default_value = DEFAULT_TARGET_ID)]
    target: String,

    /// Ids of elements present in the document (defaults to the target)
    #[arg(long = "element", value_name = "ID")]
    elements: Vec<String>,

    /// Emit single-line JSON
    #[arg(long)]
    compact: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG takes precedence, e.g. RUST_LOG=rusvelte_boot=debug
    let default_filter = if args.verbose {
        "rusvelte_boot=debug"
    } else {
        "rusvelte_boot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut config = BootConfig::default().with_target(&args.target);
    if let Some(input) = &args.input {
        let source = fs::read_to_string(input)
            .with_context(|| format!("reading component file '{}'", input.display()))?;
        config = config.with_sample(source);
    }

    let mut document = if args.elements.is_empty() {
        HeadlessDocument::with_elements([args.target.as_str()])
    } else {
        HeadlessDocument::with_elements(&args.elements)
    };

    let mut bootstrap = Bootstrap::new(config);
    let booted = block_on(bootstrap.run(bundled_loader(), &mut document))
        .with_context(|| {
            format!(
                "bootstrap into #{} failed after phase '{}'",
                bootstrap.config().target_id,
                bootstrap.phase().name()
            )
        })?;
    debug_assert_eq!(bootstrap.phase(), BootPhase::Mounted);

    let ast = booted.parser.ast();
    let json = if args.compact {
        serde_json::to_string(ast)?
    } else {
        serde_json::to_string_pretty(ast)?
    };

    if let Some(out_path) = &args.output {
        if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory for '{}'", out_path.display()))?;
        }
        fs::write(out_path, format!("{json}\n"))
            .with_context(|| format!("writing output file '{}'", out_path.display()))?;
        eprintln!(
            "Mounted into #{}, AST written to {}",
            booted.app.target_id,
            out_path.display()
        );
    } else {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}").context("writing AST to stdout")?;
        eprintln!("Mounted into #{}", booted.app.target_id);
    }

    Ok(())
}
