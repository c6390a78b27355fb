use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use umbra::PersistenceStore as _;

#[derive(Parser, Debug)]
#[command(name = "umbra", version)]
struct Cli {
    /// Log engine decisions at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one visibility pass over a scene snapshot.
    Pass(PassArgs),
    /// Clear a persisted cumulative fog path.
    Reset(ResetArgs),
}

#[derive(Parser, Debug)]
struct PassArgs {
    /// Input scene snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path for the mutation batch JSON.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Persistence store directory; without it persisted fog lives only for this run.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Shadow worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Override the quality-derived disc tolerance (map pixels).
    #[arg(long)]
    disc_tolerance: Option<f64>,
}

#[derive(Parser, Debug)]
struct ResetArgs {
    /// Persistence store directory.
    #[arg(long)]
    store: PathBuf,

    /// Client id.
    #[arg(long)]
    client: String,

    /// Scene id.
    #[arg(long)]
    scene: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::Pass(args) => cmd_pass(args),
        Command::Reset(args) => cmd_reset(args),
    }
}

fn cmd_pass(args: PassArgs) -> anyhow::Result<()> {
    let scene = umbra::SceneSnapshot::from_path(&args.in_path)
        .with_context(|| format!("load scene '{}'", args.in_path.display()))?;

    let opts = umbra::EngineOpts {
        threads: args.threads,
        disc_tolerance: args.disc_tolerance,
        ..umbra::EngineOpts::default()
    };
    let mut engine = match &args.store {
        Some(dir) => umbra::Engine::with_opts(opts, umbra::JsonFileStore::new(dir))?,
        None => umbra::Engine::with_opts(opts, umbra::MemoryStore::new())?,
    };

    let mut host = umbra::MemoryHost::new(scene);
    let report = engine.run_pass(&mut host, true)?;

    if let Some(out) = &args.out {
        write_json(out, &report.mutations)?;
    }

    let summary = serde_json::json!({
        "outcome": format!("{:?}", report.outcome),
        "items": report.mutations.item_count(),
        "stats": report.stats.to_record(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_reset(args: ResetArgs) -> anyhow::Result<()> {
    let mut store = umbra::JsonFileStore::new(&args.store);
    store
        .clear(&args.client, &args.scene)
        .with_context(|| format!("clear '{}'/'{}'", args.client, args.scene))?;
    eprintln!("cleared {}", store.entry_path(&args.client, &args.scene).display());
    Ok(())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}
