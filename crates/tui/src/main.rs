mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use careerline_core::source::{Payload, parse_payload};
use careerline_core::{EngineConfig, MemorySource, TimelineView};
use careerline_protocol::TimelineId;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: careerline <timeline.json> [--config <config.json>] [--log-file <path>]";

#[derive(Debug, PartialEq)]
struct Args {
    timeline: PathBuf,
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut timeline = None;
    let mut config = None;
    let mut log_file = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a path");
                };
                config = Some(PathBuf::from(path));
            }
            "--log-file" => {
                let Some(path) = args.next() else {
                    bail!("--log-file needs a path");
                };
                log_file = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ if timeline.is_none() => timeline = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    let Some(timeline) = timeline else {
        bail!("missing timeline file");
    };
    Ok(Args {
        timeline,
        config,
        log_file,
    })
}

/// Log to a file when asked; the terminal itself belongs to the UI.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env("CAREERLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let data =
                std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json(&data)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };
    init_logging(args.log_file.as_deref())?;
    let config = load_config(args.config.as_deref())?;

    let data = std::fs::read(&args.timeline)
        .with_context(|| format!("reading {}", args.timeline.display()))?;
    let (id, title, events) = match parse_payload(&data)? {
        Payload::Document(doc) => (doc.id, doc.title, doc.nodes),
        Payload::Nodes(nodes) => {
            let title = args
                .timeline
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (TimelineId(0), title, nodes)
        }
    };
    tracing::info!(%id, events = events.len(), "loaded timeline file");

    let now = renderer::now_ms();
    let mut view = TimelineView::new(config, now)?;
    let source = MemorySource::new().with_timeline(id, events);
    if !view.load_from(&source, id, now) {
        bail!("could not load {}: {:?}", args.timeline.display(), view.load_state());
    }

    renderer::run(&mut view, &title)
}
