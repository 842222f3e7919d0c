use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fieldboard::board::{Board, BoardError};
use fieldboard::config::{BoardConfig, ConfigError};
use fieldboard::engine::Viewport;
use fieldboard::replay::{ReplayScript, run_script};
use fieldboard::scene::{FieldSize, Orientation, Scene, SceneError};
use fieldboard::surface::RecordingSurface;
use tracing::info;

/// Field used when no scene file is given (a full-size pitch, in meters).
const DEFAULT_FIELD: FieldSize = FieldSize { width: 105.0, height: 68.0 };

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("invalid replay script: {0}")]
    Script(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "fieldboard", about = "Tactics board engine tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a pointer script against a scene and write the result.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Scene snapshot to start from; an empty pitch when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// JSON replay script.
    #[arg(long)]
    script: PathBuf,

    /// JSON board config; `FIELDBOARD_*` variables override it.
    #[arg(long, env = "FIELDBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the resulting snapshot; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Viewport in CSS pixels, `WIDTHxHEIGHT`.
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    viewport: Viewport,
}

fn parse_viewport(raw: &str) -> Result<Viewport, String> {
    let (w, h) = raw.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width {w:?}"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height {h:?}"))?;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(format!("viewport must be positive, got {raw:?}"));
    }
    Ok(Viewport { width, height })
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => run_replay(args),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => BoardConfig::from_path(path)?.with_env()?,
        None => BoardConfig::from_env()?,
    };
    let scene = match &args.scene {
        Some(path) => Scene::from_json(&read(path)?)?,
        None => Scene::new(DEFAULT_FIELD, Orientation::Landscape),
    };
    let script = ReplayScript::from_json(&read(&args.script)?)?;

    let mut board = Board::new(RecordingSurface::new(), args.viewport, scene, &config)?;
    let summary = run_script(&mut board, &script)?;
    board.on_animation_frame(0.0);

    let scene = board.scene();
    info!(
        steps = summary.steps,
        events = summary.events,
        undos = summary.undos,
        redos = summary.redos,
        tokens = scene.tokens.len(),
        drawings = scene.drawings.len(),
        surface_ops = board.engine().surface().ops().len(),
        "replay finished"
    );

    let json = scene.to_json()?;
    match &args.out {
        Some(path) => std::fs::write(path, json).map_err(|source| CliError::Write { path: path.clone(), source })?,
        None => println!("{json}"),
    }
    Ok(())
}
