mod replay;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use stickyboard::consts::DEFAULT_API_BASE_URL;
use stickyboard::doc::{Note, NoteBoard, NoteStore};
use stickyboard::engine::EngineCore;
use stickyboard::geometry::Rect;
use stickyboard::persist::{PersistError, validate_notes};
use stickyboard::surface::{FixedLayout, Surface};
use stickyboard::sync::{HttpNotesApi, NotesApi, RemoteSync, SaveHandle, SyncConfig, SyncError, spawn_save_worker};
use tracing::info;

use crate::replay::{ReplayError, parse_rect};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid notes: {0}")]
    InvalidNotes(#[from] PersistError),
    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),
    #[error("remote save failed: {0}")]
    Sync(#[from] SyncError),
    #[error("save worker crashed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Parser, Debug)]
#[command(name = "stickyboard", about = "Sticky-notes surface replay and sync CLI")]
struct Cli {
    #[arg(long, env = "STICKYBOARD_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a pointer script against a notes file and print the resulting notes.
    Replay(ReplayArgs),
    /// Check a notes file against the stored-note schema.
    Validate {
        #[arg(long)]
        notes: String,
    },
    /// Save a notes file to the remote API once.
    Push {
        #[arg(long)]
        notes: String,
    },
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long, help = "Starting notes JSON file; omit to start empty")]
    notes: Option<String>,

    #[arg(long, default_value = "-", help = "Script file path, or - for stdin")]
    events: String,

    #[arg(long, default_value = "800x600", value_parser = parse_rect, help = "WxH or x,y,w,h")]
    surface: Rect,

    #[arg(long, value_parser = parse_rect, help = "Drop target as x,y,w,h")]
    trash: Option<Rect>,

    #[arg(long, help = "Default color for placed notes")]
    color: Option<String>,

    #[arg(long, help = "Default size for placed notes (small, medium, large)")]
    size: Option<String>,

    #[arg(long, default_value_t = false, help = "Send saves to the remote API")]
    save: bool,
}

/// Remote sync for the replay: real saves with `--save`, log lines otherwise.
enum ReplaySync {
    DryRun,
    Remote(SaveHandle),
}

impl RemoteSync for ReplaySync {
    fn request_save(&self, notes: &[Note]) {
        match self {
            Self::DryRun => info!(count = notes.len(), "save requested (dry run)"),
            Self::Remote(handle) => handle.request_save(notes),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();
    let config = SyncConfig { base_url: cli.base_url.clone(), ..SyncConfig::from_env() };

    match cli.command {
        Command::Replay(args) => run_replay(&config, args).await,
        Command::Validate { notes } => {
            let notes = read_notes(&notes)?;
            println!("ok: {} notes", notes.len());
            Ok(())
        }
        Command::Push { notes } => {
            let notes = read_notes(&notes)?;
            let api = HttpNotesApi::new(&config);
            api.save_notes(&notes).await?;
            println!("saved {} notes to {}", notes.len(), api.url());
            Ok(())
        }
    }
}

async fn run_replay(config: &SyncConfig, args: ReplayArgs) -> Result<(), CliError> {
    let notes = match &args.notes {
        Some(path) => read_notes(path)?,
        None => Vec::new(),
    };
    let script = replay::parse_script(open_input(&args.events)?)?;

    let (sync, worker) = if args.save {
        let api = Arc::new(HttpNotesApi::new(config));
        let (handle, worker) = spawn_save_worker(api, config.debounce());
        (ReplaySync::Remote(handle), Some(worker))
    } else {
        (ReplaySync::DryRun, None)
    };

    let mut board = NoteBoard::new();
    if let ReplaySync::Remote(handle) = &sync {
        board = board.with_sync(handle.clone());
    }
    board.load_snapshot(notes);

    let mut core = EngineCore::new(board, sync);
    if let Some(color) = &args.color {
        core.settings.on_color_change(color);
    }
    if let Some(size) = &args.size {
        core.settings.on_size_change(size);
    }
    let mut surface = Surface::new(FixedLayout::new(args.surface, args.trash), core);

    for (step, event) in script.into_iter().enumerate() {
        for action in replay::apply(&mut surface, event)? {
            info!(step = step + 1, ?action, "action");
        }
    }

    let result = surface.core.store.notes().to_vec();
    drop(surface);
    if let Some(worker) = worker {
        worker.await?;
    }
    print_json(&result)
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>, CliError> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|source| CliError::Open { path: path.to_owned(), source })?;
    Ok(Box::new(BufReader::new(file)))
}

fn read_notes(path: &str) -> Result<Vec<Note>, CliError> {
    let notes: Vec<Note> = serde_json::from_reader(open_input(path)?)?;
    validate_notes(&notes)?;
    Ok(notes)
}

fn print_json(notes: &[Note]) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(notes)?;
    println!("{rendered}");
    Ok(())
}
