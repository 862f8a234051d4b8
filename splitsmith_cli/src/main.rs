use clap::{Parser, Subcommand};
use splitsmith_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "splitsmith")]
#[command(about = "Guided stretching sessions with a drill journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided session from a routine document
    Session {
        /// Routine document (YAML or JSON)
        #[arg(long)]
        plan: PathBuf,

        /// Week number, for week-indexed routines
        #[arg(long, default_value_t = 1)]
        week: u32,

        /// Day letter, for week-indexed routines
        #[arg(long, default_value = "A")]
        day: String,
    },

    /// Print the most recent journal entries
    Report {
        /// How many entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export the full journal to CSV
    Export {
        /// Output file (defaults to splitsmith_export.csv in the data dir)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Validate routine documents against the schema
    Validate {
        /// Documents to check (defaults to the configured routines directory)
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    splitsmith_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Session { plan, week, day } => cmd_session(data_dir, plan, week, day),
        Commands::Report { limit } => cmd_report(data_dir, limit),
        Commands::Export { path } => cmd_export(data_dir, path),
        Commands::Validate { files } => cmd_validate(files, &config.routines.dir),
    }
}

fn journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("drill_log.jsonl")
}

fn cmd_session(data_dir: PathBuf, plan: PathBuf, week: u32, day: String) -> Result<()> {
    let document = load_file(&plan)?;
    let selector = Selector { week, day };
    let routine = document.resolve(Some(&selector))?;
    tracing::debug!("Resolved '{}' to {} steps", routine.name, routine.steps.len());

    let mut journal = JsonlJournal::new(journal_path(&data_dir));
    let mut clock = SystemClock;
    let mut notifier = ConsoleNotifier;
    let mut input = StdinInput;

    let today = chrono::Local::now().date_naive();
    let logged = run_session(
        &routine,
        Some(selector),
        today,
        &mut clock,
        &mut notifier,
        &mut input,
        &mut journal,
    )?;

    println!("✓ {} drills logged to {}", logged.len(), journal.path().display());
    Ok(())
}

fn cmd_report(data_dir: PathBuf, limit: usize) -> Result<()> {
    let journal = JsonlJournal::new(journal_path(&data_dir));
    let entries = journal.list_recent(limit)?;

    if entries.is_empty() {
        println!("No drills logged yet.");
        return Ok(());
    }

    println!(
        "{:<12} {:<20} {:<20} {:<6} {:>6} {:>4} {:>4} {:>5} {:>7}",
        "date", "plan", "drill", "side", "hold_s", "sets", "rpe", "pain", "rom_cm"
    );
    for e in &entries {
        println!(
            "{:<12} {:<20} {:<20} {:<6} {:>6} {:>4} {:>4} {:>5} {:>7}",
            e.date.to_string(),
            e.plan,
            e.drill,
            e.side.map(|s| s.to_string()).unwrap_or_default(),
            e.hold_s,
            e.sets,
            e.rpe,
            e.pain,
            e.rom_cm.map(|r| r.to_string()).unwrap_or_default(),
        );
    }
    println!("\n{} entries (most recent first)", entries.len());
    Ok(())
}

fn cmd_export(data_dir: PathBuf, path: Option<PathBuf>) -> Result<()> {
    let journal = JsonlJournal::new(journal_path(&data_dir));
    let path = path.unwrap_or_else(|| data_dir.join("splitsmith_export.csv"));

    let count = export_csv(&journal, &path)?;

    println!("✓ Exported {} records to {}", count, path.display());
    Ok(())
}

fn cmd_validate(files: Vec<PathBuf>, routines_dir: &Path) -> Result<()> {
    let files = if files.is_empty() {
        scan_routines_dir(routines_dir)?
    } else {
        files
    };

    if files.is_empty() {
        eprintln!("No routine documents found in {}", routines_dir.display());
        std::process::exit(1);
    }

    // Read everything first so one unreadable file never stops the batch
    let mut invalid = 0;
    let mut docs = Vec::new();
    for path in &files {
        match std::fs::read_to_string(path) {
            Ok(text) => docs.push((path.display().to_string(), text)),
            Err(e) => {
                println!("✗ {} is invalid: {}", path.display(), e);
                invalid += 1;
            }
        }
    }

    for verdict in validate_sources(docs) {
        match &verdict.result {
            Ok(()) => println!("✓ {} is valid", verdict.source_id),
            Err(e) => {
                println!("✗ {} is invalid: {}", verdict.source_id, e);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        eprintln!("{} of {} documents invalid", invalid, files.len());
        std::process::exit(1);
    }
    Ok(())
}

fn scan_routines_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") | Some("json") => files.push(path),
            _ => {}
        }
    }
    files.sort();
    Ok(files)
}

/// Console rendering of session events
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn session_started(&mut self, routine: &str, selector: Option<&Selector>) {
        match selector {
            Some(sel) => println!("=== SplitSmith: {} ({}) ===", routine, sel),
            None => println!("=== SplitSmith: {} ===", routine),
        }
    }

    fn announce_step(&mut self, step: &Step) {
        let side = step
            .side
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();
        println!("\n{}{} - {} x {}s", step.name, side, step.sets, step.hold_s);
        if let Some(cue) = &step.cue {
            println!("  {}", cue);
        }
    }

    fn set_started(&mut self, set: u32, sets: u32, hold_s: u32) {
        println!("Set {}/{}: hold {}s", set, sets, hold_s);
    }

    fn tick(&mut self, label: &str, remaining_s: u32) {
        println!("  {}: {}s remaining", label, remaining_s);
    }

    fn cue(&mut self) {
        // Terminal bell
        print!("\x07");
        let _ = io::stdout().flush();
    }

    fn append_failed(&mut self, drill: &str, error: &Error) {
        eprintln!("! Could not log '{}': {}", drill, error);
    }

    fn session_finished(&mut self, logged: usize) {
        println!("\nDone ({} drills) - hydrate, light walk 2-3 min", logged);
    }
}

/// Blocking stdin prompts
struct StdinInput;

impl InputProvider for StdinInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}> ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim_end().to_string())
    }
}
