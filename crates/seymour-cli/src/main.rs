use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::{ColoredString, Colorize};
use tracing::{warn, Level};

use seymour_core::color;
use seymour_core::export;
use seymour_core::{
    detect_pattern, detect_word_match, duplicate_groups, load_catalog_file, pieces_with_pattern,
    pieces_with_words, rebuild, search_by_hex, strip_formatting, AnalysisSettings, Analyzer,
    CollectionStats, ColorCatalog, Config, FlushOutcome, FlushWorker, JsonFileSink,
    MatchCandidate, PieceCategory, RebuildKind, Record, RecordSink, RecordStore, Result,
    SeymourError, Session, UserData,
};

mod args;
mod input;
use args::{
    Cli, CollectionAction, ColorAction, Commands, ConfigAction, ExportFormat, RebuildTarget,
    Shell, WordAction,
};

const CATALOG_FILE: &str = "colors.json";
/// Observations handed to the session per step while scanning
const SCAN_CHUNK: usize = 64;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.base_dir);
    let paths = Paths {
        catalog: cli.catalog.unwrap_or_else(|| base_dir.join(CATALOG_FILE)),
        base_dir,
    };

    let result = match cli.command {
        Some(Commands::Classify { hex, name, all }) => {
            handle_classify(&paths, &hex, name.as_deref(), all)
        }
        Some(Commands::Pattern { hex }) => handle_pattern(&paths, &hex),
        Some(Commands::Color { action }) => handle_color(action, &paths),
        Some(Commands::Word { action }) => handle_word(action, &paths),
        Some(Commands::Config { action }) => handle_config(action, &paths.base_dir),
        Some(Commands::Scan {
            input,
            export,
            format,
            output,
        }) => handle_scan(&paths, &input, export, format, output.as_deref()).await,
        Some(Commands::Collection { action }) => handle_collection(action, &paths),
        Some(Commands::Rebuild { target }) => handle_rebuild(target, &paths),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("SEYMOUR_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".seymour"))
        .unwrap_or_else(|| PathBuf::from(".seymour"))
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "seymour", &mut io::stdout());
}

/// Resolved on-disk locations for one invocation
struct Paths {
    base_dir: PathBuf,
    catalog: PathBuf,
}

impl Paths {
    /// Reference palettes plus the user's custom colors.
    /// A missing catalog file yields custom colors only.
    fn load_catalog(&self, data: &UserData) -> Result<Arc<ColorCatalog>> {
        let catalog = if self.catalog.exists() {
            ColorCatalog::from_data(load_catalog_file(&self.catalog)?)
        } else {
            warn!(
                path = %self.catalog.display(),
                "color catalog not found, using custom colors only"
            );
            ColorCatalog::default()
        };
        Ok(Arc::new(catalog.with_custom_colors(data.custom_colors.clone())))
    }

    fn open_store(&self, config: &Config) -> Result<Arc<RecordStore>> {
        let sink: Arc<dyn RecordSink> =
            Arc::new(JsonFileSink::new(config.store.collection_path(&self.base_dir)));
        Ok(Arc::new(RecordStore::open(sink)?))
    }
}

fn ensure_saved(outcome: FlushOutcome) -> Result<()> {
    match outcome {
        FlushOutcome::Failed(message) => Err(SeymourError::PersistFailed { message }),
        _ => Ok(()),
    }
}

fn parse_hex(input: &str) -> Result<String> {
    color::normalize_hex(input).ok_or_else(|| SeymourError::InvalidHex {
        input: input.to_string(),
    })
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

// ----------------------------------------------------------------------------
// Display helpers
// ----------------------------------------------------------------------------

fn swatch(hex: &str) -> ColoredString {
    let rgb = color::hex_to_rgb(hex);
    let label = format!(" #{} ", hex.to_ascii_uppercase());
    let label = if color::is_dark(hex) {
        label.white()
    } else {
        label.black()
    };
    label.on_truecolor(rgb.r, rgb.g, rgb.b)
}

fn tier_label(tier: u8) -> ColoredString {
    let label = format!("T{}", tier);
    match tier {
        0 => label.green().bold(),
        1 => label.green(),
        2 => label.yellow(),
        _ => label.dimmed(),
    }
}

fn print_candidate(rank: usize, candidate: &MatchCandidate) {
    println!(
        "  {}. {} {:<32} ΔE {:>6.2}  Abs {:>3}  {} {}",
        rank,
        swatch(&candidate.target_hex),
        candidate.name,
        candidate.delta_e,
        candidate.absolute_distance,
        tier_label(candidate.tier),
        candidate.source.as_str().dimmed()
    );
}

fn print_record(record: &Record) {
    let best = match &record.best_match {
        Some(m) => format!("{} {} (ΔE {:.2})", tier_label(m.tier), m.name, m.delta_e),
        None => "N/A".dimmed().to_string(),
    };
    let mut line = format!(
        "  {} {:<16} {:<24} {}",
        swatch(&record.hex),
        record.id.dimmed(),
        record.display_name,
        best
    );
    if let Some(pattern) = &record.special_pattern {
        line.push_str(&format!("  {}", pattern.to_string().magenta()));
    }
    if let Some(word) = &record.word_match {
        line.push_str(&format!("  {}", word.cyan()));
    }
    println!("{}", line);
}

// ----------------------------------------------------------------------------
// Matching
// ----------------------------------------------------------------------------

fn handle_classify(paths: &Paths, hex: &str, name: Option<&str>, all: bool) -> Result<()> {
    let hex = parse_hex(hex)?;
    let config = Config::load(&paths.base_dir)?;
    let data = UserData::load(&paths.base_dir)?;
    let analyzer = Analyzer::new(paths.load_catalog(&data)?);
    let policy = config.match_policy();
    let category = name
        .map(|n| PieceCategory::infer(&strip_formatting(n)))
        .unwrap_or_default();

    let candidates = if all {
        analyzer.ranker().ranked_candidates(&hex, category, &policy)
    } else {
        analyzer
            .ranker()
            .rank(&hex, category, &policy)
            .map(|result| result.top3)
            .unwrap_or_default()
    };

    println!();
    println!("{}  {}", swatch(&hex), category.to_string().dimmed());
    println!();
    if candidates.is_empty() {
        println!("  No matching colors. Check the catalog or the [filters] config.");
    } else {
        for (i, candidate) in candidates.iter().enumerate() {
            print_candidate(i + 1, candidate);
        }
    }
    println!();

    Ok(())
}

fn handle_pattern(paths: &Paths, hex: &str) -> Result<()> {
    let hex = parse_hex(hex)?;
    let data = UserData::load(&paths.base_dir)?;

    println!("{}", swatch(&hex));
    match detect_pattern(&hex) {
        Some(pattern) => println!("  {} {}", "Pattern:".cyan(), pattern),
        None => println!("  {} {}", "Pattern:".cyan(), "none".dimmed()),
    }
    match detect_word_match(&hex, &data.words) {
        Some(word) => println!("  {} {}", "Word:".cyan(), word),
        None => println!("  {} {}", "Word:".cyan(), "none".dimmed()),
    }

    Ok(())
}

// ----------------------------------------------------------------------------
// User data
// ----------------------------------------------------------------------------

fn handle_color(action: ColorAction, paths: &Paths) -> Result<()> {
    let mut data = UserData::load(&paths.base_dir)?;

    match action {
        ColorAction::Add { name, hex } => {
            let previous = data.add_color(&name, &hex)?;
            data.save(&paths.base_dir)?;
            let label = if previous.is_some() {
                "Updated:"
            } else {
                "Added:"
            };
            println!("{} {} {}", label.green(), name.cyan(), swatch(&parse_hex(&hex)?));
            println!("Run `seymour rebuild analysis` to re-rank collected pieces.");
        }
        ColorAction::Remove { name } => {
            let hex = data.remove_color(&name)?;
            data.save(&paths.base_dir)?;
            println!("{} {} (#{})", "Removed:".green(), name.cyan(), hex);
        }
        ColorAction::List => {
            if data.custom_colors.is_empty() {
                println!("No custom colors. Add one with `seymour color add <name> <hex>`.");
                return Ok(());
            }
            println!();
            for (name, hex) in &data.custom_colors {
                println!("  {} {}", swatch(hex), name);
            }
            println!();
        }
    }

    Ok(())
}

fn handle_word(action: WordAction, paths: &Paths) -> Result<()> {
    let mut data = UserData::load(&paths.base_dir)?;

    match action {
        WordAction::Add { word, pattern } => {
            let previous = data.words.add(&word, &pattern)?;
            data.save(&paths.base_dir)?;
            let label = if previous.is_some() {
                "Updated:"
            } else {
                "Added:"
            };
            let word = word.to_uppercase();
            let stored = data.words.get(&word).unwrap_or(pattern.as_str());
            println!("{} {} = {}", label.green(), word.cyan(), stored);
        }
        WordAction::Remove { word } => {
            let pattern = data.words.remove(&word)?;
            data.save(&paths.base_dir)?;
            println!("{} {} ({})", "Removed:".green(), word.to_uppercase().cyan(), pattern);
        }
        WordAction::List => {
            if data.words.is_empty() {
                println!("No words. Add one with `seymour word add <word> <pattern>`.");
                return Ok(());
            }
            println!();
            for (word, pattern) in data.words.iter() {
                println!("  {:<12} {}", word.cyan(), pattern);
            }
            println!();
        }
    }

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(SeymourError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

// ----------------------------------------------------------------------------
// Scanning
// ----------------------------------------------------------------------------

async fn handle_scan(
    paths: &Paths,
    input_path: &Path,
    export_mode: bool,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::load(&paths.base_dir)?;
    let data = UserData::load(&paths.base_dir)?;
    let analyzer = Analyzer::new(paths.load_catalog(&data)?);
    let store = paths.open_store(&config)?;
    let settings = AnalysisSettings::from_config(&config, &data);
    let session = Session::new(analyzer, Arc::clone(&store), settings);

    let batch = input::read_observations(input_path)?;
    if !batch.skipped.is_empty() {
        eprintln!(
            "{} skipped {} malformed line(s): {:?}",
            "[WARN]".yellow().bold(),
            batch.skipped.len(),
            batch.skipped
        );
    }

    if export_mode {
        session.start_export()?;
        session.observe(&batch.observations);
        let records = session.stop_export();

        let rendered = match format {
            ExportFormat::Pretty => export::render_pretty(&records),
            ExportFormat::Json => export::render_json(&records)?,
        };
        match output {
            Some(path) => {
                fs::write(path, rendered)?;
                println!(
                    "{} {} piece(s) to {}",
                    "Exported".green(),
                    records.len(),
                    path.display()
                );
            }
            None => print!("{}", rendered),
        }
        return Ok(());
    }

    let worker = FlushWorker::spawn(Arc::clone(&store), config.store.debounce());
    session.start_scan()?;

    let mut added = 0;
    for chunk in batch.observations.chunks(SCAN_CHUNK) {
        added += session.observe(chunk);
        tokio::task::yield_now().await;
    }

    let stopped = tokio::task::block_in_place(|| session.stop_scan());
    let last = worker.shutdown().await;
    ensure_saved(stopped)?;
    ensure_saved(last)?;

    println!(
        "{} {} observation(s), {} new piece(s), {} in collection",
        "Scanned".green(),
        batch.observations.len(),
        added,
        store.len()
    );

    Ok(())
}

// ----------------------------------------------------------------------------
// Collection
// ----------------------------------------------------------------------------

fn handle_collection(action: CollectionAction, paths: &Paths) -> Result<()> {
    let config = Config::load(&paths.base_dir)?;
    let store = paths.open_store(&config)?;

    match action {
        CollectionAction::List { limit } => {
            let mut records = store.records();
            if records.is_empty() {
                println!("Collection is empty. Add pieces with `seymour scan <file>`.");
                return Ok(());
            }
            records.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
            let total = records.len();
            let shown = limit.unwrap_or(total).min(total);

            println!();
            for record in records.iter().take(shown) {
                print_record(record);
            }
            println!();
            if shown < total {
                println!("Showing {} of {} pieces", shown, total);
            }
        }
        CollectionAction::Stats => {
            let records = store.records();
            let stats = CollectionStats::compute(&records);

            println!();
            println!("{} {}", "Total:".bold(), stats.total);
            println!("  {}  {}", "T1 normal".green(), stats.t1_normal);
            println!("  {}    {}", "T1 fade".green(), stats.t1_fade);
            println!("  {}  {}", "T2 normal".yellow(), stats.t2_normal);
            println!("  {}    {}", "T2 fade".yellow(), stats.t2_fade);
            if config.analysis.dupes {
                println!("  {}      {}", "Dupes".red(), stats.dupes);
            }
            println!();
        }
        CollectionAction::Search { hexes } => {
            let hexes = hexes
                .iter()
                .map(|h| parse_hex(h))
                .collect::<Result<Vec<_>>>()?;
            let records = store.records();
            let found = search_by_hex(&records, hexes.as_slice());
            if found.is_empty() {
                println!("No pieces found.");
                return Ok(());
            }
            println!();
            for record in found {
                print_record(record);
            }
            println!();
        }
        CollectionAction::Dupes => {
            let groups = duplicate_groups(&store.records());
            if groups.is_empty() {
                println!("No duplicate hex codes.");
                return Ok(());
            }
            println!();
            for (hex, ids) in &groups {
                println!("{} x{}", swatch(hex), ids.len());
                for id in ids {
                    println!("  {}", id);
                }
            }
            println!();
        }
        CollectionAction::Patterns { kind } => {
            let snapshot = store.snapshot();
            let ids = pieces_with_pattern(snapshot.values(), &kind);
            if ids.is_empty() {
                println!("No pieces with pattern '{}'.", kind);
                return Ok(());
            }
            println!();
            for id in &ids {
                if let Some(record) = snapshot.get(id) {
                    print_record(record);
                }
            }
            println!();
        }
        CollectionAction::Words => {
            let data = UserData::load(&paths.base_dir)?;
            let snapshot = store.snapshot();
            let ids = pieces_with_words(snapshot.values(), &data.words);
            if ids.is_empty() {
                println!("No pieces match a word.");
                return Ok(());
            }
            println!();
            for id in &ids {
                if let Some(record) = snapshot.get(id) {
                    let word = detect_word_match(&record.hex, &data.words).unwrap_or_default();
                    println!("  {} {:<10} {}", swatch(&record.hex), word.cyan(), record.id);
                }
            }
            println!();
        }
        CollectionAction::Remove { id } => {
            let removed = store
                .remove(&id)
                .ok_or_else(|| SeymourError::RecordNotFound { id: id.clone() })?;
            ensure_saved(store.force_flush())?;
            println!("{} {} ({})", "Removed:".green(), id, removed.display_name);
        }
        CollectionAction::Clear { force } => {
            if store.is_empty() {
                println!("Collection is already empty.");
                return Ok(());
            }
            if !force && !confirm(&format!("Remove all {} pieces?", store.len()))? {
                println!("Aborted.");
                return Ok(());
            }
            let count = store.len();
            ensure_saved(store.clear())?;
            println!("{} {} piece(s)", "Cleared".green(), count);
        }
    }

    Ok(())
}

fn handle_rebuild(target: RebuildTarget, paths: &Paths) -> Result<()> {
    let config = Config::load(&paths.base_dir)?;
    let data = UserData::load(&paths.base_dir)?;
    let analyzer = Analyzer::new(paths.load_catalog(&data)?);
    let store = paths.open_store(&config)?;
    let settings = AnalysisSettings::from_config(&config, &data);

    let kind = match target {
        RebuildTarget::Words => RebuildKind::Words,
        RebuildTarget::Patterns => RebuildKind::Patterns,
        RebuildTarget::Analysis => RebuildKind::Analysis,
        RebuildTarget::Matches => RebuildKind::Matches,
    };
    let report = rebuild(kind, &store, &analyzer, &settings);
    ensure_saved(store.force_flush())?;

    println!(
        "{} {}: {} of {} piece(s) updated",
        "Rebuilt".green(),
        kind.as_str(),
        report.updated,
        report.total
    );

    Ok(())
}
