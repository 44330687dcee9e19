use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "seymour")]
#[command(about = "Match dyed armor colors against a reference catalog and track a collection")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.seymour)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Color catalog JSON (default: <base-dir>/colors.json)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ExportFormat {
    /// One line per piece
    #[default]
    Pretty,
    /// JSON array of records
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the closest catalog colors for a hex code
    Classify {
        /// Hex code (e.g., FF0000 or #ff0000)
        hex: String,

        /// Item name, used to infer the piece type (e.g., "Velvet Top Hat")
        #[arg(short, long)]
        name: Option<String>,

        /// Show every ranked candidate instead of the top 3
        #[arg(short, long)]
        all: bool,
    },

    /// Show the special pattern and word match of a hex code
    Pattern {
        /// Hex code
        hex: String,
    },

    /// Manage custom colors
    Color {
        #[command(subcommand)]
        action: ColorAction,
    },

    /// Manage the word list
    Word {
        #[command(subcommand)]
        action: WordAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Classify observations from a JSON Lines file
    Scan {
        /// File with one observation per line:
        /// {"id": "...", "display_name": "...", "hex": "...", "location": {"x":0,"y":0,"z":0}}
        input: PathBuf,

        /// Collect into an export instead of the collection
        #[arg(short, long)]
        export: bool,

        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Pretty)]
        format: ExportFormat,

        /// Write the export to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect and edit the collection
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },

    /// Recompute derived fields of every collected piece
    Rebuild {
        #[arg(value_enum)]
        target: RebuildTarget,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ColorAction {
    /// Add or replace a custom color
    Add {
        /// Color name
        name: String,

        /// Hex code
        hex: String,
    },

    /// Remove a custom color
    Remove {
        /// Color name
        name: String,
    },

    /// List custom colors
    List,
}

#[derive(Subcommand)]
pub enum WordAction {
    /// Add or replace a word
    Add {
        /// Word (stored uppercase)
        word: String,

        /// 1-6 characters of 0-9, A-F or X (wildcard), e.g. BEEFXX
        pattern: String,
    },

    /// Remove a word
    Remove {
        /// Word
        word: String,
    },

    /// List words
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., filters.fade_dyes)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., filters.fade_dyes)
        key: String,

        /// Value to set (e.g., "true" or "custom-t1,custom-t2,...")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Write the default config file (with comments) if missing
    Init,
}

#[derive(Subcommand)]
pub enum CollectionAction {
    /// List collected pieces
    List {
        /// Maximum pieces to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print T1/T2/dupe counts
    Stats,

    /// Find pieces by hex code
    Search {
        /// One or more hex codes
        #[arg(required = true)]
        hexes: Vec<String>,
    },

    /// List hex codes held by more than one piece
    Dupes,

    /// List pieces with a special pattern (paired, repeating, palindrome, axbxcx, axbxcx_<digit>)
    Patterns {
        kind: String,
    },

    /// List pieces matching a word
    Words,

    /// Remove a piece by id
    Remove {
        id: String,
    },

    /// Remove every piece
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RebuildTarget {
    /// Word matches
    Words,
    /// Special patterns
    Patterns,
    /// Best match
    Analysis,
    /// Top 3 matches
    Matches,
}
