pub mod analysis;
pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod pattern;
pub mod piece;
pub mod ranker;
pub mod rebuild;
pub mod record;
pub mod session;
pub mod stats;
pub mod store;

pub use analysis::{is_tracked_item, strip_formatting, AnalysisSettings, Analyzer, TRACKED_ITEMS};
pub use catalog::{
    fade_base_name, load_catalog_file, load_catalog_json, CatalogData, ColorCatalog, ColorEntry,
    ColorSource,
};
pub use color::{absolute_distance, delta_e, hex_to_lab, normalize_hex, LabColor, Rgb};
pub use config::{Config, UserData};
pub use error::{Result, SeymourError};
pub use pattern::{detect_pattern, detect_word_match, HexPattern, WordList};
pub use piece::PieceCategory;
pub use ranker::{
    tier, ClassificationResult, MatchCandidate, MatchPolicy, MatchRanker, PriorityClass,
    PriorityOrder,
};
pub use rebuild::{
    rebuild, rebuild_analysis, rebuild_matches, rebuild_patterns, rebuild_words, RebuildKind,
    RebuildReport,
};
pub use record::{Location, Observation, Record};
pub use session::{ObservationMode, Session};
pub use stats::{
    duplicate_groups, pieces_with_pattern, pieces_with_words, search_by_hex, CollectionStats,
};

// Persistence
pub use store::{
    FlushOutcome, FlushWorker, JsonFileSink, MemorySink, RecordSink, RecordStore, StoreState,
    DEFAULT_DEBOUNCE,
};
