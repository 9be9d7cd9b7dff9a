pub mod browse;
pub mod comparison;
pub mod engine;
pub mod export;
pub mod file_diff;
pub mod flatten;
pub mod ignore;
pub mod move_detect;
pub mod namespace;

pub use browse::{list_directories, DirectoryItem};
pub use comparison::TreeComparator;
pub use engine::{ComparisonOutcome, DirectoryComparator};
pub use export::{export_csv, hides_stats, EntryKind, ExportFilter, Filter};
pub use file_diff::FileComparator;
pub use flatten::flatten;
pub use ignore::IgnoreMatcher;
pub use move_detect::{DetectedMove, MoveDetector};
pub use namespace::{NamespaceExtractor, NamespaceRegistry};
