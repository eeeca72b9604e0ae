/// Data model: entry records, aggregate stats and size formatting.
pub mod file_record;
pub mod size;
pub mod stats;

pub use file_record::{extension_of, EntryKind, FileRecord, OWNER_UNKNOWN};
pub use stats::{DirectoryStats, DirectorySummary, ListingSummary};
