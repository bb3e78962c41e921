pub mod batch_item;
pub mod library;
pub mod project;
pub mod recent_file;

pub use batch_item::{BatchItem, BatchStatus, InputFile};
pub use library::LibraryLoadState;
pub use project::{ProjectFileMetadata, ProjectPatch, ProjectState, ProjectStatus};
pub use recent_file::RecentFileEntry;
