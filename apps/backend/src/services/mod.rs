//! Application services for the xtream-dl backend.

pub mod aria2;
pub mod catalog;
pub mod downloads;
pub mod naming;
pub mod snapshot;
pub mod xtream;

pub use aria2::Aria2Client;
pub use catalog::Catalog;
pub use downloads::DownloadDispatcher;
pub use naming::StreamUrlBuilder;
pub use snapshot::{FileStore, MemoryStore, SnapshotCache, SnapshotStore};
pub use xtream::{XtreamApi, XtreamClient};
