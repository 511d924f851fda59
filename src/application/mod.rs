pub mod destination;
pub mod download_coordinator;

pub use destination::create_next_folder;
pub use download_coordinator::{
    estimate_bytes, filter_trivial, plan, DownloadCoordinator, FetchSettings, ProgressSink,
    DEFAULT_MIN_BYTES,
};
