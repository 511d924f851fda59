pub mod error;
pub mod model;

pub use error::FetchError;
pub use model::{
    DownloadEvent, DownloadPlan, FailedItem, FetchReport, MediaDescriptor, Membership,
};
