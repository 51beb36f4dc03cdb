//! Background job domain entities.

pub mod metadata;
pub mod model;
pub mod status;

pub use metadata::JobMetadata;
pub use model::{JobRecord, NewJob};
pub use status::JobStatus;
