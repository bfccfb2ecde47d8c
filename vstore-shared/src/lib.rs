//! vstore shared types.
//!
//! Error taxonomy, disk template tags and constants used by the storage
//! engine (`vstore`) and by the layers that call into it (RPC, configuration,
//! job queue) without pulling in the engine itself.

pub mod constants;
pub mod errors;
pub mod template;

pub use errors::{VstoreError, VstoreResult};
pub use template::DiskTemplate;
