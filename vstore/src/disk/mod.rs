//! Backing file primitives.
//!
//! - `FileHandle` - create/exists/remove/grow/size on one policy-checked path
//! - `space_info` - capacity of the filesystem holding a storage directory

mod file;
mod space;

pub use file::{CreateOptions, FileHandle};
pub use space::{SpaceInfo, space_info};
