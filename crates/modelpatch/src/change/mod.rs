//! Patch operations and their JSON form.

pub mod codec;
pub mod fingerprint;
pub mod types;

pub use codec::{from_json, from_json_patch, to_json, to_json_patch, CodecError};
pub use fingerprint::changes_fingerprint;
pub use types::{Change, Operation};
