//! Shared runtime plumbing for the authsv binaries: logging setup and
//! filesystem checks around the snapshot file.

pub mod env;
pub mod utils;
