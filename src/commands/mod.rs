//! CLI commands implementation

pub mod init;
pub mod output;
pub mod status;

pub use init::*;
pub use output::*;
pub use status::*;
