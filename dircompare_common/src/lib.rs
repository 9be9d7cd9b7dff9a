pub mod config;
pub mod error;
pub mod tree;
pub mod types;

pub use config::*;
pub use error::*;
pub use tree::*;
pub use types::*;
