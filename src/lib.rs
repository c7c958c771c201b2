pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod manager;
pub mod model;
pub mod parser;
pub mod source;

pub use error::{Error, ParseError, Result};
pub use manager::NodeManager;
pub use model::Node;

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
