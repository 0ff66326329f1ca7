pub use error::{Error, Result};

pub mod blocks;
pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod export;
pub mod factory;
pub mod geometry;
pub mod layout;
pub mod library;
pub mod paths;
pub mod plan;
pub mod tech;
pub mod verification;

pub const BUILD_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");
pub const LIB_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/lib");

pub fn bus_bit(name: &str, index: usize) -> String {
    format!("{name}[{index}]")
}
