//! The bundled SKY130 technology.

use std::path::PathBuf;

use lazy_static::lazy_static;

use crate::error::Result;
use crate::library::CellLibrary;
use crate::LIB_PATH;

use super::{Pdk, TechConfig};

const SKY130_TECH_TOML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tech/sky130/tech.toml"
));

lazy_static! {
    pub static ref TECH_CONFIG: TechConfig = match TechConfig::from_toml(SKY130_TECH_TOML) {
        Ok(tc) => tc,
        Err(e) => panic!("Error parsing sky130 tech config: {e}"),
    };
}

/// Directory of the bundled SKY130 library cells.
pub fn library_dir() -> PathBuf {
    PathBuf::from(LIB_PATH).join("sky130")
}

pub fn pdk() -> Result<Pdk> {
    Ok(Pdk::new(
        TECH_CONFIG.clone(),
        CellLibrary::load_dir(library_dir())?,
    ))
}
