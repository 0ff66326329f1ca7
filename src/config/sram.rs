use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blocks::array::DummyParams;
use crate::error::Result;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayKind {
    #[default]
    Sram,
    Cam,
}

#[derive(Debug, Eq, PartialEq, Clone, Hash, Serialize, Deserialize)]
pub struct SramConfig {
    pub num_words: usize,
    pub word_size: usize,
    #[serde(default = "default_words_per_row")]
    pub words_per_row: usize,
    #[serde(default)]
    pub kind: ArrayKind,
    #[serde(default)]
    pub dummies: DummyParams,
    #[serde(default = "default_well_fill")]
    pub well_fill: bool,
    /// Technology rule file. Defaults to the bundled SKY130 rules.
    #[serde(default)]
    pub tech: Option<PathBuf>,
    /// Directory of library cell shape files. Defaults to the bundled SKY130 cells.
    #[serde(default)]
    pub library: Option<PathBuf>,
}

fn default_words_per_row() -> usize {
    2
}

fn default_well_fill() -> bool {
    true
}

pub fn parse_sram_config(path: impl AsRef<Path>) -> Result<SramConfig> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sram_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("memgen.toml");
        std::fs::write(
            &path,
            r#"
num_words = 32
word_size = 8
kind = "cam"

[dummies]
top = 1
bottom = 1
left = 2
right = 2
"#,
        )?;
        let config = parse_sram_config(&path)?;
        assert_eq!(config.num_words, 32);
        assert_eq!(config.words_per_row, 2);
        assert_eq!(config.kind, ArrayKind::Cam);
        assert_eq!(config.dummies.left, 2);
        assert!(config.well_fill);
        assert!(config.tech.is_none());

        std::fs::write(&path, "num_words = 32\n")?;
        assert!(parse_sram_config(&path).is_err());
        Ok(())
    }
}
