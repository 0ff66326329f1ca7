//! Generator configuration.

use serde::{Deserialize, Serialize};

pub mod sram;

pub use sram::{parse_sram_config, ArrayKind, SramConfig};

fn default_strap_stack() -> String {
    "via2".to_string()
}

fn default_true() -> bool {
    true
}

/// Options threaded through every layout generator of a build session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorOpts {
    /// Merge the well shapes of tiled cells into continuous strips.
    #[serde(default = "default_true")]
    pub well_fill: bool,
    /// Contact stack connecting horizontal power rails to the vertical straps.
    #[serde(default = "default_strap_stack")]
    pub strap_stack: String,
}

impl Default for GeneratorOpts {
    fn default() -> Self {
        Self {
            well_fill: true,
            strap_stack: default_strap_stack(),
        }
    }
}
