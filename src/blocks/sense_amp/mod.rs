use serde::{Deserialize, Serialize};

use crate::blocks::array::{ArrayParams, PinBinding};
use crate::blocks::build_array;
use crate::error::{Error, Result};
use crate::layout::PinDirection;
use crate::library::LibraryCellSpec;

/// One sense amplifier per word column group.
///
/// The cells are never mirrored; each sits over the first column of its group.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SenseAmpArrayParams {
    /// Number of bitline pairs.
    pub cols: usize,
    pub words_per_row: usize,
}

pub fn sense_amp_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "sense_amp",
        [
            ("bl", PinDirection::InOut),
            ("br", PinDirection::InOut),
            ("dout", PinDirection::Output),
            ("en", PinDirection::Input),
            ("vdd", PinDirection::Power),
            ("gnd", PinDirection::Ground),
        ],
    )
}

/// Number of cells needed for `cols` bitlines with `words_per_row` words per row.
pub(crate) fn word_groups(cols: usize, words_per_row: usize) -> Result<usize> {
    if words_per_row == 0 || cols % words_per_row != 0 {
        return Err(Error::config(format!(
            "{cols} columns cannot be split into groups of {words_per_row}"
        )));
    }
    Ok(cols / words_per_row)
}

impl SenseAmpArrayParams {
    pub fn array(&self) -> Result<ArrayParams<LibraryCellSpec>> {
        let n = word_groups(self.cols, self.words_per_row)?;
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("sense_amp_array_{n}"))
            .cell(sense_amp_cell())
            .cols(n)
            .words_per_row(self.words_per_row)
            .fill_layers(vec!["nwell".into()])
            .bind(PinBinding::BitBus, &["bl", "br"])
            .bind(PinBinding::ColBus, &["dout"])
            .bind(PinBinding::Horizontal, &["en", "vdd", "gnd"]);
        build_array(&builder)
    }
}
