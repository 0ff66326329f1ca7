use serde::{Deserialize, Serialize};

use crate::blocks::array::{ArrayParams, DummyParams, MirrorPolicy, PinBinding};
use crate::blocks::build_array;
use crate::config::ArrayKind;
use crate::error::Result;
use crate::layout::PinDirection;
use crate::library::LibraryCellSpec;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BitcellArrayParams {
    pub rows: usize,
    pub cols: usize,
    pub kind: ArrayKind,
    pub dummies: DummyParams,
}

pub fn sram_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "sram_sp_cell",
        [
            ("bl", PinDirection::InOut),
            ("br", PinDirection::InOut),
            ("wl", PinDirection::Input),
            ("vdd", PinDirection::Power),
            ("gnd", PinDirection::Ground),
        ],
    )
}

pub fn cam_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "cam_cell",
        [
            ("bl", PinDirection::InOut),
            ("br", PinDirection::InOut),
            ("sl", PinDirection::Input),
            ("slb", PinDirection::Input),
            ("wl", PinDirection::Input),
            ("ml", PinDirection::InOut),
            ("vdd", PinDirection::Power),
            ("gnd", PinDirection::Ground),
        ],
    )
}

impl BitcellArrayParams {
    pub fn array(&self) -> Result<ArrayParams<LibraryCellSpec>> {
        let (name, cell) = match self.kind {
            ArrayKind::Sram => ("bitcell_array", sram_cell()),
            ArrayKind::Cam => ("cam_array", cam_cell()),
        };
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("{name}_{}x{}", self.rows, self.cols))
            .cell(cell)
            .rows(self.rows)
            .cols(self.cols)
            .dummies(self.dummies)
            .mirror(MirrorPolicy::Both)
            // The first functional cell is unmirrored whatever the dummy count,
            // so peripherals tiled from column 0 alternate in step.
            .phase((self.dummies.bottom, self.dummies.left))
            .fill_layers(vec!["nwell".into()])
            .bind(PinBinding::ColBus, &["bl", "br"])
            .bind(PinBinding::RowBus, &["wl"])
            .bind(PinBinding::Horizontal, &["vdd", "gnd"]);
        if self.kind == ArrayKind::Cam {
            builder
                .bind(PinBinding::ColBus, &["sl", "slb"])
                .bind(PinBinding::RowBus, &["ml"]);
        }
        build_array(&builder)
    }
}
