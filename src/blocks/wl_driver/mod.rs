use serde::{Deserialize, Serialize};

use crate::blocks::array::{ArrayParams, MirrorPolicy, PinBinding};
use crate::blocks::build_array;
use crate::error::Result;
use crate::layout::PinDirection;
use crate::library::LibraryCellSpec;

/// A column of wordline drivers, one per bitcell row.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WlDriverArrayParams {
    pub rows: usize,
}

pub fn wl_driver_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "wl_driver",
        [
            ("in", PinDirection::Input),
            ("en", PinDirection::Input),
            ("wl", PinDirection::Output),
            ("vdd", PinDirection::Power),
            ("gnd", PinDirection::Ground),
        ],
    )
}

impl WlDriverArrayParams {
    pub fn array(&self) -> Result<ArrayParams<LibraryCellSpec>> {
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("wl_driver_array_{}", self.rows))
            .cell(wl_driver_cell())
            .rows(self.rows)
            .mirror(MirrorPolicy::AlternateRows)
            .fill_layers(vec!["nwell".into()])
            .bind(PinBinding::RowBus, &["in", "wl"])
            .bind(PinBinding::Vertical, &["en", "vdd", "gnd"]);
        build_array(&builder)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::blocks::array::ArrayTiler;
    use crate::config::GeneratorOpts;
    use crate::factory::Factory;
    use crate::library::LibraryCell;
    use crate::tests::test_pdk;

    #[test]
    fn test_wl_driver_array() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let array = factory.generate::<ArrayTiler<LibraryCell>>(&WlDriverArrayParams { rows: 8 }.array()?)?;
        assert_abs_diff_eq!(array.height(), 8. * 1.58, epsilon = 1e-9);
        assert_abs_diff_eq!(array.width(), 3., epsilon = 1e-9);
        for rail in array.get_pins("vdd") {
            assert_abs_diff_eq!(rail.lower_left.y, 0.);
            assert_abs_diff_eq!(rail.height, array.height(), epsilon = 1e-9);
        }
        assert!(array.has_pin("wl[7]") && array.has_pin("in[0]"));
        Ok(())
    }
}
