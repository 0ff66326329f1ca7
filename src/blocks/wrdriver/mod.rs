use serde::{Deserialize, Serialize};

use crate::blocks::array::{ArrayParams, PinBinding};
use crate::blocks::build_array;
use crate::blocks::sense_amp::word_groups;
use crate::error::Result;
use crate::layout::PinDirection;
use crate::library::LibraryCellSpec;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WriteDriverArrayParams {
    /// Number of bitline pairs.
    pub cols: usize,
    pub words_per_row: usize,
}

pub fn write_driver_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "write_driver",
        [
            ("din", PinDirection::Input),
            ("bl", PinDirection::InOut),
            ("br", PinDirection::InOut),
            ("en", PinDirection::Input),
            ("vdd", PinDirection::Power),
            ("gnd", PinDirection::Ground),
        ],
    )
}

impl WriteDriverArrayParams {
    pub fn array(&self) -> Result<ArrayParams<LibraryCellSpec>> {
        let n = word_groups(self.cols, self.words_per_row)?;
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("write_driver_array_{n}"))
            .cell(write_driver_cell())
            .cols(n)
            .words_per_row(self.words_per_row)
            .fill_layers(vec!["nwell".into()])
            .bind(PinBinding::ColBus, &["din"])
            .bind(PinBinding::BitBus, &["bl", "br"])
            .bind(PinBinding::Horizontal, &["en", "vdd", "gnd"]);
        build_array(&builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::array::ArrayTiler;
    use crate::config::GeneratorOpts;
    use crate::factory::Factory;
    use crate::library::LibraryCell;
    use crate::tests::test_pdk;

    #[test]
    fn test_write_driver_array() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let params = WriteDriverArrayParams {
            cols: 8,
            words_per_row: 2,
        };
        let array = factory.generate::<ArrayTiler<LibraryCell>>(&params.array()?)?;
        assert_eq!(array.name(), "write_driver_array_4");
        let nets = array
            .bindings(1)
            .map(|(_, net)| net.as_str())
            .collect::<Vec<_>>();
        assert_eq!(nets, vec!["din[1]", "bl[2]", "br[2]", "en", "vdd", "gnd"]);
        Ok(())
    }
}
