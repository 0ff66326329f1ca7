use serde::{Deserialize, Serialize};

use crate::blocks::array::{ArrayParams, MirrorPolicy, PinBinding};
use crate::blocks::build_array;
use crate::error::Result;
use crate::layout::PinDirection;
use crate::library::LibraryCellSpec;

/// One precharge cell per bitline pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PrechargeArrayParams {
    pub cols: usize,
}

pub fn precharge_cell() -> LibraryCellSpec {
    LibraryCellSpec::new(
        "precharge",
        [
            ("bl", PinDirection::InOut),
            ("br", PinDirection::InOut),
            ("en_b", PinDirection::Input),
            ("vdd", PinDirection::Power),
        ],
    )
}

impl PrechargeArrayParams {
    pub fn array(&self) -> Result<ArrayParams<LibraryCellSpec>> {
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("precharge_array_{}", self.cols))
            .cell(precharge_cell())
            .cols(self.cols)
            .mirror(MirrorPolicy::AlternateCols)
            .fill_layers(vec!["nwell".into()])
            .bind(PinBinding::ColBus, &["bl", "br"])
            .bind(PinBinding::Horizontal, &["en_b", "vdd"]);
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
    fn test_precharge_array() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let params = PrechargeArrayParams { cols: 16 };
        let array = factory.generate::<ArrayTiler<LibraryCell>>(&params.array()?)?;
        assert_eq!(array.name(), "precharge_array_16");
        assert_abs_diff_eq!(array.width(), 16. * 1.2, epsilon = 1e-9);
        assert_eq!(array.instances().len(), 16);
        let en = array.get_pins("en_b");
        assert_eq!(en.len(), 1);
        assert_abs_diff_eq!(en[0].width, array.width(), epsilon = 1e-9);

        assert!(PrechargeArrayParams { cols: 0 }.array().is_err());
        Ok(())
    }
}
