use crate::error::{Error, Result};
use crate::library::LibraryCellSpec;

use self::array::{ArrayParams, ArrayParamsBuilder};

pub mod array;
pub mod bank;
pub mod bitcell_array;
pub mod precharge;
pub mod sense_amp;
pub mod tap;
pub mod well_fill;
pub mod wl_driver;
pub mod wrdriver;

/// Finishes an array of library cells, reporting invalid parameters as configuration errors.
pub(crate) fn build_array(
    builder: &ArrayParamsBuilder<LibraryCellSpec>,
) -> Result<ArrayParams<LibraryCellSpec>> {
    builder.build().map_err(|e| Error::config(e.to_string()))
}
