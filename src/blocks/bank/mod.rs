//! A memory bank: the bitcell array and its column and row peripherals.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::blocks::array::DummyParams;
use crate::blocks::bitcell_array::BitcellArrayParams;
use crate::blocks::precharge::PrechargeArrayParams;
use crate::blocks::sense_amp::{word_groups, SenseAmpArrayParams};
use crate::blocks::wl_driver::WlDriverArrayParams;
use crate::blocks::wrdriver::WriteDriverArrayParams;
use crate::config::{ArrayKind, SramConfig};
use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};

pub mod layout;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BankParams {
    /// Number of wordlines.
    pub rows: usize,
    /// Number of bitline pairs.
    pub cols: usize,
    pub words_per_row: usize,
    pub kind: ArrayKind,
    pub dummies: DummyParams,
}

impl BankParams {
    /// Derives the array organization of a memory described by `cfg`.
    pub fn from_config(cfg: &SramConfig) -> Result<Self> {
        if cfg.num_words == 0 || cfg.word_size == 0 || cfg.words_per_row == 0 {
            return Err(Error::config(format!(
                "memory dimensions must be positive: {} words of {} bits, {} words per row",
                cfg.num_words, cfg.word_size, cfg.words_per_row
            )));
        }
        if cfg.num_words % cfg.words_per_row != 0 {
            return Err(Error::config(format!(
                "{} words cannot be arranged in rows of {}",
                cfg.num_words, cfg.words_per_row
            )));
        }
        Ok(Self {
            rows: cfg.num_words / cfg.words_per_row,
            cols: cfg.word_size * cfg.words_per_row,
            words_per_row: cfg.words_per_row,
            kind: cfg.kind,
            dummies: cfg.dummies,
        })
    }

    /// Number of data bits.
    #[inline]
    pub fn word_size(&self) -> usize {
        self.cols / self.words_per_row
    }

    pub fn bitcells(&self) -> BitcellArrayParams {
        BitcellArrayParams {
            rows: self.rows,
            cols: self.cols,
            kind: self.kind,
            dummies: self.dummies,
        }
    }

    pub fn precharge(&self) -> PrechargeArrayParams {
        PrechargeArrayParams { cols: self.cols }
    }

    pub fn sense_amps(&self) -> SenseAmpArrayParams {
        SenseAmpArrayParams {
            cols: self.cols,
            words_per_row: self.words_per_row,
        }
    }

    pub fn write_drivers(&self) -> WriteDriverArrayParams {
        WriteDriverArrayParams {
            cols: self.cols,
            words_per_row: self.words_per_row,
        }
    }

    pub fn wl_drivers(&self) -> WlDriverArrayParams {
        WlDriverArrayParams { rows: self.rows }
    }
}

pub struct Bank {
    params: BankParams,
}

impl Component for Bank {
    type Params = BankParams;

    fn new(params: &Self::Params, _factory: &Factory) -> Result<Self> {
        if params.rows == 0 || params.cols == 0 {
            return Err(Error::config(format!(
                "bank must have at least one row and column, got {}x{}",
                params.rows, params.cols
            )));
        }
        word_groups(params.cols, params.words_per_row)?;
        // Bitcell columns alternate in mirroring, and the column peripherals
        // connect to the first column of each group, which must be unmirrored.
        if params.words_per_row % 2 != 0 {
            return Err(Error::config(format!(
                "words per row must be even, got {}",
                params.words_per_row
            )));
        }
        Ok(Self { params: *params })
    }

    fn name(&self) -> ArcStr {
        let kind = match self.params.kind {
            ArrayKind::Sram => "sram",
            ArrayKind::Cam => "cam",
        };
        arcstr::format!("{kind}_bank_{}x{}", self.params.rows, self.params.cols)
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        self.layout(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::GeneratorOpts;
    use crate::export::LayoutExport;
    use crate::layout::{ModuleRef, PinDirection};
    use crate::paths::out_json;
    use crate::tests::{test_pdk, test_work_dir};

    fn config(num_words: usize, word_size: usize, kind: ArrayKind) -> SramConfig {
        SramConfig {
            num_words,
            word_size,
            words_per_row: 2,
            kind,
            dummies: DummyParams::default(),
            well_fill: true,
            tech: None,
            library: None,
        }
    }

    fn child<'a>(bank: &'a ModuleRef, name: &str) -> (usize, &'a ModuleRef) {
        bank.instances()
            .iter()
            .enumerate()
            .find(|(_, inst)| inst.name() == name)
            .map(|(i, inst)| (i, inst.module()))
            .unwrap()
    }

    fn nets(bank: &ModuleRef, idx: usize) -> HashSet<ArcStr> {
        bank.connections()[idx].iter().cloned().collect()
    }

    #[test]
    fn test_bank_params_from_config() -> Result<()> {
        let params = BankParams::from_config(&config(16, 4, ArrayKind::Sram))?;
        assert_eq!((params.rows, params.cols), (8, 8));
        assert_eq!(params.word_size(), 4);

        assert!(BankParams::from_config(&config(15, 4, ArrayKind::Sram)).is_err());
        assert!(BankParams::from_config(&config(0, 4, ArrayKind::Sram)).is_err());
        Ok(())
    }

    #[test]
    fn test_sram_bank() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let params = BankParams::from_config(&config(16, 4, ArrayKind::Sram))?;
        let bank = factory.generate::<Bank>(&params)?;
        assert_eq!(bank.name(), "sram_bank_8x8");

        for port in [
            "din[3]", "dout[0]", "dec[7]", "p_en_bar", "s_en", "w_en", "wl_en", "vdd", "gnd",
        ] {
            assert!(bank.has_pin(port), "missing port {port}");
        }
        assert!(!bank.has_pin("bl[0]") && !bank.has_pin("wl[0]"));
        assert_eq!(bank.pin("vdd")?.direction, PinDirection::Power);

        let (bc_idx, _) = child(&bank, "bitcells");
        let bitcell_nets = nets(&bank, bc_idx);
        for name in ["sense_amps", "write_drivers", "precharge"] {
            let (idx, _) = child(&bank, name);
            for net in nets(&bank, idx).iter().filter(|n| n.starts_with("b")) {
                assert!(bitcell_nets.contains(net), "{name} net {net} is not a bitline");
            }
        }
        let (wl_idx, _) = child(&bank, "wl_drivers");
        assert!(nets(&bank, wl_idx).contains("wl[7]"));
        assert!(nets(&bank, wl_idx).contains("wl_en"));

        let bitcells = bank.instances()[bc_idx].bbox();
        let wl = bank.instances()[wl_idx].bbox();
        let pc = bank.instances()[child(&bank, "precharge").0].bbox();
        let sa = bank.instances()[child(&bank, "sense_amps").0].bbox();
        assert_abs_diff_eq!(bitcells.left() - wl.right(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(pc.bottom(), bitcells.top(), epsilon = 1e-9);
        assert_abs_diff_eq!(sa.top(), bitcells.bottom(), epsilon = 1e-9);
        assert_abs_diff_eq!(sa.left(), bitcells.left(), epsilon = 1e-9);

        // 8 rows of bitcell rails, plus vdd and gnd of the sense amps and write
        // drivers, plus vdd of the precharge.
        let vias = bank
            .instances()
            .iter()
            .filter(|inst| inst.name().starts_with("strap_via"))
            .count();
        assert_eq!(vias, 16 + 2 + 2 + 1);

        let boundary = bank.boundary();
        for inst in bank.instances() {
            assert!(boundary.expand(1e-9).contains_box(&inst.bbox()));
        }

        let work_dir = test_work_dir("test_sram_bank");
        LayoutExport::from_module(&bank).save(out_json(&work_dir, "layout"))?;
        Ok(())
    }

    #[test]
    fn test_cam_bank() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let mut cfg = config(8, 2, ArrayKind::Cam);
        cfg.dummies = DummyParams::equal(1);
        let bank = factory.generate::<Bank>(&BankParams::from_config(&cfg)?)?;
        assert_eq!(bank.name(), "cam_bank_4x4");
        for port in ["sl[3]", "slb[0]", "ml[3]", "dout[1]"] {
            assert!(bank.has_pin(port), "missing port {port}");
        }
        let (bc_idx, bitcells) = child(&bank, "bitcells");
        assert_abs_diff_eq!(bitcells.width(), 6. * 1.6, epsilon = 1e-9);
        let bitcells = bank.instances()[bc_idx].bbox();
        let pc = bank.instances()[child(&bank, "precharge").0].bbox();
        assert_abs_diff_eq!(pc.left(), bitcells.left() + 1.6, epsilon = 1e-9);
        assert_abs_diff_eq!(pc.width(), 4. * 1.6, epsilon = 1e-9);
        Ok(())
    }

    /// `(left, right)` or `(bottom, top)` of each shape of `port` on instance `idx`.
    fn spans(bank: &ModuleRef, idx: usize, port: &str, horizontal: bool) -> Vec<(f64, f64)> {
        bank.instances()[idx]
            .pin_shapes(port)
            .unwrap()
            .iter()
            .map(|r| {
                let b = r.bbox();
                if horizontal {
                    (b.left(), b.right())
                } else {
                    (b.bottom(), b.top())
                }
            })
            .collect()
    }

    fn assert_same_track(bank: &ModuleRef, block: &str, port: &str, horizontal: bool) {
        let (bc_idx, _) = child(bank, "bitcells");
        let (idx, _) = child(bank, block);
        let expected = spans(bank, bc_idx, port, horizontal);
        for (lo, hi) in spans(bank, idx, port, horizontal) {
            for &(elo, ehi) in &expected {
                assert_abs_diff_eq!(lo, elo, epsilon = 1e-9);
                assert_abs_diff_eq!(hi, ehi, epsilon = 1e-9);
            }
        }
    }

    fn check_peripherals_on_bitcell_tracks(kind: ArrayKind) -> Result<()> {
        for dummies in [0, 1, 2] {
            let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
            let mut cfg = config(16, 4, kind);
            cfg.dummies = DummyParams::equal(dummies);
            let params = BankParams::from_config(&cfg)?;
            let bank = factory.generate::<Bank>(&params)?;

            for block in ["precharge", "sense_amps", "write_drivers"] {
                let (_, module) = child(&bank, block);
                let bitlines = module
                    .port_names()
                    .filter(|p| p.starts_with("bl[") || p.starts_with("br["))
                    .map(String::from)
                    .collect::<Vec<_>>();
                assert!(!bitlines.is_empty());
                for port in bitlines {
                    assert_same_track(&bank, block, &port, true);
                }
            }
            for row in 0..params.rows {
                assert_same_track(&bank, "wl_drivers", &format!("wl[{row}]"), false);
            }
        }
        Ok(())
    }

    #[test]
    fn test_sram_peripherals_on_bitcell_tracks() -> Result<()> {
        check_peripherals_on_bitcell_tracks(ArrayKind::Sram)
    }

    #[test]
    fn test_cam_peripherals_on_bitcell_tracks() -> Result<()> {
        check_peripherals_on_bitcell_tracks(ArrayKind::Cam)
    }

    #[test]
    fn test_bank_rejects_narrow_word_groups() {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let mut cfg = config(16, 4, ArrayKind::Sram);
        cfg.words_per_row = 1;
        let params = BankParams::from_config(&cfg).unwrap();
        assert!(matches!(
            factory.generate::<Bank>(&params),
            Err(Error::Configuration(_))
        ));

        // Odd column groups would start on a mirrored column.
        cfg.num_words = 24;
        cfg.words_per_row = 3;
        let params = BankParams::from_config(&cfg).unwrap();
        assert!(matches!(
            factory.generate::<Bank>(&params),
            Err(Error::Configuration(_))
        ));
    }
}
