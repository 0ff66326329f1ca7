//! Well and substrate taps.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactParams};
use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};
use crate::geometry::{BoundBox, CoarseDirection, Rect};
use crate::layout::{Instance, PinDirection};
use crate::tech::TechConfig;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TapKind {
    /// N+ tap in an n-well, tied to `vdd`.
    N,
    /// P+ tap in the substrate, tied to `gnd`.
    P,
}

impl TapKind {
    fn stack(&self) -> &'static str {
        match *self {
            Self::N => "ntap",
            Self::P => "ptap",
        }
    }

    fn implant(&self) -> &'static str {
        match *self {
            Self::N => "nsdm",
            Self::P => "psdm",
        }
    }

    /// The supply net the tap connects to.
    pub fn net(&self) -> &'static str {
        match *self {
            Self::N => "vdd",
            Self::P => "gnd",
        }
    }

    fn direction(&self) -> PinDirection {
        match *self {
            Self::N => PinDirection::Power,
            Self::P => PinDirection::Ground,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TapParams {
    pub kind: TapKind,
    pub rows: u32,
    pub cols: u32,
}

pub struct Tap {
    params: TapParams,
}

/// Grows `b` symmetrically to at least `width` in both directions.
fn grow_to_width(mut b: BoundBox, width: f64) -> BoundBox {
    if b.width() < width {
        b = b.expand_dir(CoarseDirection::Horizontal, (width - b.width()) / 2.);
    }
    if b.height() < width {
        b = b.expand_dir(CoarseDirection::Vertical, (width - b.height()) / 2.);
    }
    b
}

impl Component for Tap {
    type Params = TapParams;

    fn new(params: &Self::Params, _factory: &Factory) -> Result<Self> {
        if params.rows == 0 || params.cols == 0 {
            return Err(Error::config(format!(
                "tap needs at least one contact, got {}x{}",
                params.rows, params.cols
            )));
        }
        Ok(Self { params: *params })
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "{}_{}x{}",
            self.params.kind.stack(),
            self.params.rows,
            self.params.cols
        )
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let kind = self.params.kind;
        let ct = ctx.instantiate::<Contact>(&ContactParams {
            stack: kind.stack().to_string(),
            rows: self.params.rows,
            cols: self.params.cols,
            dir: CoarseDirection::Vertical,
        })?;
        let tc = ctx.pdk().config();

        let mut inst = Instance::new("contact", ct.clone());
        let diff = BoundBox::union_all(inst.pin_shapes("bot")?.iter().map(Rect::bbox))
            .ok_or_else(|| Error::config(format!("contact {} has no bottom layer", ct.name())))?;
        let mut rects = well_rects(&tc, kind, diff)?;

        let bbox = BoundBox::union_all(rects.iter().map(Rect::bbox).chain([inst.bbox()]))
            .unwrap_or(diff);
        let shift = -bbox.p0;
        inst.translate(shift);
        for rect in rects.iter_mut() {
            *rect = rect.translate(shift);
        }

        let net = ArcStr::from(kind.net());
        let top = inst.pin_shapes("top")?;
        ctx.draw_rects(rects);
        ctx.add_instance(inst, vec![net.clone(), net.clone()])?;
        ctx.add_port(net.clone(), kind.direction())?;
        for shape in top {
            ctx.add_pin_shape(&net, shape)?;
        }
        ctx.set_size(bbox.width(), bbox.height());
        Ok(())
    }
}

/// Implant and, for n-taps, well shapes around a tap diffusion.
fn well_rects(tc: &TechConfig, kind: TapKind, diff: BoundBox) -> Result<Vec<Rect>> {
    let tap = tc.layer("tap")?;
    let implant = kind.implant();
    let mut rects = vec![Rect::from_bbox(
        implant,
        grow_to_width(diff.expand(tap.enclosure(implant)), tc.layer(implant)?.width),
    )];
    if kind == TapKind::N {
        rects.push(Rect::from_bbox(
            "nwell",
            grow_to_width(diff.expand(tap.enclosure("nwell")), tc.layer("nwell")?.width),
        ));
    }
    Ok(rects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorOpts;
    use crate::geometry::Point;
    use crate::tests::test_pdk;

    fn assert_inside(outer: &BoundBox, inner: &BoundBox) {
        assert!(
            outer.expand(1e-9).contains_box(inner),
            "{inner:?} is not inside {outer:?}"
        );
    }

    #[test]
    fn test_ntap() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let tap = factory.generate::<Tap>(&TapParams {
            kind: TapKind::N,
            rows: 1,
            cols: 2,
        })?;
        assert_eq!(tap.name(), "ntap_1x2");
        assert_eq!(tap.port_names().collect::<Vec<_>>(), vec!["vdd"]);
        assert_eq!(tap.pin("vdd")?.direction, PinDirection::Power);
        assert_eq!(tap.get_pins("vdd")[0].layer, "li1");

        let nwell = tap.rects().iter().find(|r| r.layer == "nwell").unwrap();
        let nsdm = tap.rects().iter().find(|r| r.layer == "nsdm").unwrap();
        assert!(nwell.width >= 0.84 && nwell.height >= 0.84);
        assert_inside(&nwell.bbox(), &nsdm.bbox());
        let boundary = tap.boundary();
        assert_eq!(boundary.p0, Point::zero());
        for r in tap.rects() {
            assert_inside(&boundary, &r.bbox());
        }
        assert_inside(&boundary, &tap.instances()[0].bbox());
        assert_eq!(tap.connections()[0].len(), 2);
        Ok(())
    }

    #[test]
    fn test_ptap() -> Result<()> {
        let mut factory = Factory::new(test_pdk(), GeneratorOpts::default());
        let tap = factory.generate::<Tap>(&TapParams {
            kind: TapKind::P,
            rows: 1,
            cols: 1,
        })?;
        assert!(tap.rects().iter().all(|r| r.layer != "nwell"));
        assert!(tap.rects().iter().any(|r| r.layer == "psdm"));
        assert!(tap.has_pin("gnd"));

        assert!(factory
            .generate::<Tap>(&TapParams {
                kind: TapKind::P,
                rows: 0,
                cols: 1,
            })
            .is_err());
        Ok(())
    }
}
