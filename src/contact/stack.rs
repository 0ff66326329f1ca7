//! Multi-layer via stacks.
//!
//! A stack is a chain of sub-stacks. Consecutive sub-stacks share a conductor:
//! the top conductor of one is the bottom conductor of the next.

use arcstr::ArcStr;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};
use crate::geometry::{BoundBox, CoarseDirection, LayerId, Point, Rect};
use crate::layout::PinDirection;

use super::{LayerStack, ViaLayerSpec};

/// One link of a via stack: its layers and the rules of each via layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubStack {
    pub layers: LayerStack,
    pub specs: Vec<ViaLayerSpec>,
}

impl SubStack {
    pub fn new(layers: LayerStack, specs: Vec<ViaLayerSpec>) -> Result<Self> {
        if specs.len() != layers.vias().len() {
            return Err(Error::config(format!(
                "sub-stack {}..{} has {} via layers but {} via specs",
                layers.bottom(),
                layers.top(),
                layers.vias().len(),
                specs.len()
            )));
        }
        for spec in specs.iter() {
            spec.validate()?;
        }
        Ok(Self { layers, specs })
    }

    /// A single conductor with no vias.
    pub fn pad(layer: impl Into<LayerId>) -> Self {
        Self {
            layers: LayerStack {
                conductors: vec![layer.into()],
                vias: Vec::new(),
            },
            specs: Vec::new(),
        }
    }

    fn width(&self) -> f64 {
        self.specs.iter().map(ViaLayerSpec::width).fold(0., f64::max)
    }

    fn height(&self) -> f64 {
        self.specs.iter().map(ViaLayerSpec::height).fold(0., f64::max)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(default)]
pub struct ViaStackOpts {
    /// Center every cut array on `x = 0` instead of within `[0, width]`.
    pub centralize: bool,
    /// Number of conductors at the bottom of the chain to leave undrawn.
    pub start_layer: usize,
    /// Lower bounds on the conductor extents.
    pub min_width: f64,
    pub min_height: f64,
}

impl ViaStackOpts {
    pub fn builder() -> ViaStackOptsBuilder {
        ViaStackOptsBuilder::default()
    }
}

/// The shapes of a built via stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaStackGeometry {
    pub width: f64,
    pub height: f64,
    /// Width of each sub-stack, bottom to top.
    pub stack_widths: Vec<f64>,
    pub boundary: BoundBox,
    pub conductors: Vec<Rect>,
    pub cuts: Vec<Rect>,
}

impl ViaStackGeometry {
    /// Width of the lowest sub-stack.
    #[inline]
    pub fn first_layer_width(&self) -> f64 {
        self.stack_widths.first().copied().unwrap_or_default()
    }

    /// Width of the sub-stack chained onto the lowest one, or zero if there is none.
    #[inline]
    pub fn second_layer_width(&self) -> f64 {
        self.stack_widths.get(1).copied().unwrap_or_default()
    }

    pub fn rects(&self) -> impl Iterator<Item = &Rect> {
        self.conductors.iter().chain(self.cuts.iter())
    }
}

/// Lays out a chain of sub-stacks.
///
/// Every conductor has the height of the tallest sub-stack. A conductor shared by two
/// sub-stacks is drawn once, as wide as the wider of the two.
pub fn build_via_stack(stacks: &[SubStack], opts: &ViaStackOpts) -> Result<ViaStackGeometry> {
    if stacks.is_empty() {
        return Err(Error::config("via stack has no sub-stacks"));
    }
    if opts.min_width < 0. || opts.min_height < 0. {
        return Err(Error::config(format!(
            "negative minimum via stack extent ({} x {})",
            opts.min_width, opts.min_height
        )));
    }
    for (lower, upper) in stacks.iter().tuple_windows() {
        if lower.layers.top() != upper.layers.bottom() {
            return Err(Error::config(format!(
                "sub-stacks do not share a conductor: {} ends on {}, next starts on {}",
                lower.layers.bottom(),
                lower.layers.top(),
                upper.layers.bottom()
            )));
        }
    }
    let num_conductors = stacks
        .iter()
        .map(|s| s.layers.conductors().len())
        .sum::<usize>()
        - (stacks.len() - 1);
    if opts.start_layer >= num_conductors {
        return Err(Error::config(format!(
            "start layer {} skips all {num_conductors} conductors",
            opts.start_layer
        )));
    }

    let widths = stacks
        .iter()
        .map(|s| s.width().max(opts.min_width))
        .collect::<Vec<_>>();
    let width = widths.iter().copied().fold(0., f64::max);
    let height = stacks
        .iter()
        .map(SubStack::height)
        .fold(opts.min_height, f64::max);
    if width <= 0. || height <= 0. {
        return Err(Error::config(format!(
            "via stack has zero extent ({width} x {height})"
        )));
    }

    let slab = |w: f64| {
        if opts.centralize {
            BoundBox::new(Point::new(-w / 2., 0.), Point::new(w / 2., height))
        } else {
            BoundBox::from_size(Point::zero(), w, height)
        }
    };

    let mut conductors = Vec::with_capacity(num_conductors);
    let mut idx = 0;
    for (k, s) in stacks.iter().enumerate() {
        let last = s.layers.conductors().len() - 1;
        for (c, layer) in s.layers.conductors().iter().enumerate() {
            if k > 0 && c == 0 {
                continue;
            }
            let mut w = widths[k];
            if c == last {
                if let Some(next) = widths.get(k + 1) {
                    w = w.max(*next);
                }
            }
            if idx >= opts.start_layer {
                conductors.push(Rect::from_bbox(layer.clone(), slab(w)));
            }
            idx += 1;
        }
    }

    let mut cuts = Vec::new();
    for (k, s) in stacks.iter().enumerate() {
        for (spec, layer) in s.specs.iter().zip(s.layers.vias()) {
            let (ex, ey) = spec.via_extent();
            let x0 = if opts.centralize {
                -0.5 * ex
            } else {
                0.5 * (widths[k] - ex)
            };
            let y0 = 0.5 * (height - ey);
            let pitch = spec.pitch();
            for (r, c) in (0..spec.rows()).cartesian_product(0..spec.cols()) {
                cuts.push(Rect::new(
                    layer.clone(),
                    Point::new(x0 + c as f64 * pitch, y0 + r as f64 * pitch),
                    spec.via_width,
                    spec.via_width,
                ));
            }
        }
    }

    Ok(ViaStackGeometry {
        width,
        height,
        stack_widths: widths,
        boundary: slab(width),
        conductors,
        cuts,
    })
}

/// Draws `geometry` into the current module, with pins `bot` and `top` on the
/// lowest and highest drawn conductors.
pub(crate) fn draw_via_stack(ctx: &mut LayoutCtx, geometry: &ViaStackGeometry) -> Result<()> {
    ctx.draw_rects(geometry.rects().cloned());
    if let (Some(bot), Some(top)) = (geometry.conductors.first(), geometry.conductors.last()) {
        ctx.add_pin("bot", PinDirection::InOut, bot.clone())?;
        ctx.add_pin("top", PinDirection::InOut, top.clone())?;
    }
    ctx.set_boundary(geometry.boundary);
    Ok(())
}

/// A via stack built from technology contact stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct ViaStackParams {
    /// Names of technology contact stacks, bottom to top.
    pub stacks: Vec<String>,
    /// `(cols, rows)` of every cut array.
    #[builder(default = "(1, 1)")]
    pub dims: (u32, u32),
    #[builder(default)]
    pub dir: CoarseDirection,
    #[builder(default)]
    pub opts: ViaStackOpts,
}

impl ViaStackParams {
    pub fn builder() -> ViaStackParamsBuilder {
        ViaStackParamsBuilder::default()
    }

    fn name(&self) -> ArcStr {
        let mut name = format!(
            "{}_{}x{}{}",
            self.stacks.join("_"),
            self.dims.1,
            self.dims.0,
            self.dir.short_form()
        );
        if self.opts.centralize {
            name.push('c');
        }
        if self.opts.start_layer > 0 {
            name.push_str(&format!("_s{}", self.opts.start_layer));
        }
        ArcStr::from(name)
    }
}

pub struct ViaStack {
    name: ArcStr,
    subs: Vec<SubStack>,
    opts: ViaStackOpts,
}

impl Component for ViaStack {
    type Params = ViaStackParams;

    fn new(params: &Self::Params, factory: &Factory) -> Result<Self> {
        let tc = factory.pdk().config();
        let subs = params
            .stacks
            .iter()
            .map(|stack| {
                let layers = tc.stack(stack)?.layer_stack()?;
                let dims = vec![params.dims; layers.vias().len()];
                let specs = tc.via_layer_specs(stack, &dims, params.dir)?;
                SubStack::new(layers, specs)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: params.name(),
            subs,
            opts: params.opts,
        })
    }

    fn name(&self) -> ArcStr {
        self.name.clone()
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let geometry = build_via_stack(&self.subs, &self.opts)?;
        draw_via_stack(ctx, &geometry)
    }
}
