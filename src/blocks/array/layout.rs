use std::collections::BTreeMap;

use arcstr::ArcStr;
use grid::Grid;

use crate::blocks::well_fill::WellFill;
use crate::error::{Error, Result};
use crate::factory::{Component, LayoutCtx};
use crate::geometry::{approx_eq, Point, Rect, EPSILON};
use crate::layout::{Instance, ModuleRef};

use super::{ArrayTiler, PinBinding};

#[derive(Debug, Clone)]
struct Slot {
    inst: Instance,
    /// `(row, col)` among the functional cells; `None` for dummies.
    index: Option<(usize, usize)>,
}

/// Every pin of `cell` needs a binding, and every binding needs a pin.
fn check_bindings(cell: &ModuleRef, pins: &BTreeMap<ArcStr, PinBinding>) -> Result<()> {
    if let Some(pin) = cell.port_names().find(|name| !pins.contains_key(*name)) {
        return Err(Error::UnclassifiedPin {
            module: cell.name().clone(),
            pin: ArcStr::from(pin),
        });
    }
    if let Some(pin) = pins.keys().find(|name| !cell.has_pin(name)) {
        return Err(Error::PinNotFound {
            module: cell.name().clone(),
            pin: pin.clone(),
        });
    }
    Ok(())
}

fn same_rect(a: &Rect, b: &Rect) -> bool {
    a.layer == b.layer
        && approx_eq(a.lower_left.x, b.lower_left.x)
        && approx_eq(a.lower_left.y, b.lower_left.y)
        && approx_eq(a.width, b.width)
        && approx_eq(a.height, b.height)
}

fn push_unique(shapes: &mut Vec<Rect>, rect: Rect) {
    if !shapes.iter().any(|r| same_rect(r, &rect)) {
        shapes.push(rect);
    }
}

impl<C> ArrayTiler<C>
where
    C: Component,
    C::Params: Clone,
{
    pub(crate) fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let params = &self.params;
        let cell = ctx.instantiate::<C>(&params.cell)?;
        let dummy = match params.dummy_cell.as_ref() {
            Some(dummy) => ctx.instantiate::<C>(dummy)?,
            None => cell.clone(),
        };
        check_bindings(&cell, &params.pins)?;

        let pitch_x = params.pitch_x.unwrap_or_else(|| cell.width());
        let pitch_y = params.pitch_y.unwrap_or_else(|| cell.height());
        for module in [&cell, &dummy] {
            if module.width() > pitch_x + EPSILON || module.height() > pitch_y + EPSILON {
                return Err(Error::config(format!(
                    "cell {} ({} x {}) does not fit the pitch of array {} ({pitch_x} x {pitch_y})",
                    module.name(),
                    module.width(),
                    module.height(),
                    params.name
                )));
            }
        }

        let dummies = params.dummies;
        let (total_rows, total_cols) = (params.total_rows(), params.total_cols());
        let mut slots = Vec::with_capacity(total_rows * total_cols);
        for r in 0..total_rows {
            for c in 0..total_cols {
                let active = (dummies.bottom..dummies.bottom + params.rows).contains(&r)
                    && (dummies.left..dummies.left + params.cols).contains(&c);
                let (module, index, name) = if active {
                    let (i, j) = (r - dummies.bottom, c - dummies.left);
                    (&cell, Some((i, j)), format!("cell_{i}_{j}"))
                } else {
                    (&dummy, None, format!("dummy_{r}_{c}"))
                };
                let boundary = module.boundary();
                let mirror = params.mirror.mirror(r + params.phase.0, c + params.phase.1);
                // Mirrored cells are reflected within their slot, not their own boundary.
                let slack_x = if mirror.flips_x() { pitch_x - module.width() } else { 0. };
                let slack_y = if mirror.flips_y() { pitch_y - module.height() } else { 0. };
                let loc = Point::new(
                    c as f64 * pitch_x - boundary.left() + slack_x,
                    r as f64 * pitch_y - boundary.bottom() + slack_y,
                );
                let inst = Instance::new(name, module.clone())
                    .with_offset(loc)
                    .with_mirror(mirror);
                slots.push(Slot { inst, index });
            }
        }
        let grid = Grid::from_vec(slots, total_cols);

        for slot in grid.iter() {
            match slot.index {
                Some((i, j)) => {
                    let conns = cell
                        .port_names()
                        .map(|pin| params.pins[pin].net(pin, i, j, params.words_per_row))
                        .collect();
                    ctx.add_instance(slot.inst.clone(), conns)?;
                }
                None => ctx.add_dummy(slot.inst.clone()),
            }
        }

        let width = total_cols as f64 * pitch_x;
        let height = total_rows as f64 * pitch_y;
        let active = |slot: &&Slot| slot.index.is_some();

        for pin in cell.pins() {
            let name = pin.name.as_str();
            let binding = params.pins[name];
            match binding {
                PinBinding::ColBus | PinBinding::BitBus => {
                    for j in 0..params.cols {
                        let net = binding.net(name, 0, j, params.words_per_row);
                        ctx.add_port(net.clone(), pin.direction)?;
                        for slot in grid.iter_col(j + dummies.left).filter(active) {
                            for shape in slot.inst.pin_shapes(name)? {
                                ctx.add_pin_shape(&net, shape)?;
                            }
                        }
                    }
                }
                PinBinding::RowBus => {
                    for i in 0..params.rows {
                        let net = binding.net(name, i, 0, params.words_per_row);
                        ctx.add_port(net.clone(), pin.direction)?;
                        for slot in grid.iter_row(i + dummies.bottom).filter(active) {
                            for shape in slot.inst.pin_shapes(name)? {
                                ctx.add_pin_shape(&net, shape)?;
                            }
                        }
                    }
                }
                PinBinding::Horizontal => {
                    ctx.add_port(name, pin.direction)?;
                    for i in 0..params.rows {
                        let mut rails = Vec::new();
                        for slot in grid.iter_row(i + dummies.bottom).filter(active) {
                            for shape in slot.inst.pin_shapes(name)? {
                                let rail = Rect::new(
                                    shape.layer,
                                    Point::new(0., shape.lower_left.y),
                                    width,
                                    shape.height,
                                );
                                push_unique(&mut rails, rail);
                            }
                        }
                        for rail in rails {
                            ctx.add_pin_shape(name, rail)?;
                        }
                    }
                }
                PinBinding::Vertical => {
                    ctx.add_port(name, pin.direction)?;
                    for j in 0..params.cols {
                        let mut rails = Vec::new();
                        for slot in grid.iter_col(j + dummies.left).filter(active) {
                            for shape in slot.inst.pin_shapes(name)? {
                                let rail = Rect::new(
                                    shape.layer,
                                    Point::new(shape.lower_left.x, 0.),
                                    shape.width,
                                    height,
                                );
                                push_unique(&mut rails, rail);
                            }
                        }
                        for rail in rails {
                            ctx.add_pin_shape(name, rail)?;
                        }
                    }
                }
                PinBinding::Single => {
                    ctx.add_port(name, pin.direction)?;
                    for slot in grid.iter().filter(active) {
                        for shape in slot.inst.pin_shapes(name)? {
                            ctx.add_pin_shape(name, shape)?;
                        }
                    }
                }
            }
        }

        if ctx.opts().well_fill && !params.fill_layers.is_empty() {
            let fill = WellFill::new(&ctx.pdk().config(), &params.fill_layers)?;
            for r in 0..grid.rows() {
                let strips = fill.fill_row(grid.iter_row(r).map(|slot| &slot.inst));
                ctx.draw_rects(strips);
            }
        }

        ctx.set_size(width, height);
        Ok(())
    }
}
