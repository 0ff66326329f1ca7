use arcstr::ArcStr;
use log::debug;

use crate::blocks::array::ArrayTiler;
use crate::blocks::tap::{Tap, TapKind, TapParams};
use crate::contact::{ViaStack, ViaStackParams};
use crate::error::{Error, Result};
use crate::factory::LayoutCtx;
use crate::geometry::{CoarseDirection, Point, Rect};
use crate::layout::{Instance, ModuleRef, PinDirection};
use crate::library::LibraryCell;
use crate::tech::TechSource;

use super::Bank;

/// Nets that stay inside the bank.
const INTERNAL_NETS: [&str; 3] = ["bl", "br", "wl"];
const SUPPLIES: [&str; 2] = ["vdd", "gnd"];

/// Maps a child port to a bank net, renaming the base of bus ports.
fn net_name(port: &str, renames: &[(&str, &str)]) -> ArcStr {
    let (base, index) = port.split_at(port.find('[').unwrap_or(port.len()));
    match renames.iter().find(|(from, _)| *from == base) {
        Some((_, to)) => arcstr::format!("{to}{index}"),
        None => ArcStr::from(port),
    }
}

fn base_name(net: &str) -> &str {
    net.split('[').next().unwrap_or(net)
}

/// Places `module` with its lower-left corner at `p`.
fn place(name: &str, module: &ModuleRef, p: Point) -> Instance {
    Instance::new(name, module.clone()).with_offset(p - module.boundary().p0)
}

impl Bank {
    /// Adds `inst`, connecting each port through `renames`, and re-exports
    /// the ports that leave the bank.
    fn add_block(
        ctx: &mut LayoutCtx,
        inst: Instance,
        renames: &[(&str, &str)],
    ) -> Result<usize> {
        let ports = inst
            .module()
            .port_names()
            .map(|port| (ArcStr::from(port), net_name(port, renames)))
            .collect::<Vec<_>>();
        let idx = ctx.add_instance(inst, ports.iter().map(|(_, net)| net.clone()).collect())?;
        for (port, net) in ports {
            let base = base_name(&net);
            if !INTERNAL_NETS.contains(&base) && !SUPPLIES.contains(&base) {
                ctx.expose_pin(idx, &port, net)?;
            }
        }
        Ok(idx)
    }

    pub(crate) fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        let params = &self.params;
        let pdk = ctx.pdk();

        let mut bitcells = params.bitcells().array()?;
        let cell = ctx.instantiate::<LibraryCell>(&bitcells.cell)?;
        let (px, py) = (cell.width(), cell.height());
        bitcells.pitch_x = Some(px);
        bitcells.pitch_y = Some(py);

        let mut precharge = params.precharge().array()?;
        precharge.pitch_x = Some(px);
        let mut sense_amps = params.sense_amps().array()?;
        sense_amps.pitch_x = Some(px * params.words_per_row as f64);
        let mut write_drivers = params.write_drivers().array()?;
        write_drivers.pitch_x = Some(px * params.words_per_row as f64);
        let mut wl_drivers = params.wl_drivers().array()?;
        wl_drivers.pitch_y = Some(py);

        let bitcells = ctx.instantiate::<ArrayTiler<LibraryCell>>(&bitcells)?;
        let precharge = ctx.instantiate::<ArrayTiler<LibraryCell>>(&precharge)?;
        let sense_amps = ctx.instantiate::<ArrayTiler<LibraryCell>>(&sense_amps)?;
        let write_drivers = ctx.instantiate::<ArrayTiler<LibraryCell>>(&write_drivers)?;
        let wl_drivers = ctx.instantiate::<ArrayTiler<LibraryCell>>(&wl_drivers)?;

        let strap_stack = ctx.opts().strap_stack.clone();
        let via = ctx.instantiate::<ViaStack>(&ViaStackParams {
            stacks: vec![strap_stack],
            dims: (1, 1),
            dir: CoarseDirection::Horizontal,
            opts: Default::default(),
        })?;

        let wl_gap = pdk.get_design_rule("wl_driver_gap")?;
        let x0 = wl_drivers.width() + wl_gap;
        // Room below the lowest rail for its strap via.
        let y_base = via.height() / 2.;
        let y0 = y_base + write_drivers.height() + sense_amps.height();
        let dummies = params.dummies;
        let xc = x0 + dummies.left as f64 * px;

        let wd = place("write_drivers", &write_drivers, Point::new(xc, y_base));
        let sa = place(
            "sense_amps",
            &sense_amps,
            Point::new(xc, y_base + write_drivers.height()),
        );
        let bc = place("bitcells", &bitcells, Point::new(x0, y0));
        let pc = place(
            "precharge",
            &precharge,
            Point::new(xc, y0 + bitcells.height()),
        );
        let wl = place(
            "wl_drivers",
            &wl_drivers,
            Point::new(0., y0 + dummies.bottom as f64 * py),
        );
        let top = pc.bbox().top();
        let right = bc.bbox().right();

        // Column blocks carry horizontal supply rails that get strapped.
        let mut strapped = Vec::new();
        strapped.push(Self::add_block(ctx, wd, &[("en", "w_en")])?);
        strapped.push(Self::add_block(ctx, sa, &[("en", "s_en")])?);
        strapped.push(Self::add_block(ctx, bc, &[])?);
        strapped.push(Self::add_block(ctx, pc, &[("en_b", "p_en_bar")])?);
        Self::add_block(ctx, wl, &[("en", "wl_en"), ("in", "dec")])?;

        // Vertical supply straps right of the array, one per supply.
        let via_bot = via.get_pins("bot").first().map(|r| r.layer.clone());
        let via_top = via
            .get_pins("top")
            .first()
            .map(|r| r.layer.clone())
            .ok_or_else(|| Error::config(format!("via stack {} has no top layer", via.name())))?;
        let tc = pdk.config();
        let strap_width = via.width().max(tc.layer(&via_top)?.width);
        let strap_space = tc.layer(&via_top)?.space;
        let strap_gap = pdk.get_design_rule("strap_gap")?;

        let mut strap_x = right + strap_gap;
        let mut straps = Vec::with_capacity(SUPPLIES.len());
        for supply in SUPPLIES {
            let strap = Rect::new(via_top.clone(), Point::new(strap_x, 0.), strap_width, top);
            ctx.add_pin(supply, direction(supply), strap.clone())?;
            straps.push(strap);
            strap_x += strap_width + strap_space;
        }

        let mut n_vias = 0;
        for idx in strapped {
            let inst = ctx.module().instances()[idx].clone();
            for (supply, strap) in SUPPLIES.iter().zip(straps.iter()) {
                if !inst.module().has_pin(supply) {
                    continue;
                }
                for rail in inst.pin_shapes(supply)? {
                    if via_bot.as_ref() != Some(&rail.layer) {
                        return Err(Error::config(format!(
                            "strap stack lands on {:?}, but the {supply} rail of {} is on {}",
                            via_bot,
                            inst.name(),
                            rail.layer
                        )));
                    }
                    let ext = Rect::new(
                        rail.layer.clone(),
                        Point::new(rail.upper_right().x, rail.lower_left.y),
                        strap.upper_right().x - rail.upper_right().x,
                        rail.height,
                    );
                    ctx.draw_rect(ext);
                    let center = Point::new(strap.center().x, rail.center().y);
                    let via_inst = place(
                        &format!("strap_via_{n_vias}"),
                        &via,
                        center - Point::new(via.width() / 2., via.height() / 2.),
                    );
                    ctx.add_instance(via_inst, vec![ArcStr::from(*supply); 2])?;
                    n_vias += 1;
                }
            }
        }
        debug!("{}: {n_vias} strap vias", ctx.name());

        // Body taps, beyond the straps.
        let tap_x = strap_x - strap_space + strap_gap;
        for (kind, name) in [(TapKind::N, "ntap"), (TapKind::P, "ptap")] {
            let tap = ctx.instantiate::<Tap>(&TapParams {
                kind,
                rows: 1,
                cols: 2,
            })?;
            let y = match kind {
                TapKind::N => top - tap.height(),
                TapKind::P => 0.,
            };
            let net = ArcStr::from(kind.net());
            ctx.add_instance(place(name, &tap, Point::new(tap_x, y)), vec![net])?;
        }

        let bbox = ctx
            .module()
            .content_bbox()
            .ok_or_else(|| Error::config(format!("bank {} is empty", ctx.name())))?;
        ctx.set_size(bbox.right(), bbox.top());
        Ok(())
    }
}

fn direction(supply: &str) -> PinDirection {
    if supply == "gnd" {
        PinDirection::Ground
    } else {
        PinDirection::Power
    }
}
