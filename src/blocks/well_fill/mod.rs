//! Well fill: merges the well shapes of a row of tiled cells into strips.

use crate::error::Result;
use crate::geometry::{snap_up, BoundBox, LayerId, Point, Rect};
use crate::layout::Instance;
use crate::tech::TechConfig;

#[derive(Debug, Clone, PartialEq)]
struct FillLayer {
    layer: LayerId,
    space: f64,
    area: f64,
}

/// Fill rules for a set of layers.
#[derive(Debug, Clone, PartialEq)]
pub struct WellFill {
    layers: Vec<FillLayer>,
    grid: f64,
}

impl WellFill {
    pub fn new(tc: &TechConfig, layers: &[LayerId]) -> Result<Self> {
        let layers = layers
            .iter()
            .map(|layer| {
                let cfg = tc.layer(layer)?;
                Ok(FillLayer {
                    layer: layer.clone(),
                    space: cfg.space,
                    area: cfg.area,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            layers,
            grid: tc.grid,
        })
    }

    /// Fill strips covering the shapes of one row of instances.
    pub fn fill_row<'a>(&self, row: impl IntoIterator<Item = &'a Instance>) -> Vec<Rect> {
        let row = row.into_iter().collect::<Vec<_>>();
        let mut strips = Vec::new();
        for fill in self.layers.iter() {
            let mut boxes = row
                .iter()
                .flat_map(|inst| {
                    inst.module()
                        .rects()
                        .iter()
                        .filter(|r| r.layer == fill.layer)
                        .map(|r| inst.transform_rect(r).bbox())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();
            boxes.sort_by(|a, b| a.left().total_cmp(&b.left()));

            for strip in merge_strips(boxes, fill.space) {
                let strip = grow_to_area(strip, fill.area, self.grid);
                strips.push(Rect::from_bbox(fill.layer.clone(), strip));
            }
        }
        strips
    }
}

/// Merges boxes sorted by left edge whose horizontal gap is below `space`.
fn merge_strips(boxes: Vec<BoundBox>, space: f64) -> Vec<BoundBox> {
    let mut strips: Vec<BoundBox> = Vec::new();
    for b in boxes {
        match strips.last_mut() {
            Some(last) if b.left() - last.right() < space => *last = last.union(&b),
            _ => strips.push(b),
        }
    }
    strips
}

/// Widens `strip` symmetrically until its area reaches `min_area`.
fn grow_to_area(strip: BoundBox, min_area: f64, grid: f64) -> BoundBox {
    if strip.area() >= min_area || strip.height() <= 0. {
        return strip;
    }
    let width = snap_up(min_area / strip.height(), 2. * grid);
    let grow = (width - strip.width()) / 2.;
    BoundBox::new(
        Point::new(strip.left() - grow, strip.bottom()),
        Point::new(strip.right() + grow, strip.top()),
    )
}
