//! Discretized wire parasitics, used for RC estimation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parasitics of a wire at one `(width, spacing)` point.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct RcPoint {
    pub spacing: f64,
    /// Resistance per micron of length, in ohms.
    pub res: f64,
    /// Capacitance per micron of length, in femtofarads.
    pub cap: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RcWidth {
    pub width: f64,
    pub spacings: Vec<RcPoint>,
}

/// Per-layer RC tables, in the order they appear in the technology file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RcTable {
    layers: HashMap<String, Vec<RcWidth>>,
}

/// Returns the first item minimizing `|key(item) - target|`.
fn closest_by<T>(items: &[T], target: f64, key: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let dist = (key(item) - target).abs();
        match best {
            Some((_, d)) if d <= dist => {}
            _ => best = Some((item, dist)),
        }
    }
    best.map(|(item, _)| item)
}

impl RcTable {
    pub fn insert(&mut self, layer: impl Into<String>, widths: Vec<RcWidth>) {
        self.layers.insert(layer.into(), widths);
    }

    /// Finds the tabulated point closest to the query.
    ///
    /// Picks the width bucket closest to `width`, then the spacing within that
    /// bucket closest to `spacing`. Ties go to the entry listed first.
    pub fn closest(&self, layer: &str, width: f64, spacing: f64) -> Result<&RcPoint> {
        let widths = self
            .layers
            .get(layer)
            .ok_or_else(|| Error::config(format!("no RC data for layer {layer}")))?;
        let bucket = closest_by(widths, width, |w| w.width)
            .ok_or_else(|| Error::config(format!("RC table for layer {layer} is empty")))?;
        closest_by(&bucket.spacings, spacing, |p| p.spacing).ok_or_else(|| {
            Error::config(format!(
                "RC table for layer {layer} has no spacings at width {}",
                bucket.width
            ))
        })
    }
}
