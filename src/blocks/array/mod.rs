//! Tiling of a child cell into a 1-D or 2-D array.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::factory::{Component, Factory, LayoutCtx};
use crate::geometry::{CoarseDirection, LayerId, Mirror};

pub mod layout;

/// Extra non-functional cells around each edge of an array.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DummyParams {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl DummyParams {
    pub fn equal(n: usize) -> Self {
        Self {
            top: n,
            bottom: n,
            left: n,
            right: n,
        }
    }

    pub fn symmetric(rows: usize, cols: usize) -> Self {
        Self {
            top: rows,
            bottom: rows,
            left: cols,
            right: cols,
        }
    }

    /// `n` dummies at both ends of a 1-D array running in direction `dir`.
    pub fn linear(dir: CoarseDirection, n: usize) -> Self {
        match dir {
            CoarseDirection::Horizontal => Self::symmetric(0, n),
            CoarseDirection::Vertical => Self::symmetric(n, 0),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.top + self.bottom
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.left + self.right
    }
}

/// Which slots get mirrored so that neighbours share their edge rails.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MirrorPolicy {
    #[default]
    None,
    /// Mirror about the Y axis in odd columns.
    AlternateCols,
    /// Mirror about the X axis in odd rows.
    AlternateRows,
    Both,
}

impl MirrorPolicy {
    /// The mirroring of the cell in slot `(row, col)`, counted from the lower-left
    /// corner of the array, dummies included.
    pub fn mirror(&self, row: usize, col: usize) -> Mirror {
        let (rows, cols) = match *self {
            Self::None => (false, false),
            Self::AlternateCols => (false, true),
            Self::AlternateRows => (true, false),
            Self::Both => (true, true),
        };
        Mirror::from_flags(rows && row % 2 == 1, cols && col % 2 == 1)
    }
}

/// How a child pin is wired across the array.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PinBinding {
    /// One net per column: `name[col]`.
    ColBus,
    /// One net per column, indexed by bit: `name[col * words_per_row]`.
    BitBus,
    /// One net per row: `name[row]`.
    RowBus,
    /// A shared net, drawn as one rail per row spanning the array width.
    Horizontal,
    /// A shared net, drawn as one rail per column spanning the array height.
    Vertical,
    /// A shared net; each instance's shapes are exposed as they are.
    Single,
}

impl PinBinding {
    /// The net pin `name` of the cell at `(row, col)` connects to.
    pub fn net(&self, name: &str, row: usize, col: usize, words_per_row: usize) -> ArcStr {
        match *self {
            Self::ColBus => ArcStr::from(crate::bus_bit(name, col)),
            Self::BitBus => ArcStr::from(crate::bus_bit(name, col * words_per_row)),
            Self::RowBus => ArcStr::from(crate::bus_bit(name, row)),
            Self::Horizontal | Self::Vertical | Self::Single => ArcStr::from(name),
        }
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical | Self::Single)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ArrayParams<P: Clone> {
    #[builder(setter(into))]
    pub name: ArcStr,
    pub cell: P,
    /// Cell used for the dummy slots; defaults to `cell`.
    #[builder(default, setter(strip_option))]
    pub dummy_cell: Option<P>,
    #[builder(default = "1")]
    pub rows: usize,
    #[builder(default = "1")]
    pub cols: usize,
    #[builder(default = "1")]
    pub words_per_row: usize,
    /// Horizontal pitch; defaults to the cell width.
    #[builder(default, setter(strip_option))]
    pub pitch_x: Option<f64>,
    /// Vertical pitch; defaults to the cell height.
    #[builder(default, setter(strip_option))]
    pub pitch_y: Option<f64>,
    #[builder(default)]
    pub dummies: DummyParams,
    #[builder(default)]
    pub mirror: MirrorPolicy,
    /// Added to the `(row, col)` slot index before the mirroring is chosen, so
    /// that an array can alternate in step with a neighbour it is aligned to.
    #[builder(default)]
    pub phase: (usize, usize),
    /// Every pin of the cell must appear here.
    pub pins: BTreeMap<ArcStr, PinBinding>,
    /// Layers merged into continuous strips per row when well fill is enabled.
    #[builder(default)]
    pub fill_layers: Vec<LayerId>,
}

impl<P: Clone> ArrayParamsBuilder<P> {
    fn validate(&self) -> std::result::Result<(), String> {
        for (what, n) in [
            ("rows", self.rows),
            ("cols", self.cols),
            ("words_per_row", self.words_per_row),
        ] {
            if n == Some(0) {
                return Err(format!("{what} must be at least 1"));
            }
        }
        for pitch in [self.pitch_x, self.pitch_y].into_iter().flatten().flatten() {
            if !(pitch > 0.) {
                return Err(format!("pitch must be positive, got {pitch}"));
            }
        }
        Ok(())
    }

    /// Adds a binding for each of `names`.
    pub fn bind(&mut self, binding: PinBinding, names: &[&str]) -> &mut Self {
        let pins = self.pins.get_or_insert_with(BTreeMap::new);
        for name in names {
            pins.insert(ArcStr::from(*name), binding);
        }
        self
    }
}

impl<P: Clone> ArrayParams<P> {
    pub fn builder() -> ArrayParamsBuilder<P> {
        ArrayParamsBuilder::default()
    }

    #[inline]
    pub fn total_rows(&self) -> usize {
        self.rows + self.dummies.rows()
    }

    #[inline]
    pub fn total_cols(&self) -> usize {
        self.cols + self.dummies.cols()
    }
}

/// Tiles a child component `C` according to an [`ArrayParams`].
pub struct ArrayTiler<C>
where
    C: Component,
    C::Params: Clone,
{
    params: ArrayParams<C::Params>,
    phantom: PhantomData<C>,
}

impl<C> Component for ArrayTiler<C>
where
    C: Component,
    C::Params: Clone,
{
    type Params = ArrayParams<C::Params>;

    fn new(params: &Self::Params, _factory: &Factory) -> Result<Self> {
        if params.rows == 0 || params.cols == 0 || params.words_per_row == 0 {
            return Err(Error::config(format!(
                "array {} must have at least one row, column and word per row",
                params.name
            )));
        }
        Ok(Self {
            params: params.clone(),
            phantom: PhantomData,
        })
    }

    fn name(&self) -> ArcStr {
        self.params.name.clone()
    }

    fn layout(&self, ctx: &mut LayoutCtx) -> Result<()> {
        self.layout(ctx)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::GeneratorOpts;
    use crate::geometry::{Point, Rect};
    use crate::layout::{ModuleRef, PinDirection};
    use crate::library::{CellLibrary, Label, LibraryCell, LibraryCellSpec, ShapeFile};
    use crate::tech::sky130::TECH_CONFIG;
    use crate::tech::Pdk;

    fn label(text: &str, layer: &str, x: f64, y: f64) -> Label {
        Label {
            text: text.into(),
            layer: layer.into(),
            at: Point::new(x, y),
        }
    }

    /// A 2 x 4 cell with a bitline on the left, a wordline and a power rail.
    fn tile_factory(opts: GeneratorOpts) -> Factory {
        let mut lib = CellLibrary::new();
        lib.insert(ShapeFile {
            name: "tile".into(),
            shapes: vec![
                Rect::new("boundary", Point::zero(), 2., 4.),
                Rect::new("met1", Point::new(0.2, 0.), 0.2, 4.),
                Rect::new("met2", Point::new(0., 1.9), 2., 0.2),
                Rect::new("met2", Point::new(0., 3.6), 2., 0.2),
                Rect::new("nwell", Point::new(1.2, 0.), 0.6, 4.),
            ],
            labels: vec![
                label("bl", "met1", 0.3, 1.),
                label("wl", "met2", 1., 2.),
                label("vdd", "met2", 1., 3.7),
            ],
        });
        Factory::new(Pdk::new(TECH_CONFIG.clone(), lib), opts)
    }

    fn tile() -> LibraryCellSpec {
        LibraryCellSpec::new(
            "tile",
            [
                ("bl", PinDirection::InOut),
                ("wl", PinDirection::Input),
                ("vdd", PinDirection::Power),
            ],
        )
    }

    fn tile_params(rows: usize, cols: usize, mirror: MirrorPolicy) -> ArrayParamsBuilder<LibraryCellSpec> {
        let mut builder = ArrayParams::builder();
        builder
            .name(format!("tile_array_{rows}x{cols}"))
            .cell(tile())
            .rows(rows)
            .cols(cols)
            .mirror(mirror)
            .bind(PinBinding::ColBus, &["bl"])
            .bind(PinBinding::RowBus, &["wl"])
            .bind(PinBinding::Horizontal, &["vdd"]);
        builder
    }

    fn tile_array(factory: &mut Factory, params: &ArrayParams<LibraryCellSpec>) -> Result<ModuleRef> {
        factory.generate::<ArrayTiler<LibraryCell>>(params)
    }

    #[test]
    fn test_alternate_column_mirroring() -> Result<()> {
        let mut factory = tile_factory(GeneratorOpts::default());
        let params = tile_params(1, 4, MirrorPolicy::AlternateCols).build().unwrap();
        let array = tile_array(&mut factory, &params)?;

        assert_abs_diff_eq!(array.width(), 8.);
        assert_abs_diff_eq!(array.height(), 4.);
        assert_eq!(array.instances().len(), 4);
        let offsets = array
            .instances()
            .iter()
            .map(|inst| inst.offset().x)
            .collect::<Vec<_>>();
        assert_eq!(offsets, vec![0., 2., 4., 6.]);
        let mirrors = array
            .instances()
            .iter()
            .map(|inst| inst.mirror())
            .collect::<Vec<_>>();
        assert_eq!(mirrors, vec![Mirror::None, Mirror::Y, Mirror::None, Mirror::Y]);

        // Mirrored cells keep their slot; the bitline moves to the right edge.
        let bl = array.get_pins("bl[1]");
        assert_eq!(bl.len(), 1);
        assert_eq!(bl[0].layer, "met1");
        assert_abs_diff_eq!(bl[0].lower_left.x, 3.6, epsilon = 1e-9);
        assert_abs_diff_eq!(bl[0].lower_left.y, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(bl[0].width, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(bl[0].height, 4., epsilon = 1e-9);
        assert_eq!(
            array.port_names().collect::<Vec<_>>(),
            vec!["bl[0]", "bl[1]", "bl[2]", "bl[3]", "wl[0]", "vdd"]
        );
        let vdd = array.get_pins("vdd");
        assert_eq!(vdd.len(), 1);
        assert_abs_diff_eq!(vdd[0].lower_left.y, 3.6, epsilon = 1e-9);
        assert_abs_diff_eq!(vdd[0].width, 8., epsilon = 1e-9);
        assert_eq!(array.get_pins("wl[0]").len(), 4);

        let nets = array.bindings(2).map(|(_, net)| net.as_str()).collect::<Vec<_>>();
        assert_eq!(nets, vec!["bl[2]", "wl[0]", "vdd"]);
        Ok(())
    }

    macro_rules! mirror_alternation_test {
        ($n:expr) => {
            paste::paste! {
                #[test]
                fn [<test_mirror_alternation_ $n>]() -> Result<()> {
                    let mut factory = tile_factory(GeneratorOpts::default());

                    let params = tile_params(1, $n, MirrorPolicy::AlternateCols).build().unwrap();
                    let array = tile_array(&mut factory, &params)?;
                    assert_abs_diff_eq!(array.width(), $n as f64 * 2., epsilon = 1e-9);
                    for pair in array.instances().chunks_exact(2) {
                        assert_ne!(pair[0].mirror(), pair[1].mirror());
                        assert_abs_diff_eq!(pair[0].bbox().right(), pair[1].bbox().left(), epsilon = 1e-9);
                    }

                    let params = tile_params($n, 1, MirrorPolicy::AlternateRows).build().unwrap();
                    let array = tile_array(&mut factory, &params)?;
                    assert_abs_diff_eq!(array.height(), $n as f64 * 4., epsilon = 1e-9);
                    for pair in array.instances().chunks_exact(2) {
                        assert_eq!(pair[0].mirror(), Mirror::None);
                        assert_eq!(pair[1].mirror(), Mirror::X);
                        assert_abs_diff_eq!(pair[0].bbox().top(), pair[1].bbox().bottom(), epsilon = 1e-9);
                    }
                    assert_eq!(array.get_pins("vdd").len(), $n);
                    Ok(())
                }
            }
        };
    }

    mirror_alternation_test!(2);
    mirror_alternation_test!(5);
    mirror_alternation_test!(8);

    #[test]
    fn test_dummies_are_unconnected() -> Result<()> {
        let mut factory = tile_factory(GeneratorOpts::default());
        let params = tile_params(2, 2, MirrorPolicy::Both)
            .dummies(DummyParams::equal(1))
            .build()
            .unwrap();
        let array = tile_array(&mut factory, &params)?;

        assert_abs_diff_eq!(array.width(), 8.);
        assert_abs_diff_eq!(array.height(), 16.);
        assert_eq!(array.instances().len(), 4);
        assert_eq!(array.connections().len(), 4);
        assert_eq!(array.dummies().len(), 12);

        let first = &array.instances()[0];
        assert_eq!(first.name(), "cell_0_0");
        assert_eq!(first.offset(), Point::new(2., 4.));
        assert_eq!(first.mirror(), Mirror::XY);

        // Rails span the full width, dummy columns included.
        for rail in array.get_pins("vdd") {
            assert_abs_diff_eq!(rail.lower_left.x, 0.);
            assert_abs_diff_eq!(rail.width, 8.);
        }
        for (idx, conns) in array.connections().iter().enumerate() {
            assert_eq!(conns.len(), array.instances()[idx].module().num_ports());
        }
        Ok(())
    }

    #[test]
    fn test_bit_bus_and_pitch() -> Result<()> {
        let mut factory = tile_factory(GeneratorOpts::default());
        let params = tile_params(1, 3, MirrorPolicy::None)
            .words_per_row(2)
            .bind(PinBinding::BitBus, &["bl"])
            .pitch_x(2.5)
            .build()
            .unwrap();
        let array = tile_array(&mut factory, &params)?;
        assert_eq!(
            array.port_names().take(3).collect::<Vec<_>>(),
            vec!["bl[0]", "bl[2]", "bl[4]"]
        );
        assert_abs_diff_eq!(array.width(), 7.5);
        assert_abs_diff_eq!(array.instances()[2].offset().x, 5.);

        let params = tile_params(1, 3, MirrorPolicy::None)
            .pitch_x(1.5)
            .build()
            .unwrap();
        assert!(matches!(
            tile_array(&mut factory, &params),
            Err(Error::Configuration(_))
        ));
        Ok(())
    }

    #[test]
    fn test_phase_and_slot_mirroring() -> Result<()> {
        let mut factory = tile_factory(GeneratorOpts::default());
        let params = tile_params(1, 3, MirrorPolicy::AlternateCols)
            .pitch_x(2.5)
            .phase((0, 1))
            .build()
            .unwrap();
        let array = tile_array(&mut factory, &params)?;
        let mirrors = array
            .instances()
            .iter()
            .map(|inst| inst.mirror())
            .collect::<Vec<_>>();
        assert_eq!(mirrors, vec![Mirror::Y, Mirror::None, Mirror::Y]);

        // A mirrored cell narrower than the pitch is reflected about its slot.
        let first = array.instances()[0].bbox();
        assert_abs_diff_eq!(first.left(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(first.right(), 2.5, epsilon = 1e-9);
        let bl = array.get_pins("bl[0]");
        assert_eq!(bl.len(), 1);
        assert_abs_diff_eq!(bl[0].lower_left.x, 2.1, epsilon = 1e-9);
        let bl = array.get_pins("bl[1]");
        assert_abs_diff_eq!(bl[0].lower_left.x, 2.7, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_pin_policy_must_match_cell() {
        let mut factory = tile_factory(GeneratorOpts::default());

        let mut builder = ArrayParams::builder();
        builder
            .name("unclassified")
            .cell(tile())
            .cols(2)
            .bind(PinBinding::ColBus, &["bl"])
            .bind(PinBinding::RowBus, &["wl"]);
        let params = builder.build().unwrap();
        match tile_array(&mut factory, &params) {
            Err(Error::UnclassifiedPin { module, pin }) => {
                assert_eq!(module, "tile");
                assert_eq!(pin, "vdd");
            }
            other => panic!("expected UnclassifiedPin, got {other:?}"),
        }

        let params = tile_params(1, 2, MirrorPolicy::None)
            .name("extra_binding")
            .bind(PinBinding::Single, &["q"])
            .build()
            .unwrap();
        assert!(matches!(
            tile_array(&mut factory, &params),
            Err(Error::PinNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_array() {
        assert!(tile_params(0, 2, MirrorPolicy::None).build().is_err());
        assert!(tile_params(1, 2, MirrorPolicy::None)
            .words_per_row(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_well_fill_merges_neighbours() -> Result<()> {
        let params = tile_params(1, 4, MirrorPolicy::AlternateCols)
            .fill_layers(vec!["nwell".into()])
            .build()
            .unwrap();

        let mut factory = tile_factory(GeneratorOpts::default());
        let array = tile_array(&mut factory, &params)?;
        let strips = array
            .rects()
            .iter()
            .filter(|r| r.layer == "nwell")
            .collect::<Vec<_>>();
        // Wells of mirrored neighbours are 0.4 apart, below the 1.27 spacing rule.
        assert_eq!(strips.len(), 2);
        assert_abs_diff_eq!(strips[0].lower_left.x, 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(strips[0].width, 1.6, epsilon = 1e-9);
        assert_abs_diff_eq!(strips[1].lower_left.x, 5.2, epsilon = 1e-9);

        let mut factory = tile_factory(GeneratorOpts {
            well_fill: false,
            ..Default::default()
        });
        let array = tile_array(&mut factory, &params)?;
        assert!(array.rects().is_empty());
        Ok(())
    }
}
