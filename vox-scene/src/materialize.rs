//! Resolution of a [`VoxScene`]'s graph into positioned dense voxel grids.

use std::borrow::Cow;
use std::fmt;

use euclid::{Point3D, Size3D, Vector3D};

use crate::coord::{AxisConvention, FileSpace, OutputSpace, Placement};
use crate::record::{Model, ModelSize, NodeId};
use crate::scene::{NodeKind, VoxScene};
use crate::util::maybe_parallelize;
use crate::{Orientation, Palette};

// -------------------------------------------------------------------------------------------------

/// Options for [`materialize()`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[non_exhaustive]
pub struct MaterializeOptions {
    /// Coordinate convention of the delivered volumes.
    pub axis_convention: AxisConvention,
    /// Nodes nested more deeply than this below the root are not visited.
    pub max_depth: usize,
    /// Total number of node visits after which traversal stops.
    /// Shared children make the number of paths through a graph grow exponentially with its
    /// size, so this bounds the work done on hostile files.
    pub max_node_visits: usize,
    /// Models whose grids would have more cells than this are not materialized.
    pub max_grid_cells: usize,
    /// Total number of grid cells over all volumes of one [`materialize()`] call.
    /// Model references past this budget are skipped.
    pub max_total_cells: usize,
    /// If the file has no scene graph at all, materialize every model at the origin.
    pub fallback_to_models: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            axis_convention: AxisConvention::default(),
            max_depth: 1024,
            max_node_visits: 1 << 20,
            max_grid_cells: 1 << 27,
            max_total_cells: 1 << 30,
            fallback_to_models: true,
        }
    }
}

impl MaterializeOptions {
    #[allow(missing_docs)]
    #[must_use]
    pub fn with_axis_convention(mut self, axis_convention: AxisConvention) -> Self {
        self.axis_convention = axis_convention;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_max_node_visits(mut self, max_node_visits: usize) -> Self {
        self.max_node_visits = max_node_visits;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_max_grid_cells(mut self, max_grid_cells: usize) -> Self {
        self.max_grid_cells = max_grid_cells;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_max_total_cells(mut self, max_total_cells: usize) -> Self {
        self.max_total_cells = max_total_cells;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn with_fallback_to_models(mut self, fallback_to_models: bool) -> Self {
        self.fallback_to_models = fallback_to_models;
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// Receiver of the volumes produced by [`materialize()`].
pub trait VolumeSink {
    /// Accepts one volume. Called in scene graph traversal order.
    fn add_volume(&mut self, volume: Volume);
}

impl VolumeSink for Vec<Volume> {
    fn add_volume(&mut self, volume: Volume) {
        self.push(volume);
    }
}

/// One model, placed in the scene.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Volume {
    /// `_name` of the nearest enclosing transform node, `model_{index}` for models placed
    /// without a scene graph, or empty.
    pub name: String,
    /// Which model this is a copy of.
    pub model_index: usize,
    /// Columns of the matrix which maps the cube `[-1, 1]³` to the volume's extent,
    /// relative to [`Self::translation`].
    ///
    /// This is the accumulated orientation with each column scaled by half the grid's size
    /// along that axis.
    pub orientation: [Vector3D<f64, OutputSpace>; 3],
    /// Position of the center of the volume, in voxels.
    pub translation: Vector3D<i64, OutputSpace>,
    /// Palette indices of the model's voxels, with zero for empty cells.
    pub grid: DenseGrid,
}

/// A box of palette indices, stored densely.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct DenseGrid {
    size: Size3D<u32, OutputSpace>,
    /// Z-major: the element for `(x, y, z)` is at `(x * height + y) * depth + z`.
    cells: Box<[u8]>,
}

impl DenseGrid {
    /// Constructs a grid of zeroes.
    ///
    /// Returns [`None`] if the number of cells does not fit in memory addressing.
    pub fn new(size: Size3D<u32, OutputSpace>) -> Option<Self> {
        let len = usize::try_from(size.width)
            .ok()?
            .checked_mul(usize::try_from(size.height).ok()?)?
            .checked_mul(usize::try_from(size.depth).ok()?)?;
        Some(Self {
            size,
            cells: vec![0; len].into_boxed_slice(),
        })
    }

    #[allow(missing_docs)]
    pub fn size(&self) -> Size3D<u32, OutputSpace> {
        self.size
    }

    fn index(&self, p: Point3D<u32, OutputSpace>) -> Option<usize> {
        if p.x >= self.size.width || p.y >= self.size.height || p.z >= self.size.depth {
            return None;
        }
        // Cannot overflow since the product of the sizes fit when allocated.
        let [x, y, z] = [p.x, p.y, p.z].map(|c| c as usize);
        let [height, depth] = [self.size.height, self.size.depth].map(|c| c as usize);
        Some((x * height + y) * depth + z)
    }

    /// Returns the value of the cell at `p`, or [`None`] if `p` is out of bounds.
    pub fn get(&self, p: Point3D<u32, OutputSpace>) -> Option<u8> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Sets the cell at `p`. Returns false, without modifying the grid, if `p` is out of bounds.
    pub fn set(&mut self, p: Point3D<u32, OutputSpace>, value: u8) -> bool {
        match self.index(p) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// All cells, in Z-major order.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Iterates over the positions and values of all nonzero cells.
    pub fn filled(&self) -> impl Iterator<Item = (Point3D<u32, OutputSpace>, u8)> + '_ {
        let Size3D { height, depth, .. } = self.size;
        let (height, depth) = (u64::from(height), u64::from(depth));
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value != 0)
            .map(move |(i, &value)| {
                let i = i as u64;
                // Each quotient is bounded by a u32 size, so the casts are lossless.
                let point = Point3D::new(
                    (i / (height * depth)) as u32,
                    (i / depth % height) as u32,
                    (i % depth) as u32,
                );
                (point, value)
            })
    }
}

impl fmt::Debug for DenseGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseGrid")
            .field("size", &self.size)
            .field("filled", &self.filled().count())
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------

/// Walks the scene graph of `scene` and delivers one [`Volume`] per model reference to `sink`.
///
/// Malformed parts of the graph (references to missing nodes or models, cycles, excessive depth,
/// or oversized models) are skipped with a logged warning; the rest of the scene is still
/// delivered. Returns the number of volumes delivered.
///
/// Volumes are handed to `sink` as they are built, a few at a time, rather than after
/// all of them exist.
pub fn materialize<S: VolumeSink + ?Sized>(
    scene: &VoxScene,
    options: &MaterializeOptions,
    sink: &mut S,
) -> usize {
    let elements = collect_scene_elements(scene, options);
    let element_count = elements.len();
    let sized_elements = within_cell_budget(elements, options);

    let mut count = 0;
    for batch in sized_elements.chunks(EXPANSION_BATCH_LEN) {
        let volumes = maybe_parallelize(batch, |(element, size)| {
            element.expand(*size, scene.palette(), options)
        });
        for volume in volumes.into_iter().flatten() {
            sink.add_volume(volume);
            count += 1;
        }
    }
    log::debug!("materialized {count} volumes from {element_count} scene elements");
    count
}

/// Number of grids built together before they are delivered.
const EXPANSION_BATCH_LEN: usize = if cfg!(feature = "auto-threads") {
    16
} else {
    1
};

/// Validates the size of each element, and drops elements once
/// [`MaterializeOptions::max_total_cells`] is used up.
fn within_cell_budget<'s>(
    elements: Vec<SceneElement<'s>>,
    options: &MaterializeOptions,
) -> Vec<(SceneElement<'s>, Size3D<u32, FileSpace>)> {
    let mut remaining = u64::try_from(options.max_total_cells).unwrap_or(u64::MAX);
    let mut over_budget = 0usize;
    let accepted: Vec<_> = elements
        .into_iter()
        .filter_map(|element| {
            let (size, cells) = element.grid_size(options)?;
            match remaining.checked_sub(cells) {
                Some(rest) => {
                    remaining = rest;
                    Some((element, size))
                }
                None => {
                    over_budget += 1;
                    None
                }
            }
        })
        .collect();
    if over_budget > 0 {
        log::warn!(
            "skipped {over_budget} model references beyond the total limit of {} cells",
            options.max_total_cells
        );
    }
    accepted
}

fn collect_scene_elements<'s>(
    scene: &'s VoxScene,
    options: &MaterializeOptions,
) -> Vec<SceneElement<'s>> {
    if scene.nodes().is_empty() {
        if !options.fallback_to_models {
            return Vec::new();
        }
        return (0..scene.model_count())
            .filter_map(|index| {
                let (size, model) = scene.model(i32::try_from(index).ok()?)?;
                Some(SceneElement {
                    name: Cow::Owned(format!("model_{index}")),
                    placement: Placement::IDENTITY,
                    model_index: index,
                    size,
                    model,
                })
            })
            .collect();
    }

    let mut walk = Walk {
        scene,
        options,
        visits_remaining: options.max_node_visits,
        visit_limit_reported: false,
        output: Vec::new(),
    };
    if scene.node(NodeId::ROOT).is_some() {
        walk.visit(NodeId::ROOT, None, Placement::IDENTITY, "", None);
    } else {
        log::warn!("scene graph has no root node {}", NodeId::ROOT);
    }
    walk.output
}

/// State of one traversal of the scene graph.
struct Walk<'s, 'o> {
    scene: &'s VoxScene,
    options: &'o MaterializeOptions,
    visits_remaining: usize,
    visit_limit_reported: bool,
    output: Vec<SceneElement<'s>>,
}

impl<'s> Walk<'s, '_> {
    fn visit(
        &mut self,
        id: NodeId,
        referrer: Option<NodeId>,
        placement: Placement,
        name: &'s str,
        parent_list: Option<&ParentList<'_>>,
    ) {
        let Some(node) = self.scene.node(id) else {
            log::warn!(
                "scene node {} refers to nonexistent child {id}",
                referrer.unwrap_or(id)
            );
            return;
        };
        let checked = ParentList::cycle_and_depth_check(parent_list, id, self.options.max_depth);
        let parents = match checked {
            Ok(list) => list,
            Err(Pruned::Cycle) => {
                log::warn!("scene graph contains a cycle through node {id}");
                return;
            }
            Err(Pruned::TooDeep) => {
                log::warn!(
                    "scene graph is deeper than {} nodes at node {id}",
                    self.options.max_depth
                );
                return;
            }
        };
        let Some(remaining) = self.visits_remaining.checked_sub(1) else {
            if !self.visit_limit_reported {
                log::warn!(
                    "stopped scene graph traversal after {} node visits",
                    self.options.max_node_visits
                );
                self.visit_limit_reported = true;
            }
            return;
        };
        self.visits_remaining = remaining;

        let mut placement = placement;
        let mut name = name;
        match node.kind {
            NodeKind::Transform(index) => {
                if let Some(transform) = self.scene.transforms().get(index) {
                    if let Some(frame) = transform.frames.first() {
                        let rotation = frame.rotation.to_orientation().unwrap_or_else(|| {
                            log::warn!(
                                "transform node {id} has invalid rotation {:?}; ignoring it",
                                frame.rotation
                            );
                            Orientation::IDENTITY
                        });
                        placement = placement.then(rotation, frame.translation);
                    }
                    name = transform.name();
                }
            }
            NodeKind::Group(_) => {}
            NodeKind::Shape(index) => {
                let references = self
                    .scene
                    .shapes()
                    .get(index)
                    .map_or(&[][..], |shape| &shape.models);
                for reference in references {
                    let model_index = reference.model_index;
                    match self.scene.model(model_index) {
                        Some((size, model)) => self.output.push(SceneElement {
                            name: Cow::Borrowed(name),
                            placement,
                            // model() succeeded, so the index is nonnegative
                            model_index: model_index.unsigned_abs() as usize,
                            size,
                            model,
                        }),
                        None => log::warn!(
                            "shape node {id} refers to nonexistent model {model_index}"
                        ),
                    }
                }
            }
        }

        for &child in &node.children {
            self.visit(child, Some(id), placement, name, Some(&parents));
        }
    }
}

/// Why a branch of the scene graph was not visited.
#[derive(Debug)]
enum Pruned {
    Cycle,
    TooDeep,
}

/// Used for cycle detection when walking the scene graph.
struct ParentList<'a> {
    id: NodeId,
    depth: usize,
    parent: Option<&'a ParentList<'a>>,
}

impl<'a> ParentList<'a> {
    fn cycle_and_depth_check(
        list: Option<&'a Self>,
        id: NodeId,
        max_depth: usize,
    ) -> Result<Self, Pruned> {
        let depth = match list {
            Some(list) => {
                list.check_inner(id)?;
                list.depth + 1
            }
            None => 0,
        };
        if depth > max_depth {
            return Err(Pruned::TooDeep);
        }
        Ok(ParentList {
            id,
            depth,
            parent: list,
        })
    }

    fn check_inner(&self, id: NodeId) -> Result<(), Pruned> {
        if self.id == id {
            Err(Pruned::Cycle)
        } else if let Some(parent) = self.parent {
            parent.check_inner(id)
        } else {
            Ok(())
        }
    }
}

/// Results of processing the scene graph.
/// Each specifies one model to deliver as a [`Volume`].
struct SceneElement<'s> {
    name: Cow<'s, str>,
    /// In file coordinates; the axis convention is applied by [`Self::expand()`].
    placement: Placement,
    model_index: usize,
    size: ModelSize,
    model: &'s Model,
}

impl SceneElement<'_> {
    /// Returns the size of the grid for this element and its number of cells,
    /// or [`None`] if the model's size is unusable or over [`MaterializeOptions::max_grid_cells`].
    fn grid_size(&self, options: &MaterializeOptions) -> Option<(Size3D<u32, FileSpace>, u64)> {
        let Some(size) = self.size.try_cast::<u32>().filter(|size| !size.is_empty()) else {
            log::warn!(
                "model {} has invalid size {:?}; skipping it",
                self.model_index,
                self.size.to_array()
            );
            return None;
        };
        let cells = u64::from(size.width)
            .checked_mul(u64::from(size.height))
            .and_then(|area| area.checked_mul(u64::from(size.depth)));
        match cells {
            Some(cells) if usize::try_from(cells).is_ok_and(|c| c <= options.max_grid_cells) => {
                Some((size, cells))
            }
            _ => {
                log::warn!(
                    "model {} of size {:?} has more cells than the limit of {}; skipping it",
                    self.model_index,
                    self.size.to_array(),
                    options.max_grid_cells
                );
                None
            }
        }
    }

    fn expand(
        &self,
        size: Size3D<u32, FileSpace>,
        palette: &Palette,
        options: &MaterializeOptions,
    ) -> Option<Volume> {
        let convention = options.axis_convention;
        let size = convention.remap_size(size);
        let mut grid = DenseGrid::new(size)?;

        let mut outside = 0usize;
        for voxel in &self.model.voxels {
            if !palette.is_drawable(voxel.index) {
                continue;
            }
            let position = convention.remap_point(Point3D::new(
                u32::from(voxel.x),
                u32::from(voxel.y),
                u32::from(voxel.z),
            ));
            if !grid.set(position, voxel.index) {
                outside += 1;
            }
        }
        if outside > 0 {
            log::warn!(
                "model {} has {outside} voxels outside its size {:?}; skipping them",
                self.model_index,
                self.size.to_array()
            );
        }

        let half_extents = size.to_array().map(|extent| f64::from(extent) * 0.5);
        let columns = convention.remap_orientation(self.placement.orientation);
        let orientation = [0, 1, 2].map(|axis| columns[axis].to_f64() * half_extents[axis]);

        Some(Volume {
            name: self.name.clone().into_owned(),
            model_index: self.model_index,
            orientation,
            translation: convention.remap_vector(self.placement.translation),
            grid,
        })
    }
}
