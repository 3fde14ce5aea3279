//! Octree over points, used for separation queries between traced lines.

use crate::{
    geometry::{BoundingBox3, Point3},
    num::BFloat,
};

/// Configuration parameters for octrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctreeConfig {
    /// Depth below which cells are never subdivided.
    pub max_depth: u32,
    /// Number of items a cell can hold before it is subdivided.
    pub max_items_per_cell: usize,
}

impl OctreeConfig {
    pub const DEFAULT_MAX_DEPTH: u32 = 5;
    pub const DEFAULT_MAX_ITEMS_PER_CELL: usize = 10;

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        assert!(
            self.max_items_per_cell > 0,
            "Maximum number of items per cell must be larger than zero."
        );
    }
}

impl Default for OctreeConfig {
    fn default() -> Self {
        OctreeConfig {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_items_per_cell: Self::DEFAULT_MAX_ITEMS_PER_CELL,
        }
    }
}

/// Identifier of a cell in an octree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId(usize);

#[derive(Clone, Debug)]
struct OctreeCell<F: BFloat> {
    bounds: BoundingBox3<F>,
    depth: u32,
    parent: Option<CellId>,
    children: Option<[CellId; 8]>,
    items: Vec<Point3<F>>,
}

impl<F: BFloat> OctreeCell<F> {
    fn new(bounds: BoundingBox3<F>, depth: u32, parent: Option<CellId>) -> Self {
        OctreeCell {
            bounds,
            depth,
            parent,
            children: None,
            items: Vec::new(),
        }
    }
}

/// Octree storing points in an axis-aligned region.
///
/// Cells live in an arena and refer to each other by `CellId`. A cell is
/// subdivided into eight equal octants once it holds more than the configured
/// number of items and lies above the maximum depth, after which its items
/// are moved into the children. Cells are never merged and items are never removed.
#[derive(Clone, Debug)]
pub struct Octree3<F: BFloat> {
    config: OctreeConfig,
    cells: Vec<OctreeCell<F>>,
    number_of_items: usize,
}

impl<F: BFloat> Octree3<F> {
    const ROOT: CellId = CellId(0);

    /// Creates a new empty octree covering the given region.
    pub fn new(bounds: BoundingBox3<F>, config: OctreeConfig) -> Self {
        config.validate();
        Octree3 {
            config,
            cells: vec![OctreeCell::new(bounds, 0, None)],
            number_of_items: 0,
        }
    }

    /// Returns the region covered by the octree.
    pub fn bounds(&self) -> &BoundingBox3<F> {
        &self.cells[Self::ROOT.0].bounds
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Returns the identifier of the root cell.
    pub fn root(&self) -> CellId {
        Self::ROOT
    }

    /// Returns the total number of stored items.
    pub fn number_of_items(&self) -> usize {
        self.number_of_items
    }

    /// Returns the total number of cells, internal ones included.
    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// Inserts the given point into the leaf containing it and subdivides
    /// the leaf if it became overfull.
    ///
    /// Returns `false` (and stores nothing) if the point lies outside the octree.
    pub fn insert(&mut self, point: Point3<F>) -> bool {
        match self.cell_containing(&point) {
            Some(leaf) => {
                self.cells[leaf.0].items.push(point);
                self.number_of_items += 1;
                self.subdivide(leaf);
                true
            }
            None => false,
        }
    }

    /// Inserts all the given points and refines the whole tree afterwards.
    ///
    /// Returns the number of points that were inside the octree.
    pub fn insert_all<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = Point3<F>>,
    {
        let root_bounds = *self.bounds();
        let mut inserted = 0;
        for point in points {
            if root_bounds.contains(&point) {
                self.cells[Self::ROOT.0].items.push(point);
                inserted += 1;
            }
        }
        self.number_of_items += inserted;
        self.subdivide(Self::ROOT);
        inserted
    }

    /// Finds the leaf cell containing the given point, or `None` if the point
    /// lies outside the octree.
    pub fn cell_containing(&self, point: &Point3<F>) -> Option<CellId> {
        if !self.bounds().contains(point) {
            return None;
        }
        let mut id = Self::ROOT;
        while let Some(children) = &self.cells[id.0].children {
            id = children[self.cells[id.0].bounds.octant_index(point)];
        }
        Some(id)
    }

    /// Collects the items of every leaf whose region overlaps the given box.
    ///
    /// This is a superset of the items lying inside the box.
    pub fn items_in_box(&self, query: &BoundingBox3<F>) -> Vec<Point3<F>> {
        let mut items = Vec::new();
        let query = match query.intersection(self.bounds()) {
            Some(query) => query,
            None => return items,
        };
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id.0];
            match &cell.children {
                Some(children) => stack.extend(
                    children
                        .iter()
                        .rev()
                        .filter(|child| self.cells[child.0].bounds.intersects(&query)),
                ),
                None => items.extend_from_slice(&cell.items),
            }
        }
        items
    }

    /// Whether any stored item lies closer than `radius` to the given point.
    pub fn has_item_within(&self, point: &Point3<F>, radius: F) -> bool {
        self.items_in_box(&BoundingBox3::around(point, radius))
            .iter()
            .any(|item| item.distance_to(point) < radius)
    }

    /// Returns the items of the leaf containing the given point.
    ///
    /// If that leaf is empty and `check_parent` is set, all items below the
    /// parent of the leaf are returned instead.
    pub fn items_near(&self, point: &Point3<F>, check_parent: bool) -> Vec<Point3<F>> {
        let leaf = match self.cell_containing(point) {
            Some(leaf) => &self.cells[leaf.0],
            None => return Vec::new(),
        };
        if !leaf.items.is_empty() {
            leaf.items.clone()
        } else {
            match leaf.parent {
                Some(parent) if check_parent => self.items_in_cell(parent),
                _ => Vec::new(),
            }
        }
    }

    /// Returns all items stored in the given cell and its descendants.
    pub fn items_in_cell(&self, id: CellId) -> Vec<Point3<F>> {
        let mut items = Vec::new();
        self.visit_leaves_below(id, |_, cell| items.extend_from_slice(&cell.items));
        items
    }

    /// Returns the region covered by the given cell.
    pub fn cell_bounds(&self, id: CellId) -> &BoundingBox3<F> {
        &self.cells[id.0].bounds
    }

    /// Returns the center of the given cell.
    pub fn cell_center(&self, id: CellId) -> Point3<F> {
        self.cells[id.0].bounds.center()
    }

    /// Returns the depth of the given cell, the root having depth zero.
    pub fn cell_depth(&self, id: CellId) -> u32 {
        self.cells[id.0].depth
    }

    /// Calls the given closure with the identifier and items of every leaf cell.
    pub fn visit_leaves<V>(&self, mut visit: V)
    where
        V: FnMut(CellId, &[Point3<F>]),
    {
        self.visit_leaves_below(Self::ROOT, |id, cell| visit(id, &cell.items));
    }

    /// Computes the depth of the deepest leaf.
    pub fn actual_max_depth(&self) -> u32 {
        let mut max_depth = 0;
        self.visit_leaves_below(Self::ROOT, |_, cell| {
            max_depth = u32::max(max_depth, cell.depth)
        });
        max_depth
    }

    fn visit_leaves_below<V>(&self, id: CellId, mut visit: V)
    where
        V: FnMut(CellId, &OctreeCell<F>),
    {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id.0];
            match &cell.children {
                Some(children) => stack.extend(children.iter().rev()),
                None => visit(id, cell),
            }
        }
    }

    fn subdivide(&mut self, id: CellId) {
        let OctreeConfig {
            max_depth,
            max_items_per_cell,
        } = self.config;

        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id.0];
            let existing_children = cell.children;
            if cell.depth >= max_depth
                || (existing_children.is_none() && cell.items.len() <= max_items_per_cell)
            {
                continue;
            }
            let children = match existing_children {
                Some(children) => children,
                None => self.split(id),
            };
            let items = std::mem::take(&mut self.cells[id.0].items);
            for item in items {
                let octant = self.cells[id.0].bounds.octant_index(&item);
                self.cells[children[octant].0].items.push(item);
            }
            stack.extend(children.iter().rev());
        }
    }

    fn split(&mut self, id: CellId) -> [CellId; 8] {
        let first_child = self.cells.len();
        let bounds = self.cells[id.0].bounds;
        let depth = self.cells[id.0].depth + 1;
        let mut children = [CellId(0); 8];
        for (octant, child) in children.iter_mut().enumerate() {
            *child = CellId(first_child + octant);
            self.cells
                .push(OctreeCell::new(bounds.octant(octant), depth, Some(id)));
        }
        self.cells[id.0].children = Some(children);
        children
    }
}
