//! Fixed-size occupancy grid with neighbor and boundary-connectivity queries.

use crate::cell::Occupant;
use serde::{Deserialize, Serialize};

/// The 8 neighbor offsets: cardinals first, then diagonals. Targeting
/// queries depend on this enumeration order.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Row-major store of lattice sites. Each site holds exactly one
/// [`Occupant`]; every spatial rule bounds-checks candidate coordinates
/// before touching the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    sites: Vec<Occupant>,
}

impl Grid {
    /// Create a grid with all sites empty
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            sites: vec![Occupant::Empty; width * height],
        }
    }

    /// Grid width
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Get the occupant at a site
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &Occupant {
        &self.sites[self.index(x, y)]
    }

    /// Mutable access to the occupant at a site
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Occupant {
        let idx = self.index(x, y);
        &mut self.sites[idx]
    }

    /// Place an occupant at a site, replacing whatever was there
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, occupant: Occupant) {
        let idx = self.index(x, y);
        self.sites[idx] = occupant;
    }

    /// Remove and return the occupant at a site, leaving it empty
    #[inline]
    pub fn take(&mut self, x: usize, y: usize) -> Occupant {
        let idx = self.index(x, y);
        std::mem::take(&mut self.sites[idx])
    }

    /// Check if a site is empty
    #[inline]
    pub fn is_empty_site(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_empty()
    }

    /// Apply a direction offset, returning the destination only if it lies
    /// within the grid. No wraparound.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<(usize, usize)> {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx >= 0 && nx < self.width as i32 && ny >= 0 && ny < self.height as i32 {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    }

    /// The up-to-8 in-bounds neighbors of a site, in enumeration order
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        DIRECTIONS
            .iter()
            .filter_map(|&(dx, dy)| self.offset(x, y, dx, dy))
            .collect()
    }

    /// Check if a site lies on the outer boundary of the grid
    #[inline]
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    /// All currently occupied sites, in row-major order
    pub fn occupied_sites(&self) -> Vec<(usize, usize)> {
        let mut sites = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_empty_site(x, y) {
                    sites.push((x, y));
                }
            }
        }
        sites
    }

    /// Check whether an empty site is connected to the grid boundary via a
    /// path of empty sites. False for occupied sites and for the interior
    /// of voids fully enclosed by occupied sites.
    ///
    /// Worklist traversal with a visited buffer owned by the call; no
    /// recursion, so large grids cannot exhaust the stack.
    pub fn is_connected_to_boundary(&self, x: usize, y: usize) -> bool {
        if !self.is_empty_site(x, y) {
            return false;
        }

        let mut visited = vec![false; self.width * self.height];
        let mut stack = vec![(x, y)];
        visited[self.index(x, y)] = true;

        while let Some((cx, cy)) = stack.pop() {
            if self.is_boundary(cx, cy) {
                return true;
            }
            for (nx, ny) in self.neighbors(cx, cy) {
                let idx = self.index(nx, ny);
                if self.is_empty_site(nx, ny) && !visited[idx] {
                    visited[idx] = true;
                    stack.push((nx, ny));
                }
            }
        }
        false
    }

    /// Check whether a site sits on the outer surface of the cell mass:
    /// at least one neighbor is empty and that neighbor reaches the
    /// boundary. Distinguishes truly exposed sites from sites bordering
    /// only enclosed voids.
    pub fn is_on_surface(&self, x: usize, y: usize) -> bool {
        self.neighbors(x, y)
            .into_iter()
            .any(|(nx, ny)| self.is_empty_site(nx, ny) && self.is_connected_to_boundary(nx, ny))
    }

    /// Count of proliferating (non-immune) cells on the grid
    pub fn count_cells(&self) -> usize {
        self.sites.iter().filter(|o| o.is_cell()).count()
    }

    /// Count of immune cells on the grid
    pub fn count_immune(&self) -> usize {
        self.sites.iter().filter(|o| o.is_immune()).count()
    }

    /// First neighbor of a site holding a non-immune cell, in neighbor
    /// enumeration order
    pub fn adjacent_tumor_cell(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        self.neighbors(x, y)
            .into_iter()
            .find(|&(nx, ny)| self.get(nx, ny).is_cell())
    }

    /// Coordinates of the non-immune cell nearest to a site by Euclidean
    /// distance. Full-grid row-major scan; the first minimum encountered
    /// wins ties.
    pub fn nearest_tumor_cell(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        let mut nearest = None;
        let mut best = i64::MAX;

        for ny in 0..self.height {
            for nx in 0..self.width {
                if self.get(nx, ny).is_cell() {
                    let dx = nx as i64 - x as i64;
                    let dy = ny as i64 - y as i64;
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq < best {
                        best = dist_sq;
                        nearest = Some((nx, ny));
                    }
                }
            }
        }
        nearest
    }

    /// All empty sites connected to the grid boundary.
    ///
    /// Computed with a single flood seeded from every empty boundary site;
    /// the result is exactly the set of sites for which
    /// [`is_connected_to_boundary`](Self::is_connected_to_boundary) holds.
    pub fn exterior_empty_sites(&self) -> Vec<(usize, usize)> {
        let mut visited = vec![false; self.width * self.height];
        let mut stack = Vec::new();

        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_boundary(x, y) && self.is_empty_site(x, y) {
                    visited[self.index(x, y)] = true;
                    stack.push((x, y));
                }
            }
        }

        let mut exterior = Vec::new();
        while let Some((cx, cy)) = stack.pop() {
            exterior.push((cx, cy));
            for (nx, ny) in self.neighbors(cx, cy) {
                let idx = self.index(nx, ny);
                if self.is_empty_site(nx, ny) && !visited[idx] {
                    visited[idx] = true;
                    stack.push((nx, ny));
                }
            }
        }
        exterior
    }
}
