/// Grid: the maze cell layout plus the entity markers drawn on it.
///
/// Coordinates are signed so neighbor probes off the edge are expressible.
/// Anything outside `0..width` × `0..height` reads as `Cell::Wall` and is
/// never walkable.
///
/// The Player/Monster markers are a view of entity state: the entity
/// structs are authoritative and every move must go through
/// `move_marker()` to keep the two in sync.

use std::fmt;

use super::cell::Cell;

/// Orthogonal neighbor offsets, in no particular order.
pub const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// A `width` × `height` grid filled with `fill`.
    pub fn new(width: usize, height: usize, fill: Cell) -> Self {
        Grid { width, height, cells: vec![vec![fill; width]; height] }
    }

    /// Build from a string diagram using the `Cell` legend.
    /// Short rows are padded with Empty.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::new(width, height, Cell::Empty);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.cells[y][x] = Cell::from_char(ch);
            }
        }
        grid
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Cell at (x, y). Out of bounds = wall.
    #[inline]
    pub fn cell_at(&self, x: i32, y: i32) -> Cell {
        if self.in_bounds(x, y) {
            self.cells[y as usize][x as usize]
        } else {
            Cell::Wall
        }
    }

    /// Overwrite (x, y) with no validation. Out-of-bounds writes are dropped.
    #[inline]
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if self.in_bounds(x, y) {
            self.cells[y as usize][x as usize] = cell;
        }
    }

    #[inline]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.cell_at(x, y).is_walkable()
    }

    /// Move an entity marker. The old cell is cleared only if it still holds
    /// `kind`, so a marker that has since been overwritten by another entity
    /// survives.
    pub fn move_marker(&mut self, old: (i32, i32), new: (i32, i32), kind: Cell) {
        if self.cell_at(old.0, old.1) == kind {
            self.set_cell(old.0, old.1, Cell::Empty);
        }
        self.set_cell(new.0, new.1, kind);
    }

    /// Count orthogonal neighbors of (x, y) matching `pred`.
    /// Off-grid neighbors are seen as Wall.
    pub fn count_neighbors(&self, x: i32, y: i32, pred: impl Fn(Cell) -> bool) -> usize {
        NEIGHBORS
            .iter()
            .filter(|&&(dx, dy)| pred(self.cell_at(x + dx, y + dy)))
            .count()
    }

    /// Number of cells of the given kind.
    pub fn count(&self, kind: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == kind).count()
    }

    /// All positions holding `kind`, row-major.
    pub fn positions_of(&self, kind: Cell) -> Vec<(i32, i32)> {
        let mut out = vec![];
        for (y, row) in self.cells.iter().enumerate() {
            for (x, &c) in row.iter().enumerate() {
                if c == kind {
                    out.push((x as i32, y as i32));
                }
            }
        }
        out
    }

    /// Row-major iteration over `(x, y, cell)`.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, &c)| (x as i32, y as i32, c))
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row.iter().map(|c| c.to_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkable_iff_not_wall_in_bounds() {
        let g = Grid::from_rows(&[
            "#####",
            "# KT#",
            "#PMD#",
            "#####",
        ]);
        for (x, y, c) in g.iter() {
            assert_eq!(g.is_walkable(x, y), c != Cell::Wall, "at ({x},{y})");
        }
    }

    #[test]
    fn out_of_bounds_is_wall_and_blocked() {
        let g = Grid::new(3, 3, Cell::Empty);
        for &(x, y) in &[(-1, 0), (0, -1), (3, 0), (0, 3), (i32::MIN, 5), (100, 100)] {
            assert_eq!(g.cell_at(x, y), Cell::Wall);
            assert!(!g.is_walkable(x, y));
        }
    }

    #[test]
    fn set_cell_ignores_out_of_bounds() {
        let mut g = Grid::new(2, 2, Cell::Empty);
        g.set_cell(-1, 0, Cell::Key);
        g.set_cell(2, 2, Cell::Key);
        assert_eq!(g.count(Cell::Key), 0);
        g.set_cell(1, 1, Cell::Wall);
        assert_eq!(g.cell_at(1, 1), Cell::Wall);
    }

    #[test]
    fn move_marker_clears_own_trail() {
        let mut g = Grid::from_rows(&["P  "]);
        g.move_marker((0, 0), (1, 0), Cell::Player);
        assert_eq!(g.cell_at(0, 0), Cell::Empty);
        assert_eq!(g.cell_at(1, 0), Cell::Player);
    }

    #[test]
    fn move_marker_keeps_other_entity() {
        // Monster already stepped onto the cell the player is leaving.
        let mut g = Grid::from_rows(&["M  "]);
        g.move_marker((0, 0), (1, 0), Cell::Player);
        assert_eq!(g.cell_at(0, 0), Cell::Monster);
        assert_eq!(g.cell_at(1, 0), Cell::Player);
    }

    #[test]
    fn neighbor_count_treats_edge_as_wall() {
        let g = Grid::from_rows(&[
            "  ",
            "  ",
        ]);
        assert_eq!(g.count_neighbors(0, 0, |c| c == Cell::Wall), 2);
        assert_eq!(g.count_neighbors(0, 0, |c| c == Cell::Empty), 2);
    }

    #[test]
    fn display_uses_legend() {
        let rows = ["#P#", "K T", "#MD"];
        let g = Grid::from_rows(&rows);
        assert_eq!(g.to_string(), "#P#\nK T\n#MD\n");
        assert_eq!(g.positions_of(Cell::Key), vec![(0, 1)]);
    }
}
