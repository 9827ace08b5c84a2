/// Maze builder: assembles a playable maze from chunk templates.
///
/// ## Build order
///   1. Fill a 25×25 grid with Empty
///   2. Tile a 4×4 arrangement of randomly picked 6×6 chunks
///   3. Force the outer ring to Wall (after tiling, so it always wins)
///   4. Put the player at (1,1) and the monster at (23,23)
///   5. Rejection-sample 4 keys, 1 door and 12 traps
///   6. Check every key and the door can be reached from the player spawn
///
/// ## Spawn rules (4-neighborhood, off-grid counts as Wall)
///   Key / Door: cell Empty, at least 3 Wall neighbors (an alcove)
///   Trap      : cell Empty, at least 3 Empty neighbors, no Trap neighbor
///
/// Sampling is bounded: a placement that finds no valid spot within
/// `MAX_PLACEMENT_ATTEMPTS` tries fails with `MazeGenerationError`, and
/// `generate_layout` retries whole layouts a bounded number of times.

use std::collections::VecDeque;

use log::{debug, warn};
use rand::Rng;
use thiserror::Error;

use crate::domain::cell::Cell;
use crate::domain::chunk::{chunk_cell, CHUNK_SIZE, PALETTE};
use crate::domain::entity::{Direction, Monster, Player};
use crate::domain::grid::Grid;

pub const MAZE_WIDTH: usize = 25;
pub const MAZE_HEIGHT: usize = 25;
pub const CHUNKS_PER_SIDE: usize = 4;

pub const PLAYER_SPAWN: (i32, i32) = (1, 1);
pub const MONSTER_SPAWN: (i32, i32) = (23, 23);

pub const KEY_COUNT: usize = 4;
pub const DOOR_COUNT: usize = 1;
pub const TRAP_COUNT: usize = 12;

/// Random samples per item before giving up on a layout.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;
/// Whole layouts tried by `generate_layout` before giving up.
pub const MAX_LAYOUT_ATTEMPTS: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeGenerationError {
    #[error("no valid spot for {item:?} after {attempts} attempts")]
    PlacementExhausted { item: Cell, attempts: u32 },

    #[error("{0:?} has no spawn rule")]
    NoSpawnRule(Cell),

    #[error("{item:?} at ({x}, {y}) cannot be reached from the player spawn")]
    Unreachable { item: Cell, x: i32, y: i32 },
}

/// A freshly built maze with its entities in place.
#[derive(Clone, Debug)]
pub struct Layout {
    pub grid: Grid,
    pub player: Player,
    pub monster: Monster,
    pub total_keys: usize,
}

pub struct MazeBuilder<R: Rng> {
    rng: R,
    max_attempts: u32,
}

impl<R: Rng> MazeBuilder<R> {
    pub fn new(rng: R) -> Self {
        MazeBuilder { rng, max_attempts: MAX_PLACEMENT_ATTEMPTS }
    }

    /// Override the per-item sampling budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Build one layout. Fails if an item cannot be placed or ends up
    /// out of the player's reach.
    pub fn build(&mut self) -> Result<Layout, MazeGenerationError> {
        let mut grid = Grid::new(MAZE_WIDTH, MAZE_HEIGHT, Cell::Empty);
        self.tile_chunks(&mut grid);
        enforce_border(&mut grid);

        let player = Player::new(PLAYER_SPAWN.0, PLAYER_SPAWN.1);
        let monster = Monster::new(MONSTER_SPAWN.0, MONSTER_SPAWN.1);
        grid.set_cell(player.x(), player.y(), Cell::Player);
        grid.set_cell(monster.x(), monster.y(), Cell::Monster);

        for _ in 0..KEY_COUNT {
            self.place(&mut grid, Cell::Key)?;
        }
        for _ in 0..DOOR_COUNT {
            self.place(&mut grid, Cell::Door)?;
        }
        for _ in 0..TRAP_COUNT {
            self.place(&mut grid, Cell::Trap)?;
        }

        check_reachable(&grid, player.pos())?;

        Ok(Layout { grid, player, monster, total_keys: KEY_COUNT })
    }

    /// Copy a uniformly random palette chunk into each 6×6 slot.
    pub fn tile_chunks(&mut self, grid: &mut Grid) {
        for cy in 0..CHUNKS_PER_SIDE {
            for cx in 0..CHUNKS_PER_SIDE {
                let chunk = &PALETTE[self.rng.gen_range(0..PALETTE.len())];
                for y in 0..CHUNK_SIZE {
                    for x in 0..CHUNK_SIZE {
                        grid.set_cell(
                            (cx * CHUNK_SIZE + x) as i32,
                            (cy * CHUNK_SIZE + y) as i32,
                            chunk_cell(chunk, x, y),
                        );
                    }
                }
            }
        }
    }

    /// Rejection-sample an interior cell that satisfies `item`'s spawn rule
    /// and write the item there.
    pub fn place(&mut self, grid: &mut Grid, item: Cell) -> Result<(i32, i32), MazeGenerationError> {
        if !matches!(item, Cell::Key | Cell::Door | Cell::Trap) {
            return Err(MazeGenerationError::NoSpawnRule(item));
        }
        let max_x = grid.width() as i32 - 1;
        let max_y = grid.height() as i32 - 1;
        if max_x < 2 || max_y < 2 {
            return Err(MazeGenerationError::PlacementExhausted { item, attempts: 0 });
        }

        for _ in 0..self.max_attempts {
            let x = self.rng.gen_range(1..max_x);
            let y = self.rng.gen_range(1..max_y);
            if is_valid_spawn(grid, item, x, y) {
                grid.set_cell(x, y, item);
                return Ok((x, y));
            }
        }
        Err(MazeGenerationError::PlacementExhausted { item, attempts: self.max_attempts })
    }
}

/// Build layouts until one succeeds, up to `MAX_LAYOUT_ATTEMPTS`.
pub fn generate_layout<R: Rng>(rng: &mut R) -> Result<Layout, MazeGenerationError> {
    let mut last_err = None;
    for attempt in 1..=MAX_LAYOUT_ATTEMPTS {
        match MazeBuilder::new(&mut *rng).build() {
            Ok(layout) => {
                debug!("maze built on attempt {attempt}:\n{}", layout.grid);
                return Ok(layout);
            }
            Err(e) => {
                warn!("maze attempt {attempt}/{MAX_LAYOUT_ATTEMPTS} rejected: {e}");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or(MazeGenerationError::PlacementExhausted {
        item: Cell::Key,
        attempts: 0,
    }))
}

/// Overwrite the four outer edges with Wall.
pub fn enforce_border(grid: &mut Grid) {
    let w = grid.width() as i32;
    let h = grid.height() as i32;
    for x in 0..w {
        grid.set_cell(x, 0, Cell::Wall);
        grid.set_cell(x, h - 1, Cell::Wall);
    }
    for y in 0..h {
        grid.set_cell(0, y, Cell::Wall);
        grid.set_cell(w - 1, y, Cell::Wall);
    }
}

/// Spawn rule for `item` at (x, y).
pub fn is_valid_spawn(grid: &Grid, item: Cell, x: i32, y: i32) -> bool {
    if grid.cell_at(x, y) != Cell::Empty { return false; }
    match item {
        Cell::Key | Cell::Door => grid.count_neighbors(x, y, |c| c == Cell::Wall) >= 3,
        Cell::Trap => {
            grid.count_neighbors(x, y, |c| c == Cell::Empty) >= 3
                && grid.count_neighbors(x, y, |c| c == Cell::Trap) == 0
        }
        _ => false,
    }
}

/// Every key must be reachable on foot without passing the door, and the
/// door must border a reachable cell.
pub fn check_reachable(grid: &Grid, start: (i32, i32)) -> Result<(), MazeGenerationError> {
    let (w, h) = (grid.width(), grid.height());
    let mut seen = vec![vec![false; w]; h];
    let mut queue = VecDeque::new();
    if grid.in_bounds(start.0, start.1) {
        seen[start.1 as usize][start.0 as usize] = true;
        queue.push_back(start);
    }

    while let Some(cur) = queue.pop_front() {
        for dir in Direction::ALL {
            let (nx, ny) = dir.step(cur);
            if !grid.is_walkable(nx, ny) || grid.cell_at(nx, ny) == Cell::Door { continue; }
            if seen[ny as usize][nx as usize] { continue; }
            seen[ny as usize][nx as usize] = true;
            queue.push_back((nx, ny));
        }
    }

    for (x, y) in grid.positions_of(Cell::Key) {
        if !seen[y as usize][x as usize] {
            return Err(MazeGenerationError::Unreachable { item: Cell::Key, x, y });
        }
    }
    for (x, y) in grid.positions_of(Cell::Door) {
        let touches = Direction::ALL.iter().any(|d| {
            let (nx, ny) = d.step((x, y));
            grid.in_bounds(nx, ny) && seen[ny as usize][nx as usize]
        });
        if !touches {
            return Err(MazeGenerationError::Unreachable { item: Cell::Door, x, y });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layout(seed: u64) -> Layout {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_layout(&mut rng).expect("layout")
    }

    #[test]
    fn built_maze_census() {
        for seed in 0..16 {
            let l = layout(seed);
            let g = &l.grid;
            assert_eq!((g.width(), g.height()), (MAZE_WIDTH, MAZE_HEIGHT));
            assert_eq!(g.count(Cell::Player), 1, "seed {seed}");
            assert_eq!(g.count(Cell::Monster), 1, "seed {seed}");
            assert_eq!(g.count(Cell::Key), KEY_COUNT, "seed {seed}");
            assert_eq!(g.count(Cell::Door), DOOR_COUNT, "seed {seed}");
            assert_eq!(g.count(Cell::Trap), TRAP_COUNT, "seed {seed}");
            assert_eq!(g.cell_at(1, 1), Cell::Player);
            assert_eq!(g.cell_at(23, 23), Cell::Monster);
            assert_eq!(l.player.pos(), PLAYER_SPAWN);
            assert_eq!(l.monster.pos(), MONSTER_SPAWN);
            assert_eq!(l.total_keys, KEY_COUNT);
        }
    }

    #[test]
    fn border_is_all_wall() {
        for seed in 0..8 {
            let g = layout(seed).grid;
            let (w, h) = (g.width() as i32, g.height() as i32);
            for (x, y, c) in g.iter() {
                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    assert_eq!(c, Cell::Wall, "seed {seed} at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn traps_never_touch() {
        for seed in 0..16 {
            let g = layout(seed).grid;
            for (x, y) in g.positions_of(Cell::Trap) {
                assert_eq!(g.count_neighbors(x, y, |c| c == Cell::Trap), 0, "seed {seed} ({x},{y})");
                assert!(g.count_neighbors(x, y, |c| c == Cell::Empty) >= 3, "seed {seed} ({x},{y})");
            }
        }
    }

    #[test]
    fn keys_and_door_sit_in_alcoves() {
        for seed in 0..16 {
            let g = layout(seed).grid;
            let mut spots = g.positions_of(Cell::Key);
            spots.extend(g.positions_of(Cell::Door));
            for (x, y) in spots {
                assert!(g.count_neighbors(x, y, |c| c == Cell::Wall) >= 3, "seed {seed} ({x},{y})");
            }
        }
    }

    #[test]
    fn same_seed_same_maze() {
        assert_eq!(layout(42).grid, layout(42).grid);
    }

    #[test]
    fn tiling_copies_palette_chunks() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut grid = Grid::new(MAZE_WIDTH, MAZE_HEIGHT, Cell::Empty);
        MazeBuilder::new(&mut rng).tile_chunks(&mut grid);
        for cy in 0..CHUNKS_PER_SIDE {
            for cx in 0..CHUNKS_PER_SIDE {
                let matches_some = PALETTE.iter().any(|chunk| {
                    (0..CHUNK_SIZE).all(|y| {
                        (0..CHUNK_SIZE).all(|x| {
                            grid.cell_at((cx * CHUNK_SIZE + x) as i32, (cy * CHUNK_SIZE + y) as i32)
                                == chunk_cell(chunk, x, y)
                        })
                    })
                });
                assert!(matches_some, "slot ({cx},{cy})");
            }
        }
        // The last row and column are not covered by any chunk.
        assert_eq!(grid.cell_at(24, 10), Cell::Empty);
    }

    #[test]
    fn key_rule_needs_three_walls() {
        let g = Grid::from_rows(&[
            "#####",
            "# # #",
            "#   #",
            "#####",
        ]);
        assert!(is_valid_spawn(&g, Cell::Key, 1, 1));
        assert!(is_valid_spawn(&g, Cell::Door, 3, 1));
        assert!(!is_valid_spawn(&g, Cell::Key, 2, 2));
        assert!(!is_valid_spawn(&g, Cell::Key, 2, 1)); // a wall
    }

    #[test]
    fn trap_rule_needs_open_space_and_no_neighbor_trap() {
        let mut g = Grid::from_rows(&[
            "#####",
            "#   #",
            "#   #",
            "#   #",
            "#####",
        ]);
        assert!(is_valid_spawn(&g, Cell::Trap, 2, 2));
        assert!(!is_valid_spawn(&g, Cell::Trap, 1, 1)); // corner: two walls
        g.set_cell(2, 1, Cell::Trap);
        assert!(!is_valid_spawn(&g, Cell::Trap, 2, 2));
    }

    #[test]
    fn off_grid_counts_as_wall() {
        let g = Grid::from_rows(&[" #", "##"]);
        assert!(is_valid_spawn(&g, Cell::Key, 0, 0));
    }

    #[test]
    fn exhausted_sampling_fails_instead_of_hanging() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut grid = Grid::new(7, 7, Cell::Wall);
        let err = MazeBuilder::new(&mut rng)
            .with_max_attempts(50)
            .place(&mut grid, Cell::Key)
            .unwrap_err();
        assert_eq!(err, MazeGenerationError::PlacementExhausted { item: Cell::Key, attempts: 50 });
    }

    #[test]
    fn place_rejects_items_without_rule() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut grid = Grid::new(7, 7, Cell::Empty);
        let err = MazeBuilder::new(&mut rng).place(&mut grid, Cell::Monster).unwrap_err();
        assert_eq!(err, MazeGenerationError::NoSpawnRule(Cell::Monster));
    }

    #[test]
    fn sealed_key_is_reported() {
        let g = Grid::from_rows(&[
            "#######",
            "#P  #K#",
            "#  D###",
            "#######",
        ]);
        assert_eq!(
            check_reachable(&g, (1, 1)),
            Err(MazeGenerationError::Unreachable { item: Cell::Key, x: 5, y: 1 }),
        );
    }

    #[test]
    fn key_behind_door_is_unreachable() {
        let g = Grid::from_rows(&[
            "#######",
            "#P D K#",
            "#######",
        ]);
        assert!(matches!(
            check_reachable(&g, (1, 1)),
            Err(MazeGenerationError::Unreachable { item: Cell::Key, .. })
        ));
        let open = Grid::from_rows(&[
            "#######",
            "#P K D#",
            "#######",
        ]);
        assert_eq!(check_reachable(&open, (1, 1)), Ok(()));
    }
}
