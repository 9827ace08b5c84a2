/// Monster AI: perception, BFS pursuit and roaming.
///
/// Every monster tick is decided from scratch; there is no stored mode:
///   1. **Perceive**: the player is noticed if within hearing range
///      (Manhattan ≤ 3, or always once enraged) or in a straight, wall-free
///      line along the monster's row or column.
///   2. **Pursue**: if noticed, take the first step of a BFS shortest path
///      toward the player's cell.
///   3. **Roam**: otherwise wander, avoiding backtracking and dead ends.
///
/// The monster never steps on Key or Door cells. Everything else that is
/// walkable (including Trap and the player's cell) is fair game.

use std::collections::VecDeque;

use log::trace;
use rand::Rng;

use super::cell::Cell;
use super::entity::{Direction, Monster, Player};
use super::grid::Grid;

/// Manhattan distance at which the monster hears the player.
pub const HEARING_RANGE: i32 = 3;

/// BFS expansion order. Only matters for tie-breaking between equally
/// short paths, but it is fixed so pursuit is reproducible.
const PURSUIT_ORDER: [Direction; 4] = [Direction::Down, Direction::Right, Direction::Up, Direction::Left];

/// Candidate order for roaming before the random pick.
const ROAM_ORDER: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

/// What the monster knows about the player this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Perception {
    pub in_range: bool,
    pub sees: bool,
}

impl Perception {
    pub fn notices(self) -> bool {
        self.in_range || self.sees
    }
}

/// The terminal action of one monster tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MonsterAction {
    Pursue(Direction),
    Roam(Direction),
    Stay,
}

// ── Perception ──

pub fn perceive(monster: &Monster, player: &Player, grid: &Grid) -> Perception {
    Perception {
        in_range: within_range(monster, player, HEARING_RANGE),
        sees: sees_player(grid, monster.pos(), player.pos()),
    }
}

/// Enraged monsters always know where the player is.
pub fn within_range(monster: &Monster, player: &Player, range: i32) -> bool {
    if monster.is_enraged() { return true; }
    manhattan(monster.pos(), player.pos()) <= range
}

/// Straight-line sight along the row and column of `from`.
/// Each of the four rays runs to the grid edge and stops at the first Wall.
pub fn sees_player(grid: &Grid, from: (i32, i32), target: (i32, i32)) -> bool {
    for dir in Direction::ALL {
        let mut cur = dir.step(from);
        while grid.in_bounds(cur.0, cur.1) {
            if grid.cell_at(cur.0, cur.1) == Cell::Wall { break; }
            if cur == target { return true; }
            cur = dir.step(cur);
        }
    }
    false
}

pub fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

// ── Movement rules ──

/// Walkable, and not a Key or the Door.
#[inline]
pub fn can_move_to(grid: &Grid, x: i32, y: i32) -> bool {
    grid.is_walkable(x, y) && !grid.cell_at(x, y).blocks_monster()
}

/// A cell with at most one exit the monster could take.
pub fn is_dead_end(grid: &Grid, x: i32, y: i32) -> bool {
    let exits = Direction::ALL
        .iter()
        .filter(|d| {
            let (nx, ny) = d.step((x, y));
            can_move_to(grid, nx, ny)
        })
        .count();
    exits <= 1
}

// ── Pursuit ──

/// First step of a shortest path from `from` to `to`, or None if the target
/// is unreachable or already reached.
///
/// Queue entries carry the direction of the first step taken out of `from`,
/// which is exactly what walking the parent chain back from the goal would
/// yield.
pub fn first_step(grid: &Grid, from: (i32, i32), to: (i32, i32)) -> Option<Direction> {
    if from == to { return None; }
    if !grid.in_bounds(from.0, from.1) { return None; }

    let (w, h) = (grid.width(), grid.height());
    let mut visited = vec![vec![false; w]; h];
    visited[from.1 as usize][from.0 as usize] = true;

    let mut queue: VecDeque<((i32, i32), Option<Direction>)> = VecDeque::with_capacity(64);
    queue.push_back((from, None));

    while let Some((cur, first)) = queue.pop_front() {
        if cur == to {
            return first;
        }
        for dir in PURSUIT_ORDER {
            let (nx, ny) = dir.step(cur);
            if !can_move_to(grid, nx, ny) { continue; }
            if visited[ny as usize][nx as usize] { continue; }
            visited[ny as usize][nx as usize] = true;
            queue.push_back(((nx, ny), first.or(Some(dir))));
        }
    }

    None
}

// ── Roaming ──

/// Pick a wandering direction: no U-turns and no dead ends if possible,
/// otherwise any legal move, otherwise None.
pub fn roam_direction<R: Rng>(
    grid: &Grid,
    from: (i32, i32),
    last_move: Option<Direction>,
    rng: &mut R,
) -> Option<Direction> {
    let backtrack = last_move.map(Direction::reverse);

    let mut candidates: Vec<Direction> = ROAM_ORDER
        .iter()
        .copied()
        .filter(|&d| Some(d) != backtrack)
        .filter(|&d| {
            let (nx, ny) = d.step(from);
            can_move_to(grid, nx, ny) && !is_dead_end(grid, nx, ny)
        })
        .collect();

    if candidates.is_empty() {
        candidates = ROAM_ORDER
            .iter()
            .copied()
            .filter(|&d| {
                let (nx, ny) = d.step(from);
                can_move_to(grid, nx, ny)
            })
            .collect();
    }

    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

// ── Tick ──

/// Decide this tick's action without touching any state.
pub fn decide<R: Rng>(monster: &Monster, player: &Player, grid: &Grid, rng: &mut R) -> MonsterAction {
    let perception = perceive(monster, player, grid);
    if perception.notices() {
        match first_step(grid, monster.pos(), player.pos()) {
            Some(dir) => MonsterAction::Pursue(dir),
            None => MonsterAction::Stay,
        }
    } else {
        match roam_direction(grid, monster.pos(), monster.last_move(), rng) {
            Some(dir) => MonsterAction::Roam(dir),
            None => MonsterAction::Stay,
        }
    }
}

/// Carry out `action`: move one cell and keep the grid marker in sync.
/// Only roaming updates the monster's last move. Returns the cell the
/// monster stepped onto, as it was before the marker covered it.
pub fn apply_action(monster: &mut Monster, grid: &mut Grid, action: MonsterAction) -> Option<Cell> {
    let dir = match action {
        MonsterAction::Pursue(d) => d,
        MonsterAction::Roam(d) => {
            monster.set_last_move(d);
            d
        }
        MonsterAction::Stay => return None,
    };

    let old = monster.pos();
    let new = dir.step(old);
    let underneath = grid.cell_at(new.0, new.1);
    grid.move_marker(old, new, Cell::Monster);
    monster.set_position(new.0, new.1);
    trace!("monster {:?} {:?} -> {:?}", action, old, new);
    Some(underneath)
}

/// Run one monster tick: decide, then apply.
pub fn move_monster<R: Rng>(
    monster: &mut Monster,
    player: &Player,
    grid: &mut Grid,
    rng: &mut R,
) -> MonsterAction {
    let action = decide(monster, player, grid, rng);
    apply_action(monster, grid, action);
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RAGE_AFTER_SECS;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Build a grid plus entities from a diagram. 'P' and 'M' place the
    /// player and the monster and stay on the grid as markers.
    fn world_from(rows: &[&str]) -> (Grid, Player, Monster) {
        let grid = Grid::from_rows(rows);
        let (px, py) = grid.positions_of(Cell::Player)[0];
        let (mx, my) = grid.positions_of(Cell::Monster)[0];
        (grid, Player::new(px, py), Monster::new(mx, my))
    }

    fn enrage(m: &mut Monster) {
        for _ in 0..RAGE_AFTER_SECS { m.tick_second(); }
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    // ── Perception ──

    #[test]
    fn wall_blocks_line_of_sight() {
        let (mut g, p, m) = world_from(&[
            "##########",
            "#M   #  P#",
            "##########",
        ]);
        assert!(!sees_player(&g, m.pos(), p.pos()));
        g.set_cell(5, 1, Cell::Empty);
        assert!(sees_player(&g, m.pos(), p.pos()));
    }

    #[test]
    fn sight_works_along_columns_and_through_items() {
        let (g, p, m) = world_from(&[
            "###",
            "#P#",
            "#K#",
            "#T#",
            "#D#",
            "# #",
            "#M#",
            "###",
        ]);
        assert!(sees_player(&g, m.pos(), p.pos()));
    }

    #[test]
    fn no_sight_off_axis() {
        let (g, p, m) = world_from(&[
            "#####",
            "#M  #",
            "#   #",
            "#  P#",
            "#####",
        ]);
        assert!(!sees_player(&g, m.pos(), p.pos()));
    }

    #[test]
    fn hearing_range_is_manhattan_three() {
        let m = Monster::new(5, 5);
        assert!(within_range(&m, &Player::new(6, 7), HEARING_RANGE));
        assert!(within_range(&m, &Player::new(2, 5), HEARING_RANGE));
        assert!(!within_range(&m, &Player::new(7, 7), HEARING_RANGE));
    }

    #[test]
    fn enraged_monster_hears_everywhere() {
        let mut m = Monster::new(0, 0);
        let far = Player::new(100, 100);
        assert!(!within_range(&m, &far, HEARING_RANGE));
        enrage(&mut m);
        assert!(within_range(&m, &far, HEARING_RANGE));
    }

    // ── Pursuit ──

    #[test]
    fn pursuit_reaches_target_in_path_length_ticks_avoiding_key() {
        let (mut g, p, mut m) = world_from(&[
            "#########",
            "#M  K  P#",
            "# ##### #",
            "#       #",
            "#########",
        ]);
        enrage(&mut m);
        let mut r = rng(1);
        let key = (4, 1);

        // Shortest path around the key: 2 down, 6 right, 2 up.
        for tick in 1..=10 {
            let action = move_monster(&mut m, &p, &mut g, &mut r);
            assert!(matches!(action, MonsterAction::Pursue(_)), "tick {tick}: {action:?}");
            assert_ne!(m.pos(), key);
            assert_eq!(m.check_if_caught(&p), tick == 10, "tick {tick}");
        }
        assert_eq!(g.cell_at(key.0, key.1), Cell::Key);
        assert_eq!(g.cell_at(7, 1), Cell::Monster);
    }

    #[test]
    fn pursuit_never_crosses_door() {
        let (g, _, _) = world_from(&[
            "#######",
            "#M D P#",
            "#######",
        ]);
        assert_eq!(first_step(&g, (1, 1), (5, 1)), None);
    }

    #[test]
    fn pursuit_tie_break_prefers_down() {
        let (g, p, m) = world_from(&[
            "####",
            "#M #",
            "# P#",
            "####",
        ]);
        assert_eq!(first_step(&g, m.pos(), p.pos()), Some(Direction::Down));
    }

    #[test]
    fn adjacent_pursuit_steps_onto_player() {
        let (mut g, p, mut m) = world_from(&[
            "####",
            "#MP#",
            "####",
        ]);
        let action = move_monster(&mut m, &p, &mut g, &mut rng(0));
        assert_eq!(action, MonsterAction::Pursue(Direction::Right));
        assert!(m.check_if_caught(&p));
        assert_eq!(g.cell_at(1, 1), Cell::Empty);
    }

    #[test]
    fn same_cell_has_no_step() {
        let g = Grid::from_rows(&["   "]);
        assert_eq!(first_step(&g, (1, 0), (1, 0)), None);
    }

    #[test]
    fn unreachable_target_stays_put() {
        let (mut g, p, mut m) = world_from(&[
            "#######",
            "#M # P#",
            "#######",
        ]);
        enrage(&mut m);
        let action = move_monster(&mut m, &p, &mut g, &mut rng(3));
        assert_eq!(action, MonsterAction::Stay);
        assert_eq!(m.pos(), (1, 1));
        assert_eq!(g.cell_at(1, 1), Cell::Monster);
    }

    // ── Roaming ──

    #[test]
    fn roaming_does_not_backtrack_in_corridor() {
        let (mut g, p, mut m) = world_from(&[
            "#########",
            "#   M   #",
            "#########",
            "#P      #",
            "#########",
        ]);
        m.set_last_move(Direction::Right);
        for seed in 0..20 {
            let mut r = rng(seed);
            let action = decide(&m, &p, &g, &mut r);
            assert_eq!(action, MonsterAction::Roam(Direction::Right));
        }
        move_monster(&mut m, &p, &mut g, &mut rng(0));
        assert_eq!(m.pos(), (5, 1));
        assert_eq!(m.last_move(), Some(Direction::Right));
    }

    #[test]
    fn roaming_skips_dead_ends() {
        let (g, _, m) = world_from(&[
            "#######",
            "#######",
            "### ###",
            "#  M  #",
            "#######",
            "#P    #",
            "#######",
        ]);
        assert!(is_dead_end(&g, 3, 2));
        for seed in 0..40 {
            let dir = roam_direction(&g, m.pos(), None, &mut rng(seed));
            assert!(matches!(dir, Some(Direction::Left) | Some(Direction::Right)), "{dir:?}");
        }
    }

    #[test]
    fn roaming_falls_back_to_backtrack() {
        let (g, _, _) = world_from(&[
            "####",
            "#M #",
            "####",
            "#P #",
            "####",
        ]);
        // Came in moving Left; the only way out is back Right into a dead end.
        let dir = roam_direction(&g, (1, 1), Some(Direction::Left), &mut rng(9));
        assert_eq!(dir, Some(Direction::Right));
    }

    #[test]
    fn roaming_avoids_keys() {
        let (g, _, _) = world_from(&[
            "#####",
            "#KMK#",
            "#####",
            "#P  #",
            "#####",
        ]);
        assert_eq!(roam_direction(&g, (2, 1), None, &mut rng(2)), None);
    }

    #[test]
    fn boxed_in_monster_stays() {
        let (mut g, p, mut m) = world_from(&[
            "###",
            "#M#",
            "###",
            "#P#",
            "###",
        ]);
        assert_eq!(move_monster(&mut m, &p, &mut g, &mut rng(0)), MonsterAction::Stay);
        assert_eq!(m.last_move(), None);
    }

    #[test]
    fn pursuit_does_not_record_last_move() {
        let (mut g, p, mut m) = world_from(&[
            "######",
            "#M  P#",
            "######",
        ]);
        move_monster(&mut m, &p, &mut g, &mut rng(0));
        assert_eq!(m.pos(), (2, 1));
        assert_eq!(m.last_move(), None);
    }
}
