/// Entities: Player and Monster.
/// Both carry their own position; the grid markers only mirror it.

/// Seconds of monster life before it becomes enraged.
pub const RAGE_AFTER_SECS: u32 = 60;

/// Orthogonal movement direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit offset (dx, dy). Screen coordinates: y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Apply to a position.
    pub fn step(self, (x, y): (i32, i32)) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    x: i32,
    y: i32,
    keys_collected: usize,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Player { x, y, keys_collected: 0 }
    }

    pub fn x(&self) -> i32 { self.x }
    pub fn y(&self) -> i32 { self.y }
    pub fn pos(&self) -> (i32, i32) { (self.x, self.y) }
    pub fn keys_collected(&self) -> usize { self.keys_collected }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// No upper clamp: the caller compares against the maze's key total.
    pub fn collect_key(&mut self) {
        self.keys_collected += 1;
    }
}

/// The monster. `enraged` lives on the instance, so a fresh session
/// always starts calm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Monster {
    x: i32,
    y: i32,
    last_move: Option<Direction>,
    elapsed_secs: u32,
    enraged: bool,
}

impl Monster {
    pub fn new(x: i32, y: i32) -> Self {
        Monster { x, y, last_move: None, elapsed_secs: 0, enraged: false }
    }

    pub fn x(&self) -> i32 { self.x }
    pub fn y(&self) -> i32 { self.y }
    pub fn pos(&self) -> (i32, i32) { (self.x, self.y) }
    pub fn last_move(&self) -> Option<Direction> { self.last_move }
    pub fn elapsed_secs(&self) -> u32 { self.elapsed_secs }
    pub fn is_enraged(&self) -> bool { self.enraged }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_last_move(&mut self, dir: Direction) {
        self.last_move = Some(dir);
    }

    /// Advance the alive-time counter by one second.
    /// Returns true on the tick that flips the monster into rage.
    pub fn tick_second(&mut self) -> bool {
        if self.enraged {
            return false;
        }
        self.elapsed_secs += 1;
        if self.elapsed_secs >= RAGE_AFTER_SECS {
            self.enraged = true;
            return true;
        }
        false
    }

    /// Seconds left before rage; 0 once enraged.
    pub fn secs_until_enraged(&self) -> u32 {
        RAGE_AFTER_SECS.saturating_sub(self.elapsed_secs)
    }

    /// Same cell as the player?
    pub fn check_if_caught(&self, player: &Player) -> bool {
        self.pos() == player.pos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.reverse().reverse(), d);
            let (dx, dy) = d.delta();
            let (rx, ry) = d.reverse().delta();
            assert_eq!((dx + rx, dy + ry), (0, 0));
        }
    }

    #[test]
    fn collect_key_counts_up() {
        let mut p = Player::new(1, 1);
        assert_eq!(p.keys_collected(), 0);
        p.collect_key();
        p.collect_key();
        assert_eq!(p.keys_collected(), 2);
    }

    #[test]
    fn rage_latches_after_sixty_seconds() {
        let mut m = Monster::new(0, 0);
        for _ in 0..59 {
            assert!(!m.tick_second());
        }
        assert!(!m.is_enraged());
        assert_eq!(m.secs_until_enraged(), 1);
        assert!(m.tick_second()); // 60th second flips it
        assert!(m.is_enraged());
        assert!(!m.tick_second()); // only reported once
        assert!(m.is_enraged());
        assert_eq!(m.secs_until_enraged(), 0);
    }

    #[test]
    fn new_monster_is_calm() {
        let mut a = Monster::new(0, 0);
        for _ in 0..RAGE_AFTER_SECS { a.tick_second(); }
        assert!(a.is_enraged());
        let b = Monster::new(0, 0);
        assert!(!b.is_enraged());
    }

    #[test]
    fn caught_only_on_same_cell() {
        let m = Monster::new(3, 4);
        assert!(m.check_if_caught(&Player::new(3, 4)));
        assert!(!m.check_if_caught(&Player::new(3, 5)));
    }
}
