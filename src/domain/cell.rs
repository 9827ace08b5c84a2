/// Cell kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Cell {
    Wall,
    #[default]
    Empty,
    Player,  // marker mirroring Player position
    Monster, // marker mirroring Monster position
    Key,
    Trap,
    Door,
}

impl Cell {
    /// Can anything occupy this cell? Everything but Wall.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Cells the monster refuses to step on.
    pub fn blocks_monster(self) -> bool {
        matches!(self, Cell::Key | Cell::Door)
    }

    /// Legend character, shared by chunk templates, test diagrams and logs.
    pub fn to_char(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Empty => ' ',
            Cell::Player => 'P',
            Cell::Monster => 'M',
            Cell::Key => 'K',
            Cell::Trap => 'T',
            Cell::Door => 'D',
        }
    }

    /// Inverse of `to_char`. Unknown characters read as Empty.
    pub fn from_char(ch: char) -> Cell {
        match ch {
            '#' => Cell::Wall,
            'P' => Cell::Player,
            'M' => Cell::Monster,
            'K' => Cell::Key,
            'T' => Cell::Trap,
            'D' => Cell::Door,
            _ => Cell::Empty,
        }
    }
}
