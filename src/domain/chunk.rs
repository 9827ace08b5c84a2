/// Chunk palette: the fixed 6×6 templates the maze is tiled from.
///
/// Every template keeps row 0 column 3 and row 3 column 0 open and its
/// last row open along the bottom, so any two chunks placed side by side
/// or stacked connect through those openings.

use super::cell::Cell;

pub const CHUNK_SIZE: usize = 6;

pub type Chunk = [&'static str; CHUNK_SIZE];

pub const PALETTE: [Chunk; 13] = [
    [
        "### ##",
        "#   # ",
        "# # # ",
        "  ### ",
        "# # # ",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "# # # ",
        "  # # ",
        "# ### ",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "# ####",
        "  #   ",
        "# # ##",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "##### ",
        "      ",
        "# ### ",
        "# #   ",
    ],
    [
        "### ##",
        "#     ",
        "# ####",
        "   #  ",
        "# ## #",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "# ####",
        "  #   ",
        "# ### ",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "# # # ",
        "  ### ",
        "### # ",
        "#     ",
    ],
    [
        "### ##",
        "#     ",
        "# # # ",
        "  # # ",
        "# # # ",
        "# # # ",
    ],
    [
        "### ##",
        "#     ",
        "# # # ",
        "  ### ",
        "#   # ",
        "# # # ",
    ],
    [
        "### ##",
        "#     ",
        "### ##",
        "      ",
        "# ## #",
        "# #   ",
    ],
    [
        "### ##",
        "#     ",
        "# ## #",
        "      ",
        "# ## #",
        "# #   ",
    ],
    [
        "### ##",
        "#     ",
        "# ### ",
        "    # ",
        "# ### ",
        "# #   ",
    ],
    [
        "### ##",
        "#     ",
        "# # # ",
        "  # # ",
        "# # # ",
        "#     ",
    ],
];

/// Cell at (x, y) inside a chunk template.
#[inline]
pub fn chunk_cell(chunk: &Chunk, x: usize, y: usize) -> Cell {
    chunk[y].as_bytes().get(x).map_or(Cell::Wall, |&b| Cell::from_char(b as char))
}
