/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout: maze on the left (two terminal columns per maze cell),
/// side panel with status and legend on the right, message bar below.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use dungeon_escape::domain::cell::Cell;
use dungeon_escape::sim::builder::{MAZE_HEIGHT, MAZE_WIDTH};
use dungeon_escape::sim::session::Session;

use crate::Phase;

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for every terminal cell, so inter-row gaps
    /// match on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }
}

// ── Cell visuals ──

/// Terminal columns per maze cell.
const CELL_W: usize = 2;

const MAP_COL: usize = 2;
const MAP_ROW: usize = 1;
const PANEL_GAP: usize = 3;

const WALL_FG: Color = Color::Rgb { r: 110, g: 100, b: 130 };
const FLOOR_BG: Color = Color::Rgb { r: 30, g: 30, b: 44 };
const PLAYER_FG: Color = Color::Rgb { r: 80, g: 220, b: 255 };
const MONSTER_FG: Color = Color::Rgb { r: 255, g: 140, b: 40 };
const RAGE_FG: Color = Color::Rgb { r: 255, g: 40, b: 40 };
const KEY_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const TRAP_FG: Color = Color::Rgb { r: 200, g: 80, b: 200 };
const DOOR_FG: Color = Color::Rgb { r: 160, g: 110, b: 60 };
const DIM: Color = Color::Rgb { r: 130, g: 130, b: 150 };

/// The two terminal characters and colors for one maze cell.
fn cell_visual(cell: Cell, enraged: bool) -> ([char; 2], Color, Color) {
    match cell {
        Cell::Wall => (['█', '█'], WALL_FG, Glyph::BASE_BG),
        Cell::Empty => ([' ', ' '], Color::White, FLOOR_BG),
        Cell::Player => (['◖', '◗'], PLAYER_FG, FLOOR_BG),
        Cell::Monster if enraged => (['Ӂ', '!'], RAGE_FG, FLOOR_BG),
        Cell::Monster => (['Ӂ', ' '], MONSTER_FG, FLOOR_BG),
        Cell::Key => (['⚷', ' '], KEY_FG, FLOOR_BG),
        Cell::Trap => (['^', '^'], TRAP_FG, FLOOR_BG),
        Cell::Door => (['▐', '▌'], DOOR_FG, FLOOR_BG),
    }
}

const LEGEND: [(Cell, &str); 6] = [
    (Cell::Player, "you"),
    (Cell::Monster, "monster"),
    (Cell::Key, "key"),
    (Cell::Trap, "trap"),
    (Cell::Door, "exit door"),
    (Cell::Wall, "wall"),
];

/// Side-panel status text.
fn status_lines(session: &Session) -> Vec<String> {
    let monster = if session.is_enraged() {
        "Monster: ENRAGED".to_string()
    } else {
        format!("Rage in: {:>2}s", session.seconds_until_enraged())
    };
    vec![
        format!("Escapes: {}", session.run()),
        format!("Keys:    {}/{}", session.player().keys_collected(), session.total_key_count()),
        monster,
        format!("Pace:    {}ms", session.monster_period_ms()),
    ]
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns true when the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Glyph::INVALID);

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, phase: Phase, session: &Session, message: &str) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change: clear for a clean transition
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();

        match phase {
            Phase::Tutorial => self.compose_tutorial(),
            Phase::Playing => self.compose_game(session, message),
            Phase::Caught => {
                self.compose_game(session, message);
                self.compose_caught(session);
            }
            Phase::Escaped => {
                self.compose_game(session, message);
                self.compose_escaped(session);
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Glyph::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, session: &Session, message: &str) {
        let grid = session.grid();
        let enraged = session.is_enraged();

        // ── Maze ──
        for (x, y, cell) in grid.iter() {
            let col = MAP_COL + x as usize * CELL_W;
            let row = MAP_ROW + y as usize;
            let (chars, fg, bg) = cell_visual(cell, enraged);
            self.front.set(col, row, Glyph::new(chars[0], fg, bg));
            self.front.set(col + 1, row, Glyph::new(chars[1], fg, bg));
        }

        // ── Side panel ──
        let px = MAP_COL + grid.width() * CELL_W + PANEL_GAP;
        let mut py = MAP_ROW;
        self.front.put_str(px, py, "DUNGEON ESCAPE", KEY_FG, Color::Reset);
        py += 2;

        for (i, line) in status_lines(session).iter().enumerate() {
            let fg = if i == 2 && enraged { RAGE_FG } else { Color::White };
            self.front.put_str(px, py, line, fg, Color::Reset);
            py += 1;
        }
        if session.is_frozen() {
            self.front.put_str(px, py, "TRAPPED!", TRAP_FG, Color::Reset);
        }
        py += 2;

        self.front.put_str(px, py, "Legend", DIM, Color::Reset);
        py += 1;
        for (cell, label) in LEGEND {
            let (chars, fg, bg) = cell_visual(cell, false);
            self.front.set(px, py, Glyph::new(chars[0], fg, bg));
            self.front.set(px + 1, py, Glyph::new(chars[1], fg, bg));
            self.front.put_str(px + 3, py, label, DIM, Color::Reset);
            py += 1;
        }
        py += 1;
        self.front.put_str(px, py, "WASD/Arrows: move", DIM, Color::Reset);
        self.front.put_str(px, py + 1, "Esc/Q: quit", DIM, Color::Reset);

        // ── Message bar ──
        let msg_row = MAP_ROW + grid.height() + 1;
        if !message.is_empty() {
            let msg = format!(" {message} ");
            self.front.put_str(MAP_COL, msg_row, &msg, Color::Black, KEY_FG);
        }
    }

    fn compose_tutorial(&mut self) {
        let hdr = KEY_FG;
        let lines = [
            "How to play",
            "",
            "You wake up in a dungeon. Find the way out.",
            "",
            "  * Move with WASD or the arrow keys. Hold to keep walking.",
            "  * Collect all 4 keys, then walk into the exit door.",
            "  * Traps hold you in place for a second.",
            "  * The monster hears you within 3 steps and sees you",
            "    down any straight, open corridor.",
            "  * After 60 seconds it becomes enraged and always knows",
            "    where you are.",
            "  * Every escape makes the next monster faster.",
            "",
        ];
        self.front.put_str(4, 2, "╔══════════════════╗", hdr, Color::Reset);
        self.front.put_str(4, 3, "║  DUNGEON ESCAPE  ║", hdr, Color::Reset);
        self.front.put_str(4, 4, "╚══════════════════╝", hdr, Color::Reset);
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(4, 6 + i, line, Color::White, Color::Reset);
        }
        let y = 6 + lines.len();
        for (i, (cell, label)) in LEGEND.iter().enumerate() {
            let (chars, fg, bg) = cell_visual(*cell, false);
            let row = y + i;
            self.front.set(6, row, Glyph::new(chars[0], fg, bg));
            self.front.set(7, row, Glyph::new(chars[1], fg, bg));
            self.front.put_str(10, row, label, DIM, Color::Reset);
        }
        let footer = y + LEGEND.len() + 1;
        self.front.put_str(4, footer, "▸ ENTER: Start   ESC: Quit", PLAYER_FG, Color::Reset);
    }

    fn compose_caught(&mut self, session: &Session) {
        let lines = [
            "╔════════════════════════════╗".to_string(),
            "║     THE MONSTER GOT YOU    ║".to_string(),
            "╚════════════════════════════╝".to_string(),
            format!("  Escapes this game: {}", session.run()),
            "  ▸ ENTER / ESC: Quit".to_string(),
        ];
        self.compose_overlay(&lines, RAGE_FG);
    }

    fn compose_escaped(&mut self, session: &Session) {
        let lines = [
            "╔════════════════════════════╗".to_string(),
            "║        YOU ESCAPED!        ║".to_string(),
            "╚════════════════════════════╝".to_string(),
            format!("  Escapes so far: {}", session.run() + 1),
            "  Play again? (Y/N)".to_string(),
        ];
        self.compose_overlay(&lines, KEY_FG);
    }

    /// Box centered over the maze area.
    fn compose_overlay(&mut self, lines: &[String], fg: Color) {
        let shade = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let box_h = lines.len() + 2;
        let maze_cols = MAZE_WIDTH * CELL_W;
        let box_x = MAP_COL + maze_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + MAZE_HEIGHT.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Glyph::new(' ', Color::Reset, shade));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let color = if i < 3 { fg } else { Color::White };
            self.front.put_str(box_x + 2, box_y + 1 + i, line, color, shade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_escape::domain::entity::{Monster, Player};
    use dungeon_escape::domain::grid::Grid;
    use dungeon_escape::sim::builder::Layout;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn session() -> Session {
        let layout = Layout {
            grid: Grid::from_rows(&["#####", "#P  #", "#####", "#M###", "#####"]),
            player: Player::new(1, 1),
            monster: Monster::new(1, 3),
            total_keys: 4,
        };
        Session::from_layout(layout, 2, ChaCha8Rng::seed_from_u64(0))
    }

    #[test]
    fn every_cell_draws_two_columns() {
        for cell in [Cell::Wall, Cell::Empty, Cell::Player, Cell::Monster, Cell::Key, Cell::Trap, Cell::Door] {
            let (chars, _, _) = cell_visual(cell, false);
            assert_eq!(chars.len(), CELL_W);
        }
        let (calm, _, _) = cell_visual(Cell::Monster, false);
        let (angry, fg, _) = cell_visual(Cell::Monster, true);
        assert_ne!(calm, angry);
        assert_eq!(fg, RAGE_FG);
    }

    #[test]
    fn status_shows_keys_run_and_countdown() {
        let mut s = session();
        let lines = status_lines(&s);
        assert_eq!(lines[0], "Escapes: 2");
        assert_eq!(lines[1], "Keys:    0/4");
        assert_eq!(lines[2], "Rage in: 60s");
        assert_eq!(lines[3], "Pace:    225ms");

        for _ in 0..60 { s.world_tick(); }
        assert_eq!(status_lines(&s)[2], "Monster: ENRAGED");
    }

    #[test]
    fn frame_buffer_clips_out_of_range_writes() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(2, 0, "abcdef", Color::White, Color::Reset);
        fb.set(9, 9, Glyph::INVALID);
        assert_eq!(fb.get(2, 0).ch, 'a');
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(9, 9), Glyph::BLANK);
        assert_eq!(fb.get(3, 0).bg, Glyph::BASE_BG);
    }
}
