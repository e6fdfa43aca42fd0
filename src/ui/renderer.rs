/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Grid → terminal: game cell (gx, gy) occupies columns (gx*2, gx*2+1) on
/// row MAP_ROW + gy. Cells vacated by a move, pickup or kill are invalidated
/// in the back buffer so their background tile is always re-emitted.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{GridPos, Mode, PickupKind};
use crate::domain::projectile::SPIN_FRAMES;
use crate::domain::tile::TileKind;
use crate::sim::event::GameEvent;
use crate::sim::flow::{Game, MenuChoice, PauseChoice, Phase};
use crate::sim::world::Session;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 16],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // true = this char occupies 2 terminal columns
    cont: bool, // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so inter-row gaps
    /// match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 26, b: 18 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Each game cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 50, b: 30 };
const BANNER_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const LEAF: Color = Color::Rgb { r: 90, g: 230, b: 110 };
const DIM: Color = Color::DarkGrey;

/// Terminal (col, row) of the left half of game cell `pos`.
fn cell_origin(pos: GridPos) -> (usize, usize) {
    (pos.x * CELL_W, MAP_ROW + pos.y)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<std::mem::Discriminant<Phase>>,
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
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    /// Restore the terminal. Safe to call after a failed `init`.
    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, game: &Game, events: &[GameEvent], now: u64) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for clean transition
        let phase = std::mem::discriminant(&game.phase);
        if self.last_phase != Some(phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        for at in events.iter().filter_map(GameEvent::vacated_cell) {
            self.invalidate_cell(at);
        }

        self.compose(game, now);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    /// Force the background under `at` to be re-emitted next flush.
    fn invalidate_cell(&mut self, at: GridPos) {
        let (col, row) = cell_origin(at);
        self.back.set(col, row, Cell::INVALID);
        self.back.set(col + 1, row, Cell::INVALID);
    }

    fn compose(&mut self, game: &Game, now: u64) {
        self.front.clear();
        let blink = (now / 400) % 2 == 0;

        match (game.phase, game.session.as_ref()) {
            (Phase::MainMenu { cursor }, _) => self.compose_menu(cursor, game.stages.len()),
            (Phase::Playing, Some(s)) => {
                self.compose_stage(s, game.stages.len());
                self.compose_help(s);
            }
            (Phase::Paused { cursor }, Some(s)) => {
                self.compose_stage(s, game.stages.len());
                self.compose_pause(s, cursor, blink);
            }
            (Phase::StageCleared { .. }, Some(s)) => {
                self.compose_stage(s, game.stages.len());
                let line = format!("STAGE {} CLEARED", s.stage_index + 1);
                self.compose_banner(s, &line, "A: continue");
            }
            (Phase::GameOver { .. }, Some(s)) => self.compose_game_over(s),
            (Phase::GameWon, Some(s)) => self.compose_game_won(s, game.stages.len(), blink),
            // Session already dropped: nothing left to draw but the menu frame.
            (_, None) => self.compose_menu(MenuChoice::Start, game.stages.len()),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal's own.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: stage ──

    fn compose_stage(&mut self, s: &Session, total: usize) {
        self.compose_hud(s, total);

        for gy in 0..s.map.height() {
            for gx in 0..s.map.width() {
                self.compose_cell(s, GridPos::new(gx, gy));
            }
        }
    }

    fn compose_hud(&mut self, s: &Session, total: usize) {
        let held = if s.player.has_boomerang { "  [boomerang]" } else { "" };
        let hud = format!(
            " Stage {}/{} {}  SCORE {}  TIME {}  LIVES {}  COINS {}{} ",
            s.stage_index + 1,
            total,
            s.stage_name,
            s.score(),
            s.time.max(0) / 1000,
            s.lives,
            s.player.coins_grabbed,
            held,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_help(&mut self, s: &Session) {
        let row = MAP_ROW + s.map.height() + 1;
        let help = " ←→↑↓/WASD Move   Space/Z Throw   P/Esc Pause   Ctrl+C Quit";
        self.front.put_str(0, row, help, DIM, Color::Reset);
    }

    fn put_wide(&mut self, col: usize, row: usize, c: char) {
        self.front.set(col, row, Cell::from_char_wide(c, Color::Reset));
        self.front.set(col + 1, row, Cell::WIDE_CONT);
    }

    fn put_pair(&mut self, col: usize, row: usize, c0: char, c1: char, fg: Color, bg: Color) {
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }

    /// Draw whatever is topmost at `pos`:
    /// player > enemy > boomerang > pickup > exit > vehicle > tile.
    fn compose_cell(&mut self, s: &Session, pos: GridPos) {
        let (col, row) = cell_origin(pos);

        if s.player.pos == pos {
            let ch = match (s.player.mode, s.player.anim_frame) {
                (Mode::Climbing, _) => '🧗',
                (_, false) => '🏃',
                (_, true) => '🚶',
            };
            self.put_wide(col, row, ch);
            return;
        }

        if let Some(e) = s.enemies.iter().find(|e| e.exists && e.pos == pos) {
            let ch = match (e.flying, e.anim_frame) {
                (true, _) => '🦇',
                (false, false) => '🐍',
                (false, true) => '🦂',
            };
            self.put_wide(col, row, ch);
            return;
        }

        if s.boomerang.exists && s.boomerang.pos == pos {
            let spin = ['/', '-', '\\'];
            let c = spin[usize::from(s.boomerang.frame) % SPIN_FRAMES as usize];
            self.put_pair(col, row, c, c, GOLD, Color::Reset);
            return;
        }

        if let Some(p) = s.pickups.iter().find(|p| p.exists && p.pos == pos) {
            let ch = match p.kind {
                PickupKind::Health => '💗',
                PickupKind::Point => '💰',
                PickupKind::BoomerangGrant => '🪃',
            };
            self.put_wide(col, row, ch);
            return;
        }

        if s.exit.exists && s.exit.pos == pos {
            self.put_wide(col, row, '🚪');
            return;
        }

        for (i, v) in s.vehicles.iter().enumerate() {
            let id = char::from_digit((i as u32 + 1) % 10, 10).unwrap_or('?');
            let cyan = Color::Rgb { r: 80, g: 210, b: 255 };
            if v.start == pos {
                let mark = if v.bidirectional { '◎' } else { '○' };
                self.put_pair(col, row, mark, id, cyan, Color::Reset);
                return;
            }
            if v.finish == pos {
                let mark = if v.bidirectional { '◎' } else { '●' };
                self.put_pair(col, row, mark, id, cyan, Color::Reset);
                return;
            }
        }

        self.compose_tile(s.map.tile_at(pos.x, pos.y), col, row);
    }

    fn compose_tile(&mut self, tile: TileKind, col: usize, row: usize) {
        match tile {
            TileKind::Empty => self.put_pair(col, row, ' ', ' ', Color::Reset, Color::Reset),
            TileKind::Platform => self.put_pair(
                col, row, '▀', '▀',
                Color::Rgb { r: 60, g: 170, b: 60 },
                Color::Rgb { r: 90, g: 60, b: 30 },
            ),
            TileKind::Ladder => self.put_pair(
                col, row, '╠', '╣',
                Color::Rgb { r: 200, g: 150, b: 80 },
                Color::Reset,
            ),
        }
    }

    // ── Overlays ──

    fn centered_col(&self, s: &Session, text_len: usize) -> usize {
        (s.map.width() * CELL_W).saturating_sub(text_len) / 2
    }

    fn compose_banner(&mut self, s: &Session, line: &str, hint: &str) {
        let row = MAP_ROW + s.map.height() / 2;
        let text = format!("  ★ {line} ★  ");
        let cx = self.centered_col(s, text.chars().count());
        self.front.put_str(cx, row, &text, Color::Black, BANNER_BG);
        let hx = self.centered_col(s, hint.len());
        self.front.put_str(hx, row + 1, hint, Color::Black, BANNER_BG);
    }

    fn compose_pause(&mut self, s: &Session, cursor: PauseChoice, blink: bool) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let box_w = 24;
        let box_x = self.centered_col(s, box_w);
        let box_y = (MAP_ROW + s.map.height() / 2).saturating_sub(3);
        for y in box_y..box_y + 7 {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, bg));
            }
        }

        let title = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + 6, box_y + 1, title, GOLD, bg);

        let items = [(PauseChoice::Restart, "Restart stage"), (PauseChoice::Quit, "Quit to menu")];
        for (i, (choice, label)) in items.iter().enumerate() {
            let selected = *choice == cursor;
            let (mark, fg) = if selected { ("▸ ", LEAF) } else { ("  ", Color::White) };
            self.front.put_str(box_x + 4, box_y + 3 + i, mark, fg, bg);
            self.front.put_str(box_x + 6, box_y + 3 + i, label, fg, bg);
        }
        self.front.put_str(box_x + 2, box_y + 6, "Start/P: resume", DIM, bg);
    }

    // ── Static screens ──

    fn compose_menu(&mut self, cursor: MenuChoice, stage_count: usize) {
        let title = [
            r"   _                _       _           _    _         ",
            r"  (_)_  _ _ _  __ _| |___  | |__ _ __| |__| |___ _ _  ",
            r"  | | || | ' \/ _` | / -_) | / _` / _` / _` / -_) '_| ",
            r" _/ |\_,_|_||_\__, |_\___| |_\__,_\__,_\__,_\___|_|   ",
            r"|__/          |___/                                   ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, LEAF, Color::Reset);
        }

        let menu_base = 9;
        let items = [(MenuChoice::Start, "Start"), (MenuChoice::Quit, "Quit")];
        for (i, (choice, label)) in items.iter().enumerate() {
            let selected = *choice == cursor;
            let (mark, fg) = if selected { ("▸ ", GOLD) } else { ("  ", Color::White) };
            self.front.put_str(8, menu_base + i, mark, fg, Color::Reset);
            self.front.put_str(10, menu_base + i, label, fg, Color::Reset);
        }

        let info = format!("{stage_count} stages");
        self.front.put_str(10, menu_base + 3, &info, DIM, Color::Reset);

        let help = [
            "Controls",
            "  ←→↑↓ / WASD      Move / menu",
            "  Space / Z / Enter Throw / confirm",
            "  P / Esc           Pause",
            "  Ctrl+C            Quit",
        ];
        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, s: &Session) {
        let box_art = [
            "╔════════════════════════════╗",
            "║        GAME   OVER         ║",
            "╚════════════════════════════╝",
        ];
        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, red, Color::Reset);
        }
        let reason = if s.time <= 0 { "Out of time" } else { "Out of lives" };
        let score = format!("Final score: {}", s.score());
        let stage = format!("Reached stage {}: {}", s.stage_index + 1, s.stage_name);
        self.front.put_str(8, 8, reason, Color::White, Color::Reset);
        self.front.put_str(8, 9, &score, Color::White, Color::Reset);
        self.front.put_str(8, 10, &stage, Color::White, Color::Reset);
        self.front.put_str(8, 12, "A: back to menu", DIM, Color::Reset);
    }

    fn compose_game_won(&mut self, s: &Session, total: usize, blink: bool) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★ YOU ESCAPED THE JUNGLE! ★    ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let score = format!("Final score: {}", s.score());
        let stages = format!("All {total} stages cleared");
        let detail = format!(
            "{} lives, {} coins, {} s left",
            s.lives,
            s.player.coins_grabbed,
            s.time.max(0) / 1000
        );
        self.front.put_str(6, 8, &score, Color::White, Color::Reset);
        self.front.put_str(6, 9, &stages, LEAF, Color::Reset);
        self.front.put_str(6, 10, &detail, Color::White, Color::Reset);
        if blink {
            self.front.put_str(6, 12, "▸ A: quit", LEAF, Color::Reset);
        }
    }
}
