/// Tile kinds and the immutable per-stage tile map.
/// Tile semantics are queried via methods so the legend lives in one place.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileKind {
    #[default]
    Empty,
    Platform, // Walkable top surface
    Ladder,   // Climbable
}

impl TileKind {
    pub fn is_ladder(self) -> bool {
        matches!(self, TileKind::Ladder)
    }

    pub fn is_platform(self) -> bool {
        matches!(self, TileKind::Platform)
    }

    /// Map glyph for this tile. Entity markers are handled by the stage loader.
    pub fn from_glyph(ch: char) -> Option<TileKind> {
        match ch {
            ' ' | '.' => Some(TileKind::Empty),
            '=' => Some(TileKind::Platform),
            'H' => Some(TileKind::Ladder),
            _ => None,
        }
    }
}

/// Fixed-size grid of tiles, row-major (`y * width + x`).
/// Never mutated once a stage is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
}

impl TileMap {
    /// Build from a row-major tile vector. Returns None if the length
    /// doesn't match `width * height` or either dimension is zero.
    pub fn new(width: usize, height: usize, tiles: Vec<TileKind>) -> Option<Self> {
        if width == 0 || height == 0 || tiles.len() != width * height {
            return None;
        }
        Some(TileMap { width, height, tiles })
    }

    /// Parse a map from glyph rows. Unknown glyphs become Empty.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len().max(1);
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0).max(1);
        let mut tiles = vec![TileKind::Empty; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                tiles[y * width + x] = TileKind::from_glyph(ch).unwrap_or_default();
            }
        }
        TileMap { width, height, tiles }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Tile at (x, y). Out of bounds reads as Empty.
    #[inline]
    pub fn tile_at(&self, x: usize, y: usize) -> TileKind {
        if x < self.width && y < self.height {
            self.tiles[y * self.width + x]
        } else {
            TileKind::Empty
        }
    }
}
