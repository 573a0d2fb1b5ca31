use rand::Rng;
use serde::{Deserialize, Serialize};

/// Simulation clock in milliseconds. The core never reads the wall clock;
/// the host passes the current time into every tick.
pub type GameTime = u64;

/// A point in continuous map units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Movement direction on the grid. `None` means standing still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// The four directions an entity can actually travel in.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Mirror the direction (up<->down, left<->right).
    pub fn inverted(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    /// Unit step for this direction. Screen coordinates: y grows downward.
    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::None => (0.0, 0.0),
        }
    }

    /// Direction from `from` toward `to`, resolving horizontal displacement
    /// first and falling back to vertical. Coincident points yield `Down`.
    pub fn toward(from: Position, to: Position) -> Self {
        if to.x < from.x {
            Self::Left
        } else if to.x > from.x {
            Self::Right
        } else if to.y < from.y {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::CARDINALS[rng.random_range(0..Self::CARDINALS.len())]
    }
}

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub col: u32,
    pub row: u32,
}

impl Cell {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Map-unit position of this cell's anchor point.
    pub fn position(self, cell_size: f32) -> Position {
        Position::new(self.col as f32 * cell_size, self.row as f32 * cell_size)
    }

    /// Nearest cell to a map-unit position.
    pub fn containing(pos: Position, cell_size: f32) -> Self {
        Self {
            col: (pos.x / cell_size).round().max(0.0) as u32,
            row: (pos.y / cell_size).round().max(0.0) as u32,
        }
    }
}

/// Grid dimensions of the current round's map.
///
/// The playable area is the interior: the outermost ring of cells is a wall,
/// so entities are clamped to `[cell_size, (cells - 1) * cell_size]` on each
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: u32,
    pub height: u32,
    pub cell_size: f32,
}

impl MapBounds {
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Total extent in map units.
    pub fn extent(&self) -> (f32, f32) {
        (
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    pub fn min_coord(&self) -> f32 {
        self.cell_size
    }

    pub fn max_x(&self) -> f32 {
        (self.width.saturating_sub(1)) as f32 * self.cell_size
    }

    pub fn max_y(&self) -> f32 {
        (self.height.saturating_sub(1)) as f32 * self.cell_size
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_coord()
            && pos.x <= self.max_x()
            && pos.y >= self.min_coord()
            && pos.y <= self.max_y()
    }

    /// Clamp each axis independently, so an entity pressed against one edge
    /// can still slide along the other axis.
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.min_coord(), self.max_x().max(self.min_coord())),
            pos.y.clamp(self.min_coord(), self.max_y().max(self.min_coord())),
        )
    }

    /// Advance `pos` by `speed` units in `direction`, clamped to the playable
    /// area.
    pub fn step(&self, pos: Position, direction: Direction, speed: f32) -> Position {
        let (dx, dy) = direction.delta();
        self.clamp(Position::new(pos.x + dx * speed, pos.y + dy * speed))
    }

    /// Iterate every interior cell, column-major.
    pub fn interior_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = 1..self.width.saturating_sub(1);
        let rows = 1..self.height.saturating_sub(1);
        cols.flat_map(move |col| rows.clone().map(move |row| Cell::new(col, row)))
    }

    /// Uniformly random interior cell.
    pub fn random_interior_cell(&self, rng: &mut impl Rng) -> Cell {
        let max_col = self.width.saturating_sub(2).max(1);
        let max_row = self.height.saturating_sub(2).max(1);
        Cell::new(rng.random_range(1..=max_col), rng.random_range(1..=max_row))
    }

    pub fn random_position(&self, rng: &mut impl Rng) -> Position {
        self.random_interior_cell(rng).position(self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn toward_prefers_horizontal_axis() {
        let from = Position::new(100.0, 100.0);
        assert_eq!(Direction::toward(from, Position::new(40.0, 300.0)), Direction::Left);
        assert_eq!(Direction::toward(from, Position::new(140.0, 0.0)), Direction::Right);
        assert_eq!(Direction::toward(from, Position::new(100.0, 20.0)), Direction::Up);
        assert_eq!(Direction::toward(from, Position::new(100.0, 180.0)), Direction::Down);
    }

    #[test]
    fn inverted_swaps_opposites() {
        for dir in Direction::CARDINALS {
            assert_ne!(dir.inverted(), dir);
            assert_eq!(dir.inverted().inverted(), dir);
        }
        assert_eq!(Direction::None.inverted(), Direction::None);
    }

    #[test]
    fn step_clamps_only_overextended_axis() {
        let bounds = MapBounds::new(10, 10, 20.0);
        let pos = bounds.step(Position::new(20.0, 100.0), Direction::Left, 5.0);
        assert_eq!(pos, Position::new(20.0, 100.0));
        let pos = bounds.step(Position::new(178.0, 60.0), Direction::Right, 5.0);
        assert_eq!(pos, Position::new(180.0, 60.0));
        assert!(bounds.contains(pos));
    }

    #[test]
    fn random_cells_stay_interior() {
        let bounds = MapBounds::new(6, 5, 20.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let cell = bounds.random_interior_cell(&mut rng);
            assert!((1..=4).contains(&cell.col));
            assert!((1..=3).contains(&cell.row));
            assert!(bounds.contains(cell.position(bounds.cell_size)));
        }
    }

    #[test]
    fn interior_cell_count() {
        let bounds = MapBounds::new(6, 5, 20.0);
        assert_eq!(bounds.interior_cells().count(), 4 * 3);
    }

    #[test]
    fn cell_containing_rounds_to_nearest() {
        assert_eq!(Cell::containing(Position::new(41.0, 59.0), 20.0), Cell::new(2, 3));
    }
}
