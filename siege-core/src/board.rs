//! Square board geometry with flank wraparound

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Board side length
pub const BOARD_SIZE: i8 = 6;

/// Highest valid coordinate on either axis
const MAX: i8 = BOARD_SIZE - 1;

/// File letters, indexed by x
pub const FILES: &str = "abcdef";

/// Error parsing coordinate or direction notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("invalid square notation: {0}")]
    InvalidSquare(String),
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("invalid route id: {0}")]
    InvalidRoute(String),
    #[error("invalid token id: {0}")]
    InvalidToken(String),
}

/// Board square. x is the file (a-f), y is the rank (1-6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i8,
    pub y: i8,
}

impl Coord {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Check if this square is on the board
    pub fn is_valid(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    /// Row-major index 0..36
    pub fn index(&self) -> usize {
        (self.y as usize) * BOARD_SIZE as usize + self.x as usize
    }

    /// Inverse of `index`
    pub fn from_index(index: usize) -> Self {
        let size = BOARD_SIZE as usize;
        Self::new((index % size) as i8, (index / size) as i8)
    }

    /// Every square, rank by rank
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..(BOARD_SIZE as usize * BOARD_SIZE as usize)).map(Coord::from_index)
    }

    /// Chebyshev distance from the 2x2 center block (0 for c3..d4, 2 for corners)
    pub fn distance_to_center(&self) -> i8 {
        let dx = if self.x < 3 { 2 - self.x } else { self.x - 3 };
        let dy = if self.y < 3 { 2 - self.y } else { self.y - 3 };
        dx.max(dy)
    }

    /// Literal in-bounds 8-neighborhood. No wrap is applied.
    pub fn neighbors(&self) -> impl Iterator<Item = Coord> + '_ {
        Direction::ALL
            .iter()
            .map(move |dir| {
                let (dx, dy) = dir.vector();
                Coord::new(self.x + dx, self.y + dy)
            })
            .filter(Coord::is_valid)
    }

    /// One unit step with flank wraparound.
    ///
    /// A step that leaves the board lands on the far endpoint of the line
    /// (row, column or diagonal) through this square, not on a modulo-wrapped
    /// square and not on a reflection.
    pub fn flank_step(&self, dir: Direction) -> Coord {
        let (dx, dy) = dir.vector();
        let next = Coord::new(self.x + dx, self.y + dy);
        if next.is_valid() {
            return next;
        }

        if dy == 0 {
            let x = if dx > 0 { 0 } else { MAX };
            return Coord::new(x, self.y);
        }
        if dx == 0 {
            let y = if dy > 0 { 0 } else { MAX };
            return Coord::new(self.x, y);
        }

        if dx == dy {
            // x - y is constant along NE/SW
            let c = self.x - self.y;
            let low = Coord::new(c.max(0), (-c).max(0));
            let high = Coord::new((MAX + c).min(MAX), (MAX - c).min(MAX));
            if dx > 0 {
                low
            } else {
                high
            }
        } else {
            // x + y is constant along NW/SE
            let s = self.x + self.y;
            let upper_left = Coord::new((s - MAX).max(0), s.min(MAX));
            let lower_right = Coord::new(s.min(MAX), (s - MAX).max(0));
            if dx < 0 {
                lower_right
            } else {
                upper_left
            }
        }
    }

    /// Human notation, e.g. `c4`
    pub fn notation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = FILES.as_bytes().get(self.x as usize).copied().unwrap_or(b'?') as char;
        write!(f, "{}{}", file, self.y + 1)
    }
}

impl FromStr for Coord {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::InvalidSquare(s.to_string());
        let mut chars = s.trim().chars();
        let file = chars.next().ok_or_else(err)?.to_ascii_lowercase();
        let x = FILES.find(file).ok_or_else(err)? as i8;
        let rank: i8 = chars.as_str().parse().map_err(|_| err())?;
        let coord = Coord::new(x, rank - 1);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(err())
        }
    }
}

/// Compass direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Unit vector (dx, dy); north is +y
    pub const fn vector(self) -> (i8, i8) {
        match self {
            Direction::N => (0, 1),
            Direction::NE => (1, 1),
            Direction::E => (1, 0),
            Direction::SE => (1, -1),
            Direction::S => (0, -1),
            Direction::SW => (-1, -1),
            Direction::W => (-1, 0),
            Direction::NW => (-1, 1),
        }
    }

    pub fn is_orthogonal(self) -> bool {
        matches!(self, Direction::N | Direction::E | Direction::S | Direction::W)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.name() == upper)
            .ok_or_else(|| NotationError::InvalidDirection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_validity() {
        assert!(Coord::new(0, 0).is_valid());
        assert!(Coord::new(5, 5).is_valid());
        assert!(!Coord::new(6, 0).is_valid());
        assert!(!Coord::new(0, -1).is_valid());
    }

    #[test]
    fn test_notation_round_trip() {
        assert_eq!(Coord::new(2, 3).notation(), "c4");
        assert_eq!("c4".parse::<Coord>().unwrap(), Coord::new(2, 3));
        assert_eq!("F6".parse::<Coord>().unwrap(), Coord::new(5, 5));
        assert!("g1".parse::<Coord>().is_err());
        assert!("a7".parse::<Coord>().is_err());
        assert!("a".parse::<Coord>().is_err());
    }

    #[test]
    fn test_orthogonal_flank() {
        // East off the edge re-enters on the west end of the same rank
        assert_eq!(Coord::new(5, 2).flank_step(Direction::E), Coord::new(0, 2));
        assert_eq!(Coord::new(0, 2).flank_step(Direction::W), Coord::new(5, 2));
        assert_eq!(Coord::new(3, 5).flank_step(Direction::N), Coord::new(3, 0));
        assert_eq!(Coord::new(3, 0).flank_step(Direction::S), Coord::new(3, 5));
    }

    #[test]
    fn test_diagonal_flank_uses_line_endpoints() {
        // b6 going NE: diagonal x - y = -4 runs a5..b6, re-enter at a5
        assert_eq!(Coord::new(1, 5).flank_step(Direction::NE), Coord::new(0, 4));
        // f3 going NE: x - y = 3 runs d1..f3
        assert_eq!(Coord::new(5, 2).flank_step(Direction::NE), Coord::new(3, 0));
        // d1 going SW returns to f3
        assert_eq!(Coord::new(3, 0).flank_step(Direction::SW), Coord::new(5, 2));
        // a3 going NW: x + y = 2 runs a3..c1
        assert_eq!(Coord::new(0, 2).flank_step(Direction::NW), Coord::new(2, 0));
        // c1 going SE back to a3
        assert_eq!(Coord::new(2, 0).flank_step(Direction::SE), Coord::new(0, 2));
    }

    #[test]
    fn test_corner_single_square_diagonal() {
        // f1 is alone on its NE diagonal
        assert_eq!(Coord::new(5, 0).flank_step(Direction::NE), Coord::new(5, 0));
        assert_eq!(Coord::new(0, 5).flank_step(Direction::SW), Coord::new(0, 5));
        assert_eq!(Coord::new(0, 0).flank_step(Direction::NW), Coord::new(0, 0));
        assert_eq!(Coord::new(5, 5).flank_step(Direction::SE), Coord::new(5, 5));
    }

    #[test]
    fn test_neighbors_no_wrap() {
        assert_eq!(Coord::new(0, 0).neighbors().count(), 3);
        assert_eq!(Coord::new(0, 3).neighbors().count(), 5);
        assert_eq!(Coord::new(2, 2).neighbors().count(), 8);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("ne".parse::<Direction>().unwrap(), Direction::NE);
        assert!("up".parse::<Direction>().is_err());
        assert!(Direction::N.is_orthogonal());
        assert!(!Direction::SW.is_orthogonal());
    }

    #[test]
    fn test_center_distance() {
        assert_eq!(Coord::new(2, 2).distance_to_center(), 0);
        assert_eq!(Coord::new(3, 3).distance_to_center(), 0);
        assert_eq!(Coord::new(0, 0).distance_to_center(), 2);
        assert_eq!(Coord::new(5, 1).distance_to_center(), 2);
    }
}
