//! Route card definitions

use crate::board::{Coord, Direction, NotationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest route in any direction
pub const MAX_DIAGONAL_DISTANCE: u8 = 3;

/// Orthogonal routes go one further
pub const MAX_ORTHOGONAL_DISTANCE: u8 = 4;

/// Number of distinct routes: 8 directions x 3 distances + 4 orthogonal x 1
pub const ROUTE_KINDS: usize = 28;

/// A movement card. Copies with the same direction and distance are
/// interchangeable, so the route doubles as its own identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Route {
    pub direction: Direction,
    pub distance: u8,
}

impl Route {
    /// Build a route, rejecting combinations that are not in the catalog
    pub fn new(direction: Direction, distance: u8) -> Option<Self> {
        let max = if direction.is_orthogonal() {
            MAX_ORTHOGONAL_DISTANCE
        } else {
            MAX_DIAGONAL_DISTANCE
        };
        (1..=max)
            .contains(&distance)
            .then_some(Self { direction, distance })
    }

    /// Stable string key, e.g. `NE2`
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// Squares visited, origin excluded. Length is always `distance`.
    pub fn trace(&self, from: Coord) -> Vec<Coord> {
        let mut squares = Vec::with_capacity(self.distance as usize);
        let mut current = from;
        for _ in 0..self.distance {
            current = current.flank_step(self.direction);
            squares.push(current);
        }
        squares
    }

    /// Final square of the trace
    pub fn destination(&self, from: Coord) -> Coord {
        (0..self.distance).fold(from, |pos, _| pos.flank_step(self.direction))
    }
}

/// Every distinct route, in catalog order
pub fn route_catalog() -> Vec<Route> {
    Direction::ALL
        .iter()
        .flat_map(|&dir| (1..=MAX_ORTHOGONAL_DISTANCE).filter_map(move |d| Route::new(dir, d)))
        .collect()
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.direction, self.distance)
    }
}

impl FromStr for Route {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::InvalidRoute(s.to_string());
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(err)?;
        let (dir, dist) = s.split_at(split);
        let direction: Direction = dir.parse().map_err(|_| err())?;
        let distance: u8 = dist.parse().map_err(|_| err())?;
        Route::new(direction, distance).ok_or_else(err)
    }
}

impl TryFrom<String> for Route {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_size() {
        let catalog = route_catalog();
        assert_eq!(catalog.len(), ROUTE_KINDS);
        let long: Vec<_> = catalog.iter().filter(|r| r.distance == 4).collect();
        assert_eq!(long.len(), 4);
        assert!(long.iter().all(|r| r.direction.is_orthogonal()));
    }

    #[test]
    fn test_route_lookup() {
        assert_eq!("NE2".parse::<Route>().unwrap(), Route::new(Direction::NE, 2).unwrap());
        assert_eq!("e4".parse::<Route>().unwrap().id(), "E4");
        assert!("NE4".parse::<Route>().is_err());
        assert!("N0".parse::<Route>().is_err());
        assert!("X1".parse::<Route>().is_err());
    }

    #[test]
    fn test_trace_wraps() {
        let route = Route::new(Direction::E, 3).unwrap();
        let trace = route.trace(Coord::new(4, 1));
        assert_eq!(trace, vec![Coord::new(5, 1), Coord::new(0, 1), Coord::new(1, 1)]);
        assert_eq!(route.destination(Coord::new(4, 1)), Coord::new(1, 1));
    }

    #[test]
    fn test_trace_can_return_to_origin() {
        // e1-f2 is a two-square diagonal; NE2 from e1 comes back to e1
        let route = Route::new(Direction::NE, 2).unwrap();
        let trace = route.trace(Coord::new(4, 0));
        assert_eq!(trace, vec![Coord::new(5, 1), Coord::new(4, 0)]);
    }

    #[test]
    fn test_serde_as_id() {
        let route = Route::new(Direction::SW, 3).unwrap();
        let json = serde_json::to_string(&route).unwrap();
        assert_eq!(json, "\"SW3\"");
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);
    }
}
