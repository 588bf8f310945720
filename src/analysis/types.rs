use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Approach direction at a four-way intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Canonical order. Every tie-break in the allocator follows it.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        self.axis() != other.axis()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::NorthSouth => [Direction::North, Direction::South],
            Axis::EastWest => [Direction::East, Direction::West],
        }
    }
}

/// One value per direction. Holding the four slots as fields makes a
/// missing or extra direction unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectionMap<T> {
    pub north: T,
    pub south: T,
    pub east: T,
    pub west: T,
}

impl<T> DirectionMap<T> {
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self {
            north: f(Direction::North),
            south: f(Direction::South),
            east: f(Direction::East),
            west: f(Direction::West),
        }
    }

    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    /// Iterates in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> + '_ {
        Direction::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Direction, &T) -> U) -> DirectionMap<U> {
        DirectionMap::from_fn(|d| f(d, self.get(d)))
    }
}

impl<T: Clone> DirectionMap<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl DirectionMap<u32> {
    /// Saturates at `u32::MAX` instead of overflowing.
    pub fn total(&self) -> u32 {
        self.iter().fold(0u32, |acc, (_, c)| acc.saturating_add(*c))
    }
}

impl<T> Index<Direction> for DirectionMap<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        self.get(direction)
    }
}

impl<T> IndexMut<Direction> for DirectionMap<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        self.get_mut(direction)
    }
}

/// Ordinal congestion band derived from a fused count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DensityLevel {
    pub fn is_congested(self) -> bool {
        self >= DensityLevel::High
    }

    /// Multiplier applied to a count when ranking directions by pressure.
    pub fn pressure_weight(self) -> f64 {
        match self {
            DensityLevel::VeryLow => 0.5,
            DensityLevel::Low => 0.7,
            DensityLevel::Medium => 1.0,
            DensityLevel::High => 1.3,
            DensityLevel::VeryHigh => 1.7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DensityLevel::VeryLow => "very_low",
            DensityLevel::Low => "low",
            DensityLevel::Medium => "medium",
            DensityLevel::High => "high",
            DensityLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Red,
    Green,
}

impl SignalState {
    pub fn is_green(self) -> bool {
        matches!(self, SignalState::Green)
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalState::Red => write!(f, "red"),
            SignalState::Green => write!(f, "green"),
        }
    }
}

pub type SignalMap = DirectionMap<SignalState>;

impl DirectionMap<SignalState> {
    pub fn all_red() -> Self {
        Self::splat(SignalState::Red)
    }

    /// Fixed assignment used when there is no traffic or the allocator faults.
    pub fn default_assignment() -> Self {
        let mut states = Self::all_red();
        states.east = SignalState::Green;
        states
    }

    pub fn greens(&self) -> Vec<Direction> {
        self.iter()
            .filter(|(_, s)| s.is_green())
            .map(|(d, _)| d)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_iteration_order() {
        let map = DirectionMap::from_fn(|d| d.as_str());
        let order: Vec<_> = map.iter().map(|(_, s)| *s).collect();
        assert_eq!(order, vec!["north", "south", "east", "west"]);
    }

    #[test]
    fn test_total_saturates() {
        let c = DirectionMap { north: 3, south: 4, east: 0, west: 1 };
        assert_eq!(c.total(), 8);
        assert_eq!(DirectionMap::splat(u32::MAX).total(), u32::MAX);
    }

    #[test]
    fn test_axes() {
        assert!(Direction::North.is_perpendicular_to(Direction::East));
        assert!(Direction::West.is_perpendicular_to(Direction::South));
        assert!(!Direction::North.is_perpendicular_to(Direction::South));
        assert!(!Direction::East.is_perpendicular_to(Direction::West));
    }

    #[test]
    fn test_density_ordering() {
        assert!(DensityLevel::VeryLow < DensityLevel::Low);
        assert!(DensityLevel::High < DensityLevel::VeryHigh);
        assert!(DensityLevel::High.is_congested());
        assert!(!DensityLevel::Medium.is_congested());
    }

    #[test]
    fn test_serialized_shape() {
        let states = SignalMap::default_assignment();
        let json = serde_json::to_value(states).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"north": "red", "south": "red", "east": "green", "west": "red"})
        );

        let densities = DirectionMap::splat(DensityLevel::VeryHigh);
        let json = serde_json::to_value(densities).unwrap();
        assert_eq!(json["west"], "very_high");
    }
}
