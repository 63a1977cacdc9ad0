//! Identity and geometry types.
//!
//! Identities are newtype wrappers so a `ParticipantId` can never be
//! passed where a `DurableId` is expected, even though both boil down to
//! primitive values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The runtime identity of a participant, as handed out by the host.
///
/// Only valid while the participant is connected. Anything that must
/// survive a restart (inventory snapshots) is keyed by [`DurableId`]
/// instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The persistent identity of a participant (an account UUID, for
/// example). Resolved from a [`ParticipantId`] by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurableId(pub String);

impl DurableId {
    /// Creates a durable id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DurableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive arena name used as a map key.
///
/// `"Arena1"`, `"ARENA1"` and `"arena1"` all produce the same key. The
/// display name with its original casing lives on
/// [`ArenaDescriptor`](crate::ArenaDescriptor).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaKey(String);

impl ArenaKey {
    /// Normalizes an arena name into a key.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Returns the normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArenaKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ArenaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Integer block coordinates inside one world.
///
/// Used as the key of every change-log record. Serialized in documents as
/// the string `"x,y,z"` via [`Display`](fmt::Display) and [`FromStr`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for BlockPos {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(|p| p.trim().parse::<i32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Ok(Self { x, y, z }),
            _ => Err(ModelError::InvalidPosition(format!(
                "expected \"x,y,z\", got {s:?}"
            ))),
        }
    }
}

/// A point in continuous space, without world or orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A full position: world, coordinates, and facing.
///
/// Spawn points and exit positions are `Location`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    /// Creates a location facing yaw 0, pitch 0.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Sets the facing.
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// The coordinates without world or facing.
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y, self.z)
    }

    /// The block this location is inside of.
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// An axis-aligned box that participants must stay inside of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Builds a box from two arbitrary corners, ordering each axis.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Returns `true` if `min <= max` on every axis.
    pub fn is_well_formed(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Returns `true` if the point lies inside the box (faces inclusive).
    pub fn contains(&self, p: Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    /// Moves a location onto the nearest point of the box, keeping its
    /// world and facing. Locations already inside come back unchanged.
    pub fn clamp(&self, loc: &Location) -> Location {
        Location {
            x: loc.x.clamp(self.min.x, self.max.x),
            y: loc.y.clamp(self.min.y, self.max.y),
            z: loc.z.clamp(self.min.z, self.max.z),
            ..loc.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_key_ignores_case_and_whitespace() {
        assert_eq!(ArenaKey::new("Arena1"), ArenaKey::new(" ARENA1 "));
        assert_eq!(ArenaKey::new("Arena1").as_str(), "arena1");
    }

    #[test]
    fn test_block_pos_parses_display_form() {
        let pos = BlockPos::new(-4, 70, 12);
        assert_eq!(pos.to_string(), "-4,70,12");
        assert_eq!("-4,70,12".parse::<BlockPos>().unwrap(), pos);
    }

    #[test]
    fn test_block_pos_rejects_malformed_keys() {
        assert!("1,2".parse::<BlockPos>().is_err());
        assert!("1,2,3,4".parse::<BlockPos>().is_err());
        assert!("a,b,c".parse::<BlockPos>().is_err());
    }

    #[test]
    fn test_location_block_pos_floors_negative_coordinates() {
        let loc = Location::new("world", -0.5, 64.9, 3.2);
        assert_eq!(loc.block_pos(), BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn test_bounding_box_from_corners_orders_axes() {
        let b = BoundingBox::from_corners(Point::new(10.0, 0.0, -5.0), Point::new(0.0, 20.0, 5.0));
        assert_eq!(b.min, Point::new(0.0, 0.0, -5.0));
        assert_eq!(b.max, Point::new(10.0, 20.0, 5.0));
        assert!(b.is_well_formed());
    }

    #[test]
    fn test_bounding_box_clamp_moves_to_nearest_face() {
        let b = BoundingBox::from_corners(Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0));
        let outside = Location::new("world", 14.0, 5.0, -3.0).facing(90.0, 10.0);

        let clamped = b.clamp(&outside);

        assert_eq!(clamped.point(), Point::new(10.0, 5.0, 0.0));
        assert_eq!(clamped.yaw, 90.0);
        assert!(b.contains(clamped.point()));
    }

    #[test]
    fn test_bounding_box_clamp_inside_is_identity() {
        let b = BoundingBox::from_corners(Point::new(0.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0));
        let inside = Location::new("world", 1.0, 2.0, 3.0);
        assert_eq!(b.clamp(&inside), inside);
    }
}
