//! Static arena descriptions.

use serde::{Deserialize, Serialize};

use crate::{ArenaKey, BoundingBox, Location, ModelError};

/// A named, persistently described region that can host one round at a
/// time.
///
/// Descriptors are loaded from the arena catalog when a namespace is
/// registered. The engine never mutates them; editing happens through the
/// catalog's define/remove calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaDescriptor {
    /// Display name. Lookups are case-insensitive via [`ArenaKey`].
    pub name: String,
    /// Identifier of the world (environment) the arena lives in.
    pub world: String,
    /// Ordered spawn points.
    #[serde(default)]
    pub spawns: Vec<Location>,
    /// Optional box participants are confined to while a round runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

impl ArenaDescriptor {
    /// Creates a descriptor with no spawns and no bounds.
    pub fn new(name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            world: world.into(),
            spawns: Vec::new(),
            bounds: None,
        }
    }

    pub fn with_spawn(mut self, spawn: Location) -> Self {
        self.spawns.push(spawn);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The case-insensitive key this arena is registered under.
    pub fn key(&self) -> ArenaKey {
        ArenaKey::new(&self.name)
    }

    /// Checks that the arena can host a round.
    ///
    /// # Errors
    /// [`ModelError::InvalidPosition`] if there are no spawns, the bounds
    /// are inverted, or a spawn sits in another world or outside the
    /// bounds.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.spawns.is_empty() {
            return Err(ModelError::InvalidPosition(format!(
                "arena {} has no spawn points",
                self.name
            )));
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.is_well_formed() {
                return Err(ModelError::InvalidPosition(format!(
                    "arena {} has inverted bounds",
                    self.name
                )));
            }
        }
        for (index, spawn) in self.spawns.iter().enumerate() {
            if spawn.world != self.world {
                return Err(ModelError::InvalidPosition(format!(
                    "spawn {index} of arena {} is in world {}, expected {}",
                    self.name, spawn.world, self.world
                )));
            }
            if let Some(bounds) = &self.bounds {
                if !bounds.contains(spawn.point()) {
                    return Err(ModelError::InvalidPosition(format!(
                        "spawn {index} of arena {} lies outside its bounds",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}
