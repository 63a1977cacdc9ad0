//! A participant's external state and the hook that reads/writes it.

use std::collections::BTreeMap;

use roundkeeper_model::{ItemStack, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Everything about a participant that a round takes away on admission
/// and gives back on removal: carried items, worn equipment, experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Main inventory, slot → stack. Empty slots are absent.
    #[serde(default)]
    pub contents: BTreeMap<u32, ItemStack>,
    /// Worn equipment, slot → stack.
    #[serde(default)]
    pub armor: BTreeMap<u32, ItemStack>,
    #[serde(default)]
    pub offhand: Option<ItemStack>,
    #[serde(default)]
    pub level: u32,
    /// Progress towards the next level, `0.0..1.0`.
    #[serde(default)]
    pub experience: f32,
}

impl InventorySnapshot {
    /// `true` if there is nothing worth saving.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
            && self.armor.is_empty()
            && self.offhand.is_none()
            && self.level == 0
            && self.experience == 0.0
    }
}

/// Reads and writes a participant's external state on the host.
pub trait Inventories: Send + Sync + 'static {
    /// Reads the participant's current state.
    fn capture(&self, id: ParticipantId) -> Result<InventorySnapshot, SessionError>;

    /// Empties the participant's state (items, equipment, experience).
    fn clear(&self, id: ParticipantId) -> Result<(), SessionError>;

    /// Replaces the participant's state with `snapshot`.
    fn apply(&self, id: ParticipantId, snapshot: &InventorySnapshot) -> Result<(), SessionError>;
}
