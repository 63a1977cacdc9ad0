//! What sits at a position in the shared environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The material, variant data, and optional display text of one block.
///
/// This is what the change log records as a position's "original" and
/// writes back on rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    /// Material identifier, e.g. `"stone"` or `"oak_sign"`.
    pub material: String,
    /// Opaque variant data (rotation, growth stage, ...), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Display text lines for blocks that carry text (signs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
}

impl BlockState {
    /// A plain block with no variant data or text.
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            data: None,
            text: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_text(mut self, lines: Vec<String>) -> Self {
        self.text = Some(lines);
        self
    }
}

/// A stack of items in an inventory or container slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub material: String,
    pub amount: u32,
    /// Opaque item metadata (enchantments, names, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl ItemStack {
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

/// The full contents of a container block: its size and every occupied
/// slot. Empty slots are simply absent from `slots`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerContents {
    pub size: u32,
    pub slots: BTreeMap<u32, ItemStack>,
}

impl ContainerContents {
    /// An empty container with `size` slots.
    pub fn empty(size: u32) -> Self {
        Self {
            size,
            slots: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
