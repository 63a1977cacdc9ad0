//! What the change log stores per position.

use roundkeeper_model::{BlockState, ContainerContents};
use serde::{Deserialize, Serialize};

/// The original state of one position, captured at its first mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Material, variant data, and display text before the round touched it.
    pub original: BlockState,
    /// Container contents, if the block was a container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerContents>,
}
