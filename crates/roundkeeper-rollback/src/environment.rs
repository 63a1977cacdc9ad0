//! The hook into the shared environment.

use roundkeeper_model::{BlockPos, BlockState, ContainerContents};

use crate::EnvironmentError;

/// Reads and writes positions in the host's environment.
///
/// The change log calls [`block`](Self::block) and
/// [`container`](Self::container) to capture originals, and the setters to
/// put them back. Like every host collaborator, calls happen on the tick
/// thread and must not block.
pub trait Environment: Send + Sync + 'static {
    /// Returns `true` if the world is currently available.
    fn has_world(&self, world: &str) -> bool;

    /// What's at `pos` right now.
    fn block(&self, world: &str, pos: BlockPos) -> Result<BlockState, EnvironmentError>;

    /// Overwrites the block at `pos`.
    fn set_block(&self, world: &str, pos: BlockPos, state: &BlockState) -> Result<(), EnvironmentError>;

    /// The contents of the container at `pos`, or `None` if the block
    /// isn't a container.
    fn container(&self, world: &str, pos: BlockPos)
    -> Result<Option<ContainerContents>, EnvironmentError>;

    /// Replaces the contents of the container at `pos`.
    fn set_container(
        &self,
        world: &str,
        pos: BlockPos,
        contents: &ContainerContents,
    ) -> Result<(), EnvironmentError>;

    /// Empties the container at `pos`.
    fn clear_container(&self, world: &str, pos: BlockPos) -> Result<(), EnvironmentError>;
}
