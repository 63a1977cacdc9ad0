//! Core data model for roundkeeper.
//!
//! This crate defines the plain data every other layer speaks:
//!
//! - **Identity** ([`ParticipantId`], [`DurableId`], [`ArenaKey`]): who is
//!   playing and where.
//! - **Geometry** ([`BlockPos`], [`Location`], [`Point`], [`BoundingBox`]):
//!   positions in the shared environment.
//! - **Environment descriptors** ([`BlockState`], [`ItemStack`],
//!   [`ContainerContents`]): what sits at a position, used by the change
//!   log and by inventory snapshots.
//! - **Arenas** ([`ArenaDescriptor`]): the static description of a
//!   playable region.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how persisted documents
//!   are converted to and from bytes.
//!
//! Nothing here knows about rounds, sessions, or storage backends.

mod arena;
mod codec;
mod error;
mod types;
mod world;

pub use arena::ArenaDescriptor;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ModelError;
pub use types::{
    ArenaKey, BlockPos, BoundingBox, DurableId, Location, ParticipantId, Point,
};
pub use world::{BlockState, ContainerContents, ItemStack};
