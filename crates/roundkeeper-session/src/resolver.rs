//! Presence and identity hook for talking to the host.
//!
//! roundkeeper doesn't know how the host tracks connected participants or
//! moves them around. Instead it defines the [`ParticipantResolver`] trait
//! and the host implements it over whatever runtime it embeds. Tests plug
//! in an in-memory fake.

use roundkeeper_model::{DurableId, Location, ParticipantId};

use crate::SessionError;

/// Answers "is this participant here, where are they, who are they
/// durably" and performs relocations.
///
/// All methods take `&self`; implementations that track state use
/// interior mutability. Calls happen on the tick thread and must return
/// promptly.
///
/// # Example
///
/// ```rust
/// use roundkeeper_model::{DurableId, Location, ParticipantId};
/// use roundkeeper_session::{ParticipantResolver, SessionError};
///
/// /// Everyone is online at the origin and nobody can be moved.
/// struct Statues;
///
/// impl ParticipantResolver for Statues {
///     fn is_connected(&self, _id: ParticipantId) -> bool {
///         true
///     }
///     fn location(&self, _id: ParticipantId) -> Option<Location> {
///         Some(Location::new("world", 0.0, 64.0, 0.0))
///     }
///     fn durable_id(&self, id: ParticipantId) -> Result<DurableId, SessionError> {
///         Ok(DurableId::new(format!("statue-{}", id.0)))
///     }
///     fn teleport(&self, id: ParticipantId, _to: &Location) -> Result<(), SessionError> {
///         Err(SessionError::Teleport { participant: id, reason: "immovable".into() })
///     }
/// }
/// ```
pub trait ParticipantResolver: Send + Sync + 'static {
    /// Returns `true` if the participant can currently be reached.
    fn is_connected(&self, id: ParticipantId) -> bool;

    /// The participant's current position, or `None` if unknown.
    fn location(&self, id: ParticipantId) -> Option<Location>;

    /// Resolves (or allocates) the participant's durable identity.
    fn durable_id(&self, id: ParticipantId) -> Result<DurableId, SessionError>;

    /// Moves the participant.
    fn teleport(&self, id: ParticipantId, to: &Location) -> Result<(), SessionError>;
}
