//! Session records: one per participant per round.

use roundkeeper_model::{ArenaKey, DurableId, ParticipantId};

use crate::SnapshotHandle;

/// Bookkeeping for one admitted participant.
///
/// Created at admission, mutated by round logic (spectating, team,
/// frozen), and dropped at removal once the participant's inventory has
/// been restored.
///
/// `E` carries host-specific data produced by a [`SessionFactory`]; the
/// engine never looks inside it.
#[derive(Debug, Clone)]
pub struct ParticipantSession<E = ()> {
    pub participant: ParticipantId,
    pub durable: DurableId,
    /// The arena whose round this participant is in. Cleared on removal.
    pub arena: Option<ArenaKey>,
    pub spectating: bool,
    pub team: Option<String>,
    pub frozen: bool,
    /// Where the participant's pre-round inventory was saved.
    pub saved_state: Option<SnapshotHandle>,
    pub extra: E,
}

impl<E> ParticipantSession<E> {
    /// A fresh, non-spectating session in `arena`.
    pub fn new(
        participant: ParticipantId,
        durable: DurableId,
        arena: ArenaKey,
        saved_state: SnapshotHandle,
        extra: E,
    ) -> Self {
        Self {
            participant,
            durable,
            arena: Some(arena),
            spectating: false,
            team: None,
            frozen: false,
            saved_state: Some(saved_state),
            extra,
        }
    }

    /// Returns `true` while the session is attached to a round.
    pub fn in_round(&self) -> bool {
        self.arena.is_some()
    }
}

/// Builds the host-specific part of a session.
///
/// The host supplies one factory per namespace when it constructs the
/// registry; the engine calls it on every admission instead of
/// discovering session types at runtime.
///
/// ```rust
/// use roundkeeper_model::{ArenaKey, ParticipantId};
/// use roundkeeper_session::SessionFactory;
///
/// #[derive(Default)]
/// struct Score {
///     kills: u32,
/// }
///
/// struct ScoredSessions;
///
/// impl SessionFactory for ScoredSessions {
///     type Extra = Score;
///
///     fn create(&self, _participant: ParticipantId, _arena: &ArenaKey) -> Score {
///         Score::default()
///     }
/// }
/// ```
pub trait SessionFactory: Send + Sync + 'static {
    /// Host data attached to every session.
    type Extra: Send + 'static;

    /// Called once per admission, before the session is inserted into the
    /// roster.
    fn create(&self, participant: ParticipantId, arena: &ArenaKey) -> Self::Extra;

    /// Called once per removal, after the inventory restore and before the
    /// session is dropped. Default: no-op.
    fn on_remove(&self, _session: &mut ParticipantSession<Self::Extra>) {}
}

/// The default factory: sessions carry no extra data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSessions;

impl SessionFactory for PlainSessions {
    type Extra = ();

    fn create(&self, _participant: ParticipantId, _arena: &ArenaKey) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_attached_and_not_spectating() {
        let session = ParticipantSession::new(
            ParticipantId(7),
            DurableId::new("seven"),
            ArenaKey::new("Arena1"),
            SnapshotHandle {
                durable: DurableId::new("seven"),
                saved_at_ms: 0,
            },
            PlainSessions.create(ParticipantId(7), &ArenaKey::new("arena1")),
        );

        assert!(session.in_round());
        assert!(!session.spectating);
        assert!(!session.frozen);
        assert_eq!(session.team, None);
        assert_eq!(session.arena, Some(ArenaKey::new("arena1")));
    }
}
