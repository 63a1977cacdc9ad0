//! Round state: one arena, one roster, one phase timer.
//!
//! A [`Round`] on its own is read-only to callers. Everything that changes
//! it goes through [`RoundMut`](crate::RoundMut), which the registry
//! hands out together with the collaborators a transition needs.

use std::collections::BTreeMap;

use rand::Rng;
use roundkeeper_model::{ArenaDescriptor, ArenaKey, BoundingBox, Location, ParticipantId};
use roundkeeper_session::ParticipantSession;
use roundkeeper_tick::PhaseTimer;

use crate::{RoundConfig, RoundError, SpawnSelection, Stage};

/// Outcome of an admission attempt.
///
/// Everything except [`Success`](Self::Success) leaves the round and the
/// participant exactly as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResult {
    Success,
    /// The round is PREPARING and `join_while_preparing` is off.
    RoundPreparing,
    /// The round is PLAYING and `join_in_progress` is off.
    RoundPlaying,
    /// A listener vetoed the `Joining` notification.
    Cancelled,
    /// The participant's inventory couldn't be snapshotted (or a leftover
    /// snapshot couldn't be restored first).
    InventorySaveError,
    /// Something on the host side failed mid-admission; the participant's
    /// inventory was put back.
    InternalError,
}

impl JoinResult {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Whether a cancellable phase change went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// A listener vetoed it; the stage is unchanged.
    Cancelled,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// A live round in one arena.
pub struct Round<E = ()> {
    pub(crate) key: ArenaKey,
    pub(crate) arena: ArenaDescriptor,
    pub(crate) config: RoundConfig,
    pub(crate) stage: Stage,
    pub(crate) timer: PhaseTimer,
    pub(crate) roster: BTreeMap<ParticipantId, ParticipantSession<E>>,
    next_spawn: usize,
}

impl<E> Round<E> {
    /// Builds a WAITING round after checking the arena is playable.
    pub(crate) fn new(arena: ArenaDescriptor, config: RoundConfig) -> Result<Self, RoundError> {
        arena.validate()?;
        Ok(Self {
            key: arena.key(),
            arena,
            config,
            stage: Stage::Waiting,
            timer: PhaseTimer::new(),
            roster: BTreeMap::new(),
            next_spawn: 0,
        })
    }

    pub fn key(&self) -> &ArenaKey {
        &self.key
    }

    pub fn arena(&self) -> &ArenaDescriptor {
        &self.arena
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_running(&self) -> bool {
        self.stage.is_running()
    }

    /// Seconds spent in the current phase.
    pub fn elapsed(&self) -> u32 {
        self.timer.elapsed()
    }

    /// Seconds left in the current phase, or `None` if the phase has no
    /// limit (or the round isn't running).
    pub fn remaining(&self) -> Option<u32> {
        self.timer.remaining(self.active_limit())
    }

    /// The limit of the phase the round is in, if positive.
    pub fn active_limit(&self) -> Option<u32> {
        match self.stage {
            Stage::Preparing => self.config.preparation.seconds(),
            Stage::Playing => self.config.playing.seconds(),
            Stage::Waiting | Stage::Resetting => None,
        }
    }

    pub fn roster(&self) -> &BTreeMap<ParticipantId, ParticipantSession<E>> {
        &self.roster
    }

    pub fn session(&self, participant: ParticipantId) -> Option<&ParticipantSession<E>> {
        self.roster.get(&participant)
    }

    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.roster.contains_key(&participant)
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// `true` if a cap is configured and reached.
    pub fn is_full(&self) -> bool {
        self.config.max_participants > 0 && self.roster.len() >= self.config.max_participants
    }

    pub fn spawns(&self) -> &[Location] {
        &self.arena.spawns
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.arena.bounds.as_ref()
    }

    pub(crate) fn set_stage(&mut self, to: Stage) {
        if !self.stage.can_transition_to(to) {
            tracing::error!(arena = %self.key, from = %self.stage, to = %to, "unexpected stage transition");
        }
        tracing::debug!(arena = %self.key, from = %self.stage, to = %to, "stage changed");
        self.stage = to;
    }

    /// Picks the spawn for a new participant. A requested index wins when
    /// it is in range.
    pub(crate) fn pick_spawn(&mut self, requested: Option<usize>) -> Location {
        let spawns = &self.arena.spawns;
        if let Some(index) = requested.filter(|i| *i < spawns.len()) {
            return spawns[index].clone();
        }
        let index = match self.config.spawn_selection {
            SpawnSelection::Random => rand::rng().random_range(0..spawns.len()),
            SpawnSelection::Sequential => {
                let index = self.next_spawn % spawns.len();
                self.next_spawn = self.next_spawn.wrapping_add(1);
                index
            }
        };
        spawns[index].clone()
    }
}

impl<E> std::fmt::Debug for Round<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round")
            .field("arena", &self.key)
            .field("stage", &self.stage)
            .field("elapsed", &self.timer.elapsed())
            .field("participants", &self.roster.len())
            .finish()
    }
}
