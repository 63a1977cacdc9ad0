//! Phase transitions, ticking, and rollback for a single round.

use std::ops::Deref;

use roundkeeper_model::{ArenaKey, ParticipantId};
use roundkeeper_rollback::{ChangeLog, Environment, RollbackReport};
use roundkeeper_session::{ParticipantSession, SessionFactory, SnapshotStore};

use crate::notify::{Notification, NotificationBus, NotificationKind};
use crate::registry::Services;
use crate::{Round, RoundError, Stage, Transition};

/// The registry state a round operation may touch besides the round
/// itself. Borrowed field-by-field from the registry for one call.
pub(crate) struct Context<'a, F: SessionFactory> {
    pub(crate) namespace: &'a str,
    pub(crate) change_log: &'a mut ChangeLog,
    pub(crate) snapshots: &'a SnapshotStore,
    pub(crate) services: &'a Services,
    pub(crate) factory: &'a F,
    pub(crate) bus: &'a mut NotificationBus,
}

/// Mutable access to one round.
///
/// Obtained from [`SessionRegistry::round_mut`](crate::SessionRegistry::round_mut)
/// or [`SessionRegistry::create_round`](crate::SessionRegistry::create_round).
/// Dereferences to [`Round`] for the read accessors.
pub struct RoundMut<'a, F: SessionFactory> {
    pub(crate) round: &'a mut Round<F::Extra>,
    pub(crate) ctx: Context<'a, F>,
}

impl<F: SessionFactory> Deref for RoundMut<'_, F> {
    type Target = Round<F::Extra>;

    fn deref(&self) -> &Self::Target {
        self.round
    }
}

impl<'a, F: SessionFactory> RoundMut<'a, F> {
    /// Starts the round.
    ///
    /// Goes to PREPARING if the round has a positive preparation time,
    /// straight to PLAYING otherwise. Either step can be vetoed by a
    /// listener, in which case nothing changes.
    ///
    /// # Errors
    /// [`RoundError::AlreadyStarted`] unless the round is WAITING.
    pub fn start(&mut self) -> Result<Transition, RoundError> {
        let stage = self.round.stage;
        if stage != Stage::Waiting {
            tracing::error!(arena = %self.round.key, %stage, "start() called on a round that is not waiting");
            return Err(RoundError::AlreadyStarted {
                arena: self.round.key.clone(),
                stage,
            });
        }

        if self.round.config.preparation.seconds().is_none() {
            return Ok(self.begin_playing());
        }

        if self.publish(NotificationKind::Preparing).is_cancelled() {
            return Ok(Transition::Cancelled);
        }
        self.round.set_stage(Stage::Preparing);
        self.round.timer.start();
        tracing::info!(arena = %self.round.key, limit = ?self.round.active_limit(), "round preparing");
        Ok(Transition::Applied)
    }

    /// Ends the round: evicts everyone, rolls the arena back (if enabled),
    /// and returns to WAITING.
    ///
    /// A listener may veto the end, leaving the round where it was.
    ///
    /// # Errors
    /// [`RoundError::NotRunning`] unless the round is PREPARING or PLAYING.
    pub fn end(&mut self, timed_out: bool) -> Result<Transition, RoundError> {
        if !self.round.stage.is_running() {
            return Err(RoundError::NotRunning(self.round.key.clone()));
        }
        Ok(self.finish(timed_out, false))
    }

    /// Advances the round by one second.
    ///
    /// Only a running round moves. When the phase limit is reached the
    /// round moves on (PREPARING → PLAYING, PLAYING → end). Participants
    /// found outside the arena bounds are pulled back in.
    pub fn tick(&mut self) {
        if !self.round.stage.is_running() {
            return;
        }

        let elapsed = self.round.timer.advance();
        tracing::trace!(arena = %self.round.key, stage = %self.round.stage, elapsed, "round tick");
        if let Some(limit) = self.round.active_limit() {
            if elapsed >= limit {
                match self.round.stage {
                    Stage::Preparing => {
                        let _ = self.begin_playing();
                    }
                    Stage::Playing => {
                        let _ = self.finish(true, false);
                    }
                    Stage::Waiting | Stage::Resetting => {}
                }
            }
        }

        if self.round.stage.is_running() {
            self.enforce_bounds();
        }
    }

    /// Rolls back this round's arena now, whatever its stage. The round
    /// ends up WAITING.
    pub fn rollback(&mut self) -> RollbackReport {
        rollback_arena(
            &self.round.key.clone(),
            Some(&mut *self.round),
            self.ctx.change_log,
            self.ctx.services.environment.as_ref(),
            self.ctx.bus,
        )
    }

    /// Ends the round without asking listeners. Used when the round is
    /// being torn down.
    pub(crate) fn force_end(&mut self) {
        if self.round.stage.is_running() {
            let _ = self.finish(false, true);
            return;
        }

        self.evict_all();
        if self.round.config.rollback && !self.ctx.change_log.is_clean(&self.round.key) {
            self.rollback();
        }
    }

    /// Mutable access to a participant's session, for host data in
    /// [`ParticipantSession::extra`].
    pub fn session_mut(&mut self, participant: ParticipantId) -> Option<&mut ParticipantSession<F::Extra>> {
        self.round.roster.get_mut(&participant)
    }

    pub(crate) fn publish(&mut self, kind: NotificationKind) -> Notification {
        self.ctx.bus.publish(&self.round.key, kind)
    }

    /// → PLAYING, from WAITING (no preparation) or PREPARING.
    fn begin_playing(&mut self) -> Transition {
        if self.publish(NotificationKind::Starting).is_cancelled() {
            return Transition::Cancelled;
        }
        self.round.set_stage(Stage::Playing);
        if self.round.timer.is_running() {
            self.round.timer.restart();
        } else {
            self.round.timer.start();
        }
        tracing::info!(
            arena = %self.round.key,
            participants = self.round.roster.len(),
            limit = ?self.round.active_limit(),
            "round started"
        );
        Transition::Applied
    }

    /// PREPARING/PLAYING → RESETTING → WAITING.
    fn finish(&mut self, timed_out: bool, forced: bool) -> Transition {
        let previous = self.round.stage;
        self.round.set_stage(Stage::Resetting);
        if self
            .publish(NotificationKind::Ending { timed_out, forced })
            .is_cancelled()
        {
            self.round.set_stage(previous);
            return Transition::Cancelled;
        }

        tracing::info!(arena = %self.round.key, timed_out, forced, "round ending");
        self.round.timer.cancel();
        self.evict_all();

        if self.round.config.rollback {
            self.rollback();
        } else {
            self.round.set_stage(Stage::Waiting);
            self.publish(NotificationKind::RefreshDisplay);
        }
        Transition::Applied
    }

    fn evict_all(&mut self) {
        let participants: Vec<ParticipantId> = self.round.roster.keys().copied().collect();
        for participant in participants {
            if let Err(e) = self.remove_player(participant, None) {
                tracing::error!(arena = %self.round.key, %participant, error = %e, "eviction failed");
            }
        }
    }

    fn enforce_bounds(&mut self) {
        let Some(bounds) = self.round.arena.bounds.clone() else {
            return;
        };
        let services = self.ctx.services;
        let resolver = services.resolver.as_ref();
        let participants: Vec<ParticipantId> = self.round.roster.keys().copied().collect();

        for participant in participants {
            let Some(from) = resolver.location(participant) else {
                continue;
            };
            // Leaving the arena's world is handled as a removal, not a clamp.
            if from.world != self.round.arena.world || bounds.contains(from.point()) {
                continue;
            }
            let to = bounds.clamp(&from);
            if let Err(e) = resolver.teleport(participant, &to) {
                tracing::warn!(arena = %self.round.key, %participant, error = %e, "could not move participant back inside arena");
                continue;
            }
            tracing::debug!(arena = %self.round.key, %participant, "participant clamped to arena bounds");
            self.publish(NotificationKind::Relocated {
                participant,
                from,
                to,
            });
        }
    }
}

/// Replays an arena's change log. If a live round is given it goes
/// RESETTING for the duration and ends WAITING.
pub(crate) fn rollback_arena<E>(
    key: &ArenaKey,
    mut round: Option<&mut Round<E>>,
    change_log: &mut ChangeLog,
    environment: &dyn Environment,
    bus: &mut NotificationBus,
) -> RollbackReport {
    if let Some(round) = round.as_deref_mut() {
        if round.stage != Stage::Resetting {
            round.set_stage(Stage::Resetting);
        }
        bus.publish(key, NotificationKind::RollingBack);
    }

    let report = change_log.rollback(key, environment);
    if report.deferred {
        tracing::warn!(arena = %key, "arena world unavailable, rollback deferred");
    } else if !report.is_noop() {
        tracing::info!(
            arena = %key,
            blocks = report.blocks_restored,
            containers = report.containers_restored,
            skipped = report.skipped,
            "arena rolled back"
        );
    }

    if let Some(round) = round {
        round.timer.cancel();
        round.set_stage(Stage::Waiting);
        bus.publish(
            key,
            NotificationKind::RolledBack {
                restored: report.restored(),
                skipped: report.skipped,
            },
        );
        bus.publish(key, NotificationKind::RefreshDisplay);
    } else if !report.is_noop() {
        bus.publish(
            key,
            NotificationKind::RolledBack {
                restored: report.restored(),
                skipped: report.skipped,
            },
        );
    }
    report
}
