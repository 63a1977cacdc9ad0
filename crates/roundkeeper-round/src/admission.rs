//! Adding participants to and removing them from a round.

use roundkeeper_model::{Location, ParticipantId};
use roundkeeper_session::{ParticipantSession, SessionFactory};

use crate::notify::NotificationKind;
use crate::{JoinResult, RoundError, RoundMut, Stage};

/// Where a removed participant goes.
#[derive(Debug, Clone)]
pub(crate) enum Exit {
    /// The given location, or the round's configured exit.
    To(Option<Location>),
    /// Nowhere: the participant already left on their own.
    Stay,
}

impl<F: SessionFactory> RoundMut<'_, F> {
    /// Admits a participant.
    ///
    /// Their inventory is saved and cleared, a session is created, and
    /// they are moved to a spawn point (`spawn` picks one by index when in
    /// range). A WAITING round with at least its minimum after the join
    /// is started.
    ///
    /// # Errors
    /// [`RoundError::AlreadyInRound`], [`RoundError::NotConnected`],
    /// [`RoundError::RoundFull`], or [`RoundError::Resetting`]. Policy
    /// refusals and host-side failures come back as a [`JoinResult`].
    pub fn add_player(
        &mut self,
        participant: ParticipantId,
        spawn: Option<usize>,
    ) -> Result<JoinResult, RoundError> {
        let key = self.round.key.clone();

        let services = self.ctx.services;
        if let Some(current) = services.memberships.get(participant) {
            return Err(RoundError::AlreadyInRound {
                participant,
                namespace: current.namespace,
                arena: current.arena,
            });
        }
        if !services.resolver.is_connected(participant) {
            return Err(RoundError::NotConnected(participant));
        }
        if self.round.is_full() {
            return Err(RoundError::RoundFull(key));
        }

        match self.round.stage {
            Stage::Resetting => return Err(RoundError::Resetting(key)),
            Stage::Preparing if !self.round.config.join_while_preparing => {
                return Ok(JoinResult::RoundPreparing);
            }
            Stage::Playing if !self.round.config.join_in_progress => {
                return Ok(JoinResult::RoundPlaying);
            }
            _ => {}
        }

        if self
            .publish(NotificationKind::Joining { participant })
            .is_cancelled()
        {
            return Ok(JoinResult::Cancelled);
        }

        let durable = match services.resolver.durable_id(participant) {
            Ok(durable) => durable,
            Err(e) => {
                tracing::error!(arena = %key, %participant, error = %e, "could not resolve durable id");
                return Ok(JoinResult::InternalError);
            }
        };

        let snapshots = self.ctx.snapshots;
        let inventories = services.inventories.as_ref();

        // A snapshot left behind by a crash is the participant's real
        // inventory; put it back before taking a new one.
        match snapshots.has(&durable) {
            Ok(false) => {}
            Ok(true) => {
                tracing::warn!(arena = %key, %participant, %durable, "restoring leftover snapshot before admission");
                if let Err(e) = snapshots.restore(&durable, participant, inventories) {
                    tracing::error!(arena = %key, %participant, error = %e, "leftover snapshot could not be restored");
                    return Ok(JoinResult::InventorySaveError);
                }
            }
            Err(e) => {
                tracing::error!(arena = %key, %participant, error = %e, "could not check for leftover snapshot");
                return Ok(JoinResult::InventorySaveError);
            }
        }

        let handle = match snapshots.stash(&durable, participant, inventories) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(arena = %key, %participant, error = %e, "inventory snapshot failed");
                // A document still on disk means it was saved but the
                // inventory is in an unknown state.
                return Ok(match snapshots.has(&durable) {
                    Ok(false) => JoinResult::InventorySaveError,
                    Ok(true) => JoinResult::InternalError,
                    Err(e) => {
                        tracing::error!(arena = %key, %participant, error = %e, "could not check snapshot after failed stash");
                        JoinResult::InternalError
                    }
                });
            }
        };

        let spawn_point = self.round.pick_spawn(spawn);
        if let Err(e) = services.resolver.teleport(participant, &spawn_point) {
            tracing::warn!(arena = %key, %participant, error = %e, "could not move participant to spawn");
            if let Err(e) = snapshots.restore(&durable, participant, inventories) {
                tracing::error!(arena = %key, %participant, error = %e, "inventory restore failed, snapshot kept");
            }
            return Ok(JoinResult::InternalError);
        }

        if let Err(current) = services.memberships.claim(participant, self.ctx.namespace, &key) {
            // Admitted elsewhere while this one was in flight.
            if let Err(e) = snapshots.restore(&durable, participant, inventories) {
                tracing::error!(arena = %key, %participant, error = %e, "inventory restore failed, snapshot kept");
            }
            return Err(RoundError::AlreadyInRound {
                participant,
                namespace: current.namespace,
                arena: current.arena,
            });
        }

        let extra = self.ctx.factory.create(participant, &key);
        let mut session = ParticipantSession::new(participant, durable, key.clone(), handle, extra);
        session.spectating =
            self.round.stage == Stage::Playing && self.round.config.late_joiners_spectate;
        let spectating = session.spectating;

        self.round.roster.insert(participant, session);
        tracing::info!(arena = %key, %participant, spectating, participants = self.round.roster.len(), "participant joined");
        self.publish(NotificationKind::Joined {
            participant,
            spectating,
        });

        let min = self.round.config.min_participants;
        if self.round.stage == Stage::Waiting && min > 0 && self.round.roster.len() >= min {
            tracing::debug!(arena = %key, min, "minimum reached, starting round");
            self.start()?;
        }

        Ok(JoinResult::Success)
    }

    /// Removes a participant, restores their inventory, and sends them to
    /// `exit` (or the round's configured exit).
    ///
    /// If this drops a running round below its minimum, the round goes
    /// back to WAITING.
    ///
    /// # Errors
    /// [`RoundError::NotInRound`] if the participant isn't on this roster.
    pub fn remove_player(
        &mut self,
        participant: ParticipantId,
        exit: Option<Location>,
    ) -> Result<(), RoundError> {
        self.remove_with(participant, Exit::To(exit))
    }

    /// Sets or clears a participant's team label.
    pub fn set_team(
        &mut self,
        participant: ParticipantId,
        team: Option<String>,
    ) -> Result<(), RoundError> {
        let session = self.session_or_err(participant)?;
        session.team = team;
        Ok(())
    }

    /// Freezes or unfreezes a participant. The engine only carries the
    /// flag; the host decides what frozen means.
    pub fn set_frozen(&mut self, participant: ParticipantId, frozen: bool) -> Result<(), RoundError> {
        let session = self.session_or_err(participant)?;
        session.frozen = frozen;
        Ok(())
    }

    pub(crate) fn remove_with(&mut self, participant: ParticipantId, exit: Exit) -> Result<(), RoundError> {
        let key = self.round.key.clone();
        let Some(mut session) = self.round.roster.remove(&participant) else {
            return Err(RoundError::NotInRound {
                participant,
                arena: key,
            });
        };
        self.ctx
            .services
            .memberships
            .release(participant, self.ctx.namespace);
        session.spectating = false;
        session.arena = None;

        let services = self.ctx.services;
        match self
            .ctx
            .snapshots
            .restore(&session.durable, participant, services.inventories.as_ref())
        {
            Ok(true) => session.saved_state = None,
            Ok(false) => {
                tracing::warn!(arena = %key, %participant, durable = %session.durable, "no snapshot to restore");
                session.saved_state = None;
            }
            Err(e) => {
                tracing::error!(arena = %key, %participant, error = %e, "inventory restore failed, snapshot kept for next admission");
            }
        }

        let target = match exit {
            Exit::To(Some(location)) => Some(location),
            Exit::To(None) => self.round.config.exit.clone(),
            Exit::Stay => None,
        };
        if let Some(target) = target {
            if let Err(e) = services.resolver.teleport(participant, &target) {
                tracing::warn!(arena = %key, %participant, error = %e, "could not move participant to exit");
            }
        }

        self.ctx.factory.on_remove(&mut session);

        tracing::info!(arena = %key, %participant, participants = self.round.roster.len(), "participant left");
        self.publish(NotificationKind::Left { participant });

        let min = self.round.config.min_participants;
        if self.round.stage.is_running() && min > 0 && self.round.roster.len() < min {
            tracing::info!(arena = %key, min, remaining = self.round.roster.len(), "below minimum, round back to waiting");
            self.round.timer.cancel();
            self.round.set_stage(Stage::Waiting);
            self.publish(NotificationKind::RefreshDisplay);
        }
        Ok(())
    }

    fn session_or_err(
        &mut self,
        participant: ParticipantId,
    ) -> Result<&mut ParticipantSession<F::Extra>, RoundError> {
        let arena = self.round.key.clone();
        self.round
            .roster
            .get_mut(&participant)
            .ok_or(RoundError::NotInRound { participant, arena })
    }
}
