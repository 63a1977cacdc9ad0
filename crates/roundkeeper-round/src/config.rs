//! Round configuration and the stage state machine.

use roundkeeper_model::Location;
use roundkeeper_rollback::WritePolicy;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PhaseLimit
// ---------------------------------------------------------------------------

/// How long a timed phase lasts, in seconds (ticks).
///
/// Stored as a signed number so configs read naturally:
/// `-1` means unlimited, `0` means skip the phase, `n > 0` means `n`
/// seconds. Any other negative value is treated as unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseLimit(i32);

impl PhaseLimit {
    pub const UNLIMITED: Self = Self(-1);
    pub const SKIP: Self = Self(0);

    /// A phase lasting `secs` seconds.
    pub const fn secs(secs: u32) -> Self {
        if secs > i32::MAX as u32 {
            Self(i32::MAX)
        } else {
            Self(secs as i32)
        }
    }

    /// The limit in seconds, or `None` if the phase has no positive limit.
    pub fn seconds(self) -> Option<u32> {
        (self.0 > 0).then_some(self.0 as u32)
    }

    /// The configured value as written.
    pub fn raw(self) -> i32 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// SpawnSelection
// ---------------------------------------------------------------------------

/// How a spawn point is chosen when the caller doesn't request one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSelection {
    /// Round-robin through the arena's spawns in order.
    #[default]
    Sequential,
    /// Pick uniformly at random.
    Random,
}

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// Settings for one round.
///
/// Override individual fields with struct update syntax:
///
/// ```rust
/// use roundkeeper_round::{PhaseLimit, RoundConfig};
///
/// let config = RoundConfig {
///     min_participants: 2,
///     max_participants: 4,
///     preparation: PhaseLimit::secs(5),
///     playing: PhaseLimit::secs(10),
///     ..RoundConfig::default()
/// };
/// assert_eq!(config.playing.seconds(), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Participants needed before the round starts on its own. 0 disables
    /// auto-start (and auto-stop).
    pub min_participants: usize,
    /// Roster cap. 0 means no cap.
    pub max_participants: usize,
    /// Length of the PREPARING phase. `<= 0` goes straight to PLAYING.
    pub preparation: PhaseLimit,
    /// Length of the PLAYING phase. `<= 0` means the round only ends
    /// through an explicit `end()`.
    pub playing: PhaseLimit,
    /// Where removed participants are sent when the caller doesn't say.
    pub exit: Option<Location>,
    /// Roll back environment changes when the round ends.
    pub rollback: bool,
    /// Whether participants may damage each other. The engine only
    /// carries this flag; enforcing it is the host's job.
    pub pvp: bool,
    /// Admit participants while PREPARING.
    pub join_while_preparing: bool,
    /// Admit participants while PLAYING.
    pub join_in_progress: bool,
    /// Participants admitted while PLAYING start as spectators.
    pub late_joiners_spectate: bool,
    pub spawn_selection: SpawnSelection,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            max_participants: 8,
            preparation: PhaseLimit::secs(10),
            playing: PhaseLimit::secs(300),
            exit: None,
            rollback: true,
            pvp: true,
            join_while_preparing: true,
            join_in_progress: false,
            late_joiners_spectate: true,
            spawn_selection: SpawnSelection::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Settings shared by every round in one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Save the change log on every recorded change. When `false`, writes
    /// are batched and land on the next flush (the host flushes each
    /// tick).
    pub immediate_writes: bool,
    /// Config used by `create_round` when the caller doesn't pass one.
    pub default_round: RoundConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            immediate_writes: true,
            default_round: RoundConfig::default(),
        }
    }
}

impl RegistryConfig {
    pub fn write_policy(&self) -> WritePolicy {
        if self.immediate_writes {
            WritePolicy::Immediate
        } else {
            WritePolicy::Deferred
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The lifecycle phase of a round.
///
/// ```text
///              start()            prep elapsed
///   Waiting ───────────→ Preparing ───────────→ Playing
///      │                                          │
///      │ start() with no preparation              │ time up / end()
///      └──────────────────────────────────────────┤
///                                                 ▼
///   Waiting ←──────────── rollback done ────── Resetting
/// ```
///
/// Side paths: a round whose roster drops below its minimum falls back
/// from Preparing/Playing to Waiting; an `end()` vetoed by a listener
/// returns Resetting to the stage it came from; a manual rollback of an
/// idle arena passes Waiting → Resetting → Waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Waiting,
    Preparing,
    Playing,
    Resetting,
}

impl Stage {
    /// `true` while the round's timer runs.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Preparing | Self::Playing)
    }

    /// Returns `true` if the round may move from `self` to `target`.
    pub fn can_transition_to(self, target: Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Waiting, Preparing)
                | (Waiting, Playing)
                | (Waiting, Resetting)
                | (Preparing, Playing)
                | (Preparing, Waiting)
                | (Preparing, Resetting)
                | (Playing, Resetting)
                | (Playing, Waiting)
                | (Resetting, Waiting)
                | (Resetting, Preparing)
                | (Resetting, Playing)
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Preparing => write!(f, "PREPARING"),
            Self::Playing => write!(f, "PLAYING"),
            Self::Resetting => write!(f, "RESETTING"),
        }
    }
}
