//! Lifecycle notifications.
//!
//! Every observable step of a round (phase changes, admissions,
//! relocations, rollbacks) is published as a [`Notification`] on the
//! namespace's [`NotificationBus`]. Listeners run synchronously, in the
//! order they subscribed, before the step takes effect. For the
//! cancellable kinds any listener may veto the step with
//! [`Notification::cancel`]; later listeners still run and see the flag.
//!
//! Listeners receive a value, not the registry, so they can't re-enter
//! round operations. Hosts that need to react by mutating rounds queue
//! the work and apply it after the current call returns.

use roundkeeper_model::{ArenaKey, Location, ParticipantId};

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    /// WAITING → PREPARING. Cancellable.
    Preparing,
    /// → PLAYING. Cancellable.
    Starting,
    /// → RESETTING. Cancellable unless `forced`.
    Ending { timed_out: bool, forced: bool },
    /// A participant is about to be admitted. Cancellable.
    Joining { participant: ParticipantId },
    Joined {
        participant: ParticipantId,
        spectating: bool,
    },
    Left { participant: ParticipantId },
    /// A participant outside the arena bounds was moved back in.
    Relocated {
        participant: ParticipantId,
        from: Location,
        to: Location,
    },
    RollingBack,
    RolledBack { restored: usize, skipped: usize },
    /// Scoreboards, signs, and other displays of the arena should redraw.
    RefreshDisplay,
}

impl NotificationKind {
    pub fn is_cancellable(&self) -> bool {
        match self {
            Self::Preparing | Self::Starting | Self::Joining { .. } => true,
            Self::Ending { forced, .. } => !forced,
            _ => false,
        }
    }
}

/// One published event.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub namespace: String,
    pub arena: ArenaKey,
    pub kind: NotificationKind,
    cancelled: bool,
}

impl Notification {
    pub fn new(namespace: impl Into<String>, arena: ArenaKey, kind: NotificationKind) -> Self {
        Self {
            namespace: namespace.into(),
            arena,
            kind,
            cancelled: false,
        }
    }

    /// Vetoes the step. Returns `false` (and changes nothing) if this
    /// kind can't be cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.kind.is_cancellable() {
            self.cancelled = true;
        }
        self.cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_cancellable(&self) -> bool {
        self.kind.is_cancellable()
    }
}

/// A subscribed callback.
pub type Listener = Box<dyn FnMut(&mut Notification) + Send>;

/// Per-namespace list of listeners.
pub struct NotificationBus {
    namespace: String,
    listeners: Vec<Listener>,
}

impl NotificationBus {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            listeners: Vec::new(),
        }
    }

    /// Adds a listener after all existing ones.
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: FnMut(&mut Notification) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Runs every listener over a new notification and hands it back so
    /// the caller can check [`Notification::is_cancelled`].
    pub fn publish(&mut self, arena: &ArenaKey, kind: NotificationKind) -> Notification {
        let mut notification = Notification::new(self.namespace.clone(), arena.clone(), kind);
        for listener in &mut self.listeners {
            listener(&mut notification);
        }
        if notification.is_cancelled() {
            tracing::debug!(%arena, kind = ?notification.kind, "step cancelled by listener");
        }
        notification
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("namespace", &self.namespace)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
