//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the
//! [`LinkSupervisor`](super::link::LinkSupervisor) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::fsm::StateId;

use super::commands::ControlCommand;
use super::ports::StorageError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries the restored state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// An operator command was processed.
    CommandHandled {
        command: ControlCommand,
        accepted: bool,
    },

    /// A sensor confirmed motion while the alarm was watching.
    MotionConfirmed { sensor: &'static str },

    /// WiFi association completed and the control server is listening.
    LinkUp,

    /// WiFi association lost or timed out.
    LinkDown,

    /// The state could not be written to storage.
    PersistFailed { state: StateId, error: StorageError },

    /// A notification could not be sent.
    NotifyFailed,
}
