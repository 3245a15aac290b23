//! Inbound commands to the application service.
//!
//! Decoded from control datagrams by [`crate::protocol::codec`] and
//! interpreted by [`AppService::handle_command`](super::service::AppService::handle_command).

use crate::fsm::StateId;

/// Operator requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Arm after the countdown.
    ArmWithCountdown,
    /// Arm now, skipping (or cutting short) the countdown.
    ArmImmediate,
    /// Disarm from any armed state.
    Disarm,
    /// Report the current state.
    QueryStatus,
}

impl ControlCommand {
    /// The state this command asks for, if it asks for a transition.
    pub fn target(self) -> Option<StateId> {
        match self {
            Self::ArmWithCountdown => Some(StateId::Arming),
            Self::ArmImmediate => Some(StateId::Armed),
            Self::Disarm => Some(StateId::Off),
            Self::QueryStatus => None,
        }
    }
}

/// Answer to a [`ControlCommand::QueryStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReply {
    Off,
    Armed,
    Triggered,
    /// Seconds until ARMED, `-1` once overdue.
    ArmingIn(i32),
    /// Seconds until the siren, `-1` once overdue.
    MotionIn(i32),
}

/// What the service did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Transition request: `true` if applied.
    Transition { command: ControlCommand, accepted: bool },
    Status(StatusReply),
}
