//! Request decoding and reply encoding.
//!
//! Requests are matched byte-for-byte against the configured codes.
//! C clients often send the terminating NUL along with the string, so
//! trailing NUL bytes are dropped before matching; nothing else is
//! normalised (no trimming, no case folding).

use core::fmt::Write;

use crate::app::commands::{CommandOutcome, ControlCommand, StatusReply};
use crate::config::{CommandCodes, STATUS_CODE};

/// Largest request the server reads; longer datagrams are truncated.
pub const MAX_DATAGRAM: usize = 255;

/// Longest reply is `MOV_-2147483648`.
pub type Reply = heapless::String<16>;

/// Match a request payload against the configured codes.
///
/// Only trailing NULs are dropped.  A NUL inside the payload is part of
/// it, so `CODICE1\0X` matches nothing.
pub fn decode(payload: &[u8], codes: &CommandCodes) -> Option<ControlCommand> {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    let payload = &payload[..end];

    if payload.is_empty() {
        None
    } else if payload == codes.arm_countdown.as_bytes() {
        Some(ControlCommand::ArmWithCountdown)
    } else if payload == codes.arm_immediate.as_bytes() {
        Some(ControlCommand::ArmImmediate)
    } else if payload == codes.disarm.as_bytes() {
        Some(ControlCommand::Disarm)
    } else if payload == STATUS_CODE.as_bytes() {
        Some(ControlCommand::QueryStatus)
    } else {
        None
    }
}

/// Render the reply for a handled command.
pub fn encode(outcome: CommandOutcome) -> Reply {
    let mut out = Reply::new();
    // Every rendering below fits in the reply capacity.
    let _ = match outcome {
        CommandOutcome::Transition { command, accepted } => {
            let verdict = if accepted { "OK" } else { "NO" };
            let what = match command {
                ControlCommand::ArmWithCountdown => "ACCENSIONE",
                ControlCommand::ArmImmediate => "ACCESO",
                ControlCommand::Disarm => "SPENTO",
                // Never produced by the service; answer with the status token.
                ControlCommand::QueryStatus => STATUS_CODE,
            };
            write!(out, "{verdict}_{what}")
        }
        CommandOutcome::Status(status) => match status {
            StatusReply::Off => out.write_str("OFF"),
            StatusReply::Armed => out.write_str("ON"),
            StatusReply::Triggered => out.write_str("ALRM"),
            StatusReply::ArmingIn(secs) => write!(out, "ACC_{secs}"),
            StatusReply::MotionIn(secs) => write!(out, "MOV_{secs}"),
        },
    };
    out
}
