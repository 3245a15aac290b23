//! Fuzz target: control request decoding
//!
//! Feeds arbitrary datagrams to `codec::decode` and checks that:
//! - No panics under any byte sequence
//! - A command is only recognised on an exact match after NUL stripping
//! - Every reply for a recognised command is a non-empty ASCII token
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use homealarm::app::commands::{CommandOutcome, StatusReply};
use homealarm::config::{CommandCodes, STATUS_CODE};
use homealarm::protocol::codec::{self, MAX_DATAGRAM};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let codes = CommandCodes::default();
    let data = &data[..data.len().min(MAX_DATAGRAM)];

    let Some(cmd) = codec::decode(data, &codes) else {
        return;
    };

    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let trimmed = &data[..end];
    assert!(
        [
            codes.arm_countdown.as_bytes(),
            codes.arm_immediate.as_bytes(),
            codes.disarm.as_bytes(),
            STATUS_CODE.as_bytes(),
        ]
        .contains(&trimmed),
        "decoded {cmd:?} from a non-matching payload"
    );

    let outcome = match cmd.target() {
        Some(_) => CommandOutcome::Transition { command: cmd, accepted: data.len() % 2 == 0 },
        None => CommandOutcome::Status(StatusReply::MotionIn(i32::from(data[0]) - 128)),
    };
    let reply = codec::encode(outcome);
    assert!(!reply.is_empty());
    assert!(reply.is_ascii());
});
