//! UDP control protocol.
//!
//! Plain-text request/response over UDP.  A request is one datagram
//! holding exactly one code; every recognised request gets exactly one
//! reply datagram, sent back to the requester.
//!
//! | Request               | Reply on success | Reply on refusal |
//! |-----------------------|------------------|------------------|
//! | arm-with-countdown    | `OK_ACCENSIONE`  | `NO_ACCENSIONE`  |
//! | arm-immediate         | `OK_ACCESO`      | `NO_ACCESO`      |
//! | disarm                | `OK_SPENTO`      | `NO_SPENTO`      |
//! | `STATO`               | `OFF` `ON` `ALRM` `ACC_<s>` `MOV_<s>` |  |
//!
//! Anything else is dropped without a reply.

pub mod codec;
pub mod server;
