//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::CommandHandled { command, accepted } => {
                info!(
                    "CMD   | {:?} {}",
                    command,
                    if *accepted { "accepted" } else { "refused" }
                );
            }
            AppEvent::MotionConfirmed { sensor } => {
                warn!("MOTION| {}", sensor);
            }
            AppEvent::LinkUp => {
                info!("LINK  | up");
            }
            AppEvent::LinkDown => {
                warn!("LINK  | down");
            }
            AppEvent::PersistFailed { state, error: e } => {
                error!("NVS   | persisting {} failed: {}", state, e);
            }
            AppEvent::NotifyFailed => {
                warn!("NOTIFY| not delivered");
            }
        }
    }
}
