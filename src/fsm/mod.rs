//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌────────────────┬───────────┬──────────────────────────┐   │
//! │  │ StateId        │ on_enter  │ on_update                │   │
//! │  ├────────────────┼───────────┼──────────────────────────┤   │
//! │  │ Off            │ fn(ctx)   │ fn(ctx) -> Option<next>  │   │
//! │  │ Arming         │ fn(ctx)   │ fn(ctx) -> Option<next>  │   │
//! │  │ Armed          │ fn(ctx)   │ fn(ctx) -> Option<next>  │   │
//! │  │ MotionDetected │ fn(ctx)   │ fn(ctx) -> Option<next>  │   │
//! │  │ AlarmTriggered │ fn(ctx)   │ fn(ctx) -> Option<next>  │   │
//! │  └────────────────┴───────────┴──────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine switches to `next_id` and
//! runs its `on_enter`.  Entry handlers only queue [`context::Effect`]s;
//! the application service executes them after the tick.
//!
//! Operator commands go through [`Fsm::request`], which accepts only the
//! transitions in [`is_legal_request`].

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all alarm states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Off = 0,
    Arming = 1,
    Armed = 2,
    MotionDetected = 3,
    AlarmTriggered = 4,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 5;

    pub const ALL: [StateId; Self::COUNT] = [
        Self::Off,
        Self::Arming,
        Self::Armed,
        Self::MotionDetected,
        Self::AlarmTriggered,
    ];

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `AlarmTriggered` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Arming,
            2 => Self::Armed,
            3 => Self::MotionDetected,
            4 => Self::AlarmTriggered,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::AlarmTriggered
            }
        }
    }

    /// Decode a stored byte.  `None` for anything unknown.
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The state written to storage when this state is entered.
    ///
    /// A reboot during the arming countdown resumes ARMED, and a reboot
    /// during the motion grace period resumes with the siren sounding.
    pub fn persisted_form(self) -> Self {
        match self {
            Self::Arming => Self::Armed,
            Self::MotionDetected => Self::AlarmTriggered,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Arming => "Arming",
            Self::Armed => "Armed",
            Self::MotionDetected => "MotionDetected",
            Self::AlarmTriggered => "AlarmTriggered",
        }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether an operator may move the machine from `from` to `to`.
///
/// Timer and sensor driven transitions are not requests and are decided
/// by the state handlers.
pub fn is_legal_request(from: StateId, to: StateId) -> bool {
    match to {
        StateId::Arming => from == StateId::Off,
        StateId::Armed => matches!(from, StateId::Off | StateId::Arming),
        StateId::Off => from != StateId::Off,
        StateId::MotionDetected | StateId::AlarmTriggered => false,
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions.  Runs exactly once per transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Set on every transition, cleared by [`Fsm::take_state_changed`].
    state_changed: bool,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            state_changed: false,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    ///
    /// Boot counts as a transition: the edge flag is raised so the
    /// entry effects of the restored state are executed.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_changed = true;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Apply an operator request.  Returns `false` and leaves everything
    /// untouched when the transition is not allowed from the current state.
    pub fn request(&mut self, target: StateId, ctx: &mut FsmContext) -> bool {
        if !is_legal_request(self.current_state(), target) {
            info!(
                "FSM: request {} rejected in {}",
                target, self.table[self.current].name
            );
            return false;
        }
        self.transition(target, ctx);
        true
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Whether a transition happened since the last [`take_state_changed`](Self::take_state_changed).
    pub fn state_changed(&self) -> bool {
        self.state_changed
    }

    /// Read and clear the edge flag.
    pub fn take_state_changed(&mut self) -> bool {
        core::mem::take(&mut self.state_changed)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;
        self.state_changed = true;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
