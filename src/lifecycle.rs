//! Component lifecycle states and the legal transition table
//!
//! Components move through `PreOperational -> Stopped -> Running`, with the
//! runtime error states still counting as "running" for transition purposes.
//! `Exception` requires an explicit `ResetException`; `FatalError` has no
//! recovery transition at all.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    PreOperational,
    Stopped,
    Running,
    RuntimeWarning,
    RuntimeError,
    Exception,
    FatalError,
}

impl ComponentState {
    /// Running, including the runtime warning/error sub-states
    pub fn is_running_state(&self) -> bool {
        matches!(
            self,
            ComponentState::Running | ComponentState::RuntimeWarning | ComponentState::RuntimeError
        )
    }

    /// Check if this is one of the error states
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ComponentState::RuntimeWarning
                | ComponentState::RuntimeError
                | ComponentState::Exception
                | ComponentState::FatalError
        )
    }

    /// FatalError is terminal: no transition leads out of it
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComponentState::FatalError)
    }

    /// Get human-readable name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ComponentState::PreOperational => "pre_operational",
            ComponentState::Stopped => "stopped",
            ComponentState::Running => "running",
            ComponentState::RuntimeWarning => "runtime_warning",
            ComponentState::RuntimeError => "runtime_error",
            ComponentState::Exception => "exception",
            ComponentState::FatalError => "fatal_error",
        }
    }
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle transition a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Configure,
    Start,
    Stop,
    Cleanup,
    ResetException,
}

impl Transition {
    /// Get human-readable name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Configure => "configure",
            Transition::Start => "start",
            Transition::Stop => "stop",
            Transition::Cleanup => "cleanup",
            Transition::ResetException => "reset_exception",
        }
    }

    /// Check if the transition is legal from the given state
    pub fn admissible_from(&self, state: ComponentState) -> bool {
        match self {
            Transition::Configure => state == ComponentState::PreOperational,
            Transition::Start => state == ComponentState::Stopped,
            Transition::Stop => state.is_running_state(),
            Transition::Cleanup => state == ComponentState::Stopped,
            Transition::ResetException => state == ComponentState::Exception,
        }
    }

    /// State reached when the transition succeeds
    pub fn target(&self) -> ComponentState {
        match self {
            Transition::Configure => ComponentState::Stopped,
            Transition::Start => ComponentState::Running,
            Transition::Stop => ComponentState::Stopped,
            Transition::Cleanup => ComponentState::PreOperational,
            Transition::ResetException => ComponentState::Stopped,
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Local enforcement engine for the transition table
///
/// Component implementations (and the in-process mocks) run one of these;
/// remote handles only surface the remote machine's verdict. `apply` returns
/// `false` for an inadmissible transition and leaves the state untouched.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: ComponentState,
}

impl StateMachine {
    /// Create a new machine in `PreOperational`
    pub fn new() -> Self {
        Self {
            state: ComponentState::PreOperational,
        }
    }

    /// Current state; always available, side-effect-free
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Attempt a transition; returns whether it was admissible and applied
    pub fn apply(&mut self, transition: Transition) -> bool {
        if !transition.admissible_from(self.state) {
            return false;
        }
        self.state = transition.target();
        true
    }

    /// Force the machine into a state, bypassing the table
    ///
    /// Error states are entered by the component's own execution engine, not
    /// by a caller-visible transition.
    pub fn force(&mut self, state: ComponentState) {
        self.state = state;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_cycle() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.state(), ComponentState::PreOperational);

        assert!(sm.apply(Transition::Configure));
        assert_eq!(sm.state(), ComponentState::Stopped);

        assert!(sm.apply(Transition::Start));
        assert_eq!(sm.state(), ComponentState::Running);

        assert!(sm.apply(Transition::Stop));
        assert_eq!(sm.state(), ComponentState::Stopped);

        assert!(sm.apply(Transition::Cleanup));
        assert_eq!(sm.state(), ComponentState::PreOperational);
    }

    #[test]
    fn test_start_requires_configure() {
        let mut sm = StateMachine::new();
        assert!(!sm.apply(Transition::Start));
        assert_eq!(sm.state(), ComponentState::PreOperational);
    }

    #[test]
    fn test_stop_from_runtime_error() {
        let mut sm = StateMachine::new();
        sm.apply(Transition::Configure);
        sm.apply(Transition::Start);
        sm.force(ComponentState::RuntimeError);

        // RuntimeError still counts as running for transition purposes
        assert!(sm.apply(Transition::Stop));
        assert_eq!(sm.state(), ComponentState::Stopped);
    }

    #[test]
    fn test_reset_exception_only_from_exception() {
        let mut sm = StateMachine::new();
        assert!(!sm.apply(Transition::ResetException));

        sm.force(ComponentState::Exception);
        assert!(sm.apply(Transition::ResetException));
        assert_eq!(sm.state(), ComponentState::Stopped);
    }

    #[test]
    fn test_fatal_error_is_terminal() {
        let mut sm = StateMachine::new();
        sm.force(ComponentState::FatalError);
        assert!(sm.state().is_terminal());

        assert!(!sm.apply(Transition::Configure));
        assert!(!sm.apply(Transition::Start));
        assert!(!sm.apply(Transition::Stop));
        assert!(!sm.apply(Transition::Cleanup));
        assert!(!sm.apply(Transition::ResetException));
    }

    #[test]
    fn test_state_predicates() {
        assert!(ComponentState::RuntimeWarning.is_running_state());
        assert!(ComponentState::RuntimeWarning.is_error());
        assert!(!ComponentState::Running.is_error());
        assert!(!ComponentState::Exception.is_running_state());
    }
}
