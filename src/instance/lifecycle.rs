//! The FMI 2.0 instance lifecycle state machine.
//!
//! Kept free of any ABI concern so the transition rules can be checked on
//! their own: `Instantiated → InitializationMode → {StepComplete |
//! ContinuousTimeMode | EventMode} → Terminated`, with `reset` returning to
//! `Instantiated`. A Fatal status poisons the machine; from then on every
//! guarded call is rejected before it can reach the FMU.

use crate::{AbiError, StateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Component exists, experiment not yet configured or configured but
    /// initialization not entered.
    Instantiated,
    InitializationMode,
    /// Co-Simulation: between communication steps.
    StepComplete,
    /// Model Exchange: continuous integration in progress.
    ContinuousTimeMode,
    /// Model Exchange: discrete-event iteration in progress.
    EventMode,
    Terminated,
}

impl State {
    fn is_live(self) -> bool {
        self != State::Terminated
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: State,
    experiment_configured: bool,
    poisoned: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: State::Instantiated,
            experiment_configured: false,
            poisoned: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Sticky-fatal check, to be applied before any ABI-invoking operation.
    pub fn guard(&self) -> Result<(), AbiError> {
        if self.poisoned {
            Err(AbiError::Fatal)
        } else {
            Ok(())
        }
    }

    pub fn expect(&self, allowed: &[State], operation: &'static str) -> Result<(), StateError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    /// Reads and writes are permitted in every live state.
    pub fn expect_live(&self, operation: &'static str) -> Result<(), StateError> {
        if self.state.is_live() {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    pub fn check_enter_initialization(&self) -> Result<(), StateError> {
        self.expect(&[State::Instantiated], "enter_initialization_mode")?;
        if !self.experiment_configured {
            return Err(StateError::SetupExperimentRequired);
        }
        Ok(())
    }

    pub fn transition(&mut self, next: State) {
        self.state = next;
    }

    pub fn mark_experiment_configured(&mut self) {
        self.experiment_configured = true;
    }

    /// Back to the state right after `fmi2Instantiate`.
    pub fn reset(&mut self) {
        self.state = State::Instantiated;
        self.experiment_configured = false;
    }

    /// Fatal status: the instance is unusable except for freeing.
    pub fn poison(&mut self) {
        self.poisoned = true;
        self.state = State::Terminated;
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_nominal_co_simulation_sequence() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), State::Instantiated);

        lc.expect(&[State::Instantiated], "setup_experiment").unwrap();
        lc.mark_experiment_configured();
        lc.check_enter_initialization().unwrap();
        lc.transition(State::InitializationMode);
        lc.expect(&[State::InitializationMode], "exit_initialization_mode")
            .unwrap();
        lc.transition(State::StepComplete);
        lc.expect(&[State::StepComplete], "do_step").unwrap();
        lc.expect_live("read").unwrap();
        lc.transition(State::Terminated);
        assert!(lc.expect_live("read").is_err());
    }

    #[test]
    fn test_initialization_requires_setup() {
        let lc = Lifecycle::new();
        assert_eq!(
            lc.check_enter_initialization(),
            Err(StateError::SetupExperimentRequired)
        );
    }

    #[rstest]
    #[case::init(State::InitializationMode)]
    #[case::step_complete(State::StepComplete)]
    #[case::continuous(State::ContinuousTimeMode)]
    #[case::event(State::EventMode)]
    #[case::terminated(State::Terminated)]
    fn test_setup_experiment_only_when_instantiated(#[case] state: State) {
        let mut lc = Lifecycle::new();
        lc.transition(state);
        assert_eq!(
            lc.expect(&[State::Instantiated], "setup_experiment"),
            Err(StateError::InvalidTransition {
                operation: "setup_experiment",
                state,
            })
        );
    }

    #[rstest]
    #[case::instantiated(State::Instantiated)]
    #[case::init(State::InitializationMode)]
    #[case::continuous(State::ContinuousTimeMode)]
    fn test_do_step_requires_step_complete(#[case] state: State) {
        let mut lc = Lifecycle::new();
        lc.transition(state);
        assert!(lc.expect(&[State::StepComplete], "do_step").is_err());
    }

    #[test]
    fn test_reset_returns_to_instantiated() {
        let mut lc = Lifecycle::new();
        lc.mark_experiment_configured();
        lc.transition(State::StepComplete);
        lc.reset();
        assert_eq!(lc.state(), State::Instantiated);
        // the experiment has to be configured again
        assert_eq!(
            lc.check_enter_initialization(),
            Err(StateError::SetupExperimentRequired)
        );
    }

    #[test]
    fn test_poison_is_sticky() {
        let mut lc = Lifecycle::new();
        lc.transition(State::StepComplete);
        lc.poison();
        assert_eq!(lc.state(), State::Terminated);
        assert_eq!(lc.guard(), Err(AbiError::Fatal));
        // not even reset clears a poisoned machine at the caller level;
        // the guard stays in front of every ABI call
        lc.reset();
        assert_eq!(lc.guard(), Err(AbiError::Fatal));
    }
}
