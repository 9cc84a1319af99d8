//! Contracts of the instance kinds.
//!
//! [`Common`] covers the operations shared by every FMI 2.0 instance.
//! [`CoSimulation`] and [`ModelExchange`] add the interface-specific calls.
//! [`Slave`] is the consumer-facing co-simulation contract with exactly two
//! implementors: the native [`crate::InstanceCS`] and the
//! [`crate::MeSlave`] wrapper that drives a Model-Exchange instance with a
//! solver.

use fmi2_sys::{fmi2False, fmi2True};

use crate::model_description::{CoSimulationModelDescription, ModelExchangeModelDescription};
use crate::{Error, EventInfo, Status, StatusKind};

use super::FmuState;

/// Operations shared by every FMI 2.0 instance.
///
/// All methods take `&mut self`: an instance is confined to a single caller,
/// and even reads update the cached [`Status`] of the most recent ABI call.
pub trait Common {
    /// The instance name passed to `fmi2Instantiate`.
    fn name(&self) -> &str;

    /// Status of the most recent wrapped ABI call.
    fn last_status(&self) -> Status;

    /// Cached simulation time: the start time after `setup_experiment`,
    /// advanced by stepping (Co-Simulation) or `set_time` (Model Exchange).
    fn simulation_time(&self) -> f64;

    /// Configure the experiment. Only valid in the Instantiated state and
    /// required before `enter_initialization_mode`.
    fn setup_experiment(
        &mut self,
        start_time: f64,
        stop_time: Option<f64>,
        tolerance: Option<f64>,
    ) -> Result<(), Error>;

    fn enter_initialization_mode(&mut self) -> Result<(), Error>;

    fn exit_initialization_mode(&mut self) -> Result<(), Error>;

    /// Informs the FMU that the simulation run is over. Afterwards only
    /// cached-state introspection and dropping the instance remain valid.
    fn terminate(&mut self) -> Result<(), Error>;

    /// Returns the FMU to the state right after instantiation.
    fn reset(&mut self) -> Result<(), Error>;

    fn read_real(&mut self, vr: u32) -> Result<f64, Error>;
    fn read_integer(&mut self, vr: u32) -> Result<i32, Error>;
    fn read_boolean(&mut self, vr: u32) -> Result<bool, Error>;
    fn read_string(&mut self, vr: u32) -> Result<String, Error>;

    fn read_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), Error>;
    fn read_integers(&mut self, vrs: &[u32], values: &mut [i32]) -> Result<(), Error>;
    fn read_booleans(&mut self, vrs: &[u32], values: &mut [bool]) -> Result<(), Error>;
    fn read_strings(&mut self, vrs: &[u32], values: &mut [String]) -> Result<(), Error>;

    fn write_real(&mut self, vr: u32, value: f64) -> Result<(), Error>;
    fn write_integer(&mut self, vr: u32, value: i32) -> Result<(), Error>;
    fn write_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error>;
    fn write_string(&mut self, vr: u32, value: &str) -> Result<(), Error>;

    /// Vector writes are atomic from the caller's view: either the FMU
    /// accepted all values or the call reports failure.
    fn write_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), Error>;
    fn write_integers(&mut self, vrs: &[u32], values: &[i32]) -> Result<(), Error>;
    fn write_booleans(&mut self, vrs: &[u32], values: &[bool]) -> Result<(), Error>;
    fn write_strings(&mut self, vrs: &[u32], values: &[&str]) -> Result<(), Error>;

    /// Snapshot the internal FMU state. Requires the `canGetAndSetFMUstate`
    /// capability.
    fn get_fmu_state(&mut self) -> Result<FmuState, Error>;

    /// Restore a snapshot taken with [`Common::get_fmu_state`].
    fn set_fmu_state(&mut self, state: &FmuState) -> Result<(), Error>;

    fn free_fmu_state(&mut self, state: FmuState) -> Result<(), Error>;

    /// Serialize a snapshot to bytes. Requires the `canSerializeFMUstate`
    /// capability.
    fn serialize_fmu_state(&mut self, state: &FmuState) -> Result<Vec<u8>, Error>;

    fn deserialize_fmu_state(&mut self, bytes: &[u8]) -> Result<FmuState, Error>;

    /// Compute directional derivatives dv_unknown = J * dv_known. Requires
    /// the `providesDirectionalDerivative` capability.
    fn get_directional_derivative(
        &mut self,
        unknown_vrs: &[u32],
        known_vrs: &[u32],
        dv_known: &[f64],
        dv_unknown: &mut [f64],
    ) -> Result<(), Error>;
}

/// The ABI surface specific to Co-Simulation instances.
pub trait CoSimulation: Common {
    /// Compute one communication step of `step_size`, starting at the cached
    /// simulation time. Advances the cached time on success.
    fn do_step(&mut self, step_size: f64) -> Result<(), Error>;

    /// Stop an asynchronous `do_step` that returned a Pending status.
    /// Requires the `canRunAsynchronuously` capability.
    fn cancel_step(&mut self) -> Result<(), Error>;

    fn get_status(&mut self, kind: StatusKind) -> Result<Status, Error>;
    fn get_real_status(&mut self, kind: StatusKind) -> Result<f64, Error>;
    fn get_integer_status(&mut self, kind: StatusKind) -> Result<i32, Error>;
    fn get_boolean_status(&mut self, kind: StatusKind) -> Result<bool, Error>;
    fn get_string_status(&mut self, kind: StatusKind) -> Result<String, Error>;
}

/// The ABI surface specific to Model-Exchange instances.
pub trait ModelExchange: Common {
    fn model_description(&self) -> &ModelExchangeModelDescription;

    /// Set the independent variable and invalidate time-dependent caches.
    /// Must precede `get_derivatives`/`get_event_indicators` calls that
    /// expect the new time.
    fn set_time(&mut self, time: f64) -> Result<(), Error>;

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<(), Error>;

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<(), Error>;

    /// State derivatives at the current time and states.
    fn get_derivatives(&mut self, dx: &mut [f64]) -> Result<(), Error>;

    /// Event indicators; a state event is a sign change between two
    /// consecutive readings.
    fn get_event_indicators(&mut self, indicators: &mut [f64]) -> Result<(), Error>;

    fn get_nominals_of_continuous_states(&mut self, nominals: &mut [f64]) -> Result<(), Error>;

    /// Enter Event Mode from Continuous-Time Mode; discrete-time equations
    /// become active.
    fn enter_event_mode(&mut self) -> Result<(), Error>;

    /// Enter Continuous-Time Mode after the discrete-event iteration has
    /// converged; discrete-time equations freeze.
    fn enter_continuous_time_mode(&mut self) -> Result<(), Error>;

    /// One step of the discrete-event iteration. Updates the owned
    /// [`EventInfo`].
    fn new_discrete_states(&mut self) -> Result<(), Error>;

    /// To be called after every completed integrator step unless the model
    /// description sets `completedIntegratorStepNotNeeded`. Returns
    /// `(enter_event_mode, terminate_simulation)`.
    fn completed_integrator_step(
        &mut self,
        no_set_fmu_state_prior_to_current_point: bool,
    ) -> Result<(bool, bool), Error>;

    /// The event information updated by the latest `new_discrete_states`.
    fn event_info(&self) -> &EventInfo;

    fn event_info_mut(&mut self) -> &mut EventInfo;

    /// Run the discrete-event iteration to its fixed point: request new
    /// discrete states until the FMU stops asking for more. Returns whether
    /// the FMU requested termination of the simulation.
    fn do_event_iteration(&mut self) -> Result<bool, Error> {
        self.event_info_mut().new_discrete_states_needed = fmi2True;
        self.event_info_mut().terminate_simulation = fmi2False;

        while self.event_info().new_discrete_states_needed == fmi2True
            && self.event_info().terminate_simulation == fmi2False
        {
            self.new_discrete_states()?;
        }

        Ok(self.event_info().terminate_simulation == fmi2True)
    }
}

/// The co-simulation contract a master programs against, presented both by
/// native Co-Simulation instances and by solver-wrapped Model-Exchange
/// instances.
pub trait Slave: Common {
    fn model_description(&self) -> &CoSimulationModelDescription;

    /// Advance the slave by `step_size`. On success the simulation time has
    /// advanced by exactly `step_size`.
    fn do_step(&mut self, step_size: f64) -> Result<(), Error>;

    /// Cancel an asynchronous step, where supported.
    fn cancel_step(&mut self) -> Result<(), Error>;
}
