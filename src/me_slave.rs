//! Drives a Model-Exchange instance behind the Co-Simulation contract.
//!
//! A [`MeSlave`] owns an instance and an ODE solver and turns
//! [`Slave::do_step`] into continuous integration plus the FMI 2.0 event
//! loop: time events from the latest [`EventInfo`], state events from sign
//! changes of the event indicators, and step events from
//! `fmi2CompletedIntegratorStep`. After every detected event the
//! discrete-event iteration runs to its fixed point before continuous time
//! resumes.

use std::sync::Arc;

use itertools::izip;

use crate::instance::traits::{Common, ModelExchange, Slave};
use crate::instance::FmuState;
use crate::model_description::CoSimulationModelDescription;
use crate::solver::{OdeSolver, OdeSystem};
use crate::{Error, Status, sys::fmi2False};

/// Below this width an integration segment is degenerate: time snaps to the
/// target instead of asking the solver to integrate a zero-width interval.
const EPS: f64 = 1e-13;

/// A Model-Exchange instance presented as a Co-Simulation slave.
pub struct MeSlave<M: ModelExchange> {
    instance: M,
    solver: Box<dyn OdeSolver>,
    descr: Arc<CoSimulationModelDescription>,
    /// Continuous states, fetched before each integration segment.
    x: Vec<f64>,
    /// Event indicators after the most recent refresh.
    z: Vec<f64>,
    /// Event indicators before the most recent refresh.
    pz: Vec<f64>,
}

/// The callable the solver integrates over: pushes the trial time and states
/// into the instance and reads back the derivatives.
struct InstanceSystem<'a, M: ModelExchange> {
    instance: &'a mut M,
}

impl<M: ModelExchange> OdeSystem for InstanceSystem<'_, M> {
    fn eval(&mut self, x: &[f64], dx: &mut [f64], t: f64) -> Result<(), Error> {
        self.instance.set_time(t)?;
        self.instance.set_continuous_states(x)?;
        self.instance.get_derivatives(dx)
    }
}

impl<M: ModelExchange> MeSlave<M> {
    /// Wrap `instance`, taking unique ownership of it and of the solver.
    pub fn new(instance: M, solver: Box<dyn OdeSolver>) -> Self {
        let me_descr = instance.model_description();
        let descr = Arc::new(me_descr.as_co_simulation());
        let nx = me_descr.number_of_continuous_states();
        let nz = me_descr.number_of_event_indicators();
        Self {
            instance,
            solver,
            descr,
            x: vec![0.0; nx],
            z: vec![0.0; nz],
            pz: vec![0.0; nz],
        }
    }

    /// The wrapped instance, e.g. for Model-Exchange-only introspection.
    pub fn instance(&self) -> &M {
        &self.instance
    }

    /// Integrate one segment from `t` to `t_next`. Returns the time reached
    /// and whether an event indicator crossed zero over the segment.
    fn solve(&mut self, t: f64, t_next: f64) -> Result<(f64, bool), Error> {
        if !self.x.is_empty() {
            self.instance.get_continuous_states(&mut self.x)?;
        }

        let reached = {
            let mut system = InstanceSystem {
                instance: &mut self.instance,
            };
            self.solver.integrate(&mut system, &mut self.x, t, t_next)?
        };

        if !self.x.is_empty() {
            self.instance.set_continuous_states(&self.x)?;
        }

        let mut state_event = false;
        if !self.z.is_empty() {
            std::mem::swap(&mut self.pz, &mut self.z);
            self.instance.get_event_indicators(&mut self.z)?;
            // a strict sign change is a zero crossing; landing exactly on
            // zero is picked up by the next segment
            state_event = izip!(&self.pz, &self.z).any(|(pz, z)| pz * z < 0.0);
        }

        Ok((reached, state_event))
    }

    /// Event mode, fix-point iteration, back to continuous time.
    fn handle_events(&mut self) -> Result<(), Error> {
        self.instance.enter_event_mode()?;
        if self.instance.do_event_iteration()? {
            self.instance.terminate()?;
            return Err(Error::Terminated);
        }
        self.instance.enter_continuous_time_mode()?;
        // restart crossing detection from the post-event indicators
        if !self.z.is_empty() {
            self.instance.get_event_indicators(&mut self.z)?;
        }
        Ok(())
    }
}

impl<M: ModelExchange> Slave for MeSlave<M> {
    fn model_description(&self) -> &CoSimulationModelDescription {
        &self.descr
    }

    fn do_step(&mut self, step_size: f64) -> Result<(), Error> {
        if step_size <= 0.0 {
            return Err(Error::InvalidStepSize(step_size));
        }

        let mut time = self.instance.simulation_time();
        let stop_time = time + step_size;

        while time < stop_time {
            let mut t_next = f64::min(time + step_size, stop_time);

            let info = *self.instance.event_info();
            let time_event =
                info.next_event_time_defined != fmi2False && info.next_event_time <= t_next;
            if time_event {
                t_next = f64::min(t_next, info.next_event_time);
            }

            let mut state_event = false;
            if (t_next - time) > EPS {
                let (reached, crossed) = self.solve(time, t_next)?;
                time = reached;
                state_event = crossed;
            } else {
                time = t_next;
            }

            self.instance.set_time(time)?;

            let mut step_event = false;
            if !self
                .instance
                .model_description()
                .attributes
                .completed_integrator_step_not_needed
            {
                let (enter_event_mode, terminate_requested) =
                    self.instance.completed_integrator_step(true)?;
                if terminate_requested {
                    log::info!("Termination requested by the FMU at t = {time}");
                    self.instance.terminate()?;
                    return Err(Error::Terminated);
                }
                step_event = enter_event_mode;
            }

            if time_event || state_event || step_event {
                log::trace!(
                    "Event at t = {time} [time/state/step = {time_event}/{state_event}/{step_event}]"
                );
                self.handle_events()?;
            }
        }

        Ok(())
    }

    fn cancel_step(&mut self) -> Result<(), Error> {
        // Model Exchange has no asynchronous stepping to cancel.
        Err(Error::UnsupportedOperation("canRunAsynchronuously"))
    }
}

impl<M: ModelExchange> Common for MeSlave<M> {
    fn name(&self) -> &str {
        self.instance.name()
    }

    fn last_status(&self) -> Status {
        self.instance.last_status()
    }

    fn simulation_time(&self) -> f64 {
        self.instance.simulation_time()
    }

    fn setup_experiment(
        &mut self,
        start_time: f64,
        stop_time: Option<f64>,
        tolerance: Option<f64>,
    ) -> Result<(), Error> {
        self.instance.setup_experiment(start_time, stop_time, tolerance)
    }

    fn enter_initialization_mode(&mut self) -> Result<(), Error> {
        self.instance.enter_initialization_mode()
    }

    /// Delegates, then runs the discrete-event fix point and enters
    /// continuous-time mode, so the wrapped instance is ready to integrate.
    fn exit_initialization_mode(&mut self) -> Result<(), Error> {
        self.instance.exit_initialization_mode()?;
        if self.instance.do_event_iteration()? {
            self.instance.terminate()?;
            return Err(Error::Terminated);
        }
        self.instance.enter_continuous_time_mode()?;
        // baseline for the first zero-crossing comparison
        if !self.z.is_empty() {
            self.instance.get_event_indicators(&mut self.z)?;
        }
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), Error> {
        self.instance.terminate()
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.instance.reset()?;
        self.x.fill(0.0);
        self.z.fill(0.0);
        self.pz.fill(0.0);
        Ok(())
    }

    fn read_real(&mut self, vr: u32) -> Result<f64, Error> {
        self.instance.read_real(vr)
    }

    fn read_integer(&mut self, vr: u32) -> Result<i32, Error> {
        self.instance.read_integer(vr)
    }

    fn read_boolean(&mut self, vr: u32) -> Result<bool, Error> {
        self.instance.read_boolean(vr)
    }

    fn read_string(&mut self, vr: u32) -> Result<String, Error> {
        self.instance.read_string(vr)
    }

    fn read_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), Error> {
        self.instance.read_reals(vrs, values)
    }

    fn read_integers(&mut self, vrs: &[u32], values: &mut [i32]) -> Result<(), Error> {
        self.instance.read_integers(vrs, values)
    }

    fn read_booleans(&mut self, vrs: &[u32], values: &mut [bool]) -> Result<(), Error> {
        self.instance.read_booleans(vrs, values)
    }

    fn read_strings(&mut self, vrs: &[u32], values: &mut [String]) -> Result<(), Error> {
        self.instance.read_strings(vrs, values)
    }

    fn write_real(&mut self, vr: u32, value: f64) -> Result<(), Error> {
        self.instance.write_real(vr, value)
    }

    fn write_integer(&mut self, vr: u32, value: i32) -> Result<(), Error> {
        self.instance.write_integer(vr, value)
    }

    fn write_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error> {
        self.instance.write_boolean(vr, value)
    }

    fn write_string(&mut self, vr: u32, value: &str) -> Result<(), Error> {
        self.instance.write_string(vr, value)
    }

    fn write_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), Error> {
        self.instance.write_reals(vrs, values)
    }

    fn write_integers(&mut self, vrs: &[u32], values: &[i32]) -> Result<(), Error> {
        self.instance.write_integers(vrs, values)
    }

    fn write_booleans(&mut self, vrs: &[u32], values: &[bool]) -> Result<(), Error> {
        self.instance.write_booleans(vrs, values)
    }

    fn write_strings(&mut self, vrs: &[u32], values: &[&str]) -> Result<(), Error> {
        self.instance.write_strings(vrs, values)
    }

    fn get_fmu_state(&mut self) -> Result<FmuState, Error> {
        self.instance.get_fmu_state()
    }

    fn set_fmu_state(&mut self, state: &FmuState) -> Result<(), Error> {
        self.instance.set_fmu_state(state)
    }

    fn free_fmu_state(&mut self, state: FmuState) -> Result<(), Error> {
        self.instance.free_fmu_state(state)
    }

    fn serialize_fmu_state(&mut self, state: &FmuState) -> Result<Vec<u8>, Error> {
        self.instance.serialize_fmu_state(state)
    }

    fn deserialize_fmu_state(&mut self, bytes: &[u8]) -> Result<FmuState, Error> {
        self.instance.deserialize_fmu_state(bytes)
    }

    fn get_directional_derivative(
        &mut self,
        unknown_vrs: &[u32],
        known_vrs: &[u32],
        dv_known: &[f64],
        dv_unknown: &mut [f64],
    ) -> Result<(), Error> {
        self.instance
            .get_directional_derivative(unknown_vrs, known_vrs, dv_known, dv_unknown)
    }
}
