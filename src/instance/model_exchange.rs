//! Model-Exchange specifics of [`Instance`].

use std::sync::Arc;

use fmi2_sys as sys;
use sys::{fmi2Boolean, fmi2False};

use crate::library::ModelExchangeLibrary;
use crate::model_description::ModelExchangeModelDescription;
use crate::{Error, EventInfo};

use super::lifecycle::State;
use super::traits::ModelExchange;
use super::{Instance, InstanceME};

impl InstanceME {
    /// Instantiate a new Model-Exchange component from a loaded library.
    pub fn new(
        lib: Arc<ModelExchangeLibrary>,
        visible: bool,
        logging_on: bool,
    ) -> Result<Self, Error> {
        Instance::instantiate(lib, visible, logging_on)
    }

    pub fn num_continuous_states(&self) -> usize {
        self.lib.model_description().number_of_continuous_states()
    }

    pub fn num_event_indicators(&self) -> usize {
        self.lib.model_description().number_of_event_indicators()
    }

    fn me_api(&self) -> &sys::Fmi2MeApi {
        &self.lib.binding.me
    }
}

impl ModelExchange for InstanceME {
    fn model_description(&self) -> &ModelExchangeModelDescription {
        self.lib.model_description()
    }

    fn set_time(&mut self, time: f64) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("set_time")?;
        let f = self.me_api().set_time;
        let status = unsafe { f(self.component, time) };
        self.consume(status)?;
        self.time = time;
        Ok(())
    }

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<(), Error> {
        assert_eq!(states.len(), self.num_continuous_states());
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("set_continuous_states")?;
        let f = self.me_api().set_continuous_states;
        let status = unsafe { f(self.component, states.as_ptr(), states.len()) };
        self.consume(status)
    }

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<(), Error> {
        assert_eq!(states.len(), self.num_continuous_states());
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_continuous_states")?;
        let f = self.me_api().get_continuous_states;
        let status = unsafe { f(self.component, states.as_mut_ptr(), states.len()) };
        self.consume(status)
    }

    fn get_derivatives(&mut self, dx: &mut [f64]) -> Result<(), Error> {
        assert_eq!(dx.len(), self.num_continuous_states());
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_derivatives")?;
        let f = self.me_api().get_derivatives;
        let status = unsafe { f(self.component, dx.as_mut_ptr(), dx.len()) };
        self.consume(status)
    }

    fn get_event_indicators(&mut self, indicators: &mut [f64]) -> Result<(), Error> {
        assert_eq!(indicators.len(), self.num_event_indicators());
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_event_indicators")?;
        let f = self.me_api().get_event_indicators;
        let status = unsafe { f(self.component, indicators.as_mut_ptr(), indicators.len()) };
        self.consume(status)
    }

    fn get_nominals_of_continuous_states(&mut self, nominals: &mut [f64]) -> Result<(), Error> {
        assert_eq!(nominals.len(), self.num_continuous_states());
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_nominals_of_continuous_states")?;
        let f = self.me_api().get_nominals_of_continuous_states;
        let status = unsafe { f(self.component, nominals.as_mut_ptr(), nominals.len()) };
        self.consume(status)
    }

    fn enter_event_mode(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle
            .expect(&[State::ContinuousTimeMode], "enter_event_mode")?;
        let f = self.me_api().enter_event_mode;
        let status = unsafe { f(self.component) };
        self.consume(status)?;
        self.lifecycle.transition(State::EventMode);
        Ok(())
    }

    fn enter_continuous_time_mode(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle
            .expect(&[State::EventMode], "enter_continuous_time_mode")?;
        let f = self.me_api().enter_continuous_time_mode;
        let status = unsafe { f(self.component) };
        self.consume(status)?;
        self.lifecycle.transition(State::ContinuousTimeMode);
        Ok(())
    }

    fn new_discrete_states(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect(&[State::EventMode], "new_discrete_states")?;
        let f = self.me_api().new_discrete_states;
        let status = unsafe { f(self.component, &mut self.event_info) };
        self.consume(status)
    }

    fn completed_integrator_step(
        &mut self,
        no_set_fmu_state_prior_to_current_point: bool,
    ) -> Result<(bool, bool), Error> {
        self.lifecycle.guard()?;
        self.lifecycle
            .expect(&[State::ContinuousTimeMode], "completed_integrator_step")?;
        let mut enter_event_mode = fmi2False;
        let mut terminate_simulation = fmi2False;
        let f = self.me_api().completed_integrator_step;
        let status = unsafe {
            f(
                self.component,
                no_set_fmu_state_prior_to_current_point as fmi2Boolean,
                &mut enter_event_mode,
                &mut terminate_simulation,
            )
        };
        self.consume(status)?;
        Ok((
            enter_event_mode != fmi2False,
            terminate_simulation != fmi2False,
        ))
    }

    fn event_info(&self) -> &EventInfo {
        &self.event_info
    }

    fn event_info_mut(&mut self) -> &mut EventInfo {
        &mut self.event_info
    }
}
