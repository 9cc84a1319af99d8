//! Co-Simulation specifics of [`Instance`].

use std::ffi::CStr;
use std::sync::Arc;

use fmi2_sys as sys;

use crate::library::CoSimulationLibrary;
use crate::model_description::CoSimulationModelDescription;
use crate::{Error, Status, StatusKind};

use super::lifecycle::State;
use super::traits::{CoSimulation, Slave};
use super::{Instance, InstanceCS};

impl InstanceCS {
    /// Instantiate a new Co-Simulation component from a loaded library.
    pub fn new(lib: Arc<CoSimulationLibrary>, visible: bool, logging_on: bool) -> Result<Self, Error> {
        Instance::instantiate(lib, visible, logging_on)
    }

    /// The typed description of the library this instance was born from.
    pub fn model_description(&self) -> &Arc<CoSimulationModelDescription> {
        self.lib.model_description()
    }

    fn cs_api(&self) -> &sys::Fmi2CsApi {
        &self.lib.binding.cs
    }
}

impl CoSimulation for InstanceCS {
    fn do_step(&mut self, step_size: f64) -> Result<(), Error> {
        if step_size <= 0.0 {
            return Err(Error::InvalidStepSize(step_size));
        }
        self.lifecycle.guard()?;
        self.lifecycle.expect(&[State::StepComplete], "do_step")?;
        let f = self.cs_api().do_step;
        let status = unsafe { f(self.component, self.time, step_size, sys::fmi2True) };
        self.consume(status)?;
        self.time += step_size;
        Ok(())
    }

    fn cancel_step(&mut self) -> Result<(), Error> {
        self.require_capability(
            self.model_description().attributes.can_run_asynchronously,
            "canRunAsynchronuously",
        )?;
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("cancel_step")?;
        let f = self.cs_api().cancel_step;
        let status = unsafe { f(self.component) };
        self.consume(status)
    }

    fn get_status(&mut self, kind: StatusKind) -> Result<Status, Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_status")?;
        let mut value = sys::fmi2Status::OK;
        let f = self.cs_api().get_status;
        let status = unsafe { f(self.component, kind, &mut value) };
        self.consume(status)?;
        Ok(value.into())
    }

    fn get_real_status(&mut self, kind: StatusKind) -> Result<f64, Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_real_status")?;
        let mut value = 0.0;
        let f = self.cs_api().get_real_status;
        let status = unsafe { f(self.component, kind, &mut value) };
        self.consume(status)?;
        Ok(value)
    }

    fn get_integer_status(&mut self, kind: StatusKind) -> Result<i32, Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_integer_status")?;
        let mut value = 0;
        let f = self.cs_api().get_integer_status;
        let status = unsafe { f(self.component, kind, &mut value) };
        self.consume(status)?;
        Ok(value)
    }

    fn get_boolean_status(&mut self, kind: StatusKind) -> Result<bool, Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_boolean_status")?;
        let mut value = sys::fmi2False;
        let f = self.cs_api().get_boolean_status;
        let status = unsafe { f(self.component, kind, &mut value) };
        self.consume(status)?;
        Ok(value != sys::fmi2False)
    }

    fn get_string_status(&mut self, kind: StatusKind) -> Result<String, Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("get_string_status")?;
        let mut value: sys::fmi2String = std::ptr::null();
        let f = self.cs_api().get_string_status;
        let status = unsafe { f(self.component, kind, &mut value) };
        self.consume(status)?;
        Ok(if value.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned()
        })
    }
}

impl Slave for InstanceCS {
    fn model_description(&self) -> &CoSimulationModelDescription {
        self.lib.model_description()
    }

    fn do_step(&mut self, step_size: f64) -> Result<(), Error> {
        CoSimulation::do_step(self, step_size)
    }

    fn cancel_step(&mut self) -> Result<(), Error> {
        CoSimulation::cancel_step(self)
    }
}
