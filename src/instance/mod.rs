//! FMI 2.0 instances.
//!
//! [`Instance`] wraps one component handle returned by `fmi2Instantiate`,
//! generic over the library kind it was born from. The lifecycle state
//! machine in [`lifecycle`] sits in front of every wrapped call, and the
//! cached [`Status`] of the most recent ABI call decides whether an
//! operation is even allowed to reach the FMU (a Fatal status is sticky).

use std::ffi::{CStr, CString};
use std::sync::Arc;

use fmi2_sys as sys;
use sys::{fmi2Boolean, fmi2False, fmi2String};

use crate::library::{CoSimulationLibrary, FmuLibrary, ModelExchangeLibrary};
use crate::{AbiError, Error, EventInfo, Status};

pub mod lifecycle;
pub mod traits;

mod co_simulation;
mod model_exchange;

use lifecycle::{Lifecycle, State};
use traits::Common;

/// A Co-Simulation instance.
pub type InstanceCS = Instance<CoSimulationLibrary>;
/// A Model-Exchange instance.
pub type InstanceME = Instance<ModelExchangeLibrary>;

/// Opaque snapshot of the internal FMU state, produced by
/// [`traits::Common::get_fmu_state`].
///
/// The memory behind the handle is owned by the FMU; pass the snapshot back
/// to [`traits::Common::free_fmu_state`] on the same instance when done.
#[derive(Debug)]
pub struct FmuState(pub(crate) sys::fmi2FMUstate);

/// One allocated component of a loaded FMU library.
///
/// Holds a strong reference to its library (which in turn keeps the unpacked
/// resource directory alive), so teardown order is always instance → library
/// → resource. The component handle is freed exactly once, on drop.
pub struct Instance<L: FmuLibrary> {
    pub(crate) lib: Arc<L>,
    pub(crate) component: sys::fmi2Component,
    name: String,
    pub(crate) lifecycle: Lifecycle,
    last_status: Status,
    pub(crate) time: f64,
    pub(crate) event_info: EventInfo,
    /// Keeps the callback struct alive for the lifetime of the component;
    /// the FMU stores the pointer passed at instantiation.
    #[allow(dead_code)]
    callbacks: Box<sys::fmi2CallbackFunctions>,
}

// The component handle is exclusively owned and all operations take
// `&mut self`, so moving an instance to another thread is sound. It is
// deliberately not Sync: a single instance must be driven by one caller.
unsafe impl<L: FmuLibrary> Send for Instance<L> {}

fn check_lengths(vrs: usize, values: usize) -> Result<(), Error> {
    if vrs == values {
        Ok(())
    } else {
        Err(Error::LengthMismatch { vrs, values })
    }
}

impl<L: FmuLibrary> Instance<L> {
    /// Call `fmi2Instantiate` on the library and wrap the returned
    /// component. The instance name is generated from the model identifier
    /// so several instances of the same library stay distinguishable in
    /// logger output.
    pub(crate) fn instantiate(
        lib: Arc<L>,
        visible: bool,
        logging_on: bool,
    ) -> Result<Self, Error> {
        let name = lib.next_instance_name();

        let callbacks = Box::new(sys::fmi2CallbackFunctions {
            logger: Some(sys::logger::callback_logger_handler),
            allocate_memory: Some(libc::calloc),
            free_memory: Some(libc::free),
            step_finished: None,
            component_environment: std::ptr::null_mut(),
        });

        let instance_name =
            CString::new(name.as_str()).expect("instance name contains a NUL byte");
        let guid = CString::new(lib.core_description().guid.as_str())
            .expect("model description guid contains a NUL byte");
        let resource_location = CString::new(lib.resource().resource_url().as_str())
            .expect("resource URL contains a NUL byte");

        let component = unsafe {
            (lib.common().instantiate)(
                instance_name.as_ptr(),
                L::KIND,
                guid.as_ptr(),
                resource_location.as_ptr(),
                &*callbacks,
                visible as fmi2Boolean,
                logging_on as fmi2Boolean,
            )
        };
        if component.is_null() {
            return Err(Error::Instantiation);
        }
        log::trace!("Instantiated `{}` as component {:?}", name, component);

        Ok(Self {
            lib,
            component,
            name,
            lifecycle: Lifecycle::new(),
            last_status: Status::Ok,
            time: 0.0,
            event_info: EventInfo::default(),
            callbacks,
        })
    }

    fn api(&self) -> &sys::Fmi2CommonApi {
        self.lib.common()
    }

    /// Record the status of a wrapped call, translating Discard, Error and
    /// Fatal into failures. Fatal also poisons the lifecycle.
    pub(crate) fn consume(&mut self, raw: sys::fmi2Status) -> Result<(), Error> {
        let status = Status::from(raw);
        self.last_status = status;
        match status {
            Status::Ok | Status::Warning | Status::Pending => Ok(()),
            Status::Discard => Err(AbiError::Discard.into()),
            Status::Error => Err(AbiError::Error.into()),
            Status::Fatal => {
                log::error!("Instance `{}` reported a fatal status", self.name);
                self.lifecycle.poison();
                Err(AbiError::Fatal.into())
            }
        }
    }

    pub(crate) fn require_capability(
        &self,
        declared: bool,
        name: &'static str,
    ) -> Result<(), Error> {
        if declared {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation(name))
        }
    }

    fn guarded_read(&self, operation: &'static str) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live(operation)?;
        Ok(())
    }

    /// The FMI version string reported by the library.
    pub fn version(&self) -> String {
        unsafe { CStr::from_ptr((self.api().get_version)()) }
            .to_string_lossy()
            .into_owned()
    }

    /// The `fmi2TypesPlatform` string reported by the library.
    pub fn types_platform(&self) -> String {
        unsafe { CStr::from_ptr((self.api().get_types_platform)()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Enable or disable debug logging for the given categories declared in
    /// the model description.
    pub fn set_debug_logging(
        &mut self,
        logging_on: bool,
        categories: &[&str],
    ) -> Result<(), Error> {
        self.guarded_read("set_debug_logging")?;
        let category_cstr = categories
            .iter()
            .map(|c| CString::new(*c))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidString)?;
        let category_ptrs: Vec<fmi2String> = category_cstr.iter().map(|c| c.as_ptr()).collect();

        let f = self.api().set_debug_logging;
        let status = unsafe {
            f(
                self.component,
                logging_on as fmi2Boolean,
                category_ptrs.len(),
                category_ptrs.as_ptr(),
            )
        };
        self.consume(status)
    }

    /// The lifecycle state the instance is currently in.
    pub fn state(&self) -> State {
        self.lifecycle.state()
    }
}

impl<L: FmuLibrary> Common for Instance<L> {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_status(&self) -> Status {
        self.last_status
    }

    fn simulation_time(&self) -> f64 {
        self.time
    }

    fn setup_experiment(
        &mut self,
        start_time: f64,
        stop_time: Option<f64>,
        tolerance: Option<f64>,
    ) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle
            .expect(&[State::Instantiated], "setup_experiment")?;
        let f = self.api().setup_experiment;
        let status = unsafe {
            f(
                self.component,
                tolerance.is_some() as fmi2Boolean,
                tolerance.unwrap_or(0.0),
                start_time,
                stop_time.is_some() as fmi2Boolean,
                stop_time.unwrap_or(0.0),
            )
        };
        self.consume(status)?;
        self.lifecycle.mark_experiment_configured();
        self.time = start_time;
        Ok(())
    }

    fn enter_initialization_mode(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle.check_enter_initialization()?;
        let f = self.api().enter_initialization_mode;
        let status = unsafe { f(self.component) };
        self.consume(status)?;
        self.lifecycle.transition(State::InitializationMode);
        Ok(())
    }

    fn exit_initialization_mode(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle
            .expect(&[State::InitializationMode], "exit_initialization_mode")?;
        let f = self.api().exit_initialization_mode;
        let status = unsafe { f(self.component) };
        self.consume(status)?;
        self.lifecycle.transition(L::AFTER_INITIALIZATION);
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        self.lifecycle.expect_live("terminate")?;
        let f = self.api().terminate;
        let status = unsafe { f(self.component) };
        self.lifecycle.transition(State::Terminated);
        self.consume(status)
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.lifecycle.guard()?;
        let f = self.api().reset;
        let status = unsafe { f(self.component) };
        self.consume(status)?;
        self.lifecycle.reset();
        self.time = 0.0;
        self.event_info = EventInfo::default();
        Ok(())
    }

    fn read_real(&mut self, vr: u32) -> Result<f64, Error> {
        let mut value = [0.0];
        self.read_reals(&[vr], &mut value)?;
        Ok(value[0])
    }

    fn read_integer(&mut self, vr: u32) -> Result<i32, Error> {
        let mut value = [0];
        self.read_integers(&[vr], &mut value)?;
        Ok(value[0])
    }

    fn read_boolean(&mut self, vr: u32) -> Result<bool, Error> {
        let mut value = [false];
        self.read_booleans(&[vr], &mut value)?;
        Ok(value[0])
    }

    fn read_string(&mut self, vr: u32) -> Result<String, Error> {
        let mut value = [String::new()];
        self.read_strings(&[vr], &mut value)?;
        Ok(std::mem::take(&mut value[0]))
    }

    fn read_reals(&mut self, vrs: &[u32], values: &mut [f64]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("read_reals")?;
        let f = self.api().get_real;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), values.as_mut_ptr()) };
        self.consume(status)
    }

    fn read_integers(&mut self, vrs: &[u32], values: &mut [i32]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("read_integers")?;
        let f = self.api().get_integer;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), values.as_mut_ptr()) };
        self.consume(status)
    }

    fn read_booleans(&mut self, vrs: &[u32], values: &mut [bool]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("read_booleans")?;
        let mut raw = vec![fmi2False; vrs.len()];
        let f = self.api().get_boolean;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), raw.as_mut_ptr()) };
        self.consume(status)?;
        for (value, raw) in values.iter_mut().zip(&raw) {
            *value = *raw != fmi2False;
        }
        Ok(())
    }

    fn read_strings(&mut self, vrs: &[u32], values: &mut [String]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("read_strings")?;
        let mut raw: Vec<fmi2String> = vec![std::ptr::null(); vrs.len()];
        let f = self.api().get_string;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), raw.as_mut_ptr()) };
        self.consume(status)?;
        // The returned pointers are only valid until the next ABI call, so
        // the contents are copied out immediately.
        for (value, ptr) in values.iter_mut().zip(&raw) {
            *value = if ptr.is_null() {
                String::new()
            } else {
                unsafe { CStr::from_ptr(*ptr) }.to_string_lossy().into_owned()
            };
        }
        Ok(())
    }

    fn write_real(&mut self, vr: u32, value: f64) -> Result<(), Error> {
        self.write_reals(&[vr], &[value])
    }

    fn write_integer(&mut self, vr: u32, value: i32) -> Result<(), Error> {
        self.write_integers(&[vr], &[value])
    }

    fn write_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error> {
        self.write_booleans(&[vr], &[value])
    }

    fn write_string(&mut self, vr: u32, value: &str) -> Result<(), Error> {
        self.write_strings(&[vr], &[value])
    }

    fn write_reals(&mut self, vrs: &[u32], values: &[f64]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("write_reals")?;
        let f = self.api().set_real;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), values.as_ptr()) };
        self.consume(status)
    }

    fn write_integers(&mut self, vrs: &[u32], values: &[i32]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("write_integers")?;
        let f = self.api().set_integer;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), values.as_ptr()) };
        self.consume(status)
    }

    fn write_booleans(&mut self, vrs: &[u32], values: &[bool]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("write_booleans")?;
        let raw: Vec<fmi2Boolean> = values.iter().map(|v| *v as fmi2Boolean).collect();
        let f = self.api().set_boolean;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), raw.as_ptr()) };
        self.consume(status)
    }

    fn write_strings(&mut self, vrs: &[u32], values: &[&str]) -> Result<(), Error> {
        check_lengths(vrs.len(), values.len())?;
        self.guarded_read("write_strings")?;
        let cstrings = values
            .iter()
            .map(|s| CString::new(*s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidString)?;
        let raw: Vec<fmi2String> = cstrings.iter().map(|s| s.as_ptr()).collect();
        let f = self.api().set_string;
        let status = unsafe { f(self.component, vrs.as_ptr(), vrs.len(), raw.as_ptr()) };
        self.consume(status)
    }

    fn get_fmu_state(&mut self) -> Result<FmuState, Error> {
        self.require_capability(
            self.lib.attributes().can_get_and_set_fmu_state,
            "canGetAndSetFMUstate",
        )?;
        self.guarded_read("get_fmu_state")?;
        let mut state: sys::fmi2FMUstate = std::ptr::null_mut();
        let f = self.api().get_fmu_state;
        let status = unsafe { f(self.component, &mut state) };
        self.consume(status)?;
        Ok(FmuState(state))
    }

    fn set_fmu_state(&mut self, state: &FmuState) -> Result<(), Error> {
        self.require_capability(
            self.lib.attributes().can_get_and_set_fmu_state,
            "canGetAndSetFMUstate",
        )?;
        self.guarded_read("set_fmu_state")?;
        let f = self.api().set_fmu_state;
        let status = unsafe { f(self.component, state.0) };
        self.consume(status)
    }

    fn free_fmu_state(&mut self, state: FmuState) -> Result<(), Error> {
        self.require_capability(
            self.lib.attributes().can_get_and_set_fmu_state,
            "canGetAndSetFMUstate",
        )?;
        self.lifecycle.guard()?;
        let mut ptr = state.0;
        let f = self.api().free_fmu_state;
        let status = unsafe { f(self.component, &mut ptr) };
        self.consume(status)
    }

    fn serialize_fmu_state(&mut self, state: &FmuState) -> Result<Vec<u8>, Error> {
        self.require_capability(
            self.lib.attributes().can_serialize_fmu_state,
            "canSerializeFMUstate",
        )?;
        self.guarded_read("serialize_fmu_state")?;
        let mut size = 0usize;
        let f = self.api().serialized_fmu_state_size;
        let status = unsafe { f(self.component, state.0, &mut size) };
        self.consume(status)?;

        let mut bytes = vec![0u8; size];
        let f = self.api().serialize_fmu_state;
        let status =
            unsafe { f(self.component, state.0, bytes.as_mut_ptr() as *mut sys::fmi2Byte, size) };
        self.consume(status)?;
        Ok(bytes)
    }

    fn deserialize_fmu_state(&mut self, bytes: &[u8]) -> Result<FmuState, Error> {
        self.require_capability(
            self.lib.attributes().can_serialize_fmu_state,
            "canSerializeFMUstate",
        )?;
        self.guarded_read("deserialize_fmu_state")?;
        let mut state: sys::fmi2FMUstate = std::ptr::null_mut();
        let f = self.api().deserialize_fmu_state;
        let status = unsafe {
            f(
                self.component,
                bytes.as_ptr() as *const sys::fmi2Byte,
                bytes.len(),
                &mut state,
            )
        };
        self.consume(status)?;
        Ok(FmuState(state))
    }

    fn get_directional_derivative(
        &mut self,
        unknown_vrs: &[u32],
        known_vrs: &[u32],
        dv_known: &[f64],
        dv_unknown: &mut [f64],
    ) -> Result<(), Error> {
        self.require_capability(
            self.lib.attributes().provides_directional_derivative,
            "providesDirectionalDerivative",
        )?;
        check_lengths(known_vrs.len(), dv_known.len())?;
        check_lengths(unknown_vrs.len(), dv_unknown.len())?;
        self.guarded_read("get_directional_derivative")?;
        let f = self.api().get_directional_derivative;
        let status = unsafe {
            f(
                self.component,
                unknown_vrs.as_ptr(),
                unknown_vrs.len(),
                known_vrs.as_ptr(),
                known_vrs.len(),
                dv_known.as_ptr(),
                dv_unknown.as_mut_ptr(),
            )
        };
        self.consume(status)
    }
}

impl<L: FmuLibrary> std::fmt::Debug for Instance<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("component", &self.component)
            .field("state", &self.lifecycle.state())
            .field("last_status", &self.last_status)
            .field("time", &self.time)
            .finish()
    }
}

impl<L: FmuLibrary> Drop for Instance<L> {
    fn drop(&mut self) {
        // Terminate precedes free, but only from states where the standard
        // allows it and never on a poisoned instance.
        if !self.lifecycle.is_poisoned()
            && matches!(
                self.lifecycle.state(),
                State::StepComplete | State::ContinuousTimeMode | State::EventMode
            )
        {
            let f = self.api().terminate;
            let _ = unsafe { f(self.component) };
        }
        log::trace!("Freeing component {:?}", self.component);
        let f = self.api().free_instance;
        unsafe { f(self.component) };
    }
}
