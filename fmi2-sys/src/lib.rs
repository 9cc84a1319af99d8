//! Dynamically-loaded bindings to the FMI 2.0 C API.
//!
//! An FMU ships its model as a platform shared object exporting the functions
//! of the FMI 2.0 standard under their canonical names (`fmi2Instantiate`,
//! `fmi2DoStep`, ...). This crate declares the C types of that API and
//! resolves the full function tables from a loaded library, failing early
//! with the name of the first missing entry point.
//!
//! The split into [`Fmi2CommonApi`], [`Fmi2CsApi`] and [`Fmi2MeApi`] follows
//! the standard: the common functions are mandatory for every FMU, the
//! Co-Simulation and Model-Exchange groups only for libraries of that kind.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int, c_uint, c_void};

pub mod logger;

pub type fmi2Component = *mut c_void;
pub type fmi2ComponentEnvironment = *mut c_void;
pub type fmi2FMUstate = *mut c_void;
pub type fmi2ValueReference = c_uint;
pub type fmi2Real = c_double;
pub type fmi2Integer = c_int;
pub type fmi2Boolean = c_int;
pub type fmi2Char = c_char;
pub type fmi2String = *const fmi2Char;
pub type fmi2Byte = c_char;

pub const fmi2True: fmi2Boolean = 1;
pub const fmi2False: fmi2Boolean = 0;

/// Status returned by every FMI 2.0 function.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum fmi2Status {
    OK = 0,
    Warning = 1,
    /// The call was discarded; a previously computed solution is still valid.
    Discard = 2,
    Error = 3,
    /// The computation is irreparable for all instances of the model.
    Fatal = 4,
    /// Only returned by the Co-Simulation interface when a slave executes
    /// `fmi2DoStep` asynchronously.
    Pending = 5,
}

/// Argument of `fmi2Instantiate` selecting the interface kind.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum fmi2Type {
    ModelExchange = 0,
    CoSimulation = 1,
}

/// Selector for the `fmi2Get*Status` queries of an asynchronous slave.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum fmi2StatusKind {
    /// Result of an asynchronously executed `fmi2DoStep`, once finished.
    DoStepStatus = 0,
    /// Textual progress information about the running `fmi2DoStep`.
    PendingStatus = 1,
    /// End time of the last successfully completed communication step.
    LastSuccessfulTime = 2,
    /// Whether the slave wants to terminate the simulation.
    Terminated = 3,
}

pub type fmi2CallbackLogger = Option<
    unsafe extern "C" fn(
        component_environment: fmi2ComponentEnvironment,
        instance_name: fmi2String,
        status: fmi2Status,
        category: fmi2String,
        message: fmi2String,
        ...
    ),
>;

pub type fmi2CallbackAllocateMemory =
    Option<unsafe extern "C" fn(nobj: usize, size: usize) -> *mut c_void>;

pub type fmi2CallbackFreeMemory = Option<unsafe extern "C" fn(obj: *mut c_void)>;

pub type fmi2StepFinished =
    Option<unsafe extern "C" fn(component_environment: fmi2ComponentEnvironment, status: fmi2Status)>;

/// Callbacks handed to the FMU at instantiation. The FMU may invoke the
/// logger from any thread it creates, so the installed handler must be
/// thread-safe.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct fmi2CallbackFunctions {
    pub logger: fmi2CallbackLogger,
    pub allocate_memory: fmi2CallbackAllocateMemory,
    pub free_memory: fmi2CallbackFreeMemory,
    pub step_finished: fmi2StepFinished,
    pub component_environment: fmi2ComponentEnvironment,
}

/// Out-parameter of `fmi2NewDiscreteStates`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct fmi2EventInfo {
    pub new_discrete_states_needed: fmi2Boolean,
    pub terminate_simulation: fmi2Boolean,
    pub nominals_of_continuous_states_changed: fmi2Boolean,
    pub values_of_continuous_states_changed: fmi2Boolean,
    pub next_event_time_defined: fmi2Boolean,
    pub next_event_time: fmi2Real,
}

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("failed to load FMU shared library")]
    Load(#[source] libloading::Error),

    #[error("FMU shared library is missing the `{name}` entry point")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// Declares a function table struct plus a loader resolving every field from
/// a [`libloading::Library`] by its canonical FMI symbol name.
macro_rules! fmi2_api {
    (
        $(#[$struct_meta:meta])*
        pub struct $api:ident {
            $(
                $(#[$fn_meta:meta])*
                $sym:literal =>
                $field:ident: unsafe extern "C" fn($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?,
            )*
        }
    ) => {
        $(#[$struct_meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $api {
            $(
                $(#[$fn_meta])*
                pub $field: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?,
            )*
        }

        impl $api {
            /// Resolve every entry point of this table from `lib`.
            ///
            /// # Safety
            /// The library must export the named symbols with the FMI 2.0
            /// signatures declared here.
            pub unsafe fn load(lib: &libloading::Library) -> Result<Self, BindingError> {
                Ok(Self {
                    $(
                        $field: *lib
                            .get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>($sym.as_bytes())
                            .map_err(|source| BindingError::MissingSymbol { name: $sym, source })?,
                    )*
                })
            }
        }
    };
}

fmi2_api! {
    /// Functions common to the Model-Exchange and Co-Simulation interfaces.
    pub struct Fmi2CommonApi {
        "fmi2GetVersion" =>
        get_version: unsafe extern "C" fn() -> fmi2String,

        "fmi2GetTypesPlatform" =>
        get_types_platform: unsafe extern "C" fn() -> fmi2String,

        "fmi2SetDebugLogging" =>
        set_debug_logging: unsafe extern "C" fn(
            c: fmi2Component,
            logging_on: fmi2Boolean,
            n_categories: usize,
            categories: *const fmi2String,
        ) -> fmi2Status,

        /// Returns a new instance of the FMU, or NULL on failure.
        "fmi2Instantiate" =>
        instantiate: unsafe extern "C" fn(
            instance_name: fmi2String,
            fmu_type: fmi2Type,
            fmu_guid: fmi2String,
            fmu_resource_location: fmi2String,
            functions: *const fmi2CallbackFunctions,
            visible: fmi2Boolean,
            logging_on: fmi2Boolean,
        ) -> fmi2Component,

        "fmi2FreeInstance" =>
        free_instance: unsafe extern "C" fn(c: fmi2Component),

        "fmi2SetupExperiment" =>
        setup_experiment: unsafe extern "C" fn(
            c: fmi2Component,
            tolerance_defined: fmi2Boolean,
            tolerance: fmi2Real,
            start_time: fmi2Real,
            stop_time_defined: fmi2Boolean,
            stop_time: fmi2Real,
        ) -> fmi2Status,

        "fmi2EnterInitializationMode" =>
        enter_initialization_mode: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2ExitInitializationMode" =>
        exit_initialization_mode: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2Terminate" =>
        terminate: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2Reset" =>
        reset: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2GetReal" =>
        get_real: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *mut fmi2Real,
        ) -> fmi2Status,

        "fmi2GetInteger" =>
        get_integer: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *mut fmi2Integer,
        ) -> fmi2Status,

        "fmi2GetBoolean" =>
        get_boolean: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *mut fmi2Boolean,
        ) -> fmi2Status,

        "fmi2GetString" =>
        get_string: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *mut fmi2String,
        ) -> fmi2Status,

        "fmi2SetReal" =>
        set_real: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *const fmi2Real,
        ) -> fmi2Status,

        "fmi2SetInteger" =>
        set_integer: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *const fmi2Integer,
        ) -> fmi2Status,

        "fmi2SetBoolean" =>
        set_boolean: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *const fmi2Boolean,
        ) -> fmi2Status,

        "fmi2SetString" =>
        set_string: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            value: *const fmi2String,
        ) -> fmi2Status,

        "fmi2GetFMUstate" =>
        get_fmu_state: unsafe extern "C" fn(c: fmi2Component, state: *mut fmi2FMUstate) -> fmi2Status,

        "fmi2SetFMUstate" =>
        set_fmu_state: unsafe extern "C" fn(c: fmi2Component, state: fmi2FMUstate) -> fmi2Status,

        "fmi2FreeFMUstate" =>
        free_fmu_state: unsafe extern "C" fn(c: fmi2Component, state: *mut fmi2FMUstate) -> fmi2Status,

        "fmi2SerializedFMUstateSize" =>
        serialized_fmu_state_size: unsafe extern "C" fn(
            c: fmi2Component,
            state: fmi2FMUstate,
            size: *mut usize,
        ) -> fmi2Status,

        "fmi2SerializeFMUstate" =>
        serialize_fmu_state: unsafe extern "C" fn(
            c: fmi2Component,
            state: fmi2FMUstate,
            bytes: *mut fmi2Byte,
            size: usize,
        ) -> fmi2Status,

        "fmi2DeSerializeFMUstate" =>
        deserialize_fmu_state: unsafe extern "C" fn(
            c: fmi2Component,
            bytes: *const fmi2Byte,
            size: usize,
            state: *mut fmi2FMUstate,
        ) -> fmi2Status,

        "fmi2GetDirectionalDerivative" =>
        get_directional_derivative: unsafe extern "C" fn(
            c: fmi2Component,
            unknown_vrs: *const fmi2ValueReference,
            n_unknown: usize,
            known_vrs: *const fmi2ValueReference,
            n_known: usize,
            dv_known: *const fmi2Real,
            dv_unknown: *mut fmi2Real,
        ) -> fmi2Status,
    }
}

fmi2_api! {
    /// Functions specific to the Co-Simulation interface.
    pub struct Fmi2CsApi {
        "fmi2SetRealInputDerivatives" =>
        set_real_input_derivatives: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            order: *const fmi2Integer,
            value: *const fmi2Real,
        ) -> fmi2Status,

        "fmi2GetRealOutputDerivatives" =>
        get_real_output_derivatives: unsafe extern "C" fn(
            c: fmi2Component,
            vr: *const fmi2ValueReference,
            nvr: usize,
            order: *const fmi2Integer,
            value: *mut fmi2Real,
        ) -> fmi2Status,

        /// Starts the computation of a communication step.
        "fmi2DoStep" =>
        do_step: unsafe extern "C" fn(
            c: fmi2Component,
            current_communication_point: fmi2Real,
            communication_step_size: fmi2Real,
            no_set_fmu_state_prior_to_current_point: fmi2Boolean,
        ) -> fmi2Status,

        /// Stops an asynchronous `fmi2DoStep` that returned `Pending`.
        "fmi2CancelStep" =>
        cancel_step: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2GetStatus" =>
        get_status: unsafe extern "C" fn(
            c: fmi2Component,
            kind: fmi2StatusKind,
            value: *mut fmi2Status,
        ) -> fmi2Status,

        "fmi2GetRealStatus" =>
        get_real_status: unsafe extern "C" fn(
            c: fmi2Component,
            kind: fmi2StatusKind,
            value: *mut fmi2Real,
        ) -> fmi2Status,

        "fmi2GetIntegerStatus" =>
        get_integer_status: unsafe extern "C" fn(
            c: fmi2Component,
            kind: fmi2StatusKind,
            value: *mut fmi2Integer,
        ) -> fmi2Status,

        "fmi2GetBooleanStatus" =>
        get_boolean_status: unsafe extern "C" fn(
            c: fmi2Component,
            kind: fmi2StatusKind,
            value: *mut fmi2Boolean,
        ) -> fmi2Status,

        "fmi2GetStringStatus" =>
        get_string_status: unsafe extern "C" fn(
            c: fmi2Component,
            kind: fmi2StatusKind,
            value: *mut fmi2String,
        ) -> fmi2Status,
    }
}

fmi2_api! {
    /// Functions specific to the Model-Exchange interface.
    pub struct Fmi2MeApi {
        "fmi2EnterEventMode" =>
        enter_event_mode: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        "fmi2NewDiscreteStates" =>
        new_discrete_states: unsafe extern "C" fn(
            c: fmi2Component,
            event_info: *mut fmi2EventInfo,
        ) -> fmi2Status,

        "fmi2EnterContinuousTimeMode" =>
        enter_continuous_time_mode: unsafe extern "C" fn(c: fmi2Component) -> fmi2Status,

        /// Must be called after every completed integrator step unless the
        /// model description sets `completedIntegratorStepNotNeeded`.
        "fmi2CompletedIntegratorStep" =>
        completed_integrator_step: unsafe extern "C" fn(
            c: fmi2Component,
            no_set_fmu_state_prior_to_current_point: fmi2Boolean,
            enter_event_mode: *mut fmi2Boolean,
            terminate_simulation: *mut fmi2Boolean,
        ) -> fmi2Status,

        "fmi2SetTime" =>
        set_time: unsafe extern "C" fn(c: fmi2Component, time: fmi2Real) -> fmi2Status,

        "fmi2SetContinuousStates" =>
        set_continuous_states: unsafe extern "C" fn(
            c: fmi2Component,
            x: *const fmi2Real,
            nx: usize,
        ) -> fmi2Status,

        "fmi2GetDerivatives" =>
        get_derivatives: unsafe extern "C" fn(
            c: fmi2Component,
            dx: *mut fmi2Real,
            nx: usize,
        ) -> fmi2Status,

        "fmi2GetEventIndicators" =>
        get_event_indicators: unsafe extern "C" fn(
            c: fmi2Component,
            event_indicators: *mut fmi2Real,
            ni: usize,
        ) -> fmi2Status,

        "fmi2GetContinuousStates" =>
        get_continuous_states: unsafe extern "C" fn(
            c: fmi2Component,
            x: *mut fmi2Real,
            nx: usize,
        ) -> fmi2Status,

        "fmi2GetNominalsOfContinuousStates" =>
        get_nominals_of_continuous_states: unsafe extern "C" fn(
            c: fmi2Component,
            x_nominal: *mut fmi2Real,
            nx: usize,
        ) -> fmi2Status,
    }
}

/// A loaded Co-Simulation library: the common and CS function tables plus the
/// library handle keeping the symbols alive.
#[derive(Debug)]
pub struct Fmi2CsBinding {
    pub common: Fmi2CommonApi,
    pub cs: Fmi2CsApi,
    _lib: libloading::Library,
}

impl Fmi2CsBinding {
    /// Load the shared object at `path` and resolve the Co-Simulation API.
    ///
    /// # Safety
    /// The file must be an FMI 2.0 Co-Simulation library; resolved functions
    /// are called through raw pointers for the lifetime of this binding.
    pub unsafe fn load(path: &std::path::Path) -> Result<Self, BindingError> {
        let lib = libloading::Library::new(path).map_err(BindingError::Load)?;
        let common = Fmi2CommonApi::load(&lib)?;
        let cs = Fmi2CsApi::load(&lib)?;
        Ok(Self { common, cs, _lib: lib })
    }
}

/// A loaded Model-Exchange library.
#[derive(Debug)]
pub struct Fmi2MeBinding {
    pub common: Fmi2CommonApi,
    pub me: Fmi2MeApi,
    _lib: libloading::Library,
}

impl Fmi2MeBinding {
    /// Load the shared object at `path` and resolve the Model-Exchange API.
    ///
    /// # Safety
    /// The file must be an FMI 2.0 Model-Exchange library; resolved functions
    /// are called through raw pointers for the lifetime of this binding.
    pub unsafe fn load(path: &std::path::Path) -> Result<Self, BindingError> {
        let lib = libloading::Library::new(path).map_err(BindingError::Load)?;
        let common = Fmi2CommonApi::load(&lib)?;
        let me = Fmi2MeApi::load(&lib)?;
        Ok(Self { common, me, _lib: lib })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_library() {
        let res = unsafe { Fmi2CsBinding::load(std::path::Path::new("/nonexistent/model.so")) };
        assert!(matches!(res, Err(BindingError::Load(_))));
    }

    #[test]
    fn test_event_info_default() {
        let info = fmi2EventInfo::default();
        assert_eq!(info.new_discrete_states_needed, fmi2False);
        assert_eq!(info.next_event_time, 0.0);
    }
}
