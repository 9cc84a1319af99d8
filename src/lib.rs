//! The `fmi2` crate imports FMUs (Functional Mock-up Units) that follow the
//! FMI 2.0 standard and drives them through their lifecycle. See
//! <http://www.fmi-standard.org/>.
//!
//! Opening an archive with [`Fmu::open`] unpacks it and parses the model
//! description. From there, [`Fmu::as_co_simulation`] or
//! [`Fmu::as_model_exchange`] load the matching shared library and act as
//! instance factories. A Model-Exchange FMU can additionally be wrapped
//! behind the Co-Simulation contract with [`ModelExchangeFmu::new_slave`],
//! which drives the model with an ODE solver and the FMI event loop.
//!
//! # Example
//!
//! ```no_run
//! use fmi2::instance::traits::{Common, Slave};
//! use fmi2::{Euler, Fmu};
//!
//! # fn main() -> Result<(), fmi2::Error> {
//! let fmu = Fmu::open("model.fmu")?;
//! let mut slave: Box<dyn Slave> = if fmu.supports_co_simulation() {
//!     Box::new(fmu.as_co_simulation()?.new_instance(false, true)?)
//! } else {
//!     let solver = Box::new(Euler::new(1e-3));
//!     Box::new(fmu.as_model_exchange()?.new_slave(solver, false, true)?)
//! };
//!
//! slave.setup_experiment(0.0, Some(1.0), None)?;
//! slave.enter_initialization_mode()?;
//! slave.exit_initialization_mode()?;
//! while slave.simulation_time() < 1.0 {
//!     slave.do_step(1e-2)?;
//! }
//! slave.terminate()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]

pub mod fmu;
pub mod instance;
pub mod library;
pub mod me_slave;
pub mod model_description;
pub mod resource;
pub mod solver;

use std::path::PathBuf;

// Re-exports
pub use fmi2_schema as schema;
pub use fmi2_sys as sys;
pub use fmu::{CoSimulationFmu, Fmu, ModelExchangeFmu};
pub use instance::{InstanceCS, InstanceME};
pub use me_slave::MeSlave;
pub use solver::{Euler, OdeSolver, OdeSystem};

/// Out-parameter state of the Model-Exchange discrete-event iteration.
pub type EventInfo = sys::fmi2EventInfo;
/// Selector for the Co-Simulation async status queries.
pub type StatusKind = sys::fmi2StatusKind;

/// Status of the most recent FMI call, translated from the C enum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,
    /// Something is not quite right, but the computation can continue; the
    /// logger callback carries the details.
    Warning,
    Discard,
    Error,
    Fatal,
    /// An asynchronous Co-Simulation step is still running.
    Pending,
}

impl From<sys::fmi2Status> for Status {
    fn from(status: sys::fmi2Status) -> Self {
        match status {
            sys::fmi2Status::OK => Status::Ok,
            sys::fmi2Status::Warning => Status::Warning,
            sys::fmi2Status::Discard => Status::Discard,
            sys::fmi2Status::Error => Status::Error,
            sys::fmi2Status::Fatal => Status::Fatal,
            sys::fmi2Status::Pending => Status::Pending,
        }
    }
}

/// Package-level failures: everything that can go wrong between an `.fmu`
/// file on disk and a bound function table.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("failed to read FMU archive")]
    Io(#[from] std::io::Error),

    #[error("invalid FMU archive")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid model description")]
    Schema(#[source] fmi2_schema::Error),

    #[error("unsupported FMI version `{0}`, expected 2.x")]
    UnsupportedFmiVersion(String),

    #[error("FMU does not bundle a binary for this platform: {}", path.display())]
    MissingBinary { path: PathBuf },

    #[error(transparent)]
    Binding(#[from] sys::BindingError),

    #[error("unsupported host platform {os}/{arch}")]
    UnsupportedPlatform {
        os: &'static str,
        arch: &'static str,
    },
}

/// An operation was invoked in a lifecycle state where the FMI standard
/// forbids it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("`{operation}` is not allowed in the {state:?} state")]
    InvalidTransition {
        operation: &'static str,
        state: instance::lifecycle::State,
    },

    #[error("`enter_initialization_mode` requires a prior `setup_experiment`")]
    SetupExperimentRequired,
}

/// The wrapped FMI call reported a non-success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("the FMU discarded the operation")]
    Discard,

    #[error("the FMU reported an error; reset or free the instance")]
    Error,

    /// Sticky: once seen, every further call on the instance is rejected
    /// without reaching the FMU.
    #[error("the FMU reported a fatal error; the instance is unusable")]
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error("the FMU does not declare the `{0}` capability")]
    UnsupportedOperation(&'static str),

    #[error("FMU does not provide a {0} implementation")]
    UnsupportedFmuType(&'static str),

    #[error("`fmi2Instantiate` returned NULL")]
    Instantiation,

    #[error("variable `{0}` not found")]
    VariableNotFound(String),

    #[error("step size must be positive, got {0}")]
    InvalidStepSize(f64),

    #[error("value-reference and value buffers differ in length ({vrs} vs {values})")]
    LengthMismatch { vrs: usize, values: usize },

    #[error("string value contains an interior NUL byte")]
    InvalidString,

    #[error("the FMU requested termination of the simulation")]
    Terminated,
}

impl From<fmi2_schema::Error> for Error {
    fn from(e: fmi2_schema::Error) -> Self {
        match e {
            fmi2_schema::Error::VariableNotFound(name) => Error::VariableNotFound(name),
            e => Error::Package(PackageError::Schema(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_translation() {
        assert_eq!(Status::from(sys::fmi2Status::OK), Status::Ok);
        assert_eq!(Status::from(sys::fmi2Status::Warning), Status::Warning);
        assert_eq!(Status::from(sys::fmi2Status::Fatal), Status::Fatal);
    }
}
