//! Loaded FMU shared libraries.
//!
//! A library owns the resolved function tables, a strong reference to the
//! unpacked [`FmuResource`] and the typed model description of its interface
//! kind. Instances hold an `Arc` to their library, so the shared object is
//! only unloaded after every instance born from it has been freed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fmi2_sys as sys;

use crate::instance::lifecycle::State;
use crate::model_description::{
    CoSimulationModelDescription, FmuAttributes, ModelDescription, ModelExchangeModelDescription,
};
use crate::resource::FmuResource;
use crate::PackageError;

/// Platform tag of the `binaries/` subdirectory for the compile-time target.
pub(crate) fn platform_folder() -> Result<&'static str, PackageError> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("windows", "x86_64") => Ok("win64"),
        ("windows", "x86") => Ok("win32"),
        ("linux", "x86_64") => Ok("linux64"),
        ("linux", "x86") => Ok("linux32"),
        ("macos", _) => Ok("darwin64"),
        (os, arch) => Err(PackageError::UnsupportedPlatform { os, arch }),
    }
}

fn shared_lib_path(
    resource: &FmuResource,
    model_identifier: &str,
) -> Result<PathBuf, PackageError> {
    let file = format!("{model_identifier}{}", std::env::consts::DLL_SUFFIX);
    let path = resource
        .path()
        .join("binaries")
        .join(platform_folder()?)
        .join(file);
    if !path.is_file() {
        return Err(PackageError::MissingBinary { path });
    }
    Ok(path)
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::CoSimulationLibrary {}
    impl Sealed for super::ModelExchangeLibrary {}
}

/// Interface-kind plumbing shared by [`CoSimulationLibrary`] and
/// [`ModelExchangeLibrary`], used by the generic instance implementation.
pub trait FmuLibrary: private::Sealed {
    /// Interface kind passed to `fmi2Instantiate`.
    const KIND: sys::fmi2Type;

    /// Lifecycle state an instance lands in after `exit_initialization_mode`.
    const AFTER_INITIALIZATION: State;

    fn common(&self) -> &sys::Fmi2CommonApi;

    fn core_description(&self) -> &Arc<ModelDescription>;

    fn attributes(&self) -> &FmuAttributes;

    fn resource(&self) -> &Arc<FmuResource>;

    /// A process-unique instance name, `<modelIdentifier>_<n>`.
    fn next_instance_name(&self) -> String;
}

/// A loaded Co-Simulation shared library.
#[derive(Debug)]
pub struct CoSimulationLibrary {
    pub(crate) binding: sys::Fmi2CsBinding,
    resource: Arc<FmuResource>,
    descr: Arc<CoSimulationModelDescription>,
    instance_counter: AtomicUsize,
}

impl CoSimulationLibrary {
    pub(crate) fn load(
        resource: Arc<FmuResource>,
        descr: Arc<CoSimulationModelDescription>,
    ) -> Result<Self, PackageError> {
        let path = shared_lib_path(&resource, &descr.attributes.common.model_identifier)?;
        log::trace!("Loading Co-Simulation library {}", path.display());
        let binding = unsafe { sys::Fmi2CsBinding::load(&path) }?;
        Ok(Self {
            binding,
            resource,
            descr,
            instance_counter: AtomicUsize::new(0),
        })
    }

    pub fn model_description(&self) -> &Arc<CoSimulationModelDescription> {
        &self.descr
    }
}

impl FmuLibrary for CoSimulationLibrary {
    const KIND: sys::fmi2Type = sys::fmi2Type::CoSimulation;
    const AFTER_INITIALIZATION: State = State::StepComplete;

    fn common(&self) -> &sys::Fmi2CommonApi {
        &self.binding.common
    }

    fn core_description(&self) -> &Arc<ModelDescription> {
        &self.descr.core
    }

    fn attributes(&self) -> &FmuAttributes {
        &self.descr.attributes.common
    }

    fn resource(&self) -> &Arc<FmuResource> {
        &self.resource
    }

    fn next_instance_name(&self) -> String {
        let n = self.instance_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", self.descr.attributes.common.model_identifier, n)
    }
}

/// A loaded Model-Exchange shared library.
#[derive(Debug)]
pub struct ModelExchangeLibrary {
    pub(crate) binding: sys::Fmi2MeBinding,
    resource: Arc<FmuResource>,
    descr: Arc<ModelExchangeModelDescription>,
    instance_counter: AtomicUsize,
}

impl ModelExchangeLibrary {
    pub(crate) fn load(
        resource: Arc<FmuResource>,
        descr: Arc<ModelExchangeModelDescription>,
    ) -> Result<Self, PackageError> {
        let path = shared_lib_path(&resource, &descr.attributes.common.model_identifier)?;
        log::trace!("Loading Model-Exchange library {}", path.display());
        let binding = unsafe { sys::Fmi2MeBinding::load(&path) }?;
        Ok(Self {
            binding,
            resource,
            descr,
            instance_counter: AtomicUsize::new(0),
        })
    }

    pub fn model_description(&self) -> &Arc<ModelExchangeModelDescription> {
        &self.descr
    }
}

impl FmuLibrary for ModelExchangeLibrary {
    const KIND: sys::fmi2Type = sys::fmi2Type::ModelExchange;
    // Under Model Exchange the FMU implicitly enters Event Mode; the caller
    // runs the discrete-event iteration before continuous time starts.
    const AFTER_INITIALIZATION: State = State::EventMode;

    fn common(&self) -> &sys::Fmi2CommonApi {
        &self.binding.common
    }

    fn core_description(&self) -> &Arc<ModelDescription> {
        &self.descr.core
    }

    fn attributes(&self) -> &FmuAttributes {
        &self.descr.attributes.common
    }

    fn resource(&self) -> &Arc<FmuResource> {
        &self.resource
    }

    fn next_instance_name(&self) -> String {
        let n = self.instance_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", self.descr.attributes.common.model_identifier, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    fn test_platform_folder() {
        assert_eq!(platform_folder().unwrap(), "linux64");
        assert_eq!(std::env::consts::DLL_SUFFIX, ".so");
    }
}
