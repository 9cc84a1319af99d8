//! The package facade: opens an archive, parses its description and acts as
//! a factory for interface-specific FMUs and their instances.

use std::path::Path;
use std::sync::Arc;

use fmi2_schema::Fmi2ModelDescription;

use crate::instance::{InstanceCS, InstanceME};
use crate::library::{CoSimulationLibrary, ModelExchangeLibrary};
use crate::me_slave::MeSlave;
use crate::model_description::{
    self, CoSimulationAttributes, CoSimulationModelDescription, ModelDescription,
    ModelExchangeAttributes, ModelExchangeModelDescription,
};
use crate::resource::FmuResource;
use crate::solver::OdeSolver;
use crate::{Error, PackageError};

/// An opened FMU package: unpacked archive plus parsed model description.
///
/// The facade itself does not load any shared library; that happens when one
/// of the interface accessors is used. A single facade can produce both
/// variants when the description declares both, sharing one unpacked
/// resource directory.
#[derive(Debug)]
pub struct Fmu {
    resource: Arc<FmuResource>,
    descr: Arc<ModelDescription>,
    cs_attributes: Option<CoSimulationAttributes>,
    me_attributes: Option<ModelExchangeAttributes>,
}

impl Fmu {
    /// Unpack the archive at `path` and parse its `modelDescription.xml`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let resource = Arc::new(FmuResource::unpack(path.as_ref())?);
        let xml = resource.model_description_xml()?;
        let schema = Fmi2ModelDescription::from_xml(&xml)
            .map_err(PackageError::Schema)?;

        let major = schema.fmi_version.split('.').next().unwrap_or("");
        if major != "2" {
            return Err(PackageError::UnsupportedFmiVersion(schema.fmi_version).into());
        }
        log::debug!(
            "Opened FMI {} FMU `{}`",
            schema.fmi_version,
            schema.model_name
        );

        let (descr, cs_attributes, me_attributes) = model_description::from_schema(schema);
        Ok(Self {
            resource,
            descr,
            cs_attributes,
            me_attributes,
        })
    }

    /// The interface-independent part of the model description.
    pub fn model_description(&self) -> &Arc<ModelDescription> {
        &self.descr
    }

    /// The raw `modelDescription.xml` document.
    pub fn model_description_xml(&self) -> Result<String, Error> {
        Ok(self.resource.model_description_xml()?)
    }

    pub fn supports_co_simulation(&self) -> bool {
        self.cs_attributes.is_some()
    }

    pub fn supports_model_exchange(&self) -> bool {
        self.me_attributes.is_some()
    }

    /// Load the Co-Simulation shared library and return the instance
    /// factory. Fails when the description does not declare the interface or
    /// the platform binary is missing.
    pub fn as_co_simulation(&self) -> Result<CoSimulationFmu, Error> {
        let attributes = self
            .cs_attributes
            .clone()
            .ok_or(Error::UnsupportedFmuType("CoSimulation"))?;
        let descr = Arc::new(CoSimulationModelDescription {
            core: self.descr.clone(),
            attributes,
        });
        let lib = Arc::new(CoSimulationLibrary::load(self.resource.clone(), descr)?);
        Ok(CoSimulationFmu { lib })
    }

    /// Load the Model-Exchange shared library and return the instance
    /// factory.
    pub fn as_model_exchange(&self) -> Result<ModelExchangeFmu, Error> {
        let attributes = self
            .me_attributes
            .clone()
            .ok_or(Error::UnsupportedFmuType("ModelExchange"))?;
        let descr = Arc::new(ModelExchangeModelDescription {
            core: self.descr.clone(),
            attributes,
        });
        let lib = Arc::new(ModelExchangeLibrary::load(self.resource.clone(), descr)?);
        Ok(ModelExchangeFmu { lib })
    }
}

/// Factory for Co-Simulation instances of one loaded library.
#[derive(Debug)]
pub struct CoSimulationFmu {
    lib: Arc<CoSimulationLibrary>,
}

impl CoSimulationFmu {
    pub fn model_description(&self) -> &Arc<CoSimulationModelDescription> {
        self.lib.model_description()
    }

    /// Instantiate a new slave. Instances are independent and may be driven
    /// from different threads.
    pub fn new_instance(&self, visible: bool, logging_on: bool) -> Result<InstanceCS, Error> {
        InstanceCS::new(self.lib.clone(), visible, logging_on)
    }
}

/// Factory for Model-Exchange instances of one loaded library.
#[derive(Debug)]
pub struct ModelExchangeFmu {
    lib: Arc<ModelExchangeLibrary>,
}

impl ModelExchangeFmu {
    pub fn model_description(&self) -> &Arc<ModelExchangeModelDescription> {
        self.lib.model_description()
    }

    /// Instantiate a raw Model-Exchange instance; the caller drives the
    /// integration and event handling.
    pub fn new_instance(&self, visible: bool, logging_on: bool) -> Result<InstanceME, Error> {
        InstanceME::new(self.lib.clone(), visible, logging_on)
    }

    /// Instantiate and wrap behind the Co-Simulation contract: the returned
    /// slave integrates with `solver` and resolves events internally.
    pub fn new_slave(
        &self,
        solver: Box<dyn OdeSolver>,
        visible: bool,
        logging_on: bool,
    ) -> Result<MeSlave<InstanceME>, Error> {
        let instance = self.new_instance(visible, logging_on)?;
        Ok(MeSlave::new(instance, solver))
    }
}
