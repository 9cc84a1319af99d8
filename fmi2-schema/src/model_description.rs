use crate::Error;

use super::{
    CoSimulation, Fmi2Unit, Fmi2VariableDependency, ModelExchange, ScalarVariable, SimpleType,
};

/// Root element of `modelDescription.xml`.
///
/// Deliberately not strict about unknown children: real-world descriptions
/// carry `<VendorAnnotations>` and other tool-specific elements that the
/// importer has no use for.
#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "fmiModelDescription")]
pub struct Fmi2ModelDescription {
    /// Version of FMI; "2.0" for all FMI 2.0.x revisions.
    #[xml(attr = "fmiVersion")]
    pub fmi_version: String,

    /// The name of the model as used in the modeling environment that
    /// generated the XML file.
    #[xml(attr = "modelName")]
    pub model_name: String,

    /// Fingerprint of the XML file content, checked against the one compiled
    /// into the C functions at instantiation time.
    #[xml(attr = "guid")]
    pub guid: String,

    #[xml(attr = "description")]
    pub description: Option<String>,

    #[xml(attr = "author")]
    pub author: Option<String>,

    /// Version of the FMU, e.g. "1.4.1".
    #[xml(attr = "version")]
    pub version: Option<String>,

    #[xml(attr = "copyright")]
    pub copyright: Option<String>,

    #[xml(attr = "license")]
    pub license: Option<String>,

    /// Name of the tool that generated the XML file.
    #[xml(attr = "generationTool")]
    pub generation_tool: Option<String>,

    /// Date and time when the XML file was generated, ISO 8601.
    #[xml(attr = "generationDateAndTime")]
    pub generation_date_and_time: Option<String>,

    #[xml(attr = "variableNamingConvention")]
    pub variable_naming_convention: Option<String>,

    /// Required for ModelExchange, ignored for Co-Simulation.
    #[xml(attr = "numberOfEventIndicators")]
    pub number_of_event_indicators: Option<u32>,

    /// If present, the FMU implements the Model-Exchange interface.
    #[xml(child = "ModelExchange")]
    pub model_exchange: Option<ModelExchange>,

    /// If present, the FMU implements the Co-Simulation interface.
    #[xml(child = "CoSimulation")]
    pub co_simulation: Option<CoSimulation>,

    #[xml(child = "UnitDefinitions")]
    pub unit_definitions: Option<UnitDefinitions>,

    #[xml(child = "TypeDefinitions")]
    pub type_definitions: Option<TypeDefinitions>,

    #[xml(child = "LogCategories")]
    pub log_categories: Option<LogCategories>,

    #[xml(child = "DefaultExperiment")]
    pub default_experiment: Option<DefaultExperiment>,

    #[xml(child = "ModelVariables", default)]
    pub model_variables: ModelVariables,

    #[xml(child = "ModelStructure", default)]
    pub model_structure: ModelStructure,
}

impl Fmi2ModelDescription {
    /// Parse a model description document.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        hard_xml::XmlRead::from_str(xml).map_err(|e| Error::XmlParse(e.to_string()))
    }

    /// Serialize back to XML.
    pub fn to_xml(&self) -> Result<String, Error> {
        hard_xml::XmlWrite::to_string(self).map_err(|e| Error::XmlParse(e.to_string()))
    }

    /// Total number of variables.
    pub fn num_variables(&self) -> usize {
        self.model_variables.variables.len()
    }

    /// Number of continuous states, derived from the `<Derivatives>` list.
    pub fn num_states(&self) -> usize {
        self.model_structure.derivatives.unknowns.len()
    }

    pub fn num_event_indicators(&self) -> usize {
        self.number_of_event_indicators.unwrap_or(0) as usize
    }

    pub fn model_variables(&self) -> impl Iterator<Item = &ScalarVariable> {
        self.model_variables.variables.iter()
    }

    /// Look up a variable by its unique name.
    pub fn model_variable_by_name(&self, name: &str) -> Result<&ScalarVariable, Error> {
        self.model_variables
            .variables
            .iter()
            .find(|var| var.name == name)
            .ok_or_else(|| Error::VariableNotFound(name.to_owned()))
    }

    /// Resolve a 1-based index from the model structure to its variable.
    pub fn model_variable_by_index(&self, index: usize) -> Option<&ScalarVariable> {
        index
            .checked_sub(1)
            .and_then(|i| self.model_variables.variables.get(i))
    }
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "LogCategories", strict(unknown_attribute, unknown_element))]
pub struct LogCategories {
    #[xml(child = "Category")]
    pub categories: Vec<Category>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Category")]
pub struct Category {
    #[xml(attr = "name")]
    pub name: String,
    #[xml(attr = "description")]
    pub description: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "DefaultExperiment")]
pub struct DefaultExperiment {
    #[xml(attr = "startTime")]
    pub start_time: Option<f64>,

    #[xml(attr = "stopTime")]
    pub stop_time: Option<f64>,

    /// Default relative integration tolerance.
    #[xml(attr = "tolerance")]
    pub tolerance: Option<f64>,

    /// ModelExchange: default step size for fixed-step integrators.
    /// CoSimulation: preferred communication step size.
    #[xml(attr = "stepSize")]
    pub step_size: Option<f64>,
}

impl DefaultExperiment {
    pub fn start_time(&self) -> f64 {
        self.start_time.unwrap_or(0.0)
    }

    pub fn stop_time(&self) -> f64 {
        self.stop_time.unwrap_or(1.0)
    }
}

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "UnitDefinitions", strict(unknown_attribute, unknown_element))]
pub struct UnitDefinitions {
    #[xml(child = "Unit")]
    pub units: Vec<Fmi2Unit>,
}

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "TypeDefinitions", strict(unknown_attribute, unknown_element))]
pub struct TypeDefinitions {
    #[xml(child = "SimpleType")]
    pub types: Vec<SimpleType>,
}

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "ModelVariables")]
pub struct ModelVariables {
    #[xml(child = "ScalarVariable")]
    pub variables: Vec<ScalarVariable>,
}

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "ModelStructure", strict(unknown_attribute, unknown_element))]
pub struct ModelStructure {
    #[xml(child = "Outputs", default)]
    pub outputs: Outputs,

    #[xml(child = "Derivatives", default)]
    pub derivatives: Derivatives,

    #[xml(child = "InitialUnknowns", default)]
    pub initial_unknowns: InitialUnknowns,
}

#[derive(Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Outputs")]
pub struct Outputs {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Fmi2VariableDependency>,
}

#[derive(Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Derivatives")]
pub struct Derivatives {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Fmi2VariableDependency>,
}

#[derive(Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "InitialUnknowns")]
pub struct InitialUnknowns {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Fmi2VariableDependency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_description() {
        let s = r##"<?xml version="1.0" encoding="UTF8"?>
<fmiModelDescription
 fmiVersion="2.0"
 modelName="MyLibrary.SpringMassDamper"
 guid="{8c4e810f-3df3-4a00-8276-176fa3c9f9e0}"
 description="Rotational Spring Mass Damper System"
 version="1.0"
 generationDateAndTime="2011-09-23T16:57:33Z"
 variableNamingConvention="structured"
 numberOfEventIndicators="2">
 <ModelVariables>
    <ScalarVariable name="x[1]" valueReference="0" initial="exact"> <Real/> </ScalarVariable>
    <ScalarVariable name="x[2]" valueReference="1" initial="exact"> <Real/> </ScalarVariable>
    <ScalarVariable name="PI.x" valueReference="46" description="State of block" causality="local" variability="continuous" initial="calculated">
        <Real relativeQuantity="false" />
    </ScalarVariable>
    <ScalarVariable name="der(PI.x)" valueReference="45" causality="local" variability="continuous" initial="calculated">
        <Real relativeQuantity="false" derivative="3" />
    </ScalarVariable>
 </ModelVariables>
 <ModelStructure>
    <Outputs><Unknown index="1" dependencies="1 2" /><Unknown index="2" /></Outputs>
    <Derivatives><Unknown index="4" dependencies="1 2" /></Derivatives>
    <InitialUnknowns />
</ModelStructure>
</fmiModelDescription>"##;
        let md = Fmi2ModelDescription::from_xml(s).unwrap();
        assert_eq!(md.fmi_version, "2.0");
        assert_eq!(md.model_name, "MyLibrary.SpringMassDamper");
        assert_eq!(md.guid, "{8c4e810f-3df3-4a00-8276-176fa3c9f9e0}");
        assert_eq!(
            md.description.as_deref(),
            Some("Rotational Spring Mass Damper System")
        );
        assert_eq!(md.variable_naming_convention.as_deref(), Some("structured"));
        assert_eq!(md.num_event_indicators(), 2);
        assert_eq!(md.num_variables(), 4);
        assert_eq!(md.num_states(), 1);

        let outputs = &md.model_structure.outputs.unknowns;
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].index, 1);
        assert_eq!(outputs[0].dependencies, vec![1, 2]);
        assert!(outputs[1].dependencies.is_empty());

        let state = md.model_variable_by_index(3).unwrap();
        assert_eq!(state.name, "PI.x");
        assert!(md.model_variable_by_index(5).is_none());
        assert!(md.model_variable_by_index(0).is_none());
    }

    #[test]
    fn test_default_experiment() {
        let s = r##"<fmiModelDescription fmiVersion="2.0" modelName="m" guid="{g}">
            <DefaultExperiment startTime="0.2" stopTime="1.5" tolerance="0.0001"/>
            <ModelVariables/>
        </fmiModelDescription>"##;
        let md = Fmi2ModelDescription::from_xml(s).unwrap();
        let de = md.default_experiment.unwrap();
        assert_eq!(de.start_time, Some(0.2));
        assert_eq!(de.stop_time, Some(1.5));
        assert_eq!(de.tolerance, Some(0.0001));
        assert_eq!(de.step_size, None);
    }

    #[test]
    fn test_missing_required_attribute() {
        let s = r##"<fmiModelDescription fmiVersion="2.0" modelName="m"/>"##;
        assert!(matches!(
            Fmi2ModelDescription::from_xml(s),
            Err(Error::XmlParse(_))
        ));
    }
}
