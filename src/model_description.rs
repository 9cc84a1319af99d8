//! Typed view over the raw model-description schema.
//!
//! The raw schema ([`fmi2_schema::Fmi2ModelDescription`]) mirrors the XML
//! document, including the optionality of every capability attribute. The
//! importer works with a resolved form instead: a shared
//! [`ModelDescription`] core plus one attribute block per declared interface,
//! with capability defaults applied. Exactly one of
//! [`CoSimulationModelDescription`] or [`ModelExchangeModelDescription`] is
//! built per loaded library, both dereferencing to the common core.

use std::ops::Deref;
use std::sync::Arc;

use fmi2_schema as schema;
pub use fmi2_schema::{
    Causality, DefaultExperiment, ModelStructure, ModelVariables, ScalarVariable,
    ScalarVariableElement, Variability,
};

use crate::Error;

/// The interface-independent core of a model description.
#[derive(Debug)]
pub struct ModelDescription {
    pub fmi_version: String,
    pub model_name: String,
    pub guid: String,
    pub description: Option<String>,
    pub generation_tool: Option<String>,
    pub default_experiment: Option<DefaultExperiment>,
    pub log_categories: Vec<String>,
    pub model_variables: ModelVariables,
    pub model_structure: ModelStructure,
    pub number_of_event_indicators: usize,
}

impl ModelDescription {
    /// Number of continuous states, derived from the `<Derivatives>` list.
    pub fn number_of_continuous_states(&self) -> usize {
        self.model_structure.derivatives.unknowns.len()
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

    /// The variables declared as outputs in the model structure.
    pub fn outputs(&self) -> impl Iterator<Item = &ScalarVariable> {
        self.model_structure
            .outputs
            .unknowns
            .iter()
            .filter_map(|unknown| {
                (unknown.index as usize)
                    .checked_sub(1)
                    .and_then(|i| self.model_variables.variables.get(i))
            })
    }
}

/// Capability flags shared by both interface kinds, resolved to their
/// schema defaults.
#[derive(Debug, Clone, Default)]
pub struct FmuAttributes {
    /// Stem of the shared library under `binaries/<platform>/`.
    pub model_identifier: String,
    pub needs_execution_tool: bool,
    pub can_be_instantiated_only_once_per_process: bool,
    pub can_not_use_memory_management_functions: bool,
    pub can_get_and_set_fmu_state: bool,
    pub can_serialize_fmu_state: bool,
    pub provides_directional_derivative: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CoSimulationAttributes {
    pub common: FmuAttributes,
    pub can_handle_variable_communication_step_size: bool,
    pub can_interpolate_inputs: bool,
    pub max_output_derivative_order: u32,
    pub can_run_asynchronously: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ModelExchangeAttributes {
    pub common: FmuAttributes,
    /// If set, `fmi2CompletedIntegratorStep` need not be called after
    /// integrator steps.
    pub completed_integrator_step_not_needed: bool,
}

impl From<&schema::CoSimulation> for CoSimulationAttributes {
    fn from(cs: &schema::CoSimulation) -> Self {
        Self {
            common: FmuAttributes {
                model_identifier: cs.model_identifier.clone(),
                needs_execution_tool: cs.needs_execution_tool.unwrap_or(false),
                can_be_instantiated_only_once_per_process: cs
                    .can_be_instantiated_only_once_per_process
                    .unwrap_or(false),
                can_not_use_memory_management_functions: cs
                    .can_not_use_memory_management_functions
                    .unwrap_or(false),
                can_get_and_set_fmu_state: cs.can_get_and_set_fmu_state.unwrap_or(false),
                can_serialize_fmu_state: cs.can_serialize_fmu_state.unwrap_or(false),
                provides_directional_derivative: cs
                    .provides_directional_derivative
                    .unwrap_or(false),
            },
            can_handle_variable_communication_step_size: cs
                .can_handle_variable_communication_step_size
                .unwrap_or(false),
            can_interpolate_inputs: cs.can_interpolate_inputs.unwrap_or(false),
            max_output_derivative_order: cs.max_output_derivative_order.unwrap_or(0),
            can_run_asynchronously: cs.can_run_asynchronously.unwrap_or(false),
        }
    }
}

impl From<&schema::ModelExchange> for ModelExchangeAttributes {
    fn from(me: &schema::ModelExchange) -> Self {
        Self {
            common: FmuAttributes {
                model_identifier: me.model_identifier.clone(),
                needs_execution_tool: me.needs_execution_tool.unwrap_or(false),
                can_be_instantiated_only_once_per_process: me
                    .can_be_instantiated_only_once_per_process
                    .unwrap_or(false),
                can_not_use_memory_management_functions: me
                    .can_not_use_memory_management_functions
                    .unwrap_or(false),
                can_get_and_set_fmu_state: me.can_get_and_set_fmu_state.unwrap_or(false),
                can_serialize_fmu_state: me.can_serialize_fmu_state.unwrap_or(false),
                provides_directional_derivative: me
                    .provides_directional_derivative
                    .unwrap_or(false),
            },
            completed_integrator_step_not_needed: me
                .completed_integrator_step_not_needed
                .unwrap_or(false),
        }
    }
}

/// Model description of a Co-Simulation library.
#[derive(Debug, Clone)]
pub struct CoSimulationModelDescription {
    pub core: Arc<ModelDescription>,
    pub attributes: CoSimulationAttributes,
}

impl Deref for CoSimulationModelDescription {
    type Target = ModelDescription;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// Model description of a Model-Exchange library.
#[derive(Debug, Clone)]
pub struct ModelExchangeModelDescription {
    pub core: Arc<ModelDescription>,
    pub attributes: ModelExchangeAttributes,
}

impl Deref for ModelExchangeModelDescription {
    type Target = ModelDescription;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl ModelExchangeModelDescription {
    pub fn number_of_event_indicators(&self) -> usize {
        self.core.number_of_event_indicators
    }

    /// Derive the description a Co-Simulation master sees when this
    /// Model-Exchange model is driven behind an internal solver: stepping is
    /// handled by the wrapper, so variable communication step sizes are
    /// supported and no output derivatives are available.
    pub fn as_co_simulation(&self) -> CoSimulationModelDescription {
        CoSimulationModelDescription {
            core: self.core.clone(),
            attributes: CoSimulationAttributes {
                common: self.attributes.common.clone(),
                can_handle_variable_communication_step_size: true,
                can_interpolate_inputs: false,
                max_output_derivative_order: 0,
                can_run_asynchronously: false,
            },
        }
    }
}

/// Split a parsed schema document into the shared core and the per-interface
/// attribute blocks.
pub(crate) fn from_schema(
    md: schema::Fmi2ModelDescription,
) -> (
    Arc<ModelDescription>,
    Option<CoSimulationAttributes>,
    Option<ModelExchangeAttributes>,
) {
    let cs = md.co_simulation.as_ref().map(CoSimulationAttributes::from);
    let me = md.model_exchange.as_ref().map(ModelExchangeAttributes::from);

    let core = Arc::new(ModelDescription {
        fmi_version: md.fmi_version,
        model_name: md.model_name,
        guid: md.guid,
        description: md.description,
        generation_tool: md.generation_tool,
        default_experiment: md.default_experiment,
        log_categories: md
            .log_categories
            .map(|lc| lc.categories.into_iter().map(|c| c.name).collect())
            .unwrap_or_default(),
        model_variables: md.model_variables,
        model_structure: md.model_structure,
        number_of_event_indicators: md.number_of_event_indicators.unwrap_or(0) as usize,
    });

    (core, cs, me)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me_description() -> ModelExchangeModelDescription {
        let xml = r##"<fmiModelDescription fmiVersion="2.0" modelName="VanDerPol"
            guid="{vdp}" numberOfEventIndicators="2">
          <ModelExchange modelIdentifier="VanDerPol" canGetAndSetFMUstate="true"
            completedIntegratorStepNotNeeded="true"/>
          <ModelVariables>
            <ScalarVariable name="x0" valueReference="0"><Real start="2"/></ScalarVariable>
            <ScalarVariable name="der(x0)" valueReference="1"><Real derivative="1"/></ScalarVariable>
            <ScalarVariable name="x1" valueReference="2"><Real start="0"/></ScalarVariable>
            <ScalarVariable name="der(x1)" valueReference="3"><Real derivative="3"/></ScalarVariable>
          </ModelVariables>
          <ModelStructure>
            <Derivatives><Unknown index="2"/><Unknown index="4"/></Derivatives>
          </ModelStructure>
        </fmiModelDescription>"##;
        let (core, cs, me) =
            from_schema(schema::Fmi2ModelDescription::from_xml(xml).unwrap());
        assert!(cs.is_none());
        ModelExchangeModelDescription {
            core,
            attributes: me.unwrap(),
        }
    }

    #[test]
    fn test_from_schema() {
        let md = me_description();
        assert_eq!(md.model_name, "VanDerPol");
        assert_eq!(md.number_of_continuous_states(), 2);
        assert_eq!(md.number_of_event_indicators(), 2);
        assert!(md.attributes.completed_integrator_step_not_needed);
        assert!(md.attributes.common.can_get_and_set_fmu_state);
        assert!(!md.attributes.common.can_serialize_fmu_state);
    }

    #[test]
    fn test_derived_co_simulation_description() {
        let md = me_description();
        let cs = md.as_co_simulation();
        assert!(cs.attributes.can_handle_variable_communication_step_size);
        assert_eq!(cs.attributes.max_output_derivative_order, 0);
        assert!(!cs.attributes.can_run_asynchronously);
        assert_eq!(cs.attributes.common.model_identifier, "VanDerPol");
        // shared attributes are carried over verbatim
        assert!(cs.attributes.common.can_get_and_set_fmu_state);
        assert_eq!(cs.model_name, "VanDerPol");
    }

    #[test]
    fn test_variable_lookup() {
        let md = me_description();
        assert_eq!(md.model_variable_by_name("x1").unwrap().value_reference, 2);
        assert!(matches!(
            md.model_variable_by_name("missing"),
            Err(Error::VariableNotFound(_))
        ));
    }
}
