//! The `<ModelExchange>` and `<CoSimulation>` elements declaring which
//! interfaces the FMU implements, together with their capability flags.

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "File", strict(unknown_attribute, unknown_element))]
pub struct File {
    /// Path of the file relative to the sources directory, using forward
    /// slashes as separator.
    #[xml(attr = "name")]
    pub name: String,
}

#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "SourceFiles", strict(unknown_attribute, unknown_element))]
pub struct SourceFiles {
    #[xml(child = "File")]
    pub files: Vec<File>,
}

/// The FMU exposes state derivatives and event indicators; the importing
/// environment provides the solver.
#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "ModelExchange")]
pub struct ModelExchange {
    /// Short class name according to C syntax; also the stem of the shared
    /// library under `binaries/`.
    #[xml(attr = "modelIdentifier")]
    pub model_identifier: String,

    /// If true, a tool is needed to execute the model and the FMU only
    /// contains the communication to this tool.
    #[xml(attr = "needsExecutionTool")]
    pub needs_execution_tool: Option<bool>,

    #[xml(attr = "completedIntegratorStepNotNeeded")]
    pub completed_integrator_step_not_needed: Option<bool>,

    #[xml(attr = "canBeInstantiatedOnlyOncePerProcess")]
    pub can_be_instantiated_only_once_per_process: Option<bool>,

    #[xml(attr = "canNotUseMemoryManagementFunctions")]
    pub can_not_use_memory_management_functions: Option<bool>,

    #[xml(attr = "canGetAndSetFMUstate")]
    pub can_get_and_set_fmu_state: Option<bool>,

    #[xml(attr = "canSerializeFMUstate")]
    pub can_serialize_fmu_state: Option<bool>,

    /// If true, directional derivatives can be computed with
    /// `fmi2GetDirectionalDerivative`.
    #[xml(attr = "providesDirectionalDerivative")]
    pub provides_directional_derivative: Option<bool>,

    /// Source files to compile for source-code FMUs.
    #[xml(child = "SourceFiles")]
    pub source_files: Option<SourceFiles>,
}

/// The FMU embeds its own solver behind the `fmi2DoStep` interface.
#[derive(Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "CoSimulation")]
pub struct CoSimulation {
    /// Short class name according to C syntax; also the stem of the shared
    /// library under `binaries/`.
    #[xml(attr = "modelIdentifier")]
    pub model_identifier: String,

    #[xml(attr = "needsExecutionTool")]
    pub needs_execution_tool: Option<bool>,

    #[xml(attr = "canHandleVariableCommunicationStepSize")]
    pub can_handle_variable_communication_step_size: Option<bool>,

    #[xml(attr = "canInterpolateInputs")]
    pub can_interpolate_inputs: Option<bool>,

    #[xml(attr = "maxOutputDerivativeOrder")]
    pub max_output_derivative_order: Option<u32>,

    // The misspelling is the official one from the FMI 2.0 schema.
    #[xml(attr = "canRunAsynchronuously")]
    pub can_run_asynchronously: Option<bool>,

    #[xml(attr = "canBeInstantiatedOnlyOncePerProcess")]
    pub can_be_instantiated_only_once_per_process: Option<bool>,

    #[xml(attr = "canNotUseMemoryManagementFunctions")]
    pub can_not_use_memory_management_functions: Option<bool>,

    #[xml(attr = "canGetAndSetFMUstate")]
    pub can_get_and_set_fmu_state: Option<bool>,

    #[xml(attr = "canSerializeFMUstate")]
    pub can_serialize_fmu_state: Option<bool>,

    /// Directional derivatives at communication points.
    #[xml(attr = "providesDirectionalDerivative")]
    pub provides_directional_derivative: Option<bool>,

    /// Source files to compile for source-code FMUs.
    #[xml(child = "SourceFiles")]
    pub source_files: Option<SourceFiles>,
}
