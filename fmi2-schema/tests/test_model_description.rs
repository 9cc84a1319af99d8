//! Parse realistic model descriptions and resolve variables by name.

use fmi2_schema::{Causality, Fmi2ModelDescription, ScalarVariableElement, Variability};

const TORSION_BAR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
  fmiVersion="2.0"
  modelName="TorsionBar"
  guid="{bf267ba3-8886-4ab6-8e4c-cad4e1d7b957}"
  generationTool="20-sim"
  numberOfEventIndicators="0">
  <CoSimulation
    modelIdentifier="TorsionBar"
    canHandleVariableCommunicationStepSize="true"
    canGetAndSetFMUstate="false"
    canSerializeFMUstate="false"/>
  <DefaultExperiment startTime="0.0" stopTime="12.0" tolerance="0.0001"/>
  <ModelVariables>
    <ScalarVariable name="MotorDiskRev" valueReference="105" causality="output" variability="continuous">
      <Real unit="rev"/>
    </ScalarVariable>
    <ScalarVariable name="MotorOmega" valueReference="21" causality="local" variability="continuous">
      <Real unit="rad/s"/>
    </ScalarVariable>
    <ScalarVariable name="Phi" valueReference="2" causality="output" variability="continuous">
      <Real unit="rad"/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs>
      <Unknown index="1"/>
      <Unknown index="3"/>
    </Outputs>
  </ModelStructure>
</fmiModelDescription>"#;

const CONTROLLED_TEMPERATURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
  fmiVersion="2.0"
  modelName="ControlledTemperature"
  guid="{06c2700b-b39c-4895-9151-304ddde28443}"
  generationTool="20-sim"
  numberOfEventIndicators="0">
  <CoSimulation
    modelIdentifier="ControlledTemperature"
    canHandleVariableCommunicationStepSize="true"
    canBeInstantiatedOnlyOncePerProcess="true"/>
  <ModelVariables>
    <ScalarVariable name="Temperature_Reference" valueReference="46" causality="output" variability="continuous">
      <Real unit="K"/>
    </ScalarVariable>
    <ScalarVariable name="Temperature_Room" valueReference="47" causality="output" variability="continuous">
      <Real unit="K" min="0.0"/>
    </ScalarVariable>
    <ScalarVariable name="HeatCapacity1.T0" valueReference="10" causality="parameter" variability="fixed">
      <Real start="298.0"/>
    </ScalarVariable>
    <ScalarVariable name="OnOff" valueReference="30" causality="local" variability="discrete">
      <Boolean start="false"/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs>
      <Unknown index="1"/>
      <Unknown index="2"/>
    </Outputs>
  </ModelStructure>
</fmiModelDescription>"#;

#[test]
fn test_torsion_bar() {
    let md = Fmi2ModelDescription::from_xml(TORSION_BAR).unwrap();
    assert_eq!(md.model_name, "TorsionBar");
    assert!(md.co_simulation.is_some());
    assert!(md.model_exchange.is_none());

    let var = md.model_variable_by_name("MotorDiskRev").unwrap();
    assert_eq!(var.value_reference, 105);
    assert_eq!(var.causality(), Causality::Output);
    match &var.elem {
        ScalarVariableElement::Real(real) => assert_eq!(real.unit.as_deref(), Some("rev")),
        other => panic!("expected Real, got {:?}", other),
    }
}

#[test]
fn test_controlled_temperature() {
    let md = Fmi2ModelDescription::from_xml(CONTROLLED_TEMPERATURE).unwrap();
    assert_eq!(md.model_name, "ControlledTemperature");

    let var = md.model_variable_by_name("Temperature_Room").unwrap();
    assert_eq!(var.value_reference, 47);
    assert_eq!(var.variability(), Variability::Continuous);

    let cs = md.co_simulation.as_ref().unwrap();
    assert_eq!(cs.model_identifier, "ControlledTemperature");
    assert_eq!(cs.can_handle_variable_communication_step_size, Some(true));
    assert_eq!(cs.can_be_instantiated_only_once_per_process, Some(true));

    let onoff = md.model_variable_by_name("OnOff").unwrap();
    assert!(matches!(&onoff.elem, ScalarVariableElement::Boolean(b) if b.start == Some(false)));

    assert!(md.model_variable_by_name("NoSuchVariable").is_err());
}

#[test]
fn test_outputs_resolve() {
    let md = Fmi2ModelDescription::from_xml(TORSION_BAR).unwrap();
    let outputs: Vec<_> = md
        .model_structure
        .outputs
        .unknowns
        .iter()
        .filter_map(|unknown| md.model_variable_by_index(unknown.index as usize))
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(outputs, ["MotorDiskRev", "Phi"]);
}
