use std::{fmt::Display, str::FromStr};

/// Enumeration that defines the causality of the variable.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Causality {
    /// Independent parameter that stays constant during the simulation.
    Parameter,
    /// Parameter computed from other variables during initialization.
    CalculatedParameter,
    Input,
    Output,
    #[default]
    Local,
    /// The independent variable, usually time.
    Independent,
}

impl FromStr for Causality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parameter" => Ok(Causality::Parameter),
            "calculatedParameter" => Ok(Causality::CalculatedParameter),
            "input" => Ok(Causality::Input),
            "output" => Ok(Causality::Output),
            "local" => Ok(Causality::Local),
            "independent" => Ok(Causality::Independent),
            _ => Err(format!("Invalid Causality: {}", s)),
        }
    }
}

impl Display for Causality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Causality::Parameter => "parameter",
            Causality::CalculatedParameter => "calculatedParameter",
            Causality::Input => "input",
            Causality::Output => "output",
            Causality::Local => "local",
            Causality::Independent => "independent",
        };
        write!(f, "{}", s)
    }
}

/// Enumeration that defines the time instants at which a variable can change
/// its value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Variability {
    /// The value of the variable never changes.
    Constant,
    /// The value is fixed after initialization.
    Fixed,
    /// The value is constant between external events due to changing
    /// tunable parameters or inputs.
    Tunable,
    /// ModelExchange: constant between events. CoSimulation: the value only
    /// changes at communication points.
    Discrete,
    /// Only a variable of type Real can be continuous.
    #[default]
    Continuous,
}

impl FromStr for Variability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Variability::Constant),
            "fixed" => Ok(Variability::Fixed),
            "tunable" => Ok(Variability::Tunable),
            "discrete" => Ok(Variability::Discrete),
            "continuous" => Ok(Variability::Continuous),
            _ => Err(format!("Invalid Variability: {}", s)),
        }
    }
}

impl Display for Variability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Variability::Constant => "constant",
            Variability::Fixed => "fixed",
            Variability::Tunable => "tunable",
            Variability::Discrete => "discrete",
            Variability::Continuous => "continuous",
        };
        write!(f, "{}", s)
    }
}

/// Enumeration that defines how the variable is initialized.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Initial {
    #[default]
    Exact,
    Approx,
    Calculated,
}

impl FromStr for Initial {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Initial::Exact),
            "approx" => Ok(Initial::Approx),
            "calculated" => Ok(Initial::Calculated),
            _ => Err(format!("Invalid Initial: {}", s)),
        }
    }
}

impl Display for Initial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Initial::Exact => "exact",
            Initial::Approx => "approx",
            Initial::Calculated => "calculated",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Real")]
pub struct RealElement {
    /// If present, name of a SimpleType under TypeDefinitions providing
    /// defaults for the numeric attributes.
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(attr = "unit")]
    pub unit: Option<String>,

    #[xml(attr = "displayUnit")]
    pub display_unit: Option<String>,

    #[xml(attr = "relativeQuantity")]
    pub relative_quantity: Option<bool>,

    #[xml(attr = "min")]
    pub min: Option<f64>,

    #[xml(attr = "max")]
    pub max: Option<f64>,

    #[xml(attr = "nominal")]
    pub nominal: Option<f64>,

    #[xml(attr = "unbounded")]
    pub unbounded: Option<bool>,

    /// Value before initialization, if initial = exact or approx.
    #[xml(attr = "start")]
    pub start: Option<f64>,

    /// If present, this variable is the derivative of the variable with the
    /// given 1-based ScalarVariable index.
    #[xml(attr = "derivative")]
    pub derivative: Option<u32>,

    /// Only for ModelExchange continuous-time states: whether the state can
    /// be reinitialized at an event by the FMU.
    #[xml(attr = "reinit")]
    pub reinit: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Integer")]
pub struct IntegerElement {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(attr = "min")]
    pub min: Option<i32>,

    #[xml(attr = "max")]
    pub max: Option<i32>,

    #[xml(attr = "start")]
    pub start: Option<i32>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Boolean")]
pub struct BooleanElement {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "start")]
    pub start: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "String")]
pub struct StringElement {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "start")]
    pub start: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Enumeration")]
pub struct EnumerationElement {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(attr = "min")]
    pub min: Option<i32>,

    #[xml(attr = "max")]
    pub max: Option<i32>,

    #[xml(attr = "start")]
    pub start: Option<i32>,
}

#[derive(Clone, PartialEq, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
pub enum ScalarVariableElement {
    #[xml(tag = "Real")]
    Real(RealElement),
    #[xml(tag = "Integer")]
    Integer(IntegerElement),
    #[xml(tag = "Boolean")]
    Boolean(BooleanElement),
    #[xml(tag = "String")]
    String(StringElement),
    #[xml(tag = "Enumeration")]
    Enumeration(EnumerationElement),
}

impl Default for ScalarVariableElement {
    fn default() -> Self {
        Self::Real(RealElement::default())
    }
}

#[derive(Clone, Default, Debug, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "ScalarVariable")]
pub struct ScalarVariable {
    /// The full, unique name of the variable.
    #[xml(attr = "name")]
    pub name: String,

    /// The handle used to identify the variable value in the C API.
    #[xml(attr = "valueReference")]
    pub value_reference: u32,

    #[xml(attr = "description")]
    pub description: Option<String>,

    #[xml(attr = "causality")]
    pub causality: Option<Causality>,

    #[xml(attr = "variability")]
    pub variability: Option<Variability>,

    /// How the variable is initialized. Must not be provided when
    /// causality is `input` or `independent`.
    #[xml(attr = "initial")]
    pub initial: Option<Initial>,

    /// Only for ModelExchange: whether the variable may be set more than
    /// once at the same super-dense time instant.
    #[xml(attr = "canHandleMultipleSetPerTimeInstant")]
    pub can_handle_multiple_set_per_time_instant: Option<bool>,

    #[xml(
        child = "Real",
        child = "Integer",
        child = "Boolean",
        child = "String",
        child = "Enumeration"
    )]
    pub elem: ScalarVariableElement,
}

impl ScalarVariable {
    pub fn causality(&self) -> Causality {
        self.causality.unwrap_or_default()
    }

    pub fn variability(&self) -> Variability {
        self.variability.unwrap_or_default()
    }

    pub fn is_continuous_input(&self) -> bool {
        matches!(
            (&self.elem, self.causality()),
            (ScalarVariableElement::Real(_), Causality::Input)
        )
    }
}

#[cfg(test)]
mod tests {
    use hard_xml::XmlRead;

    use super::*;

    #[test]
    fn test_scalar_variable() {
        let s = r#"
        <ScalarVariable
            name="inertia1.J"
            valueReference="1073741824"
            description="Moment of load inertia"
            causality="parameter"
            variability="fixed">
            <Real declaredType="Modelica.SIunits.Inertia" start="1"/>
        </ScalarVariable>
        "#;
        let sv = ScalarVariable::from_str(s).unwrap();
        assert_eq!(sv.name, "inertia1.J");
        assert_eq!(sv.value_reference, 1073741824);
        assert_eq!(sv.description, Some("Moment of load inertia".into()));
        assert_eq!(sv.causality(), Causality::Parameter);
        assert_eq!(sv.variability(), Variability::Fixed);
        assert_eq!(
            sv.elem,
            ScalarVariableElement::Real(RealElement {
                declared_type: Some("Modelica.SIunits.Inertia".to_string()),
                start: Some(1.0),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_defaults() {
        let s = r#"<ScalarVariable name="x" valueReference="3"><Real/></ScalarVariable>"#;
        let sv = ScalarVariable::from_str(s).unwrap();
        assert_eq!(sv.causality(), Causality::Local);
        assert_eq!(sv.variability(), Variability::Continuous);
        assert_eq!(sv.initial, None);
    }
}
