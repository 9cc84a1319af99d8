//! Attribute groups shared between type definitions and scalar variables.

#[derive(Clone, Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Real")]
pub struct RealAttributes {
    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(attr = "unit")]
    pub unit: Option<String>,

    /// Default display unit, provided the conversion of values in "unit" to
    /// values in "displayUnit" is defined under UnitDefinitions.
    #[xml(attr = "displayUnit")]
    pub display_unit: Option<String>,

    /// If true, the offset of "displayUnit" must be ignored.
    #[xml(attr = "relativeQuantity")]
    pub relative_quantity: Option<bool>,

    #[xml(attr = "min")]
    pub min: Option<f64>,

    /// max >= min required
    #[xml(attr = "max")]
    pub max: Option<f64>,

    /// nominal >= min and <= max required
    #[xml(attr = "nominal")]
    pub nominal: Option<f64>,

    /// Set to true, e.g., for crank angle. If true and the variable is a
    /// state, relative tolerance should be zero on this variable.
    #[xml(attr = "unbounded")]
    pub unbounded: Option<bool>,
}

#[derive(Clone, Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Integer")]
pub struct IntegerAttributes {
    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(attr = "min")]
    pub min: Option<i32>,

    /// max >= min required
    #[xml(attr = "max")]
    pub max: Option<i32>,
}
