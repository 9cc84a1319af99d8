use super::attribute_groups::{IntegerAttributes, RealAttributes};

#[derive(Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Boolean", strict(unknown_attribute, unknown_element))]
pub struct BooleanAttributes {}

#[derive(Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "String", strict(unknown_attribute, unknown_element))]
pub struct StringAttributes {}

#[derive(Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Item", strict(unknown_attribute, unknown_element))]
pub struct EnumerationItem {
    #[xml(attr = "name")]
    pub name: String,
    #[xml(attr = "value")]
    pub value: i32,
    #[xml(attr = "description")]
    pub description: Option<String>,
}

#[derive(Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "Enumeration")]
pub struct EnumerationAttributes {
    #[xml(attr = "quantity")]
    pub quantity: Option<String>,

    #[xml(child = "Item")]
    pub items: Vec<EnumerationItem>,
}

#[derive(Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
pub enum SimpleTypeElement {
    #[xml(tag = "Real")]
    Real(RealAttributes),
    #[xml(tag = "Integer")]
    Integer(IntegerAttributes),
    #[xml(tag = "Boolean")]
    Boolean(BooleanAttributes),
    #[xml(tag = "String")]
    String(StringAttributes),
    #[xml(tag = "Enumeration")]
    Enumeration(EnumerationAttributes),
}

impl Default for SimpleTypeElement {
    fn default() -> Self {
        Self::Real(RealAttributes::default())
    }
}

/// Type defaults that a ScalarVariable can reference via `declaredType`.
#[derive(Default, Debug, PartialEq, hard_xml::XmlRead, hard_xml::XmlWrite)]
#[xml(tag = "SimpleType")]
pub struct SimpleType {
    /// Unique among all SimpleType and ScalarVariable names.
    #[xml(attr = "name")]
    pub name: String,

    #[xml(attr = "description")]
    pub description: Option<String>,

    #[xml(
        child = "Real",
        child = "Integer",
        child = "Boolean",
        child = "String",
        child = "Enumeration"
    )]
    pub elem: SimpleTypeElement,
}

#[cfg(test)]
mod tests {
    use hard_xml::XmlRead;

    use super::*;

    #[test]
    fn test_simple_type() {
        let xml = r#"
        <SimpleType name="Acceleration">
            <Real quantity="Acceleration" unit="m/s2"/>
        </SimpleType>"#;

        let simple_type = SimpleType::from_str(xml).unwrap();
        assert_eq!(simple_type.name, "Acceleration");
        assert_eq!(
            simple_type.elem,
            SimpleTypeElement::Real(RealAttributes {
                quantity: Some("Acceleration".to_owned()),
                unit: Some("m/s2".to_owned()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_enumeration_type() {
        let xml = r#"
        <SimpleType name="Mode">
            <Enumeration>
                <Item name="idle" value="1"/>
                <Item name="running" value="2"/>
            </Enumeration>
        </SimpleType>"#;

        let simple_type = SimpleType::from_str(xml).unwrap();
        match &simple_type.elem {
            SimpleTypeElement::Enumeration(e) => {
                assert_eq!(e.items.len(), 2);
                assert_eq!(e.items[1].name, "running");
                assert_eq!(e.items[1].value, 2);
            }
            other => panic!("expected Enumeration, got {:?}", other),
        }
    }
}
