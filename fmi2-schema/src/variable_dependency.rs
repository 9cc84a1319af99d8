use std::{fmt::Display, str::FromStr};

use crate::utils::AttrList;

/// Dependency of a scalar Unknown on Knowns in Continuous-Time and Event Mode
/// (ModelExchange) or at communication points (CoSimulation):
/// Unknown = f(Known_1, Known_2, ...).
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Fmi2VariableDependency {
    /// 1-based ScalarVariable index of the Unknown.
    pub index: u32,

    /// 1-based ScalarVariable indices of the Knowns this Unknown depends on.
    /// If the attribute is absent the Unknown depends on all Knowns; an
    /// empty list means it depends on none.
    pub dependencies: Vec<u32>,

    /// How each Known enters the equation. When present, must have the same
    /// number of entries as [`Self::dependencies`].
    pub dependencies_kind: Vec<DependenciesKind>,
}

// hard-xml cannot derive whitespace-separated list attributes, so the XML
// impls are written out, following the shape of the derive expansion.
impl<'input> hard_xml::XmlRead<'input> for Fmi2VariableDependency {
    fn from_reader(reader: &mut hard_xml::XmlReader<'input>) -> hard_xml::XmlResult<Self> {
        use hard_xml::xmlparser::{ElementEnd, Token};
        use hard_xml::XmlError;

        let mut index = None;
        let mut dependencies = Vec::new();
        let mut dependencies_kind = Vec::new();

        let tag = reader
            .find_element_start(None)?
            .ok_or_else(|| XmlError::MissingField {
                name: "Fmi2VariableDependency".to_owned(),
                field: "element".to_owned(),
            })?;
        let _ = reader.next().transpose()?;

        while let Some((key, value)) = reader.find_attribute()? {
            match key {
                "index" => {
                    index = Some(
                        u32::from_str(&value).map_err(|e| XmlError::FromStr(e.into()))?,
                    );
                }
                "dependencies" => {
                    dependencies = AttrList::<u32>::from_str(&value)
                        .map_err(|e| XmlError::FromStr(e.into()))?
                        .0;
                }
                "dependenciesKind" => {
                    dependencies_kind = AttrList::<DependenciesKind>::from_str(&value)
                        .map_err(|e| XmlError::FromStr(e.into()))?
                        .0;
                }
                key => {
                    return Err(XmlError::UnknownField {
                        name: "Fmi2VariableDependency".to_owned(),
                        field: key.to_owned(),
                    });
                }
            }
        }

        let dependency = Fmi2VariableDependency {
            index: index.ok_or(XmlError::MissingField {
                name: "Fmi2VariableDependency".to_owned(),
                field: "index".to_owned(),
            })?,
            dependencies,
            dependencies_kind,
        };

        if let Some(Token::ElementEnd {
            end: ElementEnd::Empty,
            ..
        }) = reader.next().transpose()?
        {
            return Ok(dependency);
        }

        if let Some(tag) = reader.find_element_start(Some(tag))? {
            return Err(XmlError::UnknownField {
                name: "Fmi2VariableDependency".to_owned(),
                field: tag.to_owned(),
            });
        }

        Ok(dependency)
    }
}

impl hard_xml::XmlWrite for Fmi2VariableDependency {
    fn to_writer<W: std::io::Write>(
        &self,
        writer: &mut hard_xml::XmlWriter<W>,
    ) -> hard_xml::XmlResult<()> {
        writer.write_element_start("Unknown")?;
        writer.write_attribute("index", &self.index.to_string())?;

        if !self.dependencies.is_empty() {
            writer.write_attribute(
                "dependencies",
                &AttrList(self.dependencies.clone()).to_string(),
            )?;
        }

        if !self.dependencies_kind.is_empty() {
            writer.write_attribute(
                "dependenciesKind",
                &AttrList(self.dependencies_kind.clone()).to_string(),
            )?;
        }

        writer.write_element_end_empty()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum DependenciesKind {
    /// No particular structure, f(v).
    #[default]
    Dependent,
    /// Constant factor, c*v (only for Real variables).
    Constant,
    /// Fixed factor, p*v (only for Real variables).
    Fixed,
    /// Tunable factor, p*v (only for Real variables).
    Tunable,
    /// Discrete factor, d*v (only for Real variables).
    Discrete,
}

impl FromStr for DependenciesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependent" => Ok(DependenciesKind::Dependent),
            "constant" => Ok(DependenciesKind::Constant),
            "fixed" => Ok(DependenciesKind::Fixed),
            "tunable" => Ok(DependenciesKind::Tunable),
            "discrete" => Ok(DependenciesKind::Discrete),
            _ => Err(format!("Invalid DependenciesKind: {}", s)),
        }
    }
}

impl Display for DependenciesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DependenciesKind::Dependent => "dependent",
            DependenciesKind::Constant => "constant",
            DependenciesKind::Fixed => "fixed",
            DependenciesKind::Tunable => "tunable",
            DependenciesKind::Discrete => "discrete",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use hard_xml::XmlRead;

    use super::*;

    #[test]
    fn test_unknown() {
        let dep =
            Fmi2VariableDependency::from_str(r#"<Unknown index="7" dependencies="5 2"/>"#).unwrap();
        assert_eq!(dep.index, 7);
        assert_eq!(dep.dependencies, vec![5, 2]);
        assert!(dep.dependencies_kind.is_empty());
    }

    #[test]
    fn test_unknown_with_kinds() {
        let dep = Fmi2VariableDependency::from_str(
            r#"<Unknown index="3" dependencies="1 2" dependenciesKind="dependent fixed"/>"#,
        )
        .unwrap();
        assert_eq!(
            dep.dependencies_kind,
            vec![DependenciesKind::Dependent, DependenciesKind::Fixed]
        );
    }
}
