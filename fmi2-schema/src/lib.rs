//! FMI 2.0 `modelDescription.xml` schema definitions.
//!
//! The structs in this crate mirror the XML schema of the FMI 2.0 standard
//! and deserialize with [`hard_xml`]. They stay close to the raw document;
//! importer-level views (capability defaults, derived counts, platform
//! concerns) are layered on top by consumers.

#![deny(unsafe_code)]

mod attribute_groups;
mod interface_type;
mod model_description;
mod scalar_variable;
mod simple_type;
mod unit;
mod utils;
mod variable_dependency;

pub use attribute_groups::*;
pub use interface_type::*;
pub use model_description::*;
pub use scalar_variable::*;
pub use simple_type::*;
pub use unit::*;
pub use variable_dependency::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error parsing modelDescription XML: {0}")]
    XmlParse(String),

    #[error("variable `{0}` not found in the model description")]
    VariableNotFound(String),
}
