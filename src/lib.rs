//! # xsdform
//!
//! Generates XForms data-entry forms from XML Schema.
//!
//! Given a schema and the name of one of its global elements, the
//! [`FormBuilder`] walks the element's type graph and produces an XForms
//! model (default instance, binds, submission) together with the controls
//! that edit it: inputs for simple values, selects for enumerations and
//! lists, repeats for multiply-occurring particles and type switches for
//! elements whose type can be substituted by a derived one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdform::{FormBuilder, FormRequest, SchemaModel};
//!
//! let schema = SchemaModel::from_file("purchase-order.xsd")?;
//! let form = FormBuilder::new(&schema).build_form(&FormRequest::new("purchaseOrder"))?;
//! println!("{}", form.to_xml_string()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod namespaces;
pub mod documents;

pub mod captions;
pub mod config;
pub mod schema;
pub mod hierarchy;

pub mod form;
pub mod rendering;

pub use config::{FormConfig, FormRequest};
pub use error::{Error, Result};
pub use form::{Anomaly, Form, FormBuilder};
pub use hierarchy::TypeHierarchyIndex;
pub use rendering::{PlainEnvelope, RenderingStrategy, XhtmlWrapper};
pub use schema::{SchemaModel, TypeGraph};

/// Version of the xsdform library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XForms namespace
pub const XFORMS_NS: &str = "http://www.w3.org/2002/xforms";

/// XML Events namespace
pub const XMLEVENTS_NS: &str = "http://www.w3.org/2001/xml-events";

/// XLink namespace
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Chiba processor extension namespace
pub const CHIBA_NS: &str = "http://chiba.sourceforge.net/xforms";

/// XHTML namespace
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
