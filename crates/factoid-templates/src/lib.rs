//! Template materialization
//!
//! Turns template documents (semantic statements such as "protein X activates
//! protein Y") into a deduplicated [`factoid_graph::Graph`].
//!
//! Data flows one way:
//!
//! ```text
//! assembler -> handlers -> resolver -> matcher -> factoid_graph::Graph
//! ```
//!
//! - [`assembler`]: walks a document's templates in order, skips or rejects the
//!   ones it cannot use, attaches the publication.
//! - [`handlers`]: one sub-graph construction per template type.
//! - [`resolver`]: entity descriptor -> xref and entity reference -> matcher.
//! - [`matcher`]: finds or creates the unique physical entity for a class,
//!   reference, feature state and complex membership.
//!
//! A [`Converter`] owns one graph. It is not shared between builds; callers
//! that convert concurrently create one converter each.
//!
//! ## Example
//!
//! ```
//! use factoid_templates::{ConvertConfig, Converter};
//!
//! let mut converter = Converter::new(ConvertConfig::default());
//! converter
//!     .add_json_str(r#"{"interactions": [{
//!         "type": "Molecular Interaction",
//!         "participants": [
//!             {"type": "protein", "name": "IGF1", "xref": {"id": "P05019", "db": "uniprot"}},
//!             {"type": "protein", "name": "FSHB", "xref": {"id": "P01225", "db": "uniprot"}}
//!         ]
//!     }]}"#)
//!     .unwrap();
//! assert_eq!(converter.report().applied, 1);
//! ```

pub mod assembler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod handlers;
pub mod matcher;
pub mod resolver;
pub mod template;

pub use assembler::{convert_document, BuildReport, Converter, SkippedTemplate};
pub use config::{ConvertConfig, Protocol};
pub use descriptor::{EntityDescriptor, EntityKind, XrefDescriptor};
pub use error::{ConvertError, Result};
pub use handlers::{state_sides, Outcome, ACTIVE};
pub use matcher::{EntityRequest, FeatureRequest};
pub use resolver::{resolve, resolve_plain};
pub use template::{StateEdge, Template, TemplateKind};
