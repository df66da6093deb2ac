//! BioPAX interchange, reverse direction
//!
//! - [`import`]: BioPAX Level 3 RDF/XML -> [`factoid_graph::Graph`], keeping
//!   every node of the input as its own node.
//! - [`report`]: a graph -> the simplified interactions it states, grouped by
//!   the PubMed id of their evidence.

pub mod import;
pub mod report;

pub use import::{graph_from_rdf_xml, graph_from_rdf_xml_reader};
pub use report::{
    report_json, templates_by_publication, EntityItem, Entry, InteractionItem, ReportItem,
};

/// Errors raised while reading BioPAX.
#[derive(Debug, thiserror::Error)]
pub enum BiopaxError {
    #[error("failed to parse RDF/XML: {0}")]
    Parse(String),

    #[error("unsupported RDF term: {0}")]
    Term(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BiopaxError>;
