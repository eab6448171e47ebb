//! # Skiss
//!
//! `Skiss` turns natural-language requests into Business Process Model and
//! Notation (BPMN) 2.0 diagrams and edits them in place. The kernel is a
//! bidirectional transformation between two views of one process:
//!
//! - a *hierarchical* tree with branches nested inside gateways, the shape
//!   an LLM reads and writes as JSON, and
//! - a *flat* graph of elements and sequence flows, the shape of BPMN 2.0
//!   XML.
//!
//! Flattening unfolds gateways into synthetic join elements and labelled
//! flows; parsing walks the flat graph forward and recovers the nesting by
//! finding where each gateway's branches reconverge. Structured edit
//! operations work on the tree, addressed by element id, and always return
//! a new process. XML produced here round-trips through the parser;
//! third-party XML is read on a best-effort basis.
//!
//! The LLM is an injected collaborator behind the [`LlmClient`] trait; the
//! engine itself never performs IO.
//!
//! ## Example
//!
//! ```
//! use skiss::Process;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let process = Process::from_json(
//!         r#"{"process":[
//!             {"type":"startEvent","id":"s1"},
//!             {"type":"task","id":"t1","label":"Review order"},
//!             {"type":"endEvent","id":"e1"}
//!         ]}"#,
//!     )?;
//!     process.validate()?;
//!
//!     // BPMN 2.0 XML with placeholder geometry for the layouter.
//!     let xml = process.to_xml()?;
//!     assert_eq!(Process::from_xml(&xml)?, process);
//!
//!     // Structured edits never touch their input.
//!     let edited = process.delete_element("t1")?;
//!     assert_eq!(edited.all_ids(), ["s1", "e1"]);
//!     Ok(())
//! }
//! ```

mod diagram;
mod edit;
mod error;
mod llm;
mod model;

pub use diagram::{ElementType, FlatElement, SequenceFlow, flatten};
pub use edit::{proposal::EditProposal, session::EditSession};
pub use error::{Error, Result};
pub use llm::{LlmClient, OpenAiClient};
pub use model::{Element, ExclusiveBranch, ParallelBranch, Process, validate_element};
