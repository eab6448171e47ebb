pub type Result<T> = std::result::Result<T, Error>;

/// Skiss Errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unsupported BPMN type {0}")]
    UnsupportedType(String),

    #[error("duplicate element id {0}")]
    DuplicateId(String),

    #[error("could not find element with id {0}")]
    MissingElement(String),

    #[error(r#"could not find a branch with condition "{0}""#)]
    MissingBranch(String),

    #[error("{0}")]
    Schema(String),

    #[error("{0}")]
    Structure(String),

    #[error("invalid edit proposal: {0}")]
    Proposal(String),

    #[error("llm transport: {0}")]
    Transport(String),

    #[error("edit session exhausted: {0}")]
    EditExhausted(String),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

// Schema
pub(crate) const ONLY_ONE_START_EVENT: &str =
    "There can only be one start event, at the top level of the process";
pub(crate) const AT_LEAST_TWO_BRANCHES: &str = "A gateway must have at least two branches";

// Structure
pub(crate) const MISSING_PROCESS_ELEMENT: &str = "No process element in the document";
pub(crate) const PARALLEL_WITHOUT_JOIN: &str =
    "Parallel gateway branches never reconverge on a join gateway";

// Proposal
pub(crate) const BEFORE_XOR_AFTER: &str = "Expected exactly one of before_id and after_id";
