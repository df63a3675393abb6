use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("build refused: {0}")]
    Validation(ValidationErrors),

    #[error("attachment read failed: {0}")]
    AttachmentRead(#[from] invrec_files::FilesError),

    #[error("dangling reference {reference} in {resource_type}/{id}")]
    DanglingReference {
        resource_type: &'static str,
        id: String,
        reference: String,
    },
    #[error("duplicate record identifier {0}")]
    DuplicateIdentifier(String),
    #[error("entry locator {locator} does not address record {id}")]
    MislocatedEntry { locator: String, id: String },

    #[error("failed to serialize bundle: {0}")]
    Serialization(serde_json::Error),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("failed to create HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

impl EngineError {
    /// The individual validation issues, when this is a refused build.
    pub fn validation_issues(&self) -> Option<&ValidationErrors> {
        match self {
            EngineError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
