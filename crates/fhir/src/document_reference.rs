//! Reference record describing one attachment.

use crate::datatypes::{Attachment, CodeableConcept, DomainResource, Reference};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentReferenceStatus {
    Current,
    Superseded,
    EnteredInError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub attachment: Attachment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    #[serde(flatten)]
    pub base: DomainResource,

    pub status: DocumentReferenceStatus,

    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub subject: Reference,

    pub date: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Reference>,

    pub content: Vec<DocumentContent>,
}
