//! Raw attachment payload.

use crate::datatypes::Meta;
use serde::{Deserialize, Serialize};

/// Base64-encoded bytes of one attachment.
///
/// `data` carries the plain base64 text, never a `data:` URL prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    pub content_type: String,

    pub data: String,
}
