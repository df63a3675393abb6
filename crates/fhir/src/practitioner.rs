//! Author of the invoice document.

use crate::datatypes::{DomainResource, HumanName, Identifier};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practitioner {
    #[serde(flatten)]
    pub base: DomainResource,

    pub identifier: Vec<Identifier>,

    pub name: Vec<HumanName>,
}
