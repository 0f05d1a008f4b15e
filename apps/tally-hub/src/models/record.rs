use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A freshly opened bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Record {
    pub number: String,
}
