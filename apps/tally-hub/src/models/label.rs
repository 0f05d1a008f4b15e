use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-form text line for the display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Label {
    #[serde(rename = "str")]
    pub text: String,
}
