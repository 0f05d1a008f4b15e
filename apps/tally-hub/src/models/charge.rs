use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment summary shown when the bill is settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Charge {
    /// Amount handed over by the customer.
    pub introduced: f64,
    /// Change due back.
    pub delivery: f64,
    pub sum: f64,
}
