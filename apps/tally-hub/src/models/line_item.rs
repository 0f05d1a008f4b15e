use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line on the running bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub name: String,
    pub count: f64,
    pub cost: f64,
    /// `count * cost` as computed by the till.
    pub sum: f64,
    /// Running bill total after this line.
    pub total: f64,
}
