use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One financial spot-check from the inspection log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InspectionRecord {
    pub inspection_date: Option<NaiveDate>,
    pub inspector: Option<String>,
    /// Accountant whose books were inspected.
    pub bookkeeping_accountant: Option<String>,
    pub reviewer: Option<String>,
}
