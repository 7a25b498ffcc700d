pub mod adjustment;
pub mod employee;
pub mod expense;
pub mod inspection;
pub mod rate_tier;
pub mod salary;
