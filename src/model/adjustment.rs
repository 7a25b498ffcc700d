use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Monthly adjustment sources, each keyed by (employee name, month) and
// maintained outside the payroll run.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceDeduction {
    pub attendance_deduction: Decimal,
    pub full_attendance_bonus: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubsidySummary {
    pub department_head_subsidy: Decimal,
    pub position_allowance: Decimal,
    pub oil_subsidy: Decimal,
    pub meal_subsidy: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialInsurance {
    pub personal_medical: Decimal,
    pub personal_pension: Decimal,
    pub personal_unemployment: Decimal,
    pub personal_total: Decimal,
    pub company_total: Decimal,
}

/// Monthly promotion-penalty sheet; its payment feeds the record's other deductions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromotionPenalty {
    pub payment: Decimal,
}
