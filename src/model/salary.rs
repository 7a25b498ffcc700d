use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

/// Position the inspection audit deduction used to occupy in the legacy array layout.
const LEGACY_AUDIT_SLOT: usize = 13;

/// Independent performance-penalty fractions of one salary record.
///
/// Older rows stored a plain JSON array with the audit penalty at a fixed
/// position; both layouts deserialize into this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PerformanceDeductions {
    /// Fractions entered by hand by payroll staff.
    #[schema(value_type = Vec<String>)]
    pub manual: Vec<Decimal>,

    /// Fraction set by the inspection-quota audit, either 0 or the fixed penalty.
    #[schema(value_type = String)]
    pub performance_audit: Decimal,
}

impl PerformanceDeductions {
    pub fn sum(&self) -> Decimal {
        self.manual.iter().copied().sum::<Decimal>() + self.performance_audit
    }

    /// Effective deduction fraction, capped at 1.
    pub fn fraction(&self) -> Decimal {
        self.sum().min(Decimal::ONE)
    }
}

impl<'de> Deserialize<'de> for PerformanceDeductions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Structured {
                #[serde(default)]
                manual: Vec<Decimal>,
                #[serde(default)]
                performance_audit: Decimal,
            },
            Legacy(Vec<Option<Decimal>>),
        }

        Ok(match Stored::deserialize(deserializer)? {
            Stored::Structured {
                manual,
                performance_audit,
            } => PerformanceDeductions {
                manual,
                performance_audit,
            },
            Stored::Legacy(slots) => {
                let mut deductions = PerformanceDeductions::default();
                for (idx, value) in slots.into_iter().enumerate() {
                    let value = value.unwrap_or_default();
                    if idx == LEGACY_AUDIT_SLOT {
                        deductions.performance_audit = value;
                    } else if !value.is_zero() {
                        deductions.manual.push(value);
                    }
                }
                deductions
            }
        })
    }
}

/// One payroll row per (employee name, month).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MonthlySalaryRecord {
    /// Absent until the row has been inserted.
    pub id: Option<u64>,
    pub name: String,
    pub department: String,
    pub id_card: String,
    #[sqlx(rename = "type")]
    pub employee_type: String,

    /// First day of the payroll month.
    #[schema(value_type = String, format = "date", example = "2025-07-01")]
    pub year_month: NaiveDate,

    #[schema(value_type = String)]
    pub base_salary: Decimal,
    #[schema(value_type = String)]
    pub temporary_increase: Decimal,
    pub temporary_increase_item: Option<String>,
    #[schema(value_type = String)]
    pub attendance_deduction: Decimal,
    #[schema(value_type = String)]
    pub basic_salary_payable: Decimal,
    #[schema(value_type = String)]
    pub full_attendance: Decimal,
    #[schema(value_type = String)]
    pub department_head_subsidy: Decimal,
    #[schema(value_type = String)]
    pub position_allowance: Decimal,
    #[schema(value_type = String)]
    pub oil_subsidy: Decimal,
    #[schema(value_type = String)]
    pub meal_subsidy: Decimal,
    #[schema(value_type = String)]
    pub seniority: Decimal,
    #[schema(value_type = String)]
    pub agency_fee_commission: Decimal,

    /// Performance commission before deductions. `None` on rows written before it was tracked.
    #[schema(value_type = Option<String>)]
    pub performance_commission_base: Option<Decimal>,
    /// Performance commission after the deduction fraction.
    #[schema(value_type = String)]
    pub performance_commission: Decimal,
    #[schema(value_type = PerformanceDeductions)]
    pub performance_deductions: Json<PerformanceDeductions>,

    #[schema(value_type = String)]
    pub business_commission: Decimal,
    #[schema(value_type = String)]
    pub other_deductions: Decimal,
    #[schema(value_type = String)]
    pub personal_medical: Decimal,
    #[schema(value_type = String)]
    pub personal_pension: Decimal,
    #[schema(value_type = String)]
    pub personal_unemployment: Decimal,
    #[schema(value_type = String)]
    pub personal_insurance_total: Decimal,
    #[schema(value_type = String)]
    pub company_insurance_total: Decimal,
    #[schema(value_type = String)]
    pub deposit_deduction: Decimal,
    #[schema(value_type = String)]
    pub personal_income_tax: Decimal,
    #[schema(value_type = String)]
    pub other: Decimal,
    #[schema(value_type = String)]
    pub total_payable: Decimal,
    #[schema(value_type = String)]
    pub bank_card_or_wechat: Decimal,
    #[schema(value_type = String)]
    pub cash_paid: Decimal,
    #[schema(value_type = String)]
    pub corporate_payment: Decimal,
    #[schema(value_type = String)]
    pub tax_declaration: Decimal,

    pub bank_card_number: String,
    pub company: String,

    pub is_confirmed: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub confirmed_at: Option<NaiveDateTime>,
}
