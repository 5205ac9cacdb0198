//! Discount code and discount usage models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surgiguide_core::discount::{DiscountRules, DiscountType};
use surgiguide_core::error::CoreError;
use surgiguide_core::types::{DbId, Money, Timestamp};

/// A row from the `discount_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DiscountCode {
    pub id: DbId,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Money>,
    pub min_order_amount: Option<Money>,
    pub max_uses_total: Option<i32>,
    pub max_uses_per_client: Option<i32>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    pub is_active: bool,
    pub times_used: i32,
    #[serde(skip_serializing)]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DiscountCode {
    pub fn rules(&self) -> Result<DiscountRules, CoreError> {
        Ok(DiscountRules {
            discount_type: self.discount_type.parse::<DiscountType>()?,
            discount_value: self.discount_value,
            max_discount_amount: self.max_discount_amount,
            min_order_amount: self.min_order_amount,
            max_uses_total: self.max_uses_total,
            max_uses_per_client: self.max_uses_per_client,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active,
            times_used: self.times_used,
        })
    }
}

/// DTO for creating a discount code. `code` is stored upper-case.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiscountCode {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Money>,
    pub min_order_amount: Option<Money>,
    pub max_uses_total: Option<i32>,
    pub max_uses_per_client: Option<i32>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    pub is_active: Option<bool>,
}

impl CreateDiscountCode {
    pub fn rules(&self) -> DiscountRules {
        DiscountRules {
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            max_discount_amount: self.max_discount_amount,
            min_order_amount: self.min_order_amount,
            max_uses_total: self.max_uses_total,
            max_uses_per_client: self.max_uses_per_client,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active.unwrap_or(true),
            times_used: 0,
        }
    }
}

/// DTO for updating a discount code. Absent fields are left unchanged; the
/// code string and type are immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDiscountCode {
    pub description: Option<String>,
    pub discount_value: Option<Decimal>,
    pub max_discount_amount: Option<Money>,
    pub min_order_amount: Option<Money>,
    pub max_uses_total: Option<i32>,
    pub max_uses_per_client: Option<i32>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    pub is_active: Option<bool>,
}

impl UpdateDiscountCode {
    /// The rules the code would have after this update.
    pub fn merged_rules(&self, current: &DiscountRules) -> DiscountRules {
        DiscountRules {
            discount_type: current.discount_type,
            discount_value: self.discount_value.unwrap_or(current.discount_value),
            max_discount_amount: self.max_discount_amount.or(current.max_discount_amount),
            min_order_amount: self.min_order_amount.or(current.min_order_amount),
            max_uses_total: self.max_uses_total.or(current.max_uses_total),
            max_uses_per_client: self.max_uses_per_client.or(current.max_uses_per_client),
            valid_from: self.valid_from.or(current.valid_from),
            valid_until: self.valid_until.or(current.valid_until),
            is_active: self.is_active.unwrap_or(current.is_active),
            times_used: current.times_used,
        }
    }
}

/// A row from the `discount_usages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DiscountUsage {
    pub id: DbId,
    pub discount_code_id: DbId,
    pub client_profile_id: DbId,
    pub case_id: DbId,
    pub quote_id: DbId,
    pub original_amount: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub applied_at: Timestamp,
}

/// A usage about to be recorded.
#[derive(Debug, Clone)]
pub struct NewDiscountUsage {
    pub discount_code_id: DbId,
    pub client_profile_id: DbId,
    pub case_id: DbId,
    pub quote_id: DbId,
    pub original_amount: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
}
