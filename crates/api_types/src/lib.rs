use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Deserializes a field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default)]`: a missing key stays `None`, an explicit
/// `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub mod movement {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MovementType {
        Income,
        Expense,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MovementStatus {
        Pending,
        Classified,
        Closed,
    }

    /// Query string of `GET /v1/movements`.
    ///
    /// `status` and `type` are kept as text so unknown values are reported
    /// with a `detail` body. `status=all` is the same as no status.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MovementListQuery {
        pub status: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementNew {
        #[serde(rename = "type")]
        pub kind: MovementType,
        /// Whole colones. Kept as the raw JSON number so integers are read
        /// exactly; must be integral, > 0 and at most `2^53 - 1`.
        pub amount: serde_json::Number,
        /// Defaults to `CRC`, the only accepted value.
        pub currency: Option<String>,
        pub description: Option<String>,
        /// Must be `pending` when given.
        pub status: Option<MovementStatus>,
        /// Defaults to today in the server timezone.
        pub date: Option<NaiveDate>,
        #[serde(default)]
        pub tags: Vec<String>,
        pub responsible: Option<String>,
        pub business_unit_id: Option<Uuid>,
    }

    /// Partial update of a movement. Missing keys are left untouched.
    ///
    /// `responsible` and `business_unit_id` are cleared by an explicit
    /// `null`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MovementUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub status: Option<MovementStatus>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub responsible: Option<Option<String>>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<MovementType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<serde_json::Number>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub currency: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub business_unit_id: Option<Option<Uuid>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub tags: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Movement {
        pub id: Uuid,
        #[serde(rename = "type")]
        pub kind: MovementType,
        pub amount: i64,
        pub currency: String,
        pub description: String,
        pub date: NaiveDate,
        pub status: MovementStatus,
        pub responsible: Option<String>,
        pub business_unit_id: Option<Uuid>,
        pub tags: Vec<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementDeleted {
        pub deleted: bool,
    }
}

pub mod kpi {
    use super::*;

    /// Query string of `GET /v1/kpis/summary`: `today`, `week` or `month`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct KpiQuery {
        pub period: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BreakdownEntry {
        pub name: String,
        pub value: i128,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct KpiSummary {
        /// Echo of the requested period, `null` when unscoped.
        pub period: Option<String>,
        pub balance: i128,
        pub total_income: i128,
        pub total_expense: i128,
        pub movement_count: u64,
        pub pending_count: u64,
        pub breakdown_type: Vec<BreakdownEntry>,
        pub breakdown_responsible: Vec<BreakdownEntry>,
    }
}

pub mod auth {
    use super::*;

    /// Optional profile overrides sent on registration.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub display_name: Option<String>,
        pub photo_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: String,
        pub email: Option<String>,
        pub phone_number: Option<String>,
        pub display_name: Option<String>,
        pub photo_url: Option<String>,
        pub created_at: DateTime<Utc>,
        pub last_login_at: DateTime<Utc>,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BusinessUnitType {
        Branch,
        Brand,
        Event,
        #[default]
        Other,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessUnitNew {
        pub name: String,
        #[serde(rename = "type", default)]
        pub kind: BusinessUnitType,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessUnit {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: BusinessUnitType,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Tag {
        pub id: Uuid,
        pub name: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub app: String,
        pub version: String,
        /// `configured` or `not_configured`.
        pub identity: String,
    }
}
