//! Movement primitives.
//!
//! A [`Movement`] is a single income or expense record owned by one user.
//! Movements enter the system as [`MovementStatus::Pending`] and are later
//! classified or closed by a person, optionally naming who is responsible
//! for them.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Income,
    Expense,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Label used to build the default description of a movement.
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Ingreso",
            Self::Expense => "Gasto",
        }
    }
}

impl TryFrom<&str> for MovementKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidKind(format!(
                "unknown movement type: {other}"
            ))),
        }
    }
}

/// Review state of a movement.
///
/// `Pending` is the only entry state. Once a movement leaves it, it can move
/// between `Classified` and `Closed` but never back to `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Pending,
    Classified,
    Closed,
}

impl MovementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Classified => "classified",
            Self::Closed => "closed",
        }
    }

    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    /// Checks whether `self -> next` is an allowed transition.
    pub fn can_transition_to(self, next: MovementStatus) -> bool {
        !(next.is_pending() && !self.is_pending())
    }

    pub(crate) fn ensure_transition(self, next: MovementStatus) -> ResultEngine<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        Err(EngineError::InvalidTransition(format!(
            "{} movement cannot return to {}",
            self.as_str(),
            next.as_str()
        )))
    }
}

impl TryFrom<&str> for MovementStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "classified" => Ok(Self::Classified),
            "closed" => Ok(Self::Closed),
            other => Err(EngineError::InvalidStatus(format!(
                "unknown status: {other}"
            ))),
        }
    }
}

/// Builds the description used when the caller leaves it blank, e.g.
/// `Gasto del 2024-01-01`.
pub fn default_description(kind: MovementKind, date: NaiveDate) -> String {
    format!("{} del {}", kind.label(), date.format("%Y-%m-%d"))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub user_id: String,
    pub kind: MovementKind,
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub responsible: Option<String>,
    pub business_unit_id: Option<Uuid>,
    pub status: MovementStatus,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    /// Builds a new pending movement.
    ///
    /// Rejects amounts outside `1..=Money::MAX_MOVEMENT` and fills the description when blank.
    pub fn new(
        user_id: String,
        kind: MovementKind,
        amount: Money,
        date: NaiveDate,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let amount = amount.ensure_movement_amount()?;
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_description(kind, date));
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            currency: Currency::Crc,
            description,
            responsible: None,
            business_unit_id: None,
            status: MovementStatus::Pending,
            date,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub responsible: Option<String>,
    pub business_unit_id: Option<Uuid>,
    pub status: String,
    pub date: Date,
    /// JSON array of tag names.
    pub tags: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::business_units::Entity",
        from = "Column::BusinessUnitId",
        to = "super::business_units::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    BusinessUnit,
}

impl Related<super::business_units::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn encode_tags(tags: &[String]) -> ResultEngine<String> {
    serde_json::to_string(tags)
        .map_err(|err| EngineError::InvalidName(format!("invalid tags: {err}")))
}

fn decode_tags(raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(tags) => tags,
        Err(err) => {
            tracing::warn!("ignoring malformed tags column: {err}");
            Vec::new()
        }
    }
}

impl TryFrom<&Movement> for ActiveModel {
    type Error = EngineError;

    fn try_from(movement: &Movement) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(movement.id),
            user_id: ActiveValue::Set(movement.user_id.clone()),
            kind: ActiveValue::Set(movement.kind.as_str().to_string()),
            amount: ActiveValue::Set(movement.amount.units()),
            currency: ActiveValue::Set(movement.currency.code().to_string()),
            description: ActiveValue::Set(movement.description.clone()),
            responsible: ActiveValue::Set(movement.responsible.clone()),
            business_unit_id: ActiveValue::Set(movement.business_unit_id),
            status: ActiveValue::Set(movement.status.as_str().to_string()),
            date: ActiveValue::Set(movement.date),
            tags: ActiveValue::Set(encode_tags(&movement.tags)?),
            created_at: ActiveValue::Set(movement.created_at),
            updated_at: ActiveValue::Set(movement.updated_at),
        })
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: MovementKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount),
            currency: model_currency(&model.currency)?,
            description: model.description,
            responsible: model.responsible,
            business_unit_id: model.business_unit_id,
            status: MovementStatus::try_from(model.status.as_str())?,
            date: model.date,
            tags: decode_tags(&model.tags),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_description_uses_spanish_label() {
        assert_eq!(
            default_description(MovementKind::Expense, date(2024, 1, 1)),
            "Gasto del 2024-01-01"
        );
        assert_eq!(
            default_description(MovementKind::Income, date(2026, 1, 20)),
            "Ingreso del 2026-01-20"
        );
    }

    #[test]
    fn new_movement_starts_pending() {
        let movement = Movement::new(
            "uid".to_string(),
            MovementKind::Income,
            Money::new(1000),
            date(2026, 1, 15),
            Some("   ".to_string()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(movement.status, MovementStatus::Pending);
        assert_eq!(movement.description, "Ingreso del 2026-01-15");
        assert!(movement.tags.is_empty());
        assert_eq!(movement.currency, Currency::Crc);
    }

    #[test]
    fn new_movement_rejects_out_of_range_amount() {
        for units in [0, -5, Money::MAX_MOVEMENT.units() + 1] {
            let err = Movement::new(
                "uid".to_string(),
                MovementKind::Expense,
                Money::new(units),
                date(2026, 1, 15),
                None,
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::InvalidAmount(_)));
        }
    }

    #[test]
    fn status_never_returns_to_pending() {
        use MovementStatus::*;
        assert!(Pending.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Classified));
        assert!(Pending.can_transition_to(Closed));
        assert!(Classified.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Classified));
        assert!(!Classified.can_transition_to(Pending));
        assert!(!Closed.can_transition_to(Pending));
        assert!(matches!(
            Closed.ensure_transition(Pending),
            Err(EngineError::InvalidTransition(_))
        ));
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!(MovementKind::try_from("income").unwrap(), MovementKind::Income);
        assert!(MovementKind::try_from("transfer").is_err());
        assert_eq!(
            MovementStatus::try_from("closed").unwrap(),
            MovementStatus::Closed
        );
        assert!(matches!(
            MovementStatus::try_from("archived"),
            Err(EngineError::InvalidStatus(_))
        ));
    }
}
