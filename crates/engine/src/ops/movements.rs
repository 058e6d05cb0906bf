use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, Movement, MovementKind, MovementStatus, ResultEngine,
    business_units, default_description, movements,
    util::{normalize_optional_text, normalize_tags},
};

use super::{Engine, with_tx};

pub const DEFAULT_LIST_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 200;

/// Filters for listing movements.
///
/// `status: None` means every status. Results are ordered newest first by
/// creation time.
#[derive(Clone, Debug, Default)]
pub struct MovementListFilter {
    pub status: Option<MovementStatus>,
    pub kind: Option<MovementKind>,
    /// Defaults to 50, capped at 200.
    pub limit: Option<u64>,
    pub offset: u64,
}

fn validate_list_filter(filter: &MovementListFilter) -> ResultEngine<u64> {
    let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 || limit > MAX_LIST_LIMIT {
        return Err(EngineError::InvalidFilter(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    Ok(limit)
}

/// Input for [`Engine::create_movement`].
#[derive(Clone, Debug)]
pub struct NewMovementCmd {
    pub user_id: String,
    pub kind: MovementKind,
    pub amount: Money,
    pub currency: Currency,
    pub description: Option<String>,
    /// Must be `pending` when given.
    pub status: Option<MovementStatus>,
    /// Defaults to today in the engine timezone.
    pub date: Option<NaiveDate>,
    pub responsible: Option<String>,
    pub business_unit_id: Option<Uuid>,
    pub tags: Vec<String>,
}

/// Partial update of a movement. `None` leaves a field untouched.
///
/// `responsible` and `business_unit_id` use a nested option: `Some(None)`
/// clears the field.
#[derive(Clone, Debug, Default)]
pub struct UpdateMovementCmd {
    pub user_id: String,
    pub movement_id: Uuid,
    pub kind: Option<MovementKind>,
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub responsible: Option<Option<String>>,
    pub business_unit_id: Option<Option<Uuid>>,
    pub status: Option<MovementStatus>,
    pub date: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

impl Engine {
    /// Records a new pending movement for `cmd.user_id`.
    ///
    /// Everything is validated before the insert: amount > 0, status (if
    /// given) is `pending`, and the business unit exists.
    pub async fn create_movement(&self, cmd: NewMovementCmd) -> ResultEngine<Movement> {
        if let Some(status) = cmd.status
            && !status.is_pending()
        {
            return Err(EngineError::InvalidStatus(format!(
                "new movements must be pending, got {}",
                status.as_str()
            )));
        }

        let date = cmd.date.unwrap_or_else(|| self.today());
        let mut movement = Movement::new(
            cmd.user_id,
            cmd.kind,
            cmd.amount,
            date,
            normalize_optional_text(cmd.description.as_deref()),
            Utc::now(),
        )?;
        movement.currency = cmd.currency;
        movement.responsible = normalize_optional_text(cmd.responsible.as_deref());
        movement.business_unit_id = cmd.business_unit_id;
        movement.tags = normalize_tags(cmd.tags);

        with_tx!(self, |db_tx| {
            if let Some(unit_id) = movement.business_unit_id {
                require_business_unit(&db_tx, unit_id).await?;
            }
            movements::ActiveModel::try_from(&movement)?
                .insert(&db_tx)
                .await?;
            Ok::<(), EngineError>(())
        })?;

        tracing::info!(
            movement_id = %movement.id,
            kind = movement.kind.as_str(),
            amount = movement.amount.units(),
            "movement created"
        );
        Ok(movement)
    }

    /// Lists the user's movements, newest first.
    pub async fn list_movements(
        &self,
        user_id: &str,
        filter: &MovementListFilter,
    ) -> ResultEngine<Vec<Movement>> {
        let limit = validate_list_filter(filter)?;

        let mut query = movements::Entity::find().filter(movements::Column::UserId.eq(user_id));
        if let Some(status) = filter.status {
            query = query.filter(movements::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(movements::Column::Kind.eq(kind.as_str()));
        }

        query
            .order_by_desc(movements::Column::CreatedAt)
            .order_by_desc(movements::Column::Id)
            .offset(filter.offset)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Movement::try_from)
            .collect()
    }

    /// Returns one movement owned by `user_id`.
    pub async fn movement(&self, user_id: &str, movement_id: Uuid) -> ResultEngine<Movement> {
        let model = require_movement(&self.database, user_id, movement_id).await?;
        Movement::try_from(model)
    }

    /// Applies a partial update.
    ///
    /// A movement that left `pending` cannot be set back to it. When the
    /// description was the generated label and the type or date change, the
    /// label is regenerated.
    pub async fn update_movement(&self, cmd: UpdateMovementCmd) -> ResultEngine<Movement> {
        if let Some(amount) = cmd.amount {
            amount.ensure_movement_amount()?;
        }

        let movement = with_tx!(self, |db_tx| {
            let model = require_movement(&db_tx, &cmd.user_id, cmd.movement_id).await?;
            let mut movement = Movement::try_from(model)?;
            let had_default_description =
                movement.description == default_description(movement.kind, movement.date);

            if let Some(status) = cmd.status {
                movement.status.ensure_transition(status)?;
                movement.status = status;
            }
            if let Some(kind) = cmd.kind {
                movement.kind = kind;
            }
            if let Some(amount) = cmd.amount {
                movement.amount = amount;
            }
            if let Some(date) = cmd.date {
                movement.date = date;
            }
            match cmd.description.as_deref() {
                Some(text) => {
                    movement.description = normalize_optional_text(Some(text))
                        .unwrap_or_else(|| default_description(movement.kind, movement.date));
                }
                None if had_default_description => {
                    movement.description = default_description(movement.kind, movement.date);
                }
                None => {}
            }
            if let Some(responsible) = &cmd.responsible {
                movement.responsible = normalize_optional_text(responsible.as_deref());
            }
            if let Some(unit) = cmd.business_unit_id {
                if let Some(unit_id) = unit {
                    require_business_unit(&db_tx, unit_id).await?;
                }
                movement.business_unit_id = unit;
            }
            if let Some(tags) = cmd.tags.clone() {
                movement.tags = normalize_tags(tags);
            }
            movement.updated_at = Utc::now();

            movements::ActiveModel::try_from(&movement)?
                .update(&db_tx)
                .await?;
            Ok::<Movement, EngineError>(movement)
        })?;

        tracing::info!(
            movement_id = %movement.id,
            status = movement.status.as_str(),
            "movement updated"
        );
        Ok(movement)
    }

    /// Claims a movement: sets a terminal status and the responsible person.
    ///
    /// `responsible` always overwrites the stored value; blank or `None`
    /// clears it.
    pub async fn classify_movement(
        &self,
        user_id: &str,
        movement_id: Uuid,
        status: MovementStatus,
        responsible: Option<&str>,
    ) -> ResultEngine<Movement> {
        if status.is_pending() {
            return Err(EngineError::InvalidStatus(
                "classification requires classified or closed".to_string(),
            ));
        }
        self.update_movement(UpdateMovementCmd {
            user_id: user_id.to_string(),
            movement_id,
            status: Some(status),
            responsible: Some(responsible.map(ToString::to_string)),
            ..Default::default()
        })
        .await
    }

    /// Deletes a movement owned by `user_id`.
    pub async fn delete_movement(&self, user_id: &str, movement_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = require_movement(&db_tx, user_id, movement_id).await?;
            movements::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok::<(), EngineError>(())
        })?;
        tracing::info!(movement_id = %movement_id, "movement deleted");
        Ok(())
    }
}

/// Loads a movement, hiding other users' rows behind the same not-found error.
async fn require_movement<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    movement_id: Uuid,
) -> ResultEngine<movements::Model> {
    movements::Entity::find_by_id(movement_id)
        .filter(movements::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("movement not exists".to_string()))
}

async fn require_business_unit<C: ConnectionTrait>(db: &C, unit_id: Uuid) -> ResultEngine<()> {
    business_units::Entity::find_by_id(unit_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| EngineError::KeyNotFound("business unit not exists".to_string()))
}
