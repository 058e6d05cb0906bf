use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{
    Currency, EngineError, Money, MovementKind, MovementListFilter, MovementStatus,
    NewMovementCmd, UpdateMovementCmd, parse_uuid,
};

use crate::{
    ServerError,
    identity::Identity,
    server::ServerState,
    types::movement::{
        Movement, MovementDeleted, MovementListQuery, MovementNew, MovementType, MovementUpdate,
    },
};

use api_types::movement::MovementStatus as MovementStatusView;

fn kind_from_view(kind: MovementType) -> MovementKind {
    match kind {
        MovementType::Income => MovementKind::Income,
        MovementType::Expense => MovementKind::Expense,
    }
}

fn kind_to_view(kind: MovementKind) -> MovementType {
    match kind {
        MovementKind::Income => MovementType::Income,
        MovementKind::Expense => MovementType::Expense,
    }
}

fn status_from_view(status: MovementStatusView) -> MovementStatus {
    match status {
        MovementStatusView::Pending => MovementStatus::Pending,
        MovementStatusView::Classified => MovementStatus::Classified,
        MovementStatusView::Closed => MovementStatus::Closed,
    }
}

fn status_to_view(status: MovementStatus) -> MovementStatusView {
    match status {
        MovementStatus::Pending => MovementStatusView::Pending,
        MovementStatus::Classified => MovementStatusView::Classified,
        MovementStatus::Closed => MovementStatusView::Closed,
    }
}

pub(crate) fn movement_view(movement: engine::Movement) -> Movement {
    Movement {
        id: movement.id,
        kind: kind_to_view(movement.kind),
        amount: movement.amount.units(),
        currency: movement.currency.code().to_string(),
        description: movement.description,
        date: movement.date,
        status: status_to_view(movement.status),
        responsible: movement.responsible,
        business_unit_id: movement.business_unit_id,
        tags: movement.tags,
        created_at: movement.created_at,
        updated_at: movement.updated_at,
    }
}

fn parse_currency(code: Option<&str>) -> Result<Currency, EngineError> {
    code.map(Currency::try_from)
        .transpose()
        .map(|currency| currency.unwrap_or(Currency::Crc))
}

/// `all` and a missing parameter both mean "every status".
fn list_filter(query: MovementListQuery) -> Result<MovementListFilter, EngineError> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(value) => Some(MovementStatus::try_from(value)?),
    };
    let kind = query
        .kind
        .as_deref()
        .map(MovementKind::try_from)
        .transpose()?;
    Ok(MovementListFilter {
        status,
        kind,
        limit: query.limit,
        offset: query.offset.unwrap_or(0),
    })
}

pub(crate) async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    query: Result<Query<MovementListQuery>, QueryRejection>,
) -> Result<Json<Vec<Movement>>, ServerError> {
    let Query(query) = query?;
    let filter = list_filter(query)?;

    let movements = state.engine.list_movements(&identity.uid, &filter).await?;
    Ok(Json(movements.into_iter().map(movement_view).collect()))
}

pub(crate) async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Movement>, ServerError> {
    let movement_id = parse_uuid(&id, "movement")?;
    let movement = state.engine.movement(&identity.uid, movement_id).await?;
    Ok(Json(movement_view(movement)))
}

pub(crate) async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    payload: Result<Json<MovementNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Movement>), ServerError> {
    let Json(payload) = payload?;
    let currency = parse_currency(payload.currency.as_deref())?;
    let amount = Money::positive_from_number(&payload.amount, currency)?;

    let movement = state
        .engine
        .create_movement(NewMovementCmd {
            user_id: identity.uid,
            kind: kind_from_view(payload.kind),
            amount,
            currency,
            description: payload.description,
            status: payload.status.map(status_from_view),
            date: payload.date,
            responsible: payload.responsible,
            business_unit_id: payload.business_unit_id,
            tags: payload.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(movement_view(movement))))
}

pub(crate) async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<MovementUpdate>, JsonRejection>,
) -> Result<Json<Movement>, ServerError> {
    let movement_id = parse_uuid(&id, "movement")?;
    let Json(payload) = payload?;
    let currency = parse_currency(payload.currency.as_deref())?;
    let amount = payload
        .amount
        .map(|amount| Money::positive_from_number(&amount, currency))
        .transpose()?;

    let movement = state
        .engine
        .update_movement(UpdateMovementCmd {
            user_id: identity.uid,
            movement_id,
            kind: payload.kind.map(kind_from_view),
            amount,
            description: payload.description,
            responsible: payload.responsible,
            business_unit_id: payload.business_unit_id,
            status: payload.status.map(status_from_view),
            date: payload.date,
            tags: payload.tags,
        })
        .await?;

    Ok(Json(movement_view(movement)))
}

pub(crate) async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<MovementDeleted>, ServerError> {
    let movement_id = parse_uuid(&id, "movement")?;
    state.engine.delete_movement(&identity.uid, movement_id).await?;
    Ok(Json(MovementDeleted { deleted: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_status_means_unfiltered() {
        let filter = list_filter(MovementListQuery {
            status: Some("all".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.status, None);
        assert_eq!(filter.offset, 0);

        let filter = list_filter(MovementListQuery {
            status: Some("pending".to_string()),
            kind: Some("expense".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.status, Some(MovementStatus::Pending));
        assert_eq!(filter.kind, Some(MovementKind::Expense));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = list_filter(MovementListQuery {
            status: Some("archived".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStatus(_)));
    }

    #[test]
    fn currency_defaults_to_crc() {
        assert_eq!(parse_currency(None).unwrap(), Currency::Crc);
        assert_eq!(parse_currency(Some("CRC")).unwrap(), Currency::Crc);
        assert!(matches!(
            parse_currency(Some("USD")),
            Err(EngineError::CurrencyMismatch(_))
        ));
    }
}
