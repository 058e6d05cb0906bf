use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::BusinessUnitKind;

use crate::{
    ServerError,
    server::ServerState,
    types::catalog::{BusinessUnit, BusinessUnitNew, BusinessUnitType, Tag, TagNew},
};

fn kind_from_view(kind: BusinessUnitType) -> BusinessUnitKind {
    match kind {
        BusinessUnitType::Branch => BusinessUnitKind::Branch,
        BusinessUnitType::Brand => BusinessUnitKind::Brand,
        BusinessUnitType::Event => BusinessUnitKind::Event,
        BusinessUnitType::Other => BusinessUnitKind::Other,
    }
}

fn kind_to_view(kind: BusinessUnitKind) -> BusinessUnitType {
    match kind {
        BusinessUnitKind::Branch => BusinessUnitType::Branch,
        BusinessUnitKind::Brand => BusinessUnitType::Brand,
        BusinessUnitKind::Event => BusinessUnitType::Event,
        BusinessUnitKind::Other => BusinessUnitType::Other,
    }
}

fn business_unit_view(unit: engine::BusinessUnit) -> BusinessUnit {
    BusinessUnit {
        id: unit.id,
        name: unit.name,
        kind: kind_to_view(unit.kind),
        created_at: unit.created_at,
    }
}

fn tag_view(tag: engine::Tag) -> Tag {
    Tag {
        id: tag.id,
        name: tag.name,
        created_at: tag.created_at,
    }
}

pub(crate) async fn list_business_units(
    State(state): State<ServerState>,
) -> Result<Json<Vec<BusinessUnit>>, ServerError> {
    let units = state.engine.list_business_units().await?;
    Ok(Json(units.into_iter().map(business_unit_view).collect()))
}

pub(crate) async fn create_business_unit(
    State(state): State<ServerState>,
    payload: Result<Json<BusinessUnitNew>, JsonRejection>,
) -> Result<(StatusCode, Json<BusinessUnit>), ServerError> {
    let Json(payload) = payload?;
    let unit = state
        .engine
        .create_business_unit(&payload.name, kind_from_view(payload.kind))
        .await?;
    tracing::info!(business_unit_id = %unit.id, "business unit created");
    Ok((StatusCode::CREATED, Json(business_unit_view(unit))))
}

pub(crate) async fn list_tags(
    State(state): State<ServerState>,
) -> Result<Json<Vec<Tag>>, ServerError> {
    let tags = state.engine.list_tags().await?;
    Ok(Json(tags.into_iter().map(tag_view).collect()))
}

pub(crate) async fn create_tag(
    State(state): State<ServerState>,
    payload: Result<Json<TagNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Tag>), ServerError> {
    let Json(payload) = payload?;
    let tag = state.engine.create_tag(&payload.name).await?;
    tracing::info!(tag_id = %tag.id, "tag created");
    Ok((StatusCode::CREATED, Json(tag_view(tag))))
}
