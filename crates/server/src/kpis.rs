use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
};
use engine::Period;

use crate::{
    ServerError,
    identity::Identity,
    server::ServerState,
    types::kpi::{BreakdownEntry, KpiQuery, KpiSummary},
};

fn breakdown_view(entries: Vec<engine::BreakdownEntry>) -> Vec<BreakdownEntry> {
    entries
        .into_iter()
        .map(|entry| BreakdownEntry {
            name: entry.name,
            value: entry.value,
        })
        .collect()
}

pub(crate) async fn summary(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    query: Result<Query<KpiQuery>, QueryRejection>,
) -> Result<Json<KpiSummary>, ServerError> {
    let Query(query) = query?;
    let period = query.period.as_deref().map(Period::try_from).transpose()?;

    let summary = state.engine.kpi_summary(&identity.uid, period).await?;

    Ok(Json(KpiSummary {
        period: summary.period.map(|p| p.as_str().to_string()),
        balance: summary.balance,
        total_income: summary.total_income,
        total_expense: summary.total_expense,
        movement_count: summary.movement_count,
        pending_count: summary.pending_count,
        breakdown_type: breakdown_view(summary.breakdown_type),
        breakdown_responsible: breakdown_view(summary.breakdown_responsible),
    }))
}
