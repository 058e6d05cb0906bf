use chrono::NaiveDate;
use sea_orm::{QueryFilter, prelude::*};

use crate::{KpiSummary, Movement, Period, ResultEngine, kpis::summarize, movements};

use super::Engine;

impl Engine {
    /// KPI summary of the user's movements for `period` (all movements when
    /// `None`), resolved against today in the engine timezone.
    pub async fn kpi_summary(
        &self,
        user_id: &str,
        period: Option<Period>,
    ) -> ResultEngine<KpiSummary> {
        self.kpi_summary_at(user_id, period, self.today()).await
    }

    /// Same as [`Engine::kpi_summary`] with an explicit "today".
    pub async fn kpi_summary_at(
        &self,
        user_id: &str,
        period: Option<Period>,
        today: NaiveDate,
    ) -> ResultEngine<KpiSummary> {
        let mut query = movements::Entity::find().filter(movements::Column::UserId.eq(user_id));
        if let Some(period) = period {
            let range = period.range(today)?;
            query = query.filter(movements::Column::Date.between(range.start, range.end));
        }

        let movements = query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Movement::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(
            user_id,
            period = period.map(Period::as_str),
            movements = movements.len(),
            "computing KPI summary"
        );
        Ok(summarize(period, &movements))
    }
}
