use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BusinessUnitKind, EngineError, Money, Movement, MovementKind, MovementStatus, ResultEngine,
    business_units, movements, tags, util::normalize_key,
};

use super::{Engine, with_tx};

/// Outcome of [`Engine::seed_demo`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// `true` when the user already had movements and nothing was written.
    pub already_seeded: bool,
    pub movements: u64,
    pub business_units: u64,
    pub tags: u64,
}

struct DemoMovement {
    kind: MovementKind,
    amount: i64,
    description: &'static str,
    responsible: Option<&'static str>,
    unit: Option<usize>,
    status: MovementStatus,
    date: (i32, u32, u32),
    tag: &'static str,
}

const DEMO_UNITS: [(&str, BusinessUnitKind); 2] = [
    ("Sucursal Centro", BusinessUnitKind::Branch),
    ("Feria del Agricultor", BusinessUnitKind::Event),
];

const DEMO_TAGS: [&str; 3] = ["SINPE", "Efectivo", "Proveedor"];

const DEMO_MOVEMENTS: [DemoMovement; 5] = [
    DemoMovement {
        kind: MovementKind::Income,
        amount: 45_000,
        description: "Venta de cafe molido",
        responsible: Some("Maria"),
        unit: Some(0),
        status: MovementStatus::Classified,
        date: (2026, 1, 15),
        tag: "SINPE",
    },
    DemoMovement {
        kind: MovementKind::Expense,
        amount: 12_000,
        description: "Compra de bolsas",
        responsible: None,
        unit: Some(0),
        status: MovementStatus::Pending,
        date: (2026, 1, 16),
        tag: "Proveedor",
    },
    DemoMovement {
        kind: MovementKind::Income,
        amount: 75_000,
        description: "Ventas feria sabado",
        responsible: Some("Carlos"),
        unit: Some(1),
        status: MovementStatus::Pending,
        date: (2026, 1, 18),
        tag: "Efectivo",
    },
    DemoMovement {
        kind: MovementKind::Expense,
        amount: 8_500,
        description: "Gasolina transporte",
        responsible: Some("Carlos"),
        unit: Some(1),
        status: MovementStatus::Classified,
        date: (2026, 1, 18),
        tag: "Efectivo",
    },
    DemoMovement {
        kind: MovementKind::Income,
        amount: 32_000,
        description: "Pedido especial empanadas",
        responsible: Some("Maria"),
        unit: None,
        status: MovementStatus::Pending,
        date: (2026, 1, 20),
        tag: "SINPE",
    },
];

impl Engine {
    /// Loads a small demo dataset for `user_id`.
    ///
    /// Does nothing when the user already has movements. Business units are
    /// always created fresh; tags are only created when missing.
    pub async fn seed_demo(&self, user_id: &str) -> ResultEngine<SeedReport> {
        let report = with_tx!(self, |db_tx| {
            let existing = movements::Entity::find()
                .filter(movements::Column::UserId.eq(user_id))
                .count(&db_tx)
                .await?;
            if existing > 0 {
                return Ok(SeedReport {
                    already_seeded: true,
                    movements: existing,
                    ..Default::default()
                });
            }

            let now = Utc::now();
            let mut report = SeedReport::default();

            let mut unit_ids = Vec::with_capacity(DEMO_UNITS.len());
            for (name, kind) in DEMO_UNITS {
                let id = Uuid::new_v4();
                business_units::ActiveModel {
                    id: ActiveValue::Set(id),
                    name: ActiveValue::Set(name.to_string()),
                    kind: ActiveValue::Set(kind.as_str().to_string()),
                    created_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;
                unit_ids.push(id);
                report.business_units += 1;
            }

            for name in DEMO_TAGS {
                let Some(name_norm) = normalize_key(name) else {
                    continue;
                };
                let exists = tags::Entity::find()
                    .filter(tags::Column::NameNorm.eq(name_norm.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    continue;
                }
                tags::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    name: ActiveValue::Set(name.to_string()),
                    name_norm: ActiveValue::Set(name_norm),
                    created_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;
                report.tags += 1;
            }

            for demo in &DEMO_MOVEMENTS {
                let (y, m, d) = demo.date;
                let date = NaiveDate::from_ymd_opt(y, m, d)
                    .ok_or_else(|| EngineError::InvalidFilter("invalid demo date".to_string()))?;
                let mut movement = Movement::new(
                    user_id.to_string(),
                    demo.kind,
                    Money::new(demo.amount),
                    date,
                    Some(demo.description.to_string()),
                    now,
                )?;
                movement.status = demo.status;
                movement.responsible = demo.responsible.map(ToString::to_string);
                movement.business_unit_id = demo.unit.and_then(|idx| unit_ids.get(idx).copied());
                movement.tags = vec![demo.tag.to_string()];
                movements::ActiveModel::try_from(&movement)?
                    .insert(&db_tx)
                    .await?;
                report.movements += 1;
            }

            Ok::<SeedReport, EngineError>(report)
        })?;

        tracing::info!(
            user_id,
            already_seeded = report.already_seeded,
            movements = report.movements,
            "demo data seeded"
        );
        Ok(report)
    }
}
