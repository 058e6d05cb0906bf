//! KPI aggregation over a set of movements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Movement, MovementKind, Period};

/// Name used in the responsible breakdown for movements nobody claimed.
pub const UNASSIGNED_RESPONSIBLE: &str = "Sin responsable";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub name: String,
    /// Whole colones.
    pub value: i128,
}

/// Totals and breakdowns for a period.
///
/// The values of each breakdown add up to `total_income + total_expense`.
/// Sums are `i128`: movement amounts are capped at `Money::MAX_MOVEMENT`, so
/// no realistic number of movements can overflow them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub period: Option<Period>,
    pub balance: i128,
    pub total_income: i128,
    pub total_expense: i128,
    pub movement_count: u64,
    pub pending_count: u64,
    pub breakdown_type: Vec<BreakdownEntry>,
    pub breakdown_responsible: Vec<BreakdownEntry>,
}

/// Folds movements into a [`KpiSummary`].
///
/// An empty input yields zero totals, two zero-valued type entries and no
/// responsible entries.
pub fn summarize<'a, I>(period: Option<Period>, movements: I) -> KpiSummary
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut total_income = 0i128;
    let mut total_expense = 0i128;
    let mut movement_count = 0u64;
    let mut pending_count = 0u64;
    let mut by_responsible: HashMap<&str, i128> = HashMap::new();

    for movement in movements {
        let amount = i128::from(movement.amount.units());
        match movement.kind {
            MovementKind::Income => total_income += amount,
            MovementKind::Expense => total_expense += amount,
        }
        movement_count += 1;
        if movement.status.is_pending() {
            pending_count += 1;
        }

        let name = movement
            .responsible
            .as_deref()
            .unwrap_or(UNASSIGNED_RESPONSIBLE);
        *by_responsible.entry(name).or_insert(0) += amount;
    }

    let balance = total_income - total_expense;

    let breakdown_type = vec![
        BreakdownEntry {
            name: MovementKind::Income.as_str().to_string(),
            value: total_income,
        },
        BreakdownEntry {
            name: MovementKind::Expense.as_str().to_string(),
            value: total_expense,
        },
    ];

    let mut breakdown_responsible: Vec<BreakdownEntry> = by_responsible
        .into_iter()
        .map(|(name, value)| BreakdownEntry {
            name: name.to_string(),
            value,
        })
        .collect();
    breakdown_responsible.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    KpiSummary {
        period,
        balance,
        total_income,
        total_expense,
        movement_count,
        pending_count,
        breakdown_type,
        breakdown_responsible,
    }
}
