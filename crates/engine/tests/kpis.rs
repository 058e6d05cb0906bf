mod common;

use chrono::NaiveDate;
use engine::{Engine, Money, MovementKind, MovementStatus, Period, UNASSIGNED_RESPONSIBLE};

use common::{ALICE, BOB, date, engine_with_db, new_movement};

async fn income_for(engine: &Engine, period: Option<Period>, today: NaiveDate) -> i128 {
    engine
        .kpi_summary_at(ALICE, period, today)
        .await
        .unwrap()
        .total_income
}

#[tokio::test]
async fn summary_totals_and_counts() {
    let (engine, _db) = engine_with_db().await;
    let today = date(2026, 1, 21);

    let income = engine
        .create_movement(new_movement(ALICE, MovementKind::Income, 45_000, today))
        .await
        .unwrap();
    engine
        .create_movement(new_movement(ALICE, MovementKind::Expense, 12_000, today))
        .await
        .unwrap();
    engine
        .create_movement(new_movement(BOB, MovementKind::Income, 99_000, today))
        .await
        .unwrap();
    engine
        .classify_movement(ALICE, income.id, MovementStatus::Classified, Some("Maria"))
        .await
        .unwrap();

    let summary = engine
        .kpi_summary_at(ALICE, Some(Period::Today), today)
        .await
        .unwrap();

    assert_eq!(summary.period, Some(Period::Today));
    assert_eq!(summary.total_income, 45_000);
    assert_eq!(summary.total_expense, 12_000);
    assert_eq!(summary.balance, 33_000);
    assert_eq!(summary.movement_count, 2);
    assert_eq!(summary.pending_count, 1);

    let responsible: Vec<(&str, i128)> = summary
        .breakdown_responsible
        .iter()
        .map(|e| (e.name.as_str(), e.value))
        .collect();
    assert_eq!(
        responsible,
        vec![("Maria", 45_000), (UNASSIGNED_RESPONSIBLE, 12_000)]
    );
}

#[tokio::test]
async fn periods_filter_on_movement_date() {
    let (engine, _db) = engine_with_db().await;
    // Wednesday.
    let today = date(2026, 1, 21);

    for (units, on) in [
        (1_000, today),
        // Monday of the same ISO week.
        (2_000, date(2026, 1, 19)),
        // Previous Sunday, same month.
        (4_000, date(2026, 1, 18)),
        // Previous month.
        (8_000, date(2025, 12, 31)),
    ] {
        engine
            .create_movement(new_movement(ALICE, MovementKind::Income, units, on))
            .await
            .unwrap();
    }

    assert_eq!(income_for(&engine, Some(Period::Today), today).await, 1_000);
    assert_eq!(income_for(&engine, Some(Period::Week), today).await, 3_000);
    assert_eq!(income_for(&engine, Some(Period::Month), today).await, 7_000);
    assert_eq!(income_for(&engine, None, today).await, 15_000);
}

#[tokio::test]
async fn empty_summary_is_zero() {
    let (engine, _db) = engine_with_db().await;

    let summary = engine
        .kpi_summary(ALICE, Some(Period::Month))
        .await
        .unwrap();

    assert_eq!(summary.balance, 0);
    assert_eq!(summary.movement_count, 0);
    assert_eq!(summary.pending_count, 0);
    assert!(summary.breakdown_responsible.is_empty());
    assert_eq!(summary.breakdown_type.len(), 2);
    assert!(summary.breakdown_type.iter().all(|e| e.value == 0));
}

#[tokio::test]
async fn balance_matches_totals_after_seed() {
    let (engine, _db) = engine_with_db().await;
    engine.seed_demo(ALICE).await.unwrap();

    let summary = engine.kpi_summary(ALICE, None).await.unwrap();

    assert_eq!(
        summary.balance,
        summary.total_income - summary.total_expense
    );
    assert_eq!(summary.total_income, 152_000);
    assert_eq!(summary.total_expense, 20_500);
    assert_eq!(summary.movement_count, 5);
    assert_eq!(summary.pending_count, 3);
    assert!(summary.pending_count <= summary.movement_count);
}

#[tokio::test]
async fn summary_of_largest_amounts_does_not_fail() {
    let (engine, _db) = engine_with_db().await;
    let today = date(2026, 1, 21);
    let max = Money::MAX_MOVEMENT.units();

    for kind in [MovementKind::Income, MovementKind::Income, MovementKind::Expense] {
        engine
            .create_movement(new_movement(ALICE, kind, max, today))
            .await
            .unwrap();
    }

    let summary = engine
        .kpi_summary_at(ALICE, Some(Period::Today), today)
        .await
        .unwrap();
    assert_eq!(summary.total_income, 2 * i128::from(max));
    assert_eq!(summary.total_expense, i128::from(max));
    assert_eq!(summary.balance, i128::from(max));
    assert_eq!(
        summary.breakdown_responsible[0].value,
        3 * i128::from(max)
    );
}
