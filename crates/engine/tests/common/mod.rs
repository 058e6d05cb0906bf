#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{Currency, Engine, Money, MovementKind, NewMovementCmd};
use migration::MigratorTrait;

pub const ALICE: &str = "uid-alice";
pub const BOB: &str = "uid-bob";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn new_movement(user_id: &str, kind: MovementKind, units: i64, on: NaiveDate) -> NewMovementCmd {
    NewMovementCmd {
        user_id: user_id.to_string(),
        kind,
        amount: Money::new(units),
        currency: Currency::Crc,
        description: None,
        status: None,
        date: Some(on),
        responsible: None,
        business_unit_id: None,
        tags: Vec::new(),
    }
}
