//! Domain engine for SUMA.
//!
//! The engine owns the movement store, the KPI aggregator and the small
//! catalogs (business units, tags) that movements reference. Every write goes
//! through [`Engine`], which wraps a sea-orm connection and runs each
//! operation in its own database transaction.

pub use business_units::{BusinessUnit, BusinessUnitKind};
pub use currency::Currency;
pub use error::EngineError;
pub use kpis::{BreakdownEntry, KpiSummary, UNASSIGNED_RESPONSIBLE, summarize};
pub use money::Money;
pub use movements::{Movement, MovementKind, MovementStatus, default_description};
pub use ops::{
    DEFAULT_TIMEZONE, Engine, EngineBuilder, MovementListFilter, NewMovementCmd,
    RegisterUserCmd, SeedReport, UpdateMovementCmd,
};
pub use period::{DateRange, Period};
pub use tags::Tag;
pub use users::User;
pub use util::parse_uuid;

mod business_units;
mod currency;
mod error;
mod kpis;
mod money;
mod movements;
mod ops;
mod period;
mod tags;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
