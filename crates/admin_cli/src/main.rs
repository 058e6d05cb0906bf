use std::{error::Error, io::Write, path::PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{
    BusinessUnitKind, Currency, Engine, Money, Movement, MovementKind, MovementListFilter,
    MovementStatus, NewMovementCmd,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;

/// Page size used when walking every movement of a user.
const EXPORT_PAGE: u64 = 200;

#[derive(Parser, Debug)]
#[command(name = "suma_admin")]
#[command(about = "Admin utilities for SUMA (demo data, movements, exports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./suma.db?mode=rwc")]
    database_url: String,

    /// IANA timezone used to resolve "today".
    #[arg(
        long,
        env = "SUMA_TIMEZONE",
        default_value = "America/Costa_Rica",
        value_parser = parse_tz
    )]
    timezone: Tz,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the demo dataset for a user (no-op if the user has movements).
    Seed(SeedArgs),
    Movement(MovementArgs),
    Unit(UnitArgs),
    /// Write every movement of a user as CSV.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SeedArgs {
    /// Identity provider uid of the owner.
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct MovementArgs {
    #[command(subcommand)]
    command: MovementCommand,
}

#[derive(Subcommand, Debug)]
enum MovementCommand {
    Add(MovementAddArgs),
    List(MovementListArgs),
}

#[derive(Args, Debug)]
struct MovementAddArgs {
    #[arg(long)]
    user: String,
    /// `income` or `expense`.
    #[arg(long = "type", value_parser = parse_kind)]
    kind: MovementKind,
    /// Whole colones, e.g. `45000`, `45.000` or `₡45 000`.
    #[arg(long, value_parser = parse_money)]
    amount: Money,
    /// `YYYY-MM-DD`, defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    responsible: Option<String>,
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Args, Debug)]
struct MovementListArgs {
    #[arg(long)]
    user: String,
    /// `pending`, `classified`, `closed` or `all`.
    #[arg(long, default_value = "all", value_parser = parse_status_filter)]
    status: StatusFilter,
    #[arg(long, default_value_t = 50)]
    limit: u64,
}

#[derive(Args, Debug)]
struct UnitArgs {
    #[command(subcommand)]
    command: UnitCommand,
}

#[derive(Subcommand, Debug)]
enum UnitCommand {
    Add(UnitAddArgs),
    List,
}

#[derive(Args, Debug)]
struct UnitAddArgs {
    #[arg(long)]
    name: String,
    /// `branch`, `brand`, `event` or `other`.
    #[arg(long = "type", default_value = "other", value_parser = parse_unit_kind)]
    kind: BusinessUnitKind,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    user: String,
    /// Output file; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_kind(raw: &str) -> Result<MovementKind, String> {
    MovementKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

fn parse_unit_kind(raw: &str) -> Result<BusinessUnitKind, String> {
    BusinessUnitKind::try_from(raw).map_err(|err| err.to_string())
}

/// `--status` value; `None` lists every status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StatusFilter(Option<MovementStatus>);

fn parse_status_filter(raw: &str) -> Result<StatusFilter, String> {
    match raw {
        "all" => Ok(StatusFilter(None)),
        other => MovementStatus::try_from(other)
            .map(|status| StatusFilter(Some(status)))
            .map_err(|err| err.to_string()),
    }
}

fn parse_tz(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>()
        .map_err(|_| format!("unknown timezone: {raw}"))
}

#[derive(Debug, Serialize)]
struct ExportRow {
    id: String,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    amount: i64,
    currency: &'static str,
    status: &'static str,
    responsible: Option<String>,
    description: String,
    tags: String,
    created_at: String,
}

impl From<Movement> for ExportRow {
    fn from(movement: Movement) -> Self {
        Self {
            id: movement.id.to_string(),
            date: movement.date.to_string(),
            kind: movement.kind.as_str(),
            amount: movement.amount.units(),
            currency: movement.currency.code(),
            status: movement.status.as_str(),
            responsible: movement.responsible,
            description: movement.description,
            tags: movement.tags.join(";"),
            created_at: movement.created_at.to_rfc3339(),
        }
    }
}

fn print_movement(movement: &Movement) {
    println!(
        "{}  {}  {:<8} {:>12}  {:<10} {:<16} {}",
        movement.id,
        movement.date,
        movement.kind.as_str(),
        movement.amount.to_string(),
        movement.status.as_str(),
        movement.responsible.as_deref().unwrap_or("-"),
        movement.description
    );
}

async fn export(
    engine: &Engine,
    user: &str,
    out: Box<dyn Write>,
) -> Result<usize, Box<dyn Error + Send + Sync>> {
    let mut writer = csv::Writer::from_writer(out);
    let mut offset = 0;
    let mut written = 0;
    loop {
        let page = engine
            .list_movements(
                user,
                &MovementListFilter {
                    limit: Some(EXPORT_PAGE),
                    offset,
                    ..Default::default()
                },
            )
            .await?;
        let fetched = page.len() as u64;
        for movement in page {
            writer.serialize(ExportRow::from(movement))?;
            written += 1;
        }
        if fetched < EXPORT_PAGE {
            break;
        }
        offset += fetched;
    }
    writer.flush()?;
    Ok(written)
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .timezone(cli.timezone)
        .build()
        .await?;

    match cli.command {
        Command::Seed(args) => {
            let report = engine.seed_demo(&args.user).await?;
            if report.already_seeded {
                println!(
                    "user {} already has {} movements, nothing seeded",
                    args.user, report.movements
                );
            } else {
                println!(
                    "seeded {} movements, {} business units, {} tags for {}",
                    report.movements, report.business_units, report.tags, args.user
                );
            }
        }
        Command::Movement(MovementArgs {
            command: MovementCommand::Add(args),
        }) => {
            let movement = engine
                .create_movement(NewMovementCmd {
                    user_id: args.user,
                    kind: args.kind,
                    amount: args.amount,
                    currency: Currency::Crc,
                    description: args.description,
                    status: None,
                    date: args.date,
                    responsible: args.responsible,
                    business_unit_id: None,
                    tags: args.tags,
                })
                .await?;
            println!("created movement: {}", movement.id);
            print_movement(&movement);
        }
        Command::Movement(MovementArgs {
            command: MovementCommand::List(args),
        }) => {
            let movements = engine
                .list_movements(
                    &args.user,
                    &MovementListFilter {
                        status: args.status.0,
                        limit: Some(args.limit),
                        ..Default::default()
                    },
                )
                .await?;
            for movement in &movements {
                print_movement(movement);
            }
            println!("{} movements", movements.len());
        }
        Command::Unit(UnitArgs {
            command: UnitCommand::Add(args),
        }) => {
            let unit = engine.create_business_unit(&args.name, args.kind).await?;
            println!("created business unit: {} ({})", unit.name, unit.id);
        }
        Command::Unit(UnitArgs {
            command: UnitCommand::List,
        }) => {
            for unit in engine.list_business_units().await? {
                println!("{}  {:<8} {}", unit.id, unit.kind.as_str(), unit.name);
            }
        }
        Command::Export(args) => {
            let out: Box<dyn Write> = match &args.output {
                Some(path) => Box::new(std::fs::File::create(path)?),
                None => Box::new(std::io::stdout()),
            };
            let written = export(&engine, &args.user, out).await?;
            tracing::info!(user = %args.user, rows = written, "export finished");
            if let Some(path) = args.output {
                eprintln!("exported {written} movements to {}", path.display());
            }
        }
    }

    Ok(())
}
