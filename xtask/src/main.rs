// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the timeclock workspace.
//!
//! - `cargo xtask ci` runs clippy, the format check, the build, the test
//!   suite, and migration verification
//! - `cargo xtask verify-migrations` applies the embedded `SQLite`
//!   migrations to a scratch database, compares the resulting schema with
//!   the tables the persistence crate maps, then reverts them and checks
//!   that nothing is left behind

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::BTreeSet;
use std::io;
use std::process::Output;

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, bail, eyre},
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

/// Package that owns the migrations directory.
const PERSISTENCE_PACKAGE: &str = "timeclock-persistence";

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Copy, Debug, Subcommand)]
enum Command {
    /// Everything CI runs: lint, build, test, verify-migrations
    CI,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Write an lcov report to target/lcov.info
    #[command(visible_alias = "cov")]
    Coverage,

    /// Clippy with warnings denied, then the format check
    #[command(visible_alias = "l")]
    Lint,

    /// Clippy with warnings denied
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Fail if rustfmt would change anything
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Apply rustfmt to the workspace
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Unit, integration and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Apply, compare and revert the `SQLite` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => {
                lint()?;
                cargo(&["build", "--all-targets", "--all-features"])?;
                test()?;
                verify_migrations()
            }
            Self::Build => cargo(&["build", "--all-targets", "--all-features"]),
            Self::Coverage => cargo(&[
                "llvm-cov",
                "--all-features",
                "--lcov",
                "--output-path",
                "target/lcov.info",
            ]),
            Self::Lint => lint(),
            Self::LintClippy => clippy(),
            Self::LintFormatting => rustfmt(&["--check"]),
            Self::FixFormatting => rustfmt(&[]),
            Self::Test => test(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn lint() -> Result<()> {
    clippy()?;
    rustfmt(&["--check"])
}

fn clippy() -> Result<()> {
    cargo(&["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"])
}

fn test() -> Result<()> {
    cargo(&["test", "--workspace", "--all-targets", "--all-features"])?;
    cargo(&["test", "--workspace", "--doc", "--all-features"])
}

fn cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args.iter().copied()).run_traced()?;
    Ok(())
}

/// Runs `cargo fmt` on the nightly toolchain.
fn rustfmt(extra: &[&str]) -> Result<()> {
    let mut args: Vec<&str> = vec!["fmt", "--all"];
    args.extend_from_slice(extra);
    cmd("cargo", args)
        // Set by the outer `cargo xtask`; it would pin the stable toolchain.
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_traced()?;
    Ok(())
}

trait RunTraced {
    fn run_traced(&self) -> io::Result<Output>;
}

impl RunTraced for duct::Expression {
    fn run_traced(&self) -> io::Result<Output> {
        tracing::info!("running {self:?}");
        self.run()
            .inspect_err(|err| tracing::error!("{self:?} failed: {err}"))
    }
}

/// Checks the persistence migrations against the schema the store maps.
///
/// 1. Every migration directory carries both `up.sql` and `down.sql`
/// 2. The embedded migrations apply to an in-memory database with foreign
///    keys enabled
/// 3. The migrated schema matches [`expected_schema`] fact for fact
/// 4. Reverting every migration leaves no tables behind
fn verify_migrations() -> Result<()> {
    check_migration_files()?;

    let mut conn =
        SqliteConnection::establish(":memory:").wrap_err("cannot open in-memory SQLite")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("cannot enable foreign keys")?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("migrations failed to apply: {e}"))?;
    tracing::info!("applied {} migration(s)", applied.len());

    let actual = schema_facts(&mut conn)?;
    let expected = expected_schema();
    let missing: Vec<&String> = expected.difference(&actual).collect();
    let unexpected: Vec<&String> = actual.difference(&expected).collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        bail!(
            "migrated schema differs from the mapped one\n  missing: {missing:#?}\n  \
             unexpected: {unexpected:#?}"
        );
    }

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("migrations failed to revert: {e}"))?;
    let leftover = table_names(&mut conn)?;
    if !leftover.is_empty() {
        bail!("tables left after revert: {leftover:?}");
    }

    tracing::info!("migrations verified");
    Ok(())
}

fn check_migration_files() -> Result<()> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .wrap_err("cannot read cargo metadata")?;
    let package = metadata
        .workspace_packages()
        .into_iter()
        .find(|package| &*package.name == PERSISTENCE_PACKAGE)
        .ok_or_else(|| eyre!("package {PERSISTENCE_PACKAGE} is not in the workspace"))?;
    let dir = package
        .manifest_path
        .parent()
        .ok_or_else(|| eyre!("manifest path has no parent"))?
        .join("migrations");

    for entry in std::fs::read_dir(&dir).wrap_err_with(|| format!("cannot list {dir}"))? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        for script in ["up.sql", "down.sql"] {
            if !path.join(script).is_file() {
                bail!("{} has no {script}", path.display());
            }
        }
    }
    Ok(())
}

/// `(name, type, nullable)`; primary keys are listed first.
type ColumnShape = (&'static str, &'static str, bool);

const TABLES: &[(&str, &[ColumnShape])] = &[
    (
        "components",
        &[
            ("component_id", "integer", false),
            ("employee_id", "text", false),
            ("start_ts", "integer", false),
            ("end_ts", "integer", true),
            ("is_manual", "integer", false),
            ("punch_ids_json", "text", false),
            ("shift_id", "integer", true),
        ],
    ),
    (
        "live_states",
        &[
            ("live_state_id", "integer", false),
            ("created_at", "text", false),
            ("record_json", "text", false),
        ],
    ),
    (
        "shifts",
        &[
            ("shift_id", "integer", false),
            ("employee_id", "text", false),
            ("component_ids_json", "text", false),
            ("start_ts", "integer", false),
            ("end_ts", "integer", true),
            ("duration_secs", "integer", false),
            ("state", "text", false),
            ("open_since_ts", "integer", true),
            ("row_index", "integer", true),
        ],
    ),
    (
        "sync_history",
        &[
            ("sync_id", "integer", false),
            ("synced_at_ts", "integer", false),
        ],
    ),
];

/// The schema as a set of one-line facts so a mismatch reads as a diff.
fn expected_schema() -> BTreeSet<String> {
    let mut facts = BTreeSet::new();
    for (table, columns) in TABLES {
        for (position, (name, kind, nullable)) in columns.iter().enumerate() {
            facts.insert(column_fact(table, name, kind, *nullable));
            if position == 0 {
                facts.insert(format!("{table} primary key {name}"));
            }
        }
    }
    facts.extend(
        [
            "index idx_shifts_employee_end on shifts (employee_id, end_ts)",
            "index idx_shifts_start on shifts (start_ts)",
            "index idx_shifts_state on shifts (state)",
            "index idx_components_shift on components (shift_id)",
            "unique on components (employee_id, start_ts)",
            "components.shift_id references shifts.shift_id",
        ]
        .map(String::from),
    );
    facts
}

fn column_fact(table: &str, column: &str, kind: &str, nullable: bool) -> String {
    let null = if nullable { "null" } else { "not null" };
    format!("{table}.{column} {kind} {null}")
}

#[derive(QueryableByName)]
struct Named {
    #[diesel(sql_type = Text)]
    name: String,
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    r#type: String,
    #[diesel(sql_type = Integer)]
    notnull: i32,
    #[diesel(sql_type = Integer)]
    pk: i32,
}

#[derive(QueryableByName)]
struct ForeignKeyRow {
    #[diesel(sql_type = Text)]
    table: String,
    #[diesel(sql_type = Text)]
    from: String,
    #[diesel(sql_type = Text)]
    to: String,
}

#[derive(QueryableByName)]
struct IndexRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    origin: String,
}

fn table_names(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    let rows: Vec<Named> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' \
         ORDER BY name",
    )
    .load(conn)
    .wrap_err("cannot list tables")?;
    Ok(rows.into_iter().map(|row| row.name).collect())
}

fn schema_facts(conn: &mut SqliteConnection) -> Result<BTreeSet<String>> {
    let mut facts = BTreeSet::new();
    for table in table_names(conn)? {
        let columns: Vec<ColumnRow> = diesel::sql_query(format!("PRAGMA table_info({table})"))
            .load(conn)
            .wrap_err_with(|| format!("cannot read columns of {table}"))?;
        for column in columns {
            // INTEGER PRIMARY KEY aliases the rowid and is never null.
            let nullable = column.notnull == 0 && column.pk == 0;
            let kind = affinity(&column.r#type);
            facts.insert(column_fact(&table, &column.name, kind, nullable));
            if column.pk > 0 {
                facts.insert(format!("{table} primary key {}", column.name));
            }
        }

        let keys: Vec<ForeignKeyRow> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({table})"))
                .load(conn)
                .wrap_err_with(|| format!("cannot read foreign keys of {table}"))?;
        for key in keys {
            facts.insert(format!(
                "{table}.{} references {}.{}",
                key.from, key.table, key.to
            ));
        }

        let indexes: Vec<IndexRow> = diesel::sql_query(format!("PRAGMA index_list({table})"))
            .load(conn)
            .wrap_err_with(|| format!("cannot read indexes of {table}"))?;
        for index in indexes {
            let columns: Vec<Named> =
                diesel::sql_query(format!("PRAGMA index_info({})", index.name))
                    .load(conn)
                    .wrap_err_with(|| format!("cannot read index {}", index.name))?;
            let columns = columns
                .into_iter()
                .map(|column| column.name)
                .collect::<Vec<_>>()
                .join(", ");
            // "u" is a UNIQUE constraint, "c" a CREATE INDEX; primary keys are covered above.
            if index.origin == "u" {
                facts.insert(format!("unique on {table} ({columns})"));
            } else if index.origin == "c" {
                facts.insert(format!("index {} on {table} ({columns})", index.name));
            }
        }
    }
    Ok(facts)
}

/// `SQLite` type affinity, reduced to the names used in [`TABLES`].
fn affinity(declared: &str) -> &'static str {
    let declared = declared.to_ascii_uppercase();
    if declared.contains("INT") {
        "integer"
    } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
        "real"
    } else if declared.contains("BLOB") {
        "blob"
    } else {
        "text"
    }
}
