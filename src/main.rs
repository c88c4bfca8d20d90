use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sqlbridge::config::AppConfig;
use sqlbridge::db::{build_pool, AdapterError, SqlAdapter, TextParam};
use sqlbridge::export;
use sqlbridge::stats::response_time_stats;
use sqlbridge::translate::{check_postgres_syntax, detect, validate, Translator};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_postgres::types::ToSql;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Run MySQL-flavoured raw SQL against PostgreSQL
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (default: <config dir>/sqlbridge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database driver name; decides the target dialect
    #[arg(long, env = "DB_DRIVER", global = true)]
    driver: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the SQL that would be sent to the database
    Translate {
        /// SQL file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// List MySQL constructs left after translation
    Validate {
        file: Option<PathBuf>,
        /// Check the input as given instead of its translation
        #[arg(long)]
        raw: bool,
    },
    /// JSON conversion report
    Report { file: Option<PathBuf> },
    /// List rewrite passes in execution order
    Rules,
    /// Translate and run a query, printing the result
    Exec {
        file: Option<PathBuf>,
        /// Positional parameter, converted to the type the server expects
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Proposal response-time statistics for a user
    Stats { user_id: Uuid },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(driver) = cli.driver {
        config.driver = Some(driver);
    }

    match cli.command {
        Command::Translate { file } => {
            let sql = read_sql(file.as_deref())?;
            println!("{}", translator(&config)?.translate(&sql));
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { file, raw } => {
            let sql = read_sql(file.as_deref())?;
            let checked = if raw {
                sql
            } else {
                translator(&config)?.translate(&sql)
            };
            let issues = validate(&checked);
            for issue in &issues {
                println!("{}", issue);
            }
            let syntax_ok = match check_postgres_syntax(&checked) {
                Ok(()) => true,
                Err(e) => {
                    println!("syntax: {}", e);
                    false
                }
            };
            if issues.is_empty() && syntax_ok {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Report { file } => {
            let sql = read_sql(file.as_deref())?;
            let report = translator(&config)?.report(&sql);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Rules => {
            let translator = translator(&config)?;
            for (i, pass) in translator.pipeline().passes().iter().enumerate() {
                println!("{:>2}. {:<16} {}", i + 1, pass.name(), pass.description());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Exec {
            file,
            params,
            format,
        } => {
            let sql = read_sql(file.as_deref())?;
            let adapter = connect(config).await?;
            let params: Vec<TextParam> = params.into_iter().map(TextParam::new).collect();
            let refs: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

            match adapter.fetch_table(&sql, &refs).await {
                Ok(result) => {
                    let rendered = match format {
                        Format::Table => export::to_table(&result),
                        Format::Json => export::to_json(&result),
                        Format::Csv => export::to_csv(&result),
                    };
                    print!("{}", rendered);
                    if matches!(format, Format::Json) {
                        println!();
                    }
                    tracing::debug!(elapsed = ?result.execution_time, "done");
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    report_failure(&err);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Stats { user_id } => {
            let adapter = connect(config).await?;
            match response_time_stats(&adapter, user_id).await {
                Ok(stats) => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    report_failure(&err);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn translator(config: &AppConfig) -> Result<Translator> {
    Translator::with_aliases(config.dialect(), &config.table_aliases)
        .context("Invalid table alias in config")
}

/// Pool-backed adapter. The dialect comes from the connection itself.
async fn connect(mut config: AppConfig) -> Result<SqlAdapter<deadpool_postgres::Pool>> {
    if config.database.password.is_empty() {
        if let Ok(pw) = std::env::var("PGPASSWORD") {
            config.database.password = pw;
        } else {
            let prompt = format!("Password for {}: ", config.database.display_string());
            config.database.password = rpassword::read_password_from_tty(Some(&prompt))?;
        }
    }

    let pool = build_pool(&config.database)?;
    let translator = Translator::with_aliases(detect(&pool), &config.table_aliases)
        .context("Invalid table alias in config")?;
    let mut adapter = SqlAdapter::with_translator(pool, translator);
    if let Some(timeout) = config.statement_timeout() {
        adapter = adapter.statement_timeout(timeout);
    }
    Ok(adapter)
}

fn read_sql(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .context("Failed to read SQL from stdin")?;
            Ok(sql)
        }
    }
}

fn report_failure(err: &AdapterError) {
    match err {
        AdapterError::QueryExecution { error, sql } => {
            eprintln!("{}", error.display_full());
            eprintln!("\nSent:\n{}", sql.trim());
        }
        other => eprintln!("Error: {}", other),
    }
}
