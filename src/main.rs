use sqlforge::config::{default_config_path, load_config};
use sqlforge::{DbError, Manager};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const USAGE: &str = "usage: sqlforge [config.toml] <connection> <sql>";

fn run(args: &[String]) -> sqlforge::Result<()> {
    let (config_path, connection, sql) = match args {
        [config, connection, sql] => (PathBuf::from(config), connection.as_str(), sql.as_str()),
        [connection, sql] => {
            let path = default_config_path()
                .ok_or_else(|| DbError::Config("no default configuration directory".to_string()))?;
            (path, connection.as_str(), sql.as_str())
        }
        _ => return Err(DbError::Config(USAGE.to_string())),
    };

    info!("Loading configuration from {}", config_path.display());
    let config = load_config(&config_path)?;
    let mut conn = Manager::from_config(&config, Some(connection))?;

    let mut result = conn.run_query(sql, &[])?;
    if result.columns().is_empty() {
        println!("{} row(s) affected", result.affected_rows());
        return Ok(());
    }

    for row in result.fetch_all_rows() {
        println!("{}", serde_json::to_string(&row.to_json())?);
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
