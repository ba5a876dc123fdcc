use adsql::db::{build_pool, ConnectionConfig, Dal, PgStorage, SslMode};
use adsql::schema::{EntityKind, ParamValue, Params};
use adsql::sql::compile_select;
use adsql::{compose_select, BuilderConfig, EntityQuery};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Compose ad-server entity queries and optionally run them
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Builder configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the SELECT composed for an entity request
    Sql(RequestArgs),
    /// Run the composed SELECT and print the rows as JSON keyed by --key
    Fetch {
        #[command(flatten)]
        request: RequestArgs,
        /// Result column used to key the rows
        #[arg(long)]
        key: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List the entity kinds
    Entities,
}

#[derive(Args)]
struct RequestArgs {
    /// Entity kind, e.g. zone, placement, history_day
    entity: EntityKind,
    /// Scalar parameter, key=value
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
    /// List parameter, key=a,b,c
    #[arg(short = 'l', long = "list", value_parser = parse_key_value)]
    lists: Vec<(String, String)>,
    /// Select the extended column set
    #[arg(long)]
    all_fields: bool,
    /// Join the entity's statistics
    #[arg(long)]
    include_stats: bool,
}

impl RequestArgs {
    fn to_query(&self) -> EntityQuery {
        let mut params = Params::new();
        for (key, value) in &self.params {
            params.insert(key, ParamValue::Scalar(value.clone()));
        }
        for (key, value) in &self.lists {
            let items: Vec<String> = value.split(',').map(|s| s.trim().to_string()).collect();
            params.insert(key, ParamValue::List(items));
        }
        EntityQuery::new(self.entity)
            .params(params)
            .all_fields(self.all_fields)
            .include_stats(self.include_stats)
    }
}

#[derive(Args)]
struct ConnectionArgs {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 5432)]
    port: u16,
    #[arg(long, default_value = "openads")]
    database: String,
    #[arg(long, default_value = "postgres")]
    user: String,
    /// disable, prefer or require
    #[arg(long, default_value = "prefer")]
    sslmode: SslMode,
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .with_context(|| format!("expected key=value, got {:?}", s))?;
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(BuilderConfig::get_config_path);
    let config = BuilderConfig::load(&config_path)?;

    match cli.command {
        Command::Entities => {
            for kind in EntityKind::ALL {
                println!("{}", kind);
            }
        }
        Command::Sql(request) => {
            let select = compose_select(&request.to_query(), &config)
                .with_context(|| format!("Failed to compose {}", request.entity))?;
            println!("{}", compile_select(&select));
        }
        Command::Fetch {
            request,
            key,
            connection,
        } => {
            let mut conn = ConnectionConfig {
                host: connection.host,
                port: connection.port,
                database: connection.database,
                user: connection.user,
                ssl_mode: connection.sslmode,
                ..ConnectionConfig::default()
            };

            // Password: PGPASSWORD env var, then interactive prompt
            if let Ok(pw) = std::env::var("PGPASSWORD") {
                conn.password = pw;
            } else {
                let prompt = format!("Password for {}: ", conn.display_string());
                conn.password = rpassword::read_password_from_tty(Some(&prompt))?;
            }

            let pool = build_pool(&conn)?;
            let dal = Dal::new(PgStorage::new(pool), config);
            let rows = dal
                .get_entities(&request.to_query(), &key)
                .await
                .with_context(|| format!("Failed to fetch {}", request.entity))?;
            println!("{}", serde_json::to_string_pretty(&rows.to_json())?);
        }
    }

    Ok(())
}
