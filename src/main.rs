use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pulse_insights::config::{Config, ConfigOverrides};
use pulse_insights::geo::{self, GeoBoundaries};
use pulse_insights::output::csv::{geo_to_csv, growth_to_csv, rankings_to_csv, yearly_to_csv};
use pulse_insights::output::render_json;
use pulse_insights::output::table::{
    render_geo_table, render_growth_table, render_metrics_table, render_rankings_table,
    render_type_counts_table, render_yearly_table,
};
use pulse_insights::pages::{render_page, summary_metrics, Page, PageRequest};
use pulse_insights::query::TransactionFilter;
use pulse_insights::server::run_server;
use pulse_insights::store::cache::QueryCache;
use pulse_insights::store::mysql::MysqlStore;
use pulse_insights::store::Datastore;
use pulse_insights::types::{Insight, RankMetric, RankOrder};
use pulse_insights::views;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "pulse-insights",
    about = "Payments analytics over the Pulse transaction dataset"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long = "db-host")]
    db_host: Option<String>,
    #[arg(long = "db-user")]
    db_user: Option<String>,
    #[arg(long = "db-name")]
    db_name: Option<String>,
    #[arg(long)]
    boundaries: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Yearly transaction values and user growth over time.
    Overview,
    /// Filtered transaction summary; "All" leaves a column unfiltered.
    Transactions {
        #[arg(long, default_value = "All")]
        state: String,
        #[arg(long, default_value = "All")]
        year: String,
        #[arg(long, default_value = "All")]
        quarter: String,
        #[arg(long = "transaction-type", default_value = "All")]
        transaction_type: String,
    },
    /// Transaction totals per state, mapped to boundary-file names.
    Geo {
        #[arg(long)]
        year: Option<u16>,
    },
    /// Top or least 10 states by amount, users, or volume.
    Insights {
        #[arg(long, default_value = "amount")]
        metric: String,
        #[arg(long, default_value = "top")]
        order: String,
    },
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        db_host: cli.db_host.clone(),
        db_user: cli.db_user.clone(),
        db_name: cli.db_name.clone(),
        boundaries_path: cli.boundaries.clone(),
    });

    if let Commands::Config { init, show } = &cli.command {
        if *init {
            Config::write_template(&config_path)?;
            println!("Wrote config template to {}", config_path.display());
        }
        if *show || !*init {
            println!("{}", render_json(&config.redacted())?);
        }
        return Ok(());
    }
    if let Commands::Serve { host, port } = &cli.command {
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let cache = QueryCache::new(
        Duration::from_secs(config.cache.ttl_secs),
        config.cache.max_entries,
    );
    let store = MysqlStore::new(config.database.connection_url(), cache);

    match &cli.command {
        Commands::Overview => {
            let yearly = store.yearly_transaction_values().await?;
            let growth = store.user_growth().await?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_yearly_table(&yearly));
                    println!("{}", render_growth_table(&growth));
                }
                OutputFormat::Json => {
                    let view =
                        render_page(&store, None, Page::Overview, &PageRequest::default()).await?;
                    println!("{}", render_json(&view)?);
                }
                OutputFormat::Csv => {
                    println!("{}", yearly_to_csv(&yearly)?);
                    println!("{}", growth_to_csv(&growth)?);
                }
            }
        }
        Commands::Transactions {
            state,
            year,
            quarter,
            transaction_type,
        } => {
            let filter =
                TransactionFilter::from_selections(state, year, quarter, transaction_type)?;
            match cli.output {
                OutputFormat::Table => {
                    let facts = store.fetch_transactions(&filter).await?;
                    let summary = views::summarize(&facts);
                    let counts = views::count_by_type(&facts);
                    println!("{}", render_metrics_table(&summary_metrics(&summary)));
                    println!("{}", render_type_counts_table(&counts));
                }
                OutputFormat::Json => {
                    let request = PageRequest {
                        filter,
                        ..Default::default()
                    };
                    let view =
                        render_page(&store, None, Page::TransactionAnalysis, &request).await?;
                    println!("{}", render_json(&view)?);
                }
                OutputFormat::Csv => {
                    warn!("CSV output for transactions not implemented, using JSON");
                    let request = PageRequest {
                        filter,
                        ..Default::default()
                    };
                    let view =
                        render_page(&store, None, Page::TransactionAnalysis, &request).await?;
                    println!("{}", render_json(&view)?);
                }
            }
        }
        Commands::Geo { year } => {
            let totals = geo::aggregate_by_state(&store, *year).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_geo_table(&totals)),
                OutputFormat::Json => {
                    let boundaries = load_boundaries(&config);
                    let request = PageRequest {
                        geo_year: *year,
                        ..Default::default()
                    };
                    let view = render_page(
                        &store,
                        boundaries.as_ref(),
                        Page::GeographicalInsights,
                        &request,
                    )
                    .await?;
                    println!("{}", render_json(&view)?);
                }
                OutputFormat::Csv => println!("{}", geo_to_csv(&totals)?),
            }
        }
        Commands::Insights { metric, order } => {
            let insight = Insight {
                metric: metric.parse::<RankMetric>()?,
                order: order.parse::<RankOrder>()?,
            };
            let rankings = store
                .state_rankings(insight.metric, insight.order, 10)
                .await?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_rankings_table(&insight, &rankings))
                }
                OutputFormat::Json => {
                    let request = PageRequest {
                        insight,
                        ..Default::default()
                    };
                    let view = render_page(&store, None, Page::TopDataInsights, &request).await?;
                    println!("{}", render_json(&view)?);
                }
                OutputFormat::Csv => println!("{}", rankings_to_csv(&rankings)?),
            }
        }
        Commands::Config { .. } | Commands::Serve { .. } => {
            unreachable!("handled before dispatch")
        }
    }

    Ok(())
}

fn load_boundaries(config: &Config) -> Option<GeoBoundaries> {
    match GeoBoundaries::load(&config.resolved_boundaries_path()) {
        Ok(boundaries) => Some(boundaries),
        Err(err) => {
            debug!("boundary file unavailable: {err:#}");
            None
        }
    }
}
