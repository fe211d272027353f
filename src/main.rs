mod analysis;
mod handlers;
mod models;
mod report;
mod routes;
mod source;
mod utils;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use axum::serve;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use analysis::scoring::{predict, ScoringWeights};
use models::{error::PredictError, prediction::Prediction};
use routes::make_app;
use source::{file::FileSource, openf1::OpenF1Source, SessionSource};
use utils::{config::Config, logging::init_tracing, state::AppState};

#[derive(Parser, Debug)]
#[command(name = "pitwall")]
#[command(about = "Predicts the Formula 1 race winner from practice and qualifying")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a weekend from OpenF1 and predict the winner
    Predict {
        #[arg(long, default_value_t = 2025)]
        year: i32,
        /// Grand Prix name, country or circuit (e.g. "British Grand Prix", "Silverstone")
        #[arg(long, default_value = "British Grand Prix")]
        grand_prix: String,
        /// Number of ranked drivers to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Print the prediction as JSON instead of a report
        #[arg(long)]
        json: bool,
        /// Season to analyse for reference when the requested weekend has no data yet
        #[arg(long)]
        fallback_year: Option<i32>,
        /// Grand Prix name for the fallback season (defaults to --grand-prix)
        #[arg(long, requires = "fallback_year")]
        fallback_grand_prix: Option<String>,
    },
    /// Predict from hand-entered session results in a JSON file
    File {
        path: PathBuf,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        json: bool,
    },
    /// List the season calendar
    Schedule {
        #[arg(long, default_value_t = 2025)]
        year: i32,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Serve predictions over HTTP
    Serve {
        /// Override the bind address (default: BIND_ADDR or 127.0.0.1:3000)
        #[arg(short, long, env = "BIND_ADDR")]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::init();
    init_tracing(&config.log_level);
    config.log_warnings();

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Predict {
            year,
            grand_prix,
            top,
            json,
            fallback_year,
            fallback_grand_prix,
        } => {
            let source = OpenF1Source::from_config(&config)?;
            let weights = ScoringWeights::default();
            match load_and_predict(&source, year, &grand_prix, &weights).await {
                Ok(prediction) => print_prediction(&prediction, top, json)?,
                Err(err) if err.is_recoverable() => {
                    println!("{err}");
                    print_schedule(&source, year, Some(10)).await;

                    let Some(fallback_year) = fallback_year else {
                        return Err(err.into());
                    };
                    let fallback_gp = fallback_grand_prix.unwrap_or(grand_prix);
                    println!("\nAlternative: testing with {fallback_year} {fallback_gp} data...");
                    println!("Note: {year} season data might not be available yet.");
                    let prediction =
                        load_and_predict(&source, fallback_year, &fallback_gp, &weights).await?;
                    if json {
                        print_prediction(&prediction, 5, true)?;
                    } else {
                        print!("\n{}", report::render_reference(&prediction, 5));
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::File { path, top, json } => {
            let source = FileSource::open(&path).await?;
            let weekend = source.weekend();
            let weights = weekend.weights();
            let prediction =
                load_and_predict(&source, weekend.year, &weekend.grand_prix, &weights).await?;
            print_prediction(&prediction, top, json)?;
        }
        Command::Schedule { year, limit } => {
            let source = OpenF1Source::from_config(&config)?;
            let mut meetings = source.schedule(year).await?;
            if let Some(limit) = limit {
                meetings.truncate(limit);
            }
            print!("{}", report::render_schedule(year, &meetings));
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.bind_addr.clone());
            let state = Arc::new(AppState::init(config)?);
            let app = make_app(state);

            let listener = TcpListener::bind(&addr).await?;
            info!("Listening on http://{}", addr);
            serve(listener, app).await?;
        }
    }
    Ok(())
}

async fn load_and_predict(
    source: &dyn SessionSource,
    year: i32,
    grand_prix: &str,
    weights: &ScoringWeights,
) -> Result<Prediction, PredictError> {
    info!("Analyzing data for {} {}...", grand_prix, year);
    let weekend = source.load_weekend(year, grand_prix).await?;
    predict(&weekend, weights)
}

async fn print_schedule(source: &dyn SessionSource, year: i32, limit: Option<usize>) {
    match source.schedule(year).await {
        Ok(mut meetings) => {
            if let Some(limit) = limit {
                meetings.truncate(limit);
            }
            print!("\n{}", report::render_schedule(year, &meetings));
        }
        Err(err) => warn!("Could not retrieve {} schedule: {}", year, err),
    }
}

fn print_prediction(
    prediction: &Prediction,
    top: usize,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        let trimmed = prediction.clone().truncated(top);
        println!("{}", serde_json::to_string_pretty(&trimmed)?);
    } else {
        print!("{}", report::render_text(prediction, top));
    }
    Ok(())
}
