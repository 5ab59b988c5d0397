use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod analyzer;
mod cache;
mod config;
mod dashboard;
mod filter;
mod gate;
mod gemini;
mod models;
mod prompt;
mod report;
mod sheet;
mod shell;

use config::Config;
use dashboard::{Analysis, Dashboard, Interaction};
use gate::Access;
use gemini::GeminiClient;
use models::Area;
use sheet::{CsvFileSource, ReportSource, SheetClient};

#[derive(Parser)]
#[command(name = "water-body-companion")]
#[command(about = "Today's water body reports per area, screened for serious issues", long_about = None)]
struct Cli {
    /// Read reports from a local CSV export instead of the live sheet
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one dashboard interaction for an area
    Dashboard {
        #[arg(long, value_enum)]
        area: Area,
        /// Admin password for the area; leave out for public access
        #[arg(long, default_value = "")]
        password: String,
        /// Admin only: list today's reports with an AI review
        #[arg(long)]
        view_reports: bool,
        /// Public only: question for the water body AI
        #[arg(long)]
        ask: Option<String>,
    },
    /// Scan today's reports in an area for serious issues
    Alerts {
        #[arg(long, value_enum)]
        area: Area,
        /// Print the extracted issues as JSON
        #[arg(long)]
        json: bool,
    },
    /// Admin view of today's reports in an area
    Reports {
        #[arg(long, value_enum)]
        area: Area,
        #[arg(long)]
        password: String,
    },
    /// Ask the water body AI a question
    Ask { question: String },
    /// Print the report submission form links
    Forms,
    /// Interactive session reading one command per line from stdin
    Shell {
        #[arg(long, value_enum, default_value = "delhi")]
        area: Area,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    tracing::debug!(model = %config.model, refresh_secs = config.refresh_interval.as_secs(), "configuration loaded");

    let source: Box<dyn ReportSource> = match cli.csv {
        Some(path) => Box::new(CsvFileSource::new(path)),
        None => Box::new(SheetClient::new(config.sheet_id.clone(), config.sheet_token.clone())),
    };
    let generator = Box::new(GeminiClient::new(config.model.clone(), config.gemini_api_key.clone()));
    let mut dashboard = Dashboard::new(config, source, generator);

    match cli.command {
        Commands::Dashboard {
            area,
            password,
            view_reports,
            ask,
        } => {
            let request = Interaction {
                password,
                view_reports,
                question: ask,
            };
            let page = dashboard.interact(area, &request).await?;
            print!("{}", report::build_page(dashboard.config(), &page));
        }
        Commands::Alerts { area, json } => {
            let alerts = dashboard.alerts(area).await?;
            if json {
                println!("{}", report::build_alerts_json(&alerts)?);
                if let Analysis::Unavailable(reason) = &alerts {
                    anyhow::bail!("alert scan unavailable: {reason}");
                }
                return Ok(());
            }
            let text = report::build_alerts(&alerts);
            if text.is_empty() {
                println!("No serious issues reported today in {area}.");
            } else {
                print!("{text}");
            }
        }
        Commands::Reports { area, password } => {
            match dashboard.access(area, &password) {
                Access::Admin => {
                    let view = dashboard.admin_view(area).await?;
                    print!("{}", report::build_admin_panel(dashboard.config(), area, Some(&view)));
                }
                Access::Public { wrong_password } => {
                    print!("{}", report::build_public_panel(dashboard.config(), wrong_password, None));
                }
            }
        }
        Commands::Ask { question } => match dashboard.ask(&question).await {
            Some(answer) => print!("{}", report::build_answer(&answer)),
            None => println!("Nothing to ask."),
        },
        Commands::Forms => {
            print!("{}", report::build_forms(dashboard.config()));
        }
        Commands::Shell { area } => {
            shell::run(&mut dashboard, area).await?;
        }
    }

    Ok(())
}
