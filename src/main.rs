use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use bi_crm::{
    config::{self, AppConfig},
    db,
    entities::sales_forecast::ForecastPeriod,
    scraper::{read_asin_list, CredentialPool, RapidApiClient},
    services::{
        churn::TrainingOutcome, insights::DEFAULT_RECOMMENDATION_LIMIT, IngestionError,
        IngestionOutcome, IngestionReport,
    },
    AppState,
};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

const DEFAULT_ASINS_FILE: &str = "config/asins.txt";

#[derive(Parser)]
#[command(
    name = "bi-crm",
    about = "CRM batch jobs: product ingestion, churn scoring and sales forecasting",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Fetch product details for ASINs and upsert them
    Scrape(ScrapeArgs),
    #[command(subcommand)]
    Churn(ChurnCommands),
    #[command(subcommand)]
    Forecast(ForecastCommands),
    #[command(subcommand)]
    Insights(InsightsCommands),
    #[command(subcommand)]
    Reviews(ReviewsCommands),
}

#[derive(Args)]
struct ScrapeArgs {
    #[arg(long, help = "Newline separated ASIN list; defaults to the configured file")]
    asins_file: Option<PathBuf>,
    #[arg(help = "ASINs to fetch; takes precedence over any file")]
    asins: Vec<String>,
}

#[derive(Subcommand)]
enum ChurnCommands {
    /// Assign heuristic churn scores to every customer
    Init,
    /// Train the classifier and print held-out metrics
    Train,
    /// Train the classifier and overwrite every churn score with its probability
    Update,
    /// Print the stored churn score of a customer
    Score { customer_id: Uuid },
}

#[derive(Subcommand)]
enum ForecastCommands {
    /// Forecast every product and store the result
    Run(ForecastRunArgs),
    /// Compare forecasts against base sales
    Evaluate,
    /// List stored forecasts of a product
    Show { product_id: Uuid },
}

#[derive(Args)]
struct ForecastRunArgs {
    #[arg(long, help = "Forecast date (YYYY-MM-DD); defaults to today")]
    date: Option<NaiveDate>,
    #[arg(long, help = "Daily, Weekly or Monthly; defaults to the configured period")]
    period: Option<ForecastPeriod>,
}

#[derive(Subcommand)]
enum InsightsCommands {
    /// Products a customer has not ordered yet
    Recommend {
        customer_id: Uuid,
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
        limit: usize,
    },
    /// Recent prices and a suggested price for a product
    Pricing { product_id: Uuid },
}

#[derive(Subcommand)]
enum ReviewsCommands {
    /// Fill in sentiment scores for reviews that lack one
    Score,
}

struct CliContext {
    state: AppState,
}

impl CliContext {
    async fn initialize(force_migrate: bool) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);

        let pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        db::check_connection(&pool)
            .await
            .context("database did not answer a ping")?;
        if force_migrate || config.auto_migrate {
            db::run_migrations(&pool)
                .await
                .context("failed to run database migrations")?;
        }

        Ok(Self {
            state: AppState::new(Arc::new(pool), config),
        })
    }

    fn config(&self) -> &AppConfig {
        &self.state.config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(matches!(cli.command, Commands::Migrate)).await?;

    match cli.command {
        Commands::Migrate => {
            if cli.json {
                print_json(&json!({ "migrated": true }))?;
            } else {
                println!("Database schema is up to date");
            }
        }
        Commands::Scrape(args) => handle_scrape(&context, args, cli.json).await?,
        Commands::Churn(command) => handle_churn(&context, command, cli.json).await?,
        Commands::Forecast(command) => handle_forecast(&context, command, cli.json).await?,
        Commands::Insights(command) => handle_insights(&context, command, cli.json).await?,
        Commands::Reviews(ReviewsCommands::Score) => {
            let scored = context
                .state
                .insights_service()
                .score_review_sentiment()
                .await
                .context("failed to score reviews")?;
            if cli.json {
                print_json(&json!({ "scored": scored }))?;
            } else {
                println!("Scored sentiment for {} reviews", scored);
            }
        }
    }

    Ok(())
}

fn resolve_asins(config: &AppConfig, args: ScrapeArgs) -> Result<Vec<String>> {
    if !args.asins.is_empty() {
        return Ok(args.asins);
    }
    let path = args
        .asins_file
        .or_else(|| config.scraper.asins_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASINS_FILE));
    read_asin_list(&path).with_context(|| format!("failed to read ASIN list {}", path.display()))
}

async fn handle_scrape(context: &CliContext, args: ScrapeArgs, json: bool) -> Result<()> {
    let config = context.config();
    let asins = resolve_asins(config, args)?;
    let mut pool = CredentialPool::new(config.scraper.api_keys.clone())
        .context("no API keys configured; set scraper.api_keys or APP__SCRAPER__API_KEYS")?;
    let api = RapidApiClient::new(&config.scraper).context("failed to build API client")?;

    info!(asins = asins.len(), "starting product scraping");
    let service = context.state.ingestion_service(Arc::new(api));

    match service.scrape_and_store_products(&asins, &mut pool).await {
        Ok(report) => {
            render_report(&report, json)?;
            Ok(())
        }
        Err(IngestionError::CredentialsExhausted { pool_size, partial }) => {
            render_report(&partial, json)?;
            bail!(
                "all {} API keys exceeded their quota after {} of {} ASINs",
                pool_size,
                partial.outcomes.len(),
                asins.len()
            )
        }
    }
}

fn render_report(report: &IngestionReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    for outcome in &report.outcomes {
        match outcome {
            IngestionOutcome::Stored {
                asin,
                product_id,
                created,
                ..
            } => println!("- {} stored as {} (created: {})", asin, product_id, created),
            IngestionOutcome::Skipped { asin, reason } => println!("- {} skipped: {}", asin, reason),
        }
    }
    println!(
        "Stored {} products ({} new), skipped {}",
        report.stored(),
        report.created(),
        report.skipped()
    );
    Ok(())
}

async fn handle_churn(context: &CliContext, command: ChurnCommands, json: bool) -> Result<()> {
    let service = context.state.churn_service();
    let today = Utc::now().date_naive();

    match command {
        ChurnCommands::Init => {
            let updated = service
                .generate_initial_churn_scores(today)
                .await
                .context("failed to assign initial churn scores")?;
            if json {
                print_json(&json!({ "updated": updated }))?;
            } else {
                println!("Initial churn scores assigned to {} customers", updated);
            }
        }
        ChurnCommands::Train => {
            let outcome = service
                .train_churn_model(today)
                .await
                .context("failed to train churn model")?;
            match &outcome {
                TrainingOutcome::Trained(model) => {
                    let metrics = service.evaluate_churn_model(model);
                    if json {
                        print_json(&json!({
                            "status": "trained",
                            "train_size": model.train_size(),
                            "test_size": model.test_size(),
                            "metrics": metrics,
                        }))?;
                    } else {
                        println!(
                            "Churn model trained on {} customers, evaluated on {}",
                            model.train_size(),
                            model.test_size()
                        );
                        println!("Accuracy  : {:.4}", metrics.accuracy);
                        println!("Precision : {:.4}", metrics.precision);
                        println!("Recall    : {:.4}", metrics.recall);
                        println!("F1 Score  : {:.4}", metrics.f1);
                        match metrics.roc_auc {
                            Some(auc) => println!("ROC-AUC   : {:.4}", auc),
                            None => println!("ROC-AUC   : undefined (single class in held-out split)"),
                        }
                    }
                }
                TrainingOutcome::InsufficientData { customers, reason } => {
                    if json {
                        print_json(&outcome_summary(*customers, reason))?;
                    } else {
                        println!("Churn model not trained: {}", reason);
                    }
                }
            }
        }
        ChurnCommands::Update => {
            let outcome = service
                .train_churn_model(today)
                .await
                .context("failed to train churn model")?;
            let model = match outcome {
                TrainingOutcome::Trained(model) => model,
                TrainingOutcome::InsufficientData { customers, reason } => {
                    if json {
                        print_json(&outcome_summary(customers, &reason))?;
                    } else {
                        println!("Churn scores left unchanged: {}", reason);
                    }
                    return Ok(());
                }
            };
            let updated = service
                .predict_and_update_churn(&model, today)
                .await
                .context("failed to update churn scores")?;
            if json {
                print_json(&json!({ "status": "updated", "updated": updated }))?;
            } else {
                println!("Updated churn scores for {} customers", updated);
            }
        }
        ChurnCommands::Score { customer_id } => {
            let score = service
                .churn_score_for_customer(customer_id)
                .await
                .context("failed to read churn score")?;
            if json {
                print_json(&json!({ "customer_id": customer_id, "churn_score": score }))?;
            } else {
                match score {
                    Some(score) => println!("Customer {} churn score: {}", customer_id, score),
                    None => println!("Customer {} has no churn score yet", customer_id),
                }
            }
        }
    }

    Ok(())
}

fn outcome_summary(customers: usize, reason: &str) -> serde_json::Value {
    json!({
        "status": "insufficient_data",
        "customers": customers,
        "reason": reason,
    })
}

async fn handle_forecast(context: &CliContext, command: ForecastCommands, json: bool) -> Result<()> {
    let service = context.state.forecast_service();

    match command {
        ForecastCommands::Run(args) => {
            let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
            let period = args.period.unwrap_or_else(|| service.default_period());
            let stored = service
                .forecast_and_store_sales(date, period)
                .await
                .context("failed to store sales forecasts")?;
            if json {
                print_json(&stored)?;
            } else {
                for entry in &stored {
                    println!(
                        "- {}: base sales {}, polarity {:.2}, predicted {}",
                        entry.forecast.product_id,
                        entry.forecast.base_sales,
                        entry.forecast.sentiment_polarity,
                        entry.record.predicted_sales
                    );
                }
                println!("Sales forecast updated for {} products", stored.len());
            }
        }
        ForecastCommands::Evaluate => {
            let evaluation = service
                .evaluate_sales_forecast()
                .await
                .context("failed to evaluate sales forecast")?;
            match evaluation {
                None if json => print_json(&json!({ "products": 0 }))?,
                None => println!("No products to evaluate"),
                Some(evaluation) if json => print_json(&evaluation)?,
                Some(evaluation) => {
                    println!("Products : {}", evaluation.rows.len());
                    println!("MAE      : {:.2}", evaluation.metrics.mae);
                    println!("RMSE     : {:.2}", evaluation.metrics.rmse);
                    match evaluation.metrics.mape {
                        Some(mape) => println!("MAPE     : {:.2}%", mape * 100.0),
                        None => println!("MAPE     : undefined (no product with base sales)"),
                    }
                }
            }
        }
        ForecastCommands::Show { product_id } => {
            let forecasts = service
                .forecasts_for_product(product_id)
                .await
                .context("failed to load forecasts")?;
            if json {
                print_json(&forecasts)?;
            } else if forecasts.is_empty() {
                println!("No forecasts stored for product {}", product_id);
            } else {
                for forecast in &forecasts {
                    println!(
                        "- {} {}: {}",
                        forecast.forecast_date, forecast.period, forecast.predicted_sales
                    );
                }
            }
        }
    }

    Ok(())
}

async fn handle_insights(context: &CliContext, command: InsightsCommands, json: bool) -> Result<()> {
    let service = context.state.insights_service();

    match command {
        InsightsCommands::Recommend { customer_id, limit } => {
            let recommendations = service
                .recommend_products(customer_id, limit)
                .await
                .context("failed to build recommendations")?;
            if json {
                print_json(&json!({
                    "customer_id": customer_id,
                    "recommended_products": recommendations,
                }))?;
            } else if recommendations.is_empty() {
                println!("No products left to recommend");
            } else {
                for product in &recommendations {
                    println!("- {} ({})", product.name, product.product_id);
                }
            }
        }
        InsightsCommands::Pricing { product_id } => {
            let trends = service
                .pricing_trends(product_id)
                .await
                .context("failed to compute pricing trends")?;
            if json {
                print_json(&trends)?;
            } else {
                let prices: Vec<String> = trends.price_trends.iter().map(|p| p.to_string()).collect();
                println!("Recent prices   : [{}]", prices.join(", "));
                match trends.suggested_price {
                    Some(price) => println!("Suggested price : {}", price),
                    None => println!("Suggested price : none (no price data)"),
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
