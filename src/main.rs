use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use configuration::Config;
use dataset::DataCleaner;
use forecast::{forecast_insights, RevenueForecaster, TrainOptions};
use kpi::{Assumptions, KpiEngine, KpiReport, Runway};
use ml_features::{engineer_features, prepare_ml_data, FeatureParams};
use tracing_subscriber::EnvFilter;

/// The main entry point for the Foresight analytics application.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => handle_analyze(args, cli.config),
        Commands::Forecast(args) => handle_forecast(args, cli.config),
        Commands::Clean(args) => handle_clean(args, cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A business analytics engine: KPI reports and revenue forecasts from a
/// transaction CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a transaction CSV and compute the full KPI report.
    Analyze(AnalyzeArgs),
    /// Train the forecast models and project future revenue.
    Forecast(ForecastArgs),
    /// Clean a transaction CSV and write the normalized table back out.
    Clean(CleanArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The transaction CSV to analyze.
    #[arg(long)]
    input: PathBuf,

    /// Write the full KPI report as pretty-printed JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the assumed cash balance used for the runway calculation.
    #[arg(long)]
    cash: Option<f64>,

    /// Override the assumed initial investment used for the ROI calculation.
    #[arg(long)]
    investment: Option<f64>,
}

#[derive(Parser)]
struct ForecastArgs {
    /// The transaction CSV to train on.
    #[arg(long)]
    input: PathBuf,

    /// Number of future periods to project (defaults to the configured value).
    #[arg(long)]
    periods: Option<usize>,

    /// Where to write the trained model artifact (defaults to the configured path).
    #[arg(long)]
    model_out: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The transaction CSV to clean.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the cleaned table.
    #[arg(long)]
    output: PathBuf,
}

// ==============================================================================
// Shared Pipeline Steps
// ==============================================================================

fn load_settings(config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    configuration::load_config(config_path.as_deref()).context("Failed to load configuration")
}

fn load_and_clean(
    input: &PathBuf,
    config: &Config,
) -> anyhow::Result<(Vec<core_types::Transaction>, dataset::CleanSummary)> {
    let records = dataset::load_csv(input)
        .with_context(|| format!("Failed to read transactions from {}", input.display()))?;
    let cleaner = DataCleaner::new(config.analysis.z_score_threshold);
    Ok(cleaner.clean(records))
}

fn print_clean_summary(summary: &dataset::CleanSummary) {
    println!(
        "Cleaned {} rows down to {} ({} cells imputed, {} duplicates, {} outliers removed, {} unparseable dates kept)",
        summary.rows_in,
        summary.rows_out,
        summary.cells_imputed,
        summary.duplicates_removed,
        summary.outliers_removed,
        summary.unparseable_dates,
    );
}

// ==============================================================================
// Analyze Command
// ==============================================================================

fn handle_analyze(args: AnalyzeArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_settings(config_path)?;
    let (table, summary) = load_and_clean(&args.input, &config)?;
    print_clean_summary(&summary);

    let assumptions = Assumptions {
        current_cash: args.cash.unwrap_or(config.analysis.current_cash),
        initial_investment: args.investment.unwrap_or(config.analysis.initial_investment),
    };
    let report = KpiEngine::new().calculate(&table, &assumptions);

    print_headline_summary(&report);

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize the KPI report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write the KPI report to {}", path.display()))?;
        println!("Full report written to {}", path.display());
    }

    Ok(())
}

fn print_headline_summary(report: &KpiReport) {
    let runway = match &report.runway_months {
        Runway::Months(m) => format!("{m:.1} months"),
        Runway::Infinite => "Infinite (No Expenses)".to_string(),
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);
    table
        .add_row(vec!["Total Revenue".to_string(), format!("${:.2}", report.total_revenue)])
        .add_row(vec!["Total Cost".to_string(), format!("${:.2}", report.total_cost)])
        .add_row(vec!["Net Profit".to_string(), format!("${:.2}", report.net_profit)])
        .add_row(vec!["Profit Margin".to_string(), format!("{:.2}%", report.profit_margin)])
        .add_row(vec!["EBITDA".to_string(), format!("${:.2}", report.ebitda)])
        .add_row(vec!["Monthly Burn Rate".to_string(), format!("${:.2}", report.burn_rate)])
        .add_row(vec!["Runway".to_string(), runway])
        .add_row(vec!["ROI".to_string(), format!("{:.2}%", report.roi)])
        .add_row(vec![
            "Revenue Growth Rate".to_string(),
            format!("{:.2}%", report.revenue_growth_rate),
        ])
        .add_row(vec!["Growth Trajectory".to_string(), report.growth_trajectory.to_string()])
        .add_row(vec![
            "Scalability Score".to_string(),
            format!("{:.1}/100", report.scalability_score),
        ])
        .add_row(vec!["Risk Score".to_string(), format!("{:.1}/100", report.risk_score)])
        .add_row(vec!["IPO Readiness".to_string(), format!("{:.1}/100", report.ipo_readiness)])
        .add_row(vec![
            "Shark Tank Score".to_string(),
            format!("{}/100", report.shark_tank_score),
        ])
        .add_row(vec!["Cash Flow Health".to_string(), report.cash_flow_health.to_string()])
        .add_row(vec!["Market Position".to_string(), report.market_position.to_string()]);
    println!("{table}");

    println!(
        "Expansion recommendation: {}",
        report.expansion_recommendation.recommendation
    );
    for reason in &report.expansion_recommendation.reasons {
        println!("  - {reason}");
    }
}

// ==============================================================================
// Forecast Command
// ==============================================================================

fn handle_forecast(args: ForecastArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_settings(config_path)?;
    let (mut table, summary) = load_and_clean(&args.input, &config)?;
    print_clean_summary(&summary);

    // Lag and rolling features assume chronological rows. Rows without a
    // parseable date sink to the end and are dropped by the feature pipeline.
    table.sort_by_key(|t| (t.date.is_none(), t.date));

    let params = FeatureParams {
        target: config.forecasting.target_column.clone(),
        lags: config.forecasting.lag_periods.clone(),
        windows: config.forecasting.rolling_windows.clone(),
        cumulative: false,
    };
    let frame = engineer_features(&table, &params).context("Feature engineering failed")?;
    let data = prepare_ml_data(&frame, &params.target)
        .context("Failed to assemble the training matrix")?;

    let options = TrainOptions {
        test_size: config.forecasting.test_size as f32,
        seed: config.forecasting.partition_seed,
    };
    let mut forecaster = RevenueForecaster::new();
    let metrics = forecaster.train(&data, &options)?.clone();

    let mut metrics_table = Table::new();
    metrics_table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Model", "MAE", "RMSE", "R²"]);
    for (name, scores) in &metrics {
        metrics_table.add_row(vec![
            name.clone(),
            format!("{:.2}", scores.mae),
            format!("{:.2}", scores.rmse),
            format!("{:.4}", scores.r2),
        ]);
    }
    println!("{metrics_table}");

    if let Some(best) = forecaster.best_model() {
        println!("Best model: {best}");
    }

    let periods = args.periods.unwrap_or(config.forecasting.forecast_periods);
    let last_features = data
        .x
        .last()
        .context("Feature engineering produced no usable rows")?;
    let projections = forecaster.predict_next_periods(last_features, periods)?;

    println!("\nProjected {} for the next {periods} period(s):", params.target);
    for (i, value) in projections.iter().enumerate() {
        println!("  Period {}: {value:.2}", i + 1);
    }

    let insights = forecast_insights(&data.y, &projections);
    println!(
        "\nRecent average: {:.2} | Forecast average: {:.2} | Expected growth: {:.2}%",
        insights.current_average, insights.predicted_average, insights.expected_growth_rate
    );

    let model_path = args.model_out.unwrap_or(config.forecasting.model_path.clone());
    forecaster.save(&model_path)?;
    println!("Model artifact saved to {}", model_path.display());

    Ok(())
}

// ==============================================================================
// Clean Command
// ==============================================================================

fn handle_clean(args: CleanArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_settings(config_path)?;
    let (table, summary) = load_and_clean(&args.input, &config)?;
    print_clean_summary(&summary);

    dataset::write_csv(&args.output, &table)
        .with_context(|| format!("Failed to write the cleaned table to {}", args.output.display()))?;
    println!("Cleaned table written to {}", args.output.display());
    Ok(())
}
