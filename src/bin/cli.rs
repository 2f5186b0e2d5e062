//! Strategy Options CLI
//!
//! Evaluates one strategy against a market snapshot: builds the legs (from
//! explicit series or a named template), computes the payoff curve, names the
//! pattern and reports breakevens, margin and solvency points.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use strategy_options::prelude::*;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON or YAML)
    #[arg(short, long, env = "STRATEGY_CONFIG")]
    config: Option<PathBuf>,

    /// Instantiate this template from the library
    #[arg(short, long, conflicts_with = "legs")]
    template: Option<String>,

    /// Legs as a JSON list of {"series", "qty", "price"?}, inline or a file path
    #[arg(short, long)]
    legs: Option<String>,

    /// Manual underlying price; overrides the configured one
    #[arg(short, long)]
    spot: Option<f64>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Include the sampled payoff curve in the JSON report
    #[arg(long, requires = "json")]
    curve: bool,

    /// List the template library and exit
    #[arg(long)]
    list_templates: bool,
}

/// One leg as given on the command line
#[derive(Debug, Deserialize)]
struct LegSpec {
    series: String,
    qty: i64,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Serialize)]
struct Report<'a> {
    template: Option<&'a str>,
    legs: &'a [Leg],
    pattern: Option<PatternMatch>,
    summary: StrategySummary,
    /// Set when the curve has NaN samples; risk and what-if are then omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_curve: Option<String>,
    risk: Option<RiskSummary>,
    what_if: Option<WhatIf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    curve: Option<&'a PayoffCurve>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(args.config.as_deref()).context("loading configuration")?;
    if let Some(spot) = args.spot {
        config.scenario.manual_spot = Some(spot);
    }
    config.validate()?;

    let library = match TemplateLibrary::from_path(&config.data.templates) {
        Ok(library) => library,
        Err(e) if args.template.is_none() && !args.list_templates => {
            tracing::warn!("No template library, skipping pattern detection: {}", e);
            TemplateLibrary::default()
        }
        Err(e) => return Err(e).context("loading template library"),
    };

    if args.list_templates {
        print_library(&library);
        return Ok(());
    }

    let market = MarketSnapshot::load(&config.data.snapshot).context("loading market snapshot")?;
    let multiplier = market.default_multiplier().unwrap_or(config.scenario.multiplier);

    let legs = match (&args.template, &args.legs) {
        (Some(name), _) => {
            let Some(template) = library.get(name) else {
                bail!("unknown template {:?}; try --list-templates", name);
            };
            let spot = config.scenario.manual_spot.or_else(|| market.default_spot());
            let instance = TemplateBuilder::new(&market, multiplier).instantiate(template, spot)?;
            info!(
                "Instantiated {} with {} of {} components",
                name,
                template.components.len() - instance.missing.len(),
                template.components.len()
            );
            instance.legs
        }
        (None, Some(raw)) => parse_legs(raw)?
            .into_iter()
            .map(|spec| market.build_leg(&spec.series, spec.qty, spec.price, multiplier))
            .collect::<StrategyResult<Vec<_>>>()?,
        (None, None) => bail!("nothing to evaluate: pass --template or --legs"),
    };

    let scenario = config.scenario.to_params(chrono::Local::now().date_naive());
    let curve = PayoffCurve::build(&legs, &scenario)?;

    let matcher = PatternMatcher::with_config(config.matcher.clone());
    let pattern = PatternMatcher::detection_spot(scenario.manual_spot, &legs)
        .and_then(|spot| matcher.detect(&legs, spot, &library));

    let balance = config.portfolio.initial_balance;
    let summary = StrategySummary::compute(&legs, &config.fees);
    let risk = RiskSummary::analyze(&curve, &legs, balance);

    let (invalid_curve, risk, what_if) = if risk.valid {
        let what_if = WhatIf::evaluate(&curve, config.portfolio.estimate_price, balance, risk.total_initial_margin);
        (None, Some(risk), Some(what_if))
    } else {
        let reason = format!("no valid curve: missing price for {}", risk.unpriced_legs.join(", "));
        (Some(reason), None, None)
    };

    let report = Report {
        template: args.template.as_deref(),
        legs: &legs,
        pattern,
        summary,
        invalid_curve,
        risk,
        what_if,
        curve: args.curve.then_some(&curve),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &curve);
    }

    Ok(())
}

/// Inline JSON, or the path of a file holding it
fn parse_legs(raw: &str) -> Result<Vec<LegSpec>> {
    let json = if Path::new(raw).is_file() {
        fs::read_to_string(raw).with_context(|| format!("reading legs from {}", raw))?
    } else {
        raw.to_string()
    };
    serde_json::from_str(&json).context("parsing --legs")
}

fn print_library(library: &TemplateLibrary) {
    println!("Strategy Templates ({})", library.len());
    println!("===================\n");
    for template in library.iter() {
        println!("  {:<28} {:>2} legs  {}", template.name, template.components.len(), template.group);
    }
}

fn fmt_price(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{:.2}", p))
}

fn print_report(report: &Report, curve: &PayoffCurve) {
    println!("Strategy Evaluation");
    println!("===================\n");

    println!("Legs:");
    for leg in report.legs {
        let kind = leg.kind.map_or("Missing", |k| k.label());
        println!(
            "  {:<28} {:<7} qty {:>4}  price {:>9.2}  premium {:>12.2}",
            leg.series, kind, leg.qty, leg.trade_price, leg.premium_total
        );
    }

    println!("\nPattern:");
    match &report.pattern {
        Some(m) if m.score == 0 => println!("  {}", m.name),
        Some(m) => println!("  {} (nearest, score {})", m.name, m.score),
        None => println!("  Custom"),
    }

    let s = &report.summary;
    println!("\nSummary:");
    println!("  Option contracts: {}", s.option_contracts);
    println!("  Future contracts: {}", s.future_contracts);
    println!("  Net premium:      {:.2}", s.net_premium);
    println!("  Round-trip fees:  {:.2}", s.fees);

    if let Some(reason) = &report.invalid_curve {
        println!("\nRisk at expiry:");
        println!("  {}; set a price with --legs to evaluate", reason);
        return;
    }

    if let Some(r) = &report.risk {
        print_risk(r, curve);
    }
    if let Some(w) = &report.what_if {
        print_what_if(w);
    }
}

fn print_risk(r: &RiskSummary, curve: &PayoffCurve) {
    println!("\nRisk at expiry:");
    println!(
        "  Grid:             {} .. {} ({} points)",
        fmt_price(curve.prices.first().copied()),
        fmt_price(curve.prices.last().copied()),
        curve.len()
    );
    let breakevens: Vec<String> = r.breakevens.iter().map(|b| format!("{:.2}", b)).collect();
    println!("  Breakevens:       {}", if breakevens.is_empty() { "-".to_string() } else { breakevens.join(", ") });
    println!("  Max profit:       {}", fmt_price(r.max_profit));
    println!("  Max loss:         {}", fmt_price(r.max_loss));
    println!("  Initial margin:   {:.2}", r.total_initial_margin);
    println!("  Maint. margin:    {:.2}", r.total_maintenance_margin);
    println!("  Margin call below {}", fmt_price(r.margin_call_price));
    println!("  Stop-out below    {}", fmt_price(r.stop_out_price));
    if !r.broke_points.is_empty() {
        let broke: Vec<String> = r.broke_points.iter().map(|b| format!("{:.2}", b)).collect();
        println!("  Broke points:     {}", broke.join(", "));
    }
}

fn print_what_if(w: &WhatIf) {
    println!("\nWhat-if at {:.2}:", w.estimate_price);
    println!("  P/L:              {:.2}", w.pnl);
    println!("  Equity:           {:.2}", w.equity);
    if w.below_initial_margin {
        println!("  Equity is below the initial margin requirement");
    }
}
