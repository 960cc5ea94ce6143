use agro_core::{
    Config, DashboardReport, DashboardService, MetricKind, ProviderConfig, ProviderId,
    TemperatureUnit, analyze, classify,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select, Text};
use tracing::info;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "agro", version, about = "Agro-meteorological dashboard CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a data provider and dashboard defaults.
    Configure {
        /// Provider short name, e.g. "dashboard" or "sample".
        provider: String,
    },

    /// Show the full dashboard for a city.
    Show {
        /// City name; falls back to the configured default city.
        city: Option<String>,

        /// Override the default provider.
        #[arg(long)]
        provider: Option<String>,

        /// Temperature unit: celsius, fahrenheit or kelvin.
        #[arg(long)]
        unit: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show only the active alerts for a city.
    Alerts {
        city: Option<String>,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show the seven-day field operations calendar.
    Calendar {
        city: Option<String>,

        /// First day of the window (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Classify a single metric value, e.g. `agro classify moisture 35`.
    Classify {
        /// One of: moisture, ndvi, evi, savi, ndwi, lai, aqi.
        metric: String,

        value: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, provider, unit, json } => {
                let config = Config::load()?;
                let unit = match unit {
                    Some(u) => TemperatureUnit::try_from(u.as_str())?,
                    None => config.temperature_unit,
                };
                let report = load_report(&config, city, provider.as_deref(), None).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    output::print_report(&report, unit);
                }
                Ok(())
            }
            Command::Alerts { city, provider, json } => {
                let config = Config::load()?;
                let report = load_report(&config, city, provider.as_deref(), None).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report.alerts)?);
                } else {
                    output::print_alerts(&report.alerts);
                }
                Ok(())
            }
            Command::Calendar { city, date, provider, json } => {
                let config = Config::load()?;
                let today = date.as_deref().map(parse_date).transpose()?;
                let report = load_report(&config, city, provider.as_deref(), today).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report.calendar)?);
                } else {
                    output::print_calendar(&report.calendar);
                }
                Ok(())
            }
            Command::Classify { metric, value } => {
                let metric = MetricKind::try_from(metric.as_str())?;
                output::print_classification(&classify(metric, Some(value)));
                Ok(())
            }
        }
    }
}

async fn load_report(
    config: &Config,
    city: Option<String>,
    provider: Option<&str>,
    today: Option<NaiveDate>,
) -> Result<DashboardReport> {
    let city = config.resolve_city(city)?;
    let provider = provider.map(ProviderId::try_from).transpose()?;
    let service = DashboardService::from_config(config, provider)?;

    info!(%city, provider = %service.provider_id(), "loading dashboard");

    let snapshot = service.fetch(&city).await;

    let now = Utc::now();
    Ok(analyze(snapshot, today.unwrap_or_else(|| now.date_naive()), now))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{value}'. Expected format: YYYY-MM-DD"))
}

fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.needs_config() {
        let existing = config.provider_config(id).cloned();
        let default_url = existing
            .as_ref()
            .and_then(|c| c.base_url.clone())
            .unwrap_or_else(|| "http://localhost:5000".to_string());

        let base_url = Text::new("Dashboard API base URL:")
            .with_default(&default_url)
            .prompt()
            .context("Failed to read base URL")?;

        let api_key = Password::new("API key (leave empty if none):")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        let api_key = Some(api_key.trim().to_string()).filter(|k| !k.is_empty());

        let mut settings = ProviderConfig::new(base_url.trim(), api_key);
        if let Some(existing) = existing {
            settings.timeout_secs = existing.timeout_secs;
        }
        config.upsert_provider(id, settings);

        config.fallback_to_sample = Confirm::new("Fall back to sample data when a request fails?")
            .with_default(config.fallback_to_sample)
            .prompt()
            .context("Failed to read fallback choice")?;
    } else {
        config.upsert_provider(id, ProviderConfig { base_url: None, api_key: None, timeout_secs: 30 });
    }

    let units = TemperatureUnit::all().to_vec();
    let start = units.iter().position(|u| *u == config.temperature_unit).unwrap_or(0);
    config.temperature_unit = Select::new("Temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read temperature unit")?;

    let city = Text::new("Default city (leave empty for none):")
        .with_default(config.default_city.as_deref().unwrap_or(""))
        .prompt()
        .context("Failed to read default city")?;
    config.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

    if Confirm::new(&format!("Make '{id}' the default provider?"))
        .with_default(true)
        .prompt()
        .context("Failed to read default provider choice")?
    {
        config.set_default_provider(id);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_overrides() {
        let cli = Cli::try_parse_from(["agro", "show", "Kyiv", "--unit", "f", "--json"]).unwrap();
        match cli.command {
            Command::Show { city, unit, json, provider } => {
                assert_eq!(city.as_deref(), Some("Kyiv"));
                assert_eq!(unit.as_deref(), Some("f"));
                assert!(json);
                assert!(provider.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_classify() {
        let cli = Cli::try_parse_from(["agro", "classify", "ndvi", "0.42"]).unwrap();
        assert!(matches!(cli.command, Command::Classify { ref metric, value } if metric == "ndvi" && value == 0.42));
    }

    #[test]
    fn calendar_date_must_be_iso() {
        assert_eq!(parse_date("2024-06-01").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_date("01.06.2024").unwrap_err().to_string().contains("YYYY-MM-DD"));
    }
}
