//! Core library for the `agro` dashboard CLI.
//!
//! This crate defines:
//! - Configuration & provider settings
//! - Abstraction over agro-meteorological data providers
//! - Typed models and the normalization of endpoint payloads
//! - Risk classification, recommendations, alerts and the field calendar
//!
//! It is used by `agro-cli`, but can also be reused by other binaries or services.

pub mod alerts;
pub mod calendar;
pub mod classify;
pub mod config;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod recommend;
pub mod service;
pub mod units;

pub use classify::{Classification, MetricKind, StatusLabel, classify};
pub use config::{Config, ProviderConfig};
pub use model::{Alert, CalendarOperation, DashboardSnapshot, Priority};
pub use provider::{AgroDataProvider, ProviderId};
pub use service::{DashboardReport, DashboardService, DashboardSession, analyze};
pub use units::{TemperatureFormat, TemperatureUnit, format_temperature};
