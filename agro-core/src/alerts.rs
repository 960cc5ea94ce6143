use chrono::{DateTime, Utc};

use crate::{
    classify::{self, StatusLabel},
    model::{
        AirQuality, Alert, AlertKind, DashboardSnapshot, MoistureReading, Priority,
        VegetationHealth, VegetationIndices, WeatherSnapshot,
    },
};

pub const HEAT_ALERT_C: f64 = 30.0;
pub const FROST_ALERT_C: f64 = 0.0;
pub const DRY_SOIL_ALERT_PCT: f64 = 30.0;
pub const CRITICAL_DRY_SOIL_PCT: f64 = 20.0;
pub const AIR_QUALITY_ALERT_INDEX: f64 = 80.0;

/// The slice of a snapshot the alert rules look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertInputs<'a> {
    pub weather: Option<&'a WeatherSnapshot>,
    pub moisture: Option<&'a MoistureReading>,
    pub vegetation: Option<&'a VegetationIndices>,
    pub air_quality: Option<&'a AirQuality>,
}

impl<'a> AlertInputs<'a> {
    pub fn from_snapshot(snapshot: &'a DashboardSnapshot) -> Self {
        Self {
            weather: snapshot.weather.as_ref(),
            moisture: snapshot.moisture.as_ref(),
            vegetation: snapshot.vegetation.as_ref(),
            air_quality: snapshot.air_quality.as_ref(),
        }
    }

    fn is_empty(&self) -> bool {
        self.weather.is_none()
            && self.moisture.is_none()
            && self.vegetation.is_none()
            && self.air_quality.is_none()
    }
}

/// Scans the inputs in a fixed rule order. The result depends only on the
/// inputs and `now`, so repeated calls with the same data agree exactly.
pub fn aggregate(inputs: &AlertInputs<'_>, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut push = |id: &str, kind: AlertKind, priority: Priority, title: &str, message: String| {
        alerts.push(Alert {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            message,
            timestamp: now,
            priority,
        });
    };

    if let Some(weather) = inputs.weather {
        if weather.temperature > HEAT_ALERT_C {
            push(
                "temperature-high",
                AlertKind::Warning,
                Priority::High,
                "Висока температура",
                format!(
                    "Температура {:.1}°C. Можливий тепловий стрес рослин, поливайте ввечері",
                    weather.temperature
                ),
            );
        }
        if weather.temperature < FROST_ALERT_C {
            push(
                "temperature-frost",
                AlertKind::Error,
                Priority::High,
                "Заморозки",
                format!(
                    "Температура {:.1}°C. Захистіть чутливі культури від заморозків",
                    weather.temperature
                ),
            );
        }
    }

    if let Some(moisture) = inputs.moisture {
        let value = moisture.current_moisture;
        if value < CRITICAL_DRY_SOIL_PCT {
            push(
                "moisture-critical",
                AlertKind::Error,
                Priority::High,
                "Критично низька вологість ґрунту",
                format!("Вологість ґрунту {value:.1}%. Необхідний терміновий полив"),
            );
        } else if value < DRY_SOIL_ALERT_PCT {
            push(
                "moisture-low",
                AlertKind::Warning,
                Priority::High,
                "Низька вологість ґрунту",
                format!("Вологість ґрунту {value:.1}%. Рекомендується полив"),
            );
        }
    }

    if let Some(vegetation) = inputs
        .vegetation
        .filter(|v| classify::vegetation_health(v) == Some(VegetationHealth::Poor))
    {
        push(
            "vegetation-poor",
            AlertKind::Warning,
            Priority::Medium,
            "Поганий стан рослинності",
            format!("NDVI {:.2}. Рекомендується обстежити посіви", vegetation.ndvi),
        );
    }

    if let Some(air) = inputs.air_quality.filter(|a| a.index > AIR_QUALITY_ALERT_INDEX) {
        let status = classify::air_quality_status(Some(air.index));
        push(
            "air-quality",
            AlertKind::Warning,
            Priority::Medium,
            "Погіршення якості повітря",
            format!("Індекс якості повітря {:.0} ({})", air.index, status.label()),
        );
    }

    if alerts.is_empty() && !inputs.is_empty() {
        alerts.push(Alert {
            id: "all-clear".to_string(),
            kind: AlertKind::Success,
            title: "Умови в нормі".to_string(),
            message: "Критичних відхилень не виявлено".to_string(),
            timestamp: now,
            priority: Priority::Low,
        });
    }

    alerts
}
