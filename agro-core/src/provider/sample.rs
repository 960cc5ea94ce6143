use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

use crate::model::{
    AirQuality, ExtendedWeather, ForecastDay, HourlyEntry, MoistureReading, RiskLevel, TrendPoint,
    Trends, VegetationIndices, WeatherSnapshot, YieldPrediction,
};

use super::{AgroDataProvider, ProviderId};

/// Deterministic offline data derived from the city name. Also used as the
/// per-domain fallback when the live API fails.
#[derive(Debug, Clone)]
pub struct SampleProvider {
    anchor: DateTime<Utc>,
}

impl SampleProvider {
    pub fn new() -> Self {
        Self { anchor: Utc::now() }
    }

    /// Pins "now" so generated dates are reproducible.
    pub fn anchored_at(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    fn today(&self) -> NaiveDate {
        self.anchor.date_naive()
    }
}

impl Default for SampleProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable per-city seed in `0..1000`.
fn seed(city: &str) -> u32 {
    city.to_lowercase()
        .bytes()
        .fold(17u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
        % 1000
}

/// Maps the seed onto `[min, max]`, varied by `salt`.
fn spread(city: &str, salt: u32, min: f64, max: f64) -> f64 {
    let step = (seed(city).wrapping_add(salt.wrapping_mul(97))) % 1000;
    let value = min + (max - min) * f64::from(step) / 999.0;
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl AgroDataProvider for SampleProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Sample
    }

    async fn current_weather(&self, city: &str) -> Result<WeatherSnapshot> {
        let temperature = spread(city, 1, -5.0, 35.0);
        let sunrise = self.today().and_hms_opt(4, 50, 0).map(|t| t.and_utc());
        let sunset = self.today().and_hms_opt(19, 10, 0).map(|t| t.and_utc());

        Ok(WeatherSnapshot {
            temperature,
            humidity: spread(city, 2, 30.0, 95.0),
            wind_speed: spread(city, 3, 0.5, 14.0),
            description: "мінлива хмарність".to_string(),
            sunrise,
            sunset,
            max_temperature: Some(temperature + 4.0),
            min_temperature: Some(temperature - 6.0),
            country: Some("UA".to_string()),
        })
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>> {
        let base = spread(city, 1, -5.0, 35.0);
        let days = (0..7u32)
            .filter_map(|offset| {
                let date = self.today().checked_add_days(Days::new(u64::from(offset)))?;
                let swing = f64::from(offset % 3) * 1.5;
                Some(ForecastDay {
                    date,
                    max_temperature: base + 4.0 - swing,
                    min_temperature: base - 6.0 - swing,
                    description: "мінлива хмарність".to_string(),
                    humidity: Some(spread(city, 10 + offset, 35.0, 90.0)),
                    precipitation_mm: Some(spread(city, 20 + offset, 0.0, 12.0)),
                    wind_speed: Some(spread(city, 30 + offset, 0.5, 12.0)),
                })
            })
            .collect();
        Ok(days)
    }

    async fn hourly(&self, city: &str) -> Result<Vec<HourlyEntry>> {
        let base = spread(city, 1, -5.0, 35.0);
        let entries = (0..24i64)
            .map(|hour| HourlyEntry {
                time: self.anchor + Duration::hours(hour),
                temperature: base + ((hour % 12) as f64 - 6.0) / 2.0,
                humidity: Some(spread(city, 40 + hour as u32, 30.0, 95.0)),
                wind_speed: Some(spread(city, 3, 0.5, 14.0)),
                description: "мінлива хмарність".to_string(),
                precipitation_probability: Some(spread(city, 50 + hour as u32, 0.0, 100.0)),
            })
            .collect();
        Ok(entries)
    }

    async fn extended(&self, city: &str) -> Result<ExtendedWeather> {
        Ok(ExtendedWeather {
            pressure: Some(spread(city, 4, 995.0, 1030.0)),
            visibility: Some(spread(city, 5, 2000.0, 10000.0)),
            uv_index: Some(spread(city, 6, 0.0, 9.0)),
            cloudiness: Some(spread(city, 7, 0.0, 100.0)),
            dew_point: Some(spread(city, 8, -8.0, 20.0)),
            feels_like: Some(spread(city, 1, -5.0, 35.0) - 1.0),
        })
    }

    async fn air_quality(&self, city: &str) -> Result<AirQuality> {
        Ok(AirQuality {
            index: spread(city, 9, 10.0, 140.0),
            pm2_5: Some(spread(city, 11, 2.0, 60.0)),
            pm10: Some(spread(city, 12, 5.0, 90.0)),
            no2: Some(spread(city, 13, 1.0, 80.0)),
            o3: Some(spread(city, 14, 10.0, 120.0)),
            co: Some(spread(city, 15, 100.0, 900.0)),
            so2: Some(spread(city, 16, 0.5, 30.0)),
        })
    }

    async fn soil_moisture(&self, city: &str) -> Result<MoistureReading> {
        let current = spread(city, 17, 10.0, 95.0);
        let average = spread(city, 18, 35.0, 60.0);

        Ok(MoistureReading {
            current_moisture: current,
            historical_average: Some(average),
            moisture_difference: Some(((current - average) * 10.0).round() / 10.0),
            risk_level: Some(RiskLevel::from_moisture(current)),
        })
    }

    async fn vegetation(&self, city: &str) -> Result<VegetationIndices> {
        let ndvi = spread(city, 19, 0.05, 0.95);

        Ok(VegetationIndices {
            ndvi,
            evi: Some((ndvi * 0.8 * 100.0).round() / 100.0),
            savi: Some((ndvi * 0.9 * 100.0).round() / 100.0),
            ndwi: Some(spread(city, 21, -0.5, 0.5)),
            lai: Some(spread(city, 22, 0.3, 5.5)),
            health: None,
        })
    }

    async fn trends(&self, city: &str) -> Result<Trends> {
        let series = |salt: u32, min: f64, max: f64| -> Vec<TrendPoint> {
            (0..14u32)
                .rev()
                .filter_map(|back| {
                    let date = self.today().checked_sub_days(Days::new(u64::from(back)))?;
                    Some(TrendPoint { date, value: spread(city, salt + back, min, max) })
                })
                .collect()
        };

        Ok(Trends {
            moisture: series(60, 10.0, 95.0),
            temperature: series(80, -5.0, 35.0),
            ndvi: series(100, 0.05, 0.95),
        })
    }

    async fn yield_prediction(&self, city: &str) -> Result<YieldPrediction> {
        Ok(YieldPrediction {
            crop: "пшениця".to_string(),
            predicted_yield: spread(city, 23, 2.5, 7.5),
            unit: "t/ha".to_string(),
            confidence: Some(spread(city, 24, 60.0, 95.0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn provider() -> SampleProvider {
        SampleProvider::anchored_at(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn same_city_gives_same_readings() {
        let p = provider();
        let a = p.soil_moisture("Poltava").await.unwrap();
        let b = p.soil_moisture("poltava").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn values_stay_within_normalized_ranges() {
        let p = provider();
        for city in ["Kyiv", "Lviv", "Odesa", "Kharkiv", "Dnipro", "Вінниця"] {
            let m = p.soil_moisture(city).await.unwrap();
            assert!((0.0..=100.0).contains(&m.current_moisture));

            let v = p.vegetation(city).await.unwrap();
            assert!((-1.0..=1.0).contains(&v.ndvi));

            let w = p.current_weather(city).await.unwrap();
            assert!((0.0..=100.0).contains(&w.humidity));
        }
    }

    #[tokio::test]
    async fn forecast_covers_a_week_from_anchor() {
        let days = provider().forecast("Kyiv").await.unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
    }

    #[tokio::test]
    async fn trend_series_are_date_ordered() {
        let trends = provider().trends("Kyiv").await.unwrap();
        assert_eq!(trends.moisture.len(), 14);
        assert!(trends.moisture.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(trends.moisture.last().map(|p| p.date), NaiveDate::from_ymd_opt(2024, 6, 1));
    }
}
