// Endpoints disagree on casing and on whether they wrap the payload in a
// `{success, data}` envelope, so every raw struct accepts both spellings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    AirQuality, DataDomain, ExtendedWeather, ForecastDay, HourlyEntry, MoistureReading,
    RiskLevel, TrendPoint, Trends, VegetationHealth, VegetationIndices, WeatherSnapshot,
    YieldPrediction,
};

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("{domain} payload is missing required field `{field}`")]
    MissingField { domain: DataDomain, field: &'static str },

    #[error("{domain} field `{field}` is out of range: {value}")]
    OutOfRange { domain: DataDomain, field: &'static str, value: f64 },

    #[error("{domain} field `{field}` has an unrecognized value: {value}")]
    Invalid { domain: DataDomain, field: &'static str, value: String },
}

/// Reported by an endpoint that answered `success: false`, or succeeded
/// without any data.
#[derive(Debug, Error, PartialEq)]
#[error("{domain} endpoint reported failure: {message}")]
pub struct ApiError {
    pub domain: DataDomain,
    pub message: String,
}

/// A decoded response body, either wrapped or bare.
#[derive(Debug)]
pub enum Envelope<T> {
    Wrapped {
        success: bool,
        data: Option<T>,
        message: Option<String>,
        error: Option<String>,
    },
    Bare(T),
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Any object with a `success` key is decoded strictly as a wrapper; only
    /// other bodies are taken as the bare payload. The `data` of a failed
    /// response is never decoded.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let wrapped = value.as_object().is_some_and(|obj| obj.contains_key("success"));
        if !wrapped {
            return Ok(Envelope::Bare(serde_json::from_value(value)?));
        }

        let raw: RawEnvelope = serde_json::from_value(value)?;
        let data = match raw.data {
            Some(data) if raw.success && !data.is_null() => Some(serde_json::from_value(data)?),
            _ => None,
        };

        Ok(Envelope::Wrapped { success: raw.success, data, message: raw.message, error: raw.error })
    }

    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        Self::from_value(serde_json::from_str(body)?)
    }
}

impl<T> Envelope<T> {
    pub fn into_data(self, domain: DataDomain) -> Result<T, ApiError> {
        match self {
            Envelope::Bare(data) => Ok(data),
            Envelope::Wrapped { success: true, data: Some(data), .. } => Ok(data),
            Envelope::Wrapped { success, message, error, .. } => {
                let fallback = if success { "response contained no data" } else { "unspecified error" };
                let message = message.or(error).unwrap_or_else(|| fallback.to_string());
                Err(ApiError { domain, message })
            }
        }
    }
}

fn require<T>(value: Option<T>, domain: DataDomain, field: &'static str) -> Result<T, NormalizeError> {
    value.ok_or(NormalizeError::MissingField { domain, field })
}

fn check_range(
    value: f64,
    min: f64,
    max: f64,
    domain: DataDomain,
    field: &'static str,
) -> Result<f64, NormalizeError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(NormalizeError::OutOfRange { domain, field, value })
    }
}

fn check_optional_range(
    value: Option<f64>,
    min: f64,
    max: f64,
    domain: DataDomain,
    field: &'static str,
) -> Result<Option<f64>, NormalizeError> {
    value.map(|v| check_range(v, min, max, domain, field)).transpose()
}

fn check_finite(value: f64, domain: DataDomain, field: &'static str) -> Result<f64, NormalizeError> {
    check_range(value, f64::MIN, f64::MAX, domain, field)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn parse_date(value: &str, domain: DataDomain) -> Result<NaiveDate, NormalizeError> {
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| NormalizeError::Invalid {
        domain,
        field: "date",
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeather {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    #[serde(alias = "wind_speed")]
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    #[serde(alias = "max_temperature")]
    pub max_temperature: Option<f64>,
    #[serde(alias = "min_temperature")]
    pub min_temperature: Option<f64>,
    pub country: Option<String>,
}

pub fn weather(raw: RawWeather) -> Result<WeatherSnapshot, NormalizeError> {
    const D: DataDomain = DataDomain::CurrentWeather;

    let temperature = check_finite(require(raw.temperature, D, "temperature")?, D, "temperature")?;
    let humidity = check_range(require(raw.humidity, D, "humidity")?, 0.0, 100.0, D, "humidity")?;
    let wind_speed =
        check_range(require(raw.wind_speed, D, "windSpeed")?, 0.0, f64::MAX, D, "windSpeed")?;

    Ok(WeatherSnapshot {
        temperature,
        humidity,
        wind_speed,
        description: raw.description.unwrap_or_default(),
        sunrise: raw.sunrise.and_then(unix_to_utc),
        sunset: raw.sunset.and_then(unix_to_utc),
        max_temperature: raw.max_temperature.filter(|t| t.is_finite()),
        min_temperature: raw.min_temperature.filter(|t| t.is_finite()),
        country: raw.country.filter(|c| !c.is_empty()),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForecastDay {
    pub date: Option<String>,
    pub dt: Option<i64>,
    #[serde(alias = "max_temperature", alias = "maxTemp")]
    pub max_temperature: Option<f64>,
    #[serde(alias = "min_temperature", alias = "minTemp")]
    pub min_temperature: Option<f64>,
    pub description: Option<String>,
    pub humidity: Option<f64>,
    #[serde(alias = "precipitation_mm")]
    pub precipitation: Option<f64>,
    #[serde(alias = "wind_speed")]
    pub wind_speed: Option<f64>,
}

pub fn forecast(raw: Vec<RawForecastDay>) -> Result<Vec<ForecastDay>, NormalizeError> {
    const D: DataDomain = DataDomain::Forecast;

    let mut days = raw
        .into_iter()
        .map(|day| {
            let date = match (day.date.as_deref(), day.dt) {
                (Some(date), _) => parse_date(date, D)?,
                (None, Some(dt)) => require(unix_to_utc(dt), D, "dt")?.date_naive(),
                (None, None) => {
                    return Err(NormalizeError::MissingField { domain: D, field: "date" });
                }
            };
            let max = require(day.max_temperature, D, "maxTemperature")?;
            let min = require(day.min_temperature, D, "minTemperature")?;

            Ok(ForecastDay {
                date,
                max_temperature: check_finite(max, D, "maxTemperature")?,
                min_temperature: check_finite(min, D, "minTemperature")?,
                description: day.description.unwrap_or_default(),
                humidity: check_optional_range(day.humidity, 0.0, 100.0, D, "humidity")?,
                precipitation_mm: check_optional_range(
                    day.precipitation,
                    0.0,
                    f64::MAX,
                    D,
                    "precipitation",
                )?,
                wind_speed: check_optional_range(day.wind_speed, 0.0, f64::MAX, D, "windSpeed")?,
            })
        })
        .collect::<Result<Vec<_>, NormalizeError>>()?;

    days.sort_by_key(|d| d.date);
    Ok(days)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHourlyEntry {
    pub time: Option<String>,
    pub dt: Option<i64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    #[serde(alias = "wind_speed")]
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    #[serde(alias = "precipitation_probability", alias = "pop")]
    pub precipitation_probability: Option<f64>,
}

pub fn hourly(raw: Vec<RawHourlyEntry>) -> Result<Vec<HourlyEntry>, NormalizeError> {
    const D: DataDomain = DataDomain::Hourly;

    let mut entries = raw
        .into_iter()
        .map(|entry| {
            let time = match (entry.time.as_deref(), entry.dt) {
                (Some(time), _) => DateTime::parse_from_rfc3339(time)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| NormalizeError::Invalid {
                        domain: D,
                        field: "time",
                        value: time.to_string(),
                    })?,
                (None, Some(dt)) => require(unix_to_utc(dt), D, "dt")?,
                (None, None) => {
                    return Err(NormalizeError::MissingField { domain: D, field: "time" });
                }
            };

            Ok(HourlyEntry {
                time,
                temperature: check_finite(
                    require(entry.temperature, D, "temperature")?,
                    D,
                    "temperature",
                )?,
                humidity: check_optional_range(entry.humidity, 0.0, 100.0, D, "humidity")?,
                wind_speed: check_optional_range(entry.wind_speed, 0.0, f64::MAX, D, "windSpeed")?,
                description: entry.description.unwrap_or_default(),
                precipitation_probability: entry.precipitation_probability,
            })
        })
        .collect::<Result<Vec<_>, NormalizeError>>()?;

    entries.sort_by_key(|e| e.time);
    Ok(entries)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExtendedWeather {
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    #[serde(alias = "uv_index", alias = "uvi")]
    pub uv_index: Option<f64>,
    #[serde(alias = "clouds")]
    pub cloudiness: Option<f64>,
    #[serde(alias = "dew_point")]
    pub dew_point: Option<f64>,
    #[serde(alias = "feels_like")]
    pub feels_like: Option<f64>,
}

pub fn extended(raw: RawExtendedWeather) -> Result<ExtendedWeather, NormalizeError> {
    const D: DataDomain = DataDomain::Extended;

    Ok(ExtendedWeather {
        pressure: check_optional_range(raw.pressure, 0.0, f64::MAX, D, "pressure")?,
        visibility: check_optional_range(raw.visibility, 0.0, f64::MAX, D, "visibility")?,
        uv_index: check_optional_range(raw.uv_index, 0.0, f64::MAX, D, "uvIndex")?,
        cloudiness: check_optional_range(raw.cloudiness, 0.0, 100.0, D, "cloudiness")?,
        dew_point: raw.dew_point.filter(|v| v.is_finite()),
        feels_like: raw.feels_like.filter(|v| v.is_finite()),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAirQuality {
    #[serde(alias = "aqi")]
    pub index: Option<f64>,
    #[serde(alias = "pm25", alias = "pm2.5")]
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
}

pub fn air_quality(raw: RawAirQuality) -> Result<AirQuality, NormalizeError> {
    const D: DataDomain = DataDomain::AirQuality;

    Ok(AirQuality {
        index: check_range(require(raw.index, D, "index")?, 0.0, f64::MAX, D, "index")?,
        pm2_5: check_optional_range(raw.pm2_5, 0.0, f64::MAX, D, "pm2_5")?,
        pm10: check_optional_range(raw.pm10, 0.0, f64::MAX, D, "pm10")?,
        no2: check_optional_range(raw.no2, 0.0, f64::MAX, D, "no2")?,
        o3: check_optional_range(raw.o3, 0.0, f64::MAX, D, "o3")?,
        co: check_optional_range(raw.co, 0.0, f64::MAX, D, "co")?,
        so2: check_optional_range(raw.so2, 0.0, f64::MAX, D, "so2")?,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMoisture {
    #[serde(alias = "currentMoisture")]
    pub current_moisture: Option<f64>,
    #[serde(alias = "historicalAverage")]
    pub historical_average: Option<f64>,
    #[serde(alias = "moistureDifference")]
    pub moisture_difference: Option<f64>,
    #[serde(alias = "riskLevel")]
    pub risk_level: Option<String>,
}

pub fn moisture(raw: RawMoisture) -> Result<MoistureReading, NormalizeError> {
    const D: DataDomain = DataDomain::SoilMoisture;

    let current = check_range(
        require(raw.current_moisture, D, "current_moisture")?,
        0.0,
        100.0,
        D,
        "current_moisture",
    )?;

    let risk_level = raw
        .risk_level
        .map(|label| {
            RiskLevel::parse(&label).ok_or(NormalizeError::Invalid {
                domain: D,
                field: "risk_level",
                value: label,
            })
        })
        .transpose()?;

    Ok(MoistureReading {
        current_moisture: current,
        historical_average: check_optional_range(
            raw.historical_average,
            0.0,
            100.0,
            D,
            "historical_average",
        )?,
        moisture_difference: raw.moisture_difference.filter(|v| v.is_finite()),
        risk_level,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVegetation {
    #[serde(alias = "NDVI")]
    pub ndvi: Option<f64>,
    #[serde(alias = "EVI")]
    pub evi: Option<f64>,
    #[serde(alias = "SAVI")]
    pub savi: Option<f64>,
    #[serde(alias = "NDWI")]
    pub ndwi: Option<f64>,
    #[serde(alias = "LAI")]
    pub lai: Option<f64>,
    pub health: Option<String>,
}

pub fn vegetation(raw: RawVegetation) -> Result<VegetationIndices, NormalizeError> {
    const D: DataDomain = DataDomain::Vegetation;

    let health = raw
        .health
        .map(|label| {
            VegetationHealth::parse(&label).ok_or(NormalizeError::Invalid {
                domain: D,
                field: "health",
                value: label,
            })
        })
        .transpose()?;

    Ok(VegetationIndices {
        ndvi: check_range(require(raw.ndvi, D, "ndvi")?, -1.0, 1.0, D, "ndvi")?,
        evi: check_optional_range(raw.evi, -1.0, 1.0, D, "evi")?,
        savi: check_optional_range(raw.savi, -1.0, 1.0, D, "savi")?,
        ndwi: check_optional_range(raw.ndwi, -1.0, 1.0, D, "ndwi")?,
        lai: check_optional_range(raw.lai, 0.0, f64::MAX, D, "lai")?,
        health,
    })
}

#[derive(Debug, Deserialize)]
pub struct RawTrendPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTrends {
    #[serde(default)]
    pub moisture: Vec<RawTrendPoint>,
    #[serde(default)]
    pub temperature: Vec<RawTrendPoint>,
    #[serde(default)]
    pub ndvi: Vec<RawTrendPoint>,
}

fn series(raw: Vec<RawTrendPoint>) -> Result<Vec<TrendPoint>, NormalizeError> {
    const D: DataDomain = DataDomain::Trends;

    let mut points = raw
        .into_iter()
        .filter(|p| p.value.is_finite())
        .map(|p| Ok(TrendPoint { date: parse_date(&p.date, D)?, value: p.value }))
        .collect::<Result<Vec<_>, NormalizeError>>()?;
    points.sort_by_key(|p| p.date);
    Ok(points)
}

pub fn trends(raw: RawTrends) -> Result<Trends, NormalizeError> {
    Ok(Trends {
        moisture: series(raw.moisture)?,
        temperature: series(raw.temperature)?,
        ndvi: series(raw.ndvi)?,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RawYield {
    pub crop: Option<String>,
    #[serde(alias = "predictedYield")]
    pub predicted_yield: Option<f64>,
    pub unit: Option<String>,
    pub confidence: Option<f64>,
}

pub fn yield_prediction(raw: RawYield) -> Result<YieldPrediction, NormalizeError> {
    const D: DataDomain = DataDomain::Yield;

    Ok(YieldPrediction {
        crop: require(raw.crop.filter(|c| !c.is_empty()), D, "crop")?,
        predicted_yield: check_range(
            require(raw.predicted_yield, D, "predicted_yield")?,
            0.0,
            f64::MAX,
            D,
            "predicted_yield",
        )?,
        unit: raw.unit.unwrap_or_else(|| "t/ha".to_string()),
        confidence: check_optional_range(raw.confidence, 0.0, 100.0, D, "confidence")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value, domain: DataDomain) -> T {
        let envelope: Envelope<T> = Envelope::from_value(value).expect("valid envelope");
        envelope.into_data(domain).expect("successful envelope")
    }

    #[test]
    fn accepts_bare_weather_object() {
        let raw: RawWeather = decode(
            json!({
                "temperature": 21.5,
                "humidity": 60,
                "windSpeed": 3.2,
                "description": "clear sky",
                "sunrise": 1717209600,
                "sunset": 1717264800,
                "maxTemperature": 24.0,
                "minTemperature": 15.0,
                "country": "UA"
            }),
            DataDomain::CurrentWeather,
        );
        let w = weather(raw).unwrap();

        assert_eq!(w.temperature, 21.5);
        assert_eq!(w.humidity, 60.0);
        assert_eq!(w.country.as_deref(), Some("UA"));
        assert_eq!(w.sunrise.map(|t| t.timestamp()), Some(1717209600));
    }

    #[test]
    fn accepts_wrapped_moisture_payload() {
        let raw: RawMoisture = decode(
            json!({
                "success": true,
                "data": {
                    "current_moisture": 27.4,
                    "historical_average": 35.0,
                    "moisture_difference": -7.6,
                    "risk_level": "moderate-dry"
                }
            }),
            DataDomain::SoilMoisture,
        );
        let m = moisture(raw).unwrap();

        assert_eq!(m.current_moisture, 27.4);
        assert_eq!(m.risk_level, Some(RiskLevel::ModerateDry));
    }

    #[test]
    fn failed_envelope_surfaces_message() {
        let envelope: Envelope<RawMoisture> =
            Envelope::from_value(json!({ "success": false, "message": "city not found" })).unwrap();
        let err = envelope.into_data(DataDomain::SoilMoisture).unwrap_err();
        assert_eq!(err.message, "city not found");
        assert!(err.to_string().contains("soil-moisture"));
    }

    #[test]
    fn successful_envelope_without_data_is_an_error() {
        let envelope: Envelope<RawVegetation> =
            Envelope::from_value(json!({ "success": true })).unwrap();
        assert!(envelope.into_data(DataDomain::Vegetation).is_err());
    }

    #[test]
    fn rejects_out_of_range_moisture() {
        let raw = RawMoisture { current_moisture: Some(130.0), ..Default::default() };
        assert_eq!(
            moisture(raw).unwrap_err(),
            NormalizeError::OutOfRange {
                domain: DataDomain::SoilMoisture,
                field: "current_moisture",
                value: 130.0
            }
        );
    }

    #[test]
    fn empty_objects_report_missing_fields_without_panicking() {
        assert!(matches!(
            weather(RawWeather::default()),
            Err(NormalizeError::MissingField { field: "temperature", .. })
        ));
        assert!(moisture(RawMoisture::default()).is_err());
        assert!(vegetation(RawVegetation::default()).is_err());
        assert!(air_quality(RawAirQuality::default()).is_err());
        assert!(yield_prediction(RawYield::default()).is_err());
        assert_eq!(extended(RawExtendedWeather::default()).unwrap(), ExtendedWeather::default());
        assert_eq!(trends(RawTrends::default()).unwrap(), Trends::default());
    }

    #[test]
    fn vegetation_validates_index_range_and_health() {
        let raw: RawVegetation = decode(
            json!({ "NDVI": 0.62, "evi": 0.41, "lai": 2.8, "health": "good" }),
            DataDomain::Vegetation,
        );
        let v = vegetation(raw).unwrap();
        assert_eq!(v.ndvi, 0.62);
        assert_eq!(v.health, Some(VegetationHealth::Good));

        let raw = RawVegetation { ndvi: Some(1.4), ..Default::default() };
        assert!(matches!(vegetation(raw), Err(NormalizeError::OutOfRange { field: "ndvi", .. })));

        let raw = RawVegetation {
            ndvi: Some(0.5),
            health: Some("thriving".into()),
            ..Default::default()
        };
        assert!(matches!(vegetation(raw), Err(NormalizeError::Invalid { field: "health", .. })));
    }

    #[test]
    fn forecast_accepts_dates_or_timestamps_and_sorts() {
        let raw: Vec<RawForecastDay> = decode(
            json!({
                "success": true,
                "data": [
                    { "date": "2024-06-03", "maxTemperature": 25, "minTemperature": 14 },
                    { "dt": 1717200000, "max_temperature": 22, "min_temperature": 12, "precipitation": 4.2 }
                ]
            }),
            DataDomain::Forecast,
        );
        let days = forecast(raw).unwrap();

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[0].precipitation_mm, Some(4.2));
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[test]
    fn trends_sort_and_skip_non_finite() {
        let raw = RawTrends {
            moisture: vec![
                RawTrendPoint { date: "2024-06-02".into(), value: 40.0 },
                RawTrendPoint { date: "2024-06-01T00:00:00Z".into(), value: 35.0 },
                RawTrendPoint { date: "2024-06-03".into(), value: f64::NAN },
            ],
            ..Default::default()
        };
        let t = trends(raw).unwrap();
        assert_eq!(t.moisture.len(), 2);
        assert_eq!(t.moisture[0].value, 35.0);
    }

    #[test]
    fn failed_envelope_ignores_malformed_data() {
        let envelope: Envelope<RawExtendedWeather> = Envelope::from_value(json!({
            "success": false,
            "message": "city not found",
            "data": { "pressure": "n/a", "visibility": [1, 2] }
        }))
        .unwrap();

        let err = envelope.into_data(DataDomain::Extended).unwrap_err();
        assert_eq!(err.message, "city not found");
    }

    #[test]
    fn malformed_data_in_successful_envelope_is_a_decode_error() {
        let result: serde_json::Result<Envelope<RawTrends>> = Envelope::from_value(json!({
            "success": true,
            "data": { "moisture": [{ "date": "2024-06-01", "value": "wet" }] }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn null_data_in_successful_envelope_is_an_api_error() {
        let envelope: Envelope<RawTrends> =
            Envelope::from_value(json!({ "success": true, "data": null })).unwrap();
        let err = envelope.into_data(DataDomain::Trends).unwrap_err();
        assert_eq!(err.message, "response contained no data");
    }
}
