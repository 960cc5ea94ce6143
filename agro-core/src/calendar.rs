use chrono::{Days, NaiveDate};

use crate::{
    classify::MoistureStatus,
    model::{
        CalendarOperation, OperationSource, OperationStatus, OperationType, Priority,
        VegetationHealth,
    },
    recommend::{
        DISEASE_HUMIDITY_PCT, FROST_C, HEAT_STRESS_C, HEAVY_RAIN_MM, RecommendationContext,
        STRONG_WIND_MPS,
    },
};

/// Calendar covers `today` and the following six days.
pub const WINDOW_DAYS: u64 = 7;

struct Slot {
    key: &'static str,
    name: &'static str,
    kind: OperationType,
    offset: u64,
    priority: Priority,
    recommendation: String,
    source: OperationSource,
}

/// Builds the operation list for the window starting at `today`, sorted by
/// priority (high first) and then by date.
pub fn build(ctx: &RecommendationContext<'_>, today: NaiveDate) -> Vec<CalendarOperation> {
    let mut slots = Vec::new();

    moisture_slots(ctx, &mut slots);
    weather_slots(ctx, &mut slots);
    vegetation_slots(ctx, &mut slots);

    slots.push(Slot {
        key: "routine-inspection",
        name: "Плановий огляд поля",
        kind: OperationType::Inspection,
        offset: WINDOW_DAYS - 1,
        priority: Priority::Low,
        recommendation: "Щотижневий огляд стану посівів".to_string(),
        source: OperationSource::Routine,
    });

    let mut operations: Vec<CalendarOperation> =
        slots.into_iter().filter_map(|slot| place(slot, today)).collect();

    operations.extend(forecast_operations(ctx, today));

    operations.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.date.cmp(&b.date)));
    operations
}

fn place(slot: Slot, today: NaiveDate) -> Option<CalendarOperation> {
    if slot.offset >= WINDOW_DAYS {
        return None;
    }
    let date = today.checked_add_days(Days::new(slot.offset))?;
    Some(operation(
        slot.key,
        slot.name,
        slot.kind,
        date,
        today,
        slot.priority,
        slot.recommendation,
        slot.source,
    ))
}

#[allow(clippy::too_many_arguments)]
fn operation(
    key: &str,
    name: &str,
    kind: OperationType,
    date: NaiveDate,
    today: NaiveDate,
    priority: Priority,
    recommendation: String,
    source: OperationSource,
) -> CalendarOperation {
    let status = if priority == Priority::High && date == today {
        OperationStatus::Urgent
    } else {
        OperationStatus::Planned
    };

    CalendarOperation {
        id: format!("{key}-{date}"),
        name: name.to_string(),
        kind,
        date,
        priority,
        status,
        recommendation,
        source,
    }
}

fn moisture_slots(ctx: &RecommendationContext<'_>, slots: &mut Vec<Slot>) {
    let Some(reading) = ctx.moisture else {
        return;
    };
    let value = reading.current_moisture;

    let slot = match ctx.moisture_status() {
        MoistureStatus::VeryLow | MoistureStatus::Low => Slot {
            key: "irrigation",
            name: "Полив",
            kind: OperationType::Irrigation,
            offset: 0,
            priority: Priority::High,
            recommendation: format!("Вологість ґрунту {value:.1}%, необхідний полив"),
            source: OperationSource::Moisture,
        },
        MoistureStatus::Insufficient => Slot {
            key: "irrigation",
            name: "Полив",
            kind: OperationType::Irrigation,
            offset: 2,
            priority: Priority::Medium,
            recommendation: format!("Вологість ґрунту {value:.1}%, заплануйте полив"),
            source: OperationSource::Moisture,
        },
        MoistureStatus::High => Slot {
            key: "irrigation-adjust",
            name: "Коригування поливу",
            kind: OperationType::Irrigation,
            offset: 1,
            priority: Priority::Low,
            recommendation: "Скоротіть норму поливу".to_string(),
            source: OperationSource::Moisture,
        },
        MoistureStatus::Excessive => Slot {
            key: "drainage",
            name: "Перевірка дренажу",
            kind: OperationType::Drainage,
            offset: 1,
            priority: Priority::Medium,
            recommendation: format!("Вологість ґрунту {value:.1}%, призупиніть полив"),
            source: OperationSource::Moisture,
        },
        MoistureStatus::Optimal | MoistureStatus::Unknown => return,
    };
    slots.push(slot);
}

fn weather_slots(ctx: &RecommendationContext<'_>, slots: &mut Vec<Slot>) {
    let Some(weather) = ctx.weather else {
        return;
    };

    if weather.temperature > HEAT_STRESS_C {
        slots.push(Slot {
            key: "evening-irrigation",
            name: "Вечірній полив",
            kind: OperationType::Irrigation,
            offset: 0,
            priority: Priority::Medium,
            recommendation: "Поливайте після 18:00 через спеку".to_string(),
            source: OperationSource::Weather,
        });
    }
    if weather.temperature < FROST_C {
        slots.push(Slot {
            key: "frost-protection",
            name: "Захист від заморозків",
            kind: OperationType::Protection,
            offset: 0,
            priority: Priority::High,
            recommendation: "Вкрийте чутливі культури".to_string(),
            source: OperationSource::Weather,
        });
    }
    if weather.wind_speed > STRONG_WIND_MPS {
        slots.push(Slot {
            key: "spraying",
            name: "Обприскування (перенесено)",
            kind: OperationType::Spraying,
            offset: 2,
            priority: Priority::Medium,
            recommendation: format!("Вітер {:.1} м/с, обприскування перенесено", weather.wind_speed),
            source: OperationSource::Weather,
        });
    }
    if weather.humidity > DISEASE_HUMIDITY_PCT {
        slots.push(Slot {
            key: "disease-inspection",
            name: "Огляд на хвороби",
            kind: OperationType::Inspection,
            offset: 1,
            priority: Priority::Medium,
            recommendation: "Висока вологість повітря, перевірте посіви на грибкові хвороби"
                .to_string(),
            source: OperationSource::Weather,
        });
    }
}

fn vegetation_slots(ctx: &RecommendationContext<'_>, slots: &mut Vec<Slot>) {
    match ctx.vegetation_health() {
        Some(VegetationHealth::Poor) => slots.push(Slot {
            key: "crop-inspection",
            name: "Обстеження посівів",
            kind: OperationType::Inspection,
            offset: 1,
            priority: Priority::High,
            recommendation: "Поганий стан рослинності за NDVI".to_string(),
            source: OperationSource::Vegetation,
        }),
        Some(VegetationHealth::Moderate) => slots.push(Slot {
            key: "fertilization",
            name: "Внесення добрив",
            kind: OperationType::Fertilization,
            offset: 3,
            priority: Priority::Medium,
            recommendation: "Задовільний стан рослинності, підживіть посіви".to_string(),
            source: OperationSource::Vegetation,
        }),
        _ => {}
    }
}

fn forecast_operations(ctx: &RecommendationContext<'_>, today: NaiveDate) -> Vec<CalendarOperation> {
    let Some(days) = ctx.forecast else {
        return Vec::new();
    };
    let Some(last) = today.checked_add_days(Days::new(WINDOW_DAYS - 1)) else {
        return Vec::new();
    };

    let mut operations = Vec::new();
    for day in days.iter().filter(|d| d.date >= today && d.date <= last) {
        if let Some(mm) = day.precipitation_mm.filter(|mm| *mm >= HEAVY_RAIN_MM) {
            operations.push(operation(
                "runoff-check",
                "Перевірка стоку після опадів",
                OperationType::Drainage,
                day.date,
                today,
                Priority::Low,
                format!("Прогнозовано {mm:.1} мм опадів"),
                OperationSource::Forecast,
            ));
        }
        if day.min_temperature < FROST_C {
            let date = day.date.pred_opt().filter(|d| *d >= today).unwrap_or(today);
            operations.push(operation(
                "frost-preparation",
                "Підготовка до заморозків",
                OperationType::Protection,
                date,
                today,
                Priority::High,
                format!("Прогнозовано {:.0}°C {}", day.min_temperature, day.date.format("%d.%m")),
                OperationSource::Forecast,
            ));
        }
    }
    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastDay, MoistureReading, VegetationIndices, WeatherSnapshot};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn moisture(value: f64) -> MoistureReading {
        MoistureReading {
            current_moisture: value,
            historical_average: None,
            moisture_difference: None,
            risk_level: None,
        }
    }

    fn forecast_day(offset: u64, min: f64, rain: f64) -> ForecastDay {
        ForecastDay {
            date: today() + Days::new(offset),
            max_temperature: min + 10.0,
            min_temperature: min,
            description: "mixed".into(),
            humidity: None,
            precipitation_mm: Some(rain),
            wind_speed: None,
        }
    }

    #[test]
    fn empty_context_still_has_routine_inspection() {
        let ops = build(&RecommendationContext::default(), today());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationType::Inspection);
        assert_eq!(ops[0].date, today() + Days::new(6));
    }

    #[test]
    fn dry_soil_irrigates_today_as_urgent() {
        let reading = moisture(18.0);
        let ctx = RecommendationContext { moisture: Some(&reading), ..Default::default() };
        let ops = build(&ctx, today());

        let irrigation = &ops[0];
        assert_eq!(irrigation.kind, OperationType::Irrigation);
        assert_eq!(irrigation.date, today());
        assert_eq!(irrigation.priority, Priority::High);
        assert_eq!(irrigation.status, OperationStatus::Urgent);
        assert_eq!(irrigation.id, "irrigation-2024-05-10");
    }

    #[test]
    fn sorted_by_priority_then_date() {
        let reading = moisture(35.0);
        let weather = WeatherSnapshot {
            temperature: 33.0,
            humidity: 90.0,
            wind_speed: 12.0,
            description: "hot".into(),
            sunrise: None,
            sunset: None,
            max_temperature: None,
            min_temperature: None,
            country: None,
        };
        let vegetation = VegetationIndices {
            ndvi: 0.2,
            evi: None,
            savi: None,
            ndwi: None,
            lai: None,
            health: None,
        };
        let ctx = RecommendationContext {
            moisture: Some(&reading),
            weather: Some(&weather),
            vegetation: Some(&vegetation),
            forecast: None,
        };
        let ops = build(&ctx, today());

        for pair in ops.windows(2) {
            assert!(
                (pair[0].priority, pair[0].date) <= (pair[1].priority, pair[1].date),
                "{:?} before {:?}",
                pair[0].id,
                pair[1].id
            );
        }
        assert_eq!(ops[0].id, "crop-inspection-2024-05-11");
        assert_eq!(ops.last().map(|o| o.source), Some(OperationSource::Routine));
    }

    #[test]
    fn forecast_days_outside_window_are_ignored() {
        let days = vec![forecast_day(2, -2.0, 8.0), forecast_day(9, -5.0, 20.0)];
        let ctx = RecommendationContext { forecast: Some(&days), ..Default::default() };
        let ops = build(&ctx, today());

        let frost: Vec<_> = ops.iter().filter(|o| o.kind == OperationType::Protection).collect();
        assert_eq!(frost.len(), 1);
        assert_eq!(frost[0].date, today() + Days::new(1));

        let runoff: Vec<_> = ops.iter().filter(|o| o.kind == OperationType::Drainage).collect();
        assert_eq!(runoff.len(), 1);
        assert_eq!(runoff[0].date, today() + Days::new(2));
    }

    #[test]
    fn frost_today_is_not_moved_before_window() {
        let days = vec![forecast_day(0, -1.0, 0.0)];
        let ctx = RecommendationContext { forecast: Some(&days), ..Default::default() };
        let ops = build(&ctx, today());
        assert_eq!(ops[0].date, today());
        assert_eq!(ops[0].status, OperationStatus::Urgent);
    }
}
