use serde::{Deserialize, Serialize};

use crate::{
    classify::{self, MoistureStatus, StatusLabel},
    model::{
        DashboardSnapshot, ForecastDay, MoistureReading, Priority, VegetationHealth,
        VegetationIndices, WeatherSnapshot,
    },
};

pub const HEAT_STRESS_C: f64 = 30.0;
pub const FROST_C: f64 = 0.0;
pub const STRONG_WIND_MPS: f64 = 10.0;
pub const DISEASE_HUMIDITY_PCT: f64 = 85.0;
pub const HEAVY_RAIN_MM: f64 = 5.0;
/// A moisture deficit against the long-term average beyond this is reported.
pub const MOISTURE_DEFICIT_PCT: f64 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UrgentIrrigation,
    Irrigation,
    PlanIrrigation,
    MaintainIrrigation,
    ReduceIrrigation,
    PauseIrrigation,
    ImproveDrainage,
    FrostProtection,
    EveningIrrigation,
    PostponeSpraying,
    DiseaseInspection,
    CropInspection,
    Fertilization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub priority: Priority,
    pub action: String,
    pub timing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub notes: Vec<String>,
    pub actions: Vec<Action>,
}

impl Recommendations {
    fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    fn act(&mut self, kind: ActionKind, priority: Priority, action: &str, timing: impl Into<String>) {
        self.actions.push(Action {
            kind,
            priority,
            action: action.to_string(),
            timing: timing.into(),
        });
    }

    pub fn actions_with_priority(&self, priority: Priority) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.priority == priority)
    }
}

/// Inputs shared by the recommendation rules and the calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationContext<'a> {
    pub moisture: Option<&'a MoistureReading>,
    pub weather: Option<&'a WeatherSnapshot>,
    pub forecast: Option<&'a [ForecastDay]>,
    pub vegetation: Option<&'a VegetationIndices>,
}

impl<'a> RecommendationContext<'a> {
    pub fn from_snapshot(snapshot: &'a DashboardSnapshot) -> Self {
        Self {
            moisture: snapshot.moisture.as_ref(),
            weather: snapshot.weather.as_ref(),
            forecast: snapshot.forecast.as_deref(),
            vegetation: snapshot.vegetation.as_ref(),
        }
    }

    pub fn moisture_status(&self) -> MoistureStatus {
        classify::moisture_status(self.moisture.map(|m| m.current_moisture))
    }

    pub fn vegetation_health(&self) -> Option<VegetationHealth> {
        self.vegetation.and_then(classify::vegetation_health)
    }
}

pub fn generate(ctx: &RecommendationContext<'_>) -> Recommendations {
    let mut out = Recommendations::default();

    moisture_rules(ctx, &mut out);
    weather_rules(ctx, &mut out);
    forecast_rules(ctx, &mut out);
    vegetation_rules(ctx, &mut out);

    out
}

fn moisture_rules(ctx: &RecommendationContext<'_>, out: &mut Recommendations) {
    let status = ctx.moisture_status();
    let Some(reading) = ctx.moisture else {
        out.note("Дані про вологість ґрунту відсутні, рекомендації щодо поливу недоступні");
        return;
    };
    let value = reading.current_moisture;

    match status {
        MoistureStatus::VeryLow => {
            out.note(format!(
                "Критично низька вологість ґрунту ({value:.1}%). Необхідний терміновий полив"
            ));
            out.act(ActionKind::UrgentIrrigation, Priority::High, "Терміновий полив", "Негайно");
        }
        MoistureStatus::Low => {
            out.note(format!("Низька вологість ґрунту ({value:.1}%). Рекомендується полив"));
            out.act(ActionKind::Irrigation, Priority::High, "Полив", "Протягом 24 годин");
        }
        MoistureStatus::Insufficient => {
            out.note(format!("Вологість ґрунту недостатня ({value:.1}%)"));
            out.act(
                ActionKind::PlanIrrigation,
                Priority::Medium,
                "Запланувати полив",
                "Протягом 2-3 днів",
            );
        }
        MoistureStatus::Optimal => {
            out.note("Вологість ґрунту оптимальна, підтримуйте поточний режим");
            out.act(
                ActionKind::MaintainIrrigation,
                Priority::Low,
                "Підтримувати поточний режим поливу",
                "Постійно",
            );
        }
        MoistureStatus::High => {
            out.note(format!("Вологість ґрунту підвищена ({value:.1}%). Зменште полив"));
            out.act(
                ActionKind::ReduceIrrigation,
                Priority::Medium,
                "Скоротити полив",
                "Наступні 3-5 днів",
            );
        }
        MoistureStatus::Excessive => {
            out.note(format!(
                "Надмірна вологість ґрунту ({value:.1}%). Призупиніть полив до нормалізації"
            ));
            out.act(
                ActionKind::PauseIrrigation,
                Priority::Medium,
                "Призупинити полив",
                "До зниження вологості",
            );
            out.act(
                ActionKind::ImproveDrainage,
                Priority::Medium,
                "Перевірити дренаж",
                "Протягом тижня",
            );
        }
        MoistureStatus::Unknown => {
            out.note(format!("Стан вологості: {}", status.label()));
        }
    }

    if let Some(diff) = reading.moisture_difference.filter(|d| *d < MOISTURE_DEFICIT_PCT) {
        out.note(format!("Вологість на {:.1}% нижча за багаторічну норму", diff.abs()));
    }
}

fn weather_rules(ctx: &RecommendationContext<'_>, out: &mut Recommendations) {
    let Some(weather) = ctx.weather else {
        return;
    };

    if weather.temperature > HEAT_STRESS_C {
        out.note(format!(
            "Спекотна погода ({:.0}°C): можливий тепловий стрес рослин",
            weather.temperature
        ));
        out.act(
            ActionKind::EveningIrrigation,
            Priority::Medium,
            "Полив у вечірні години",
            "Після 18:00",
        );
    }

    if weather.temperature < FROST_C {
        out.note(format!("Заморозки ({:.0}°C): захистіть чутливі культури", weather.temperature));
        out.act(
            ActionKind::FrostProtection,
            Priority::High,
            "Захист від заморозків",
            "Сьогодні ввечері",
        );
    }

    if weather.wind_speed > STRONG_WIND_MPS {
        out.act(
            ActionKind::PostponeSpraying,
            Priority::Medium,
            "Відкласти обприскування",
            "До послаблення вітру",
        );
    }

    if weather.humidity > DISEASE_HUMIDITY_PCT {
        out.note("Висока вологість повітря сприяє розвитку грибкових хвороб");
        out.act(
            ActionKind::DiseaseInspection,
            Priority::Medium,
            "Огляд на грибкові хвороби",
            "Протягом 2 днів",
        );
    }
}

fn forecast_rules(ctx: &RecommendationContext<'_>, out: &mut Recommendations) {
    let Some(days) = ctx.forecast else {
        return;
    };

    if let Some(rainy) = days
        .iter()
        .find(|d| d.precipitation_mm.is_some_and(|mm| mm >= HEAVY_RAIN_MM))
    {
        out.note(format!(
            "Очікуються опади {} ({:.1} мм), врахуйте при плануванні поливу",
            rainy.date.format("%d.%m"),
            rainy.precipitation_mm.unwrap_or_default()
        ));
    }

    if let Some(frosty) = days.iter().find(|d| d.min_temperature < FROST_C) {
        out.act(
            ActionKind::FrostProtection,
            Priority::High,
            "Підготуватися до заморозків",
            format!("До {}", frosty.date.format("%d.%m")),
        );
    }
}

fn vegetation_rules(ctx: &RecommendationContext<'_>, out: &mut Recommendations) {
    let Some(indices) = ctx.vegetation else {
        return;
    };

    match ctx.vegetation_health() {
        Some(VegetationHealth::Poor) => {
            out.note(format!("Поганий стан рослинності (NDVI {:.2})", indices.ndvi));
            out.act(ActionKind::CropInspection, Priority::High, "Обстежити посіви", "Протягом 2 днів");
        }
        Some(VegetationHealth::Moderate) => {
            out.act(
                ActionKind::Fertilization,
                Priority::Medium,
                "Внесення добрив",
                "Протягом тижня",
            );
        }
        _ => {}
    }

    if indices.ndwi.is_some_and(|ndwi| ndwi < 0.0) {
        out.note("NDWI вказує на водний стрес рослин");
    }

    if indices.lai.is_some_and(|lai| lai < 1.0) {
        out.note("Низький індекс листової поверхні (LAI)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Recommendations {
        fn has_action(&self, kind: ActionKind) -> bool {
            self.actions.iter().any(|a| a.kind == kind)
        }
    }

    fn moisture(value: f64) -> MoistureReading {
        MoistureReading {
            current_moisture: value,
            historical_average: None,
            moisture_difference: None,
            risk_level: None,
        }
    }

    fn weather(temperature: f64, humidity: f64, wind_speed: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            humidity,
            wind_speed,
            description: "clear".into(),
            sunrise: None,
            sunset: None,
            max_temperature: None,
            min_temperature: None,
            country: None,
        }
    }

    fn vegetation(ndvi: f64) -> VegetationIndices {
        VegetationIndices { ndvi, evi: None, savi: None, ndwi: None, lai: None, health: None }
    }

    #[test]
    fn very_dry_soil_needs_urgent_irrigation() {
        let reading = moisture(15.0);
        let ctx = RecommendationContext { moisture: Some(&reading), ..Default::default() };
        let recs = generate(&ctx);

        let urgent = recs
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::UrgentIrrigation)
            .expect("urgent irrigation action");
        assert_eq!(urgent.priority, Priority::High);
        assert_eq!(urgent.timing, "Негайно");
    }

    #[test]
    fn waterlogged_soil_pauses_irrigation() {
        let reading = moisture(90.0);
        let ctx = RecommendationContext { moisture: Some(&reading), ..Default::default() };
        let recs = generate(&ctx);

        assert!(recs.has_action(ActionKind::PauseIrrigation));
        assert!(recs.notes.iter().any(|n| n.contains("Призупиніть полив")));
        assert!(!recs.has_action(ActionKind::UrgentIrrigation));
        assert!(!recs.has_action(ActionKind::Irrigation));
    }

    #[test]
    fn empty_context_yields_placeholder() {
        let recs = generate(&RecommendationContext::default());

        assert!(recs.actions.is_empty());
        assert_eq!(recs.notes.len(), 1);
        assert!(recs.notes[0].contains("відсутні"));
    }

    #[test]
    fn rules_are_additive_without_conflict_resolution() {
        let reading = moisture(10.0);
        let hot = weather(35.0, 90.0, 12.0);
        let ctx = RecommendationContext {
            moisture: Some(&reading),
            weather: Some(&hot),
            ..Default::default()
        };
        let recs = generate(&ctx);

        let kinds: Vec<_> = recs.actions.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::UrgentIrrigation,
                ActionKind::EveningIrrigation,
                ActionKind::PostponeSpraying,
                ActionKind::DiseaseInspection,
            ]
        );
    }

    #[test]
    fn frost_in_forecast_adds_protection() {
        let days = vec![ForecastDay {
            date: chrono::NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            max_temperature: 6.0,
            min_temperature: -3.0,
            description: "clear".into(),
            humidity: None,
            precipitation_mm: Some(7.5),
            wind_speed: None,
        }];
        let ctx = RecommendationContext { forecast: Some(&days), ..Default::default() };
        let recs = generate(&ctx);

        let frost = recs
            .actions
            .iter()
            .find(|a| a.kind == ActionKind::FrostProtection)
            .expect("frost action");
        assert_eq!(frost.timing, "До 02.04");
        assert!(recs.notes.iter().any(|n| n.contains("7.5 мм")));
    }

    #[test]
    fn poor_vegetation_gets_inspection() {
        let indices = vegetation(0.2);
        let ctx = RecommendationContext { vegetation: Some(&indices), ..Default::default() };
        let recs = generate(&ctx);
        assert!(recs.has_action(ActionKind::CropInspection));
        assert_eq!(recs.actions_with_priority(Priority::High).count(), 1);

        let indices = vegetation(0.4);
        let ctx = RecommendationContext { vegetation: Some(&indices), ..Default::default() };
        assert!(generate(&ctx).has_action(ActionKind::Fertilization));
    }

    #[test]
    fn moisture_deficit_is_reported() {
        let mut reading = moisture(45.0);
        reading.moisture_difference = Some(-12.5);
        let ctx = RecommendationContext { moisture: Some(&reading), ..Default::default() };
        let recs = generate(&ctx);
        assert!(recs.notes.iter().any(|n| n.contains("12.5%")));
    }
}
