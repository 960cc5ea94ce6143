use agro_core::{
    Alert, CalendarOperation, Classification, DashboardReport, Priority, TemperatureFormat,
    TemperatureUnit,
    model::{AlertKind, OperationStatus},
};

const NO_DATA: &str = "немає даних";

pub fn print_report(report: &DashboardReport, unit: TemperatureUnit) {
    let snapshot = &report.snapshot;
    println!("== {} ({}) ==", snapshot.city, snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC"));

    println!();
    println!("Weather");
    match &snapshot.weather {
        Some(w) => {
            println!("  {}, {}", unit.display_temperature(w.temperature), w.description);
            if let (Some(max), Some(min)) = (w.max_temperature, w.min_temperature) {
                println!(
                    "  max {} / min {}",
                    unit.display_temperature(max),
                    unit.display_temperature(min)
                );
            }
            println!("  humidity {:.0}%, wind {:.1} m/s", w.humidity, w.wind_speed);
        }
        None => println!("  {NO_DATA}"),
    }

    if let Some(days) = snapshot.forecast.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("Forecast");
        for day in days {
            println!(
                "  {}  {} .. {}  {}",
                day.date,
                unit.display_temperature(day.min_temperature),
                unit.display_temperature(day.max_temperature),
                day.description
            );
        }
    }

    println!();
    println!("Soil moisture");
    print_classification(&report.moisture_status);
    if let Some(m) = &snapshot.moisture {
        if let Some(avg) = m.historical_average {
            println!("  historical average {avg:.1}%");
        }
    }

    println!();
    println!("Vegetation");
    print_classification(&report.vegetation_status);
    if let Some(health) = report.vegetation_health {
        println!("  health: {}", health.as_str());
    }

    println!();
    println!("Air quality");
    print_classification(&report.air_quality_status);

    if let Some(trends) = &snapshot.trends {
        println!();
        println!("Trends");
        println!("  moisture {}", trends.moisture_direction());
        println!("  temperature {}", trends.temperature_direction());
        println!("  ndvi {}", trends.ndvi_direction());
    }

    if let Some(y) = &snapshot.yield_prediction {
        println!();
        println!("Yield forecast");
        match y.confidence {
            Some(c) => println!("  {}: {:.1} {} ({c:.0}% confidence)", y.crop, y.predicted_yield, y.unit),
            None => println!("  {}: {:.1} {}", y.crop, y.predicted_yield, y.unit),
        }
    }

    println!();
    println!("Recommendations");
    for note in &report.recommendations.notes {
        println!("  - {note}");
    }
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        for action in report.recommendations.actions_with_priority(priority) {
            println!("  [{priority}] {} ({})", action.action, action.timing);
        }
    }

    println!();
    print_alerts(&report.alerts);

    println!();
    print_calendar(&report.calendar);
}

pub fn print_classification(c: &Classification) {
    match c.value {
        Some(value) => println!("  {}: {value} -> {} ({})", c.metric.as_str(), c.label, c.color),
        None => println!("  {}: {} ({})", c.metric.as_str(), c.label, c.color),
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    println!("Alerts");
    if alerts.is_empty() {
        println!("  {NO_DATA}");
        return;
    }
    for alert in alerts {
        println!("  {} [{}] {}: {}", alert_marker(alert.kind), alert.priority, alert.title, alert.message);
    }
}

pub fn print_calendar(operations: &[CalendarOperation]) {
    println!("Calendar");
    for op in operations {
        let status = match op.status {
            OperationStatus::Urgent => " URGENT",
            OperationStatus::Planned => "",
        };
        println!("  {} [{}]{status} {} ({})", op.date, op.priority, op.name, op.kind);
        println!("      {}", op.recommendation);
    }
}

fn alert_marker(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Error => "!!",
        AlertKind::Warning => "! ",
        AlertKind::Info => "i ",
        AlertKind::Success => "ok",
    }
}
