// Gemeinsame Szenario-Bausteine fuer die Integrationstests.
//
// Wird per `include!` eingebunden. Benötigte Imports:
//   use xosc::model::{Condition, Rule, Trigger, ValueCondition, WorldPosition};
//   use xosc::EncodeOptions;

/// Fester Header-Zeitstempel, damit Exporte vergleichbar bleiben.
fn fixed_timestamp() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2021, 5, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid timestamp")
}

fn fixed_options() -> EncodeOptions {
    EncodeOptions::default().with_timestamp(fixed_timestamp())
}

fn at(x: f64, y: f64) -> WorldPosition {
    WorldPosition::new(x, y, 0.0, 0.0)
}

/// `SimulationTimeCondition` >= `seconds` als einzige Startbedingung.
fn after_seconds(seconds: f64) -> Trigger {
    Trigger::single(Condition::by_value(ValueCondition::SimulationTime {
        value: seconds.into(),
        rule: Rule::GreaterOrEqual,
    }))
}

/// Inhalt zwischen dem ersten `<open` und dem dazugehoerigen `</close>` (inklusive).
fn block<'a>(xml: &'a str, open: &str, close: &str) -> &'a str {
    let start = xml.find(&format!("<{open}")).expect("block start");
    let end = xml[start..].find(&format!("</{close}>")).expect("block end") + start;
    &xml[start..end + close.len() + 3]
}
