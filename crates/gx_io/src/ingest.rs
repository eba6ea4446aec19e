//! Loose JSON → typed records.
//!
//! Stored rows and submitted forms are loosely typed: numbers arrive as strings,
//! activity types may be misspelled or from a newer client. This layer is where
//! that tolerance lives; everything past it is typed.
//!
//! Rules:
//! - A distance is a JSON number or a numeric string; anything else drops the row.
//! - Only finite, strictly positive distances survive `ingest_activities`.
//! - Unknown activity types drop the row with a `warn!` (they would contribute 0 anyway).
//! - Answers: negative, NaN, and non-numeric values become `None`; unknown enum
//!   tokens become `None` with a `warn!`. Ingest never fails.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use gx_core::{ActivityRecord, ActivityType, EmissionModel, ParticipantAnswers};

// ----------------------------- Wire types -----------------------------

/// A number that may have been stored as text (`"120"`, `" 12.5 "`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    /// The finite numeric value, if there is one.
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for LooseNumber {
    fn from(n: f64) -> Self { LooseNumber::Number(n) }
}

impl From<&str> for LooseNumber {
    fn from(s: &str) -> Self { LooseNumber::Text(s.to_string()) }
}

/// One activity row as stored, before the type token is checked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActivity {
    pub activity_type: String,
    #[serde(default)]
    pub distance_km: Option<LooseNumber>,
}

impl RawActivity {
    pub fn new(activity_type: impl Into<String>, distance_km: impl Into<LooseNumber>) -> Self {
        Self { activity_type: activity_type.into(), distance_km: Some(distance_km.into()) }
    }
}

// ----------------------------- Activities -----------------------------

/// Split a JSON array (or `{ "activities": [...] }`) into raw rows.
/// Elements that are not activity-shaped are dropped with a `warn!`.
pub fn raw_activities_from_value(v: &Value) -> Vec<RawActivity> {
    let items = match v {
        Value::Array(a) => a.as_slice(),
        Value::Object(o) => match o.get("activities") {
            Some(Value::Array(a)) => a.as_slice(),
            _ => {
                warn!("activities object has no `activities` array; ignoring it");
                return Vec::new();
            }
        },
        Value::Null => return Vec::new(),
        _ => {
            warn!("activities must be an array; ignoring value");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match RawActivity::deserialize(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(index = i, error = %e, "dropping malformed activity row");
                None
            }
        })
        .collect()
}

/// Type-check raw rows against the activity set `T`.
///
/// Rows with an unknown type or an uncounted distance are dropped; input order is kept.
pub fn ingest_activities<T: FromStr + Copy>(raw: &[RawActivity]) -> Vec<ActivityRecord<T>> {
    let mut out = Vec::with_capacity(raw.len());
    for (i, row) in raw.iter().enumerate() {
        let Ok(activity_type) = row.activity_type.parse::<T>() else {
            warn!(index = i, activity_type = %row.activity_type, "dropping activity with unknown type");
            continue;
        };
        let distance = row.distance_km.as_ref().and_then(LooseNumber::value).unwrap_or(0.0);
        let record = ActivityRecord::new(activity_type, distance);
        if record.counted_distance().is_none() {
            debug!(index = i, activity_type = %row.activity_type, "skipping activity without a positive distance");
            continue;
        }
        out.push(record);
    }
    out
}

/// CO₂ of raw rows, looked up in the participant factor table.
///
/// This is the untyped entry point: a type outside the table (e.g. `"unicycle"`)
/// contributes 0. Rows are typed against the participant set, so `plane` and
/// `electricCar` rows count here. A project bundle's baseline is typed against
/// `ProjectActivityType` at load time instead (`loader::project_bundle_from_value`),
/// which drops those two types before any sum; the same rows can therefore total
/// more here than as a bundle baseline.
pub fn activities_co2_from_raw(model: &EmissionModel, raw: &[RawActivity]) -> f64 {
    ingest_activities::<ActivityType>(raw)
        .iter()
        .map(|a| a.distance_km * model.transport.get(a.activity_type))
        .sum()
}

// ----------------------------- Answers -----------------------------

/// Coerce a loosely typed answers object. Non-objects yield empty answers.
pub fn ingest_answers(v: &Value) -> ParticipantAnswers {
    let Some(obj) = v.as_object() else {
        if !v.is_null() {
            warn!("answers must be a JSON object; treating as unanswered");
        }
        return ParticipantAnswers::default();
    };

    ParticipantAnswers {
        flight_km: number_field(obj, "flightKm"),
        boat_km: number_field(obj, "boatKm"),
        train_km: number_field(obj, "trainKm"),
        bus_km: number_field(obj, "busKm"),
        car_km: number_field(obj, "carKm"),
        car_type: enum_field(obj, "carType"),
        car_passengers: number_field(obj, "carPassengers"),
        days: number_field(obj, "days"),
        accommodation_category: enum_field(obj, "accommodationCategory"),
        room_occupancy: enum_field(obj, "roomOccupancy"),
        electricity: enum_field(obj, "electricity"),
        food: enum_field(obj, "food"),
    }
}

fn loose_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

/// Non-negative finite number, else `None`.
fn number_field(obj: &Map<String, Value>, key: &'static str) -> Option<f64> {
    let raw = obj.get(key).filter(|v| !v.is_null())?;
    match loose_f64(raw) {
        Some(x) if x >= 0.0 => Some(x),
        Some(_) => {
            debug!(field = key, "ignoring negative answer");
            None
        }
        None => {
            warn!(field = key, "ignoring non-numeric answer");
            None
        }
    }
}

fn enum_field<E: FromStr>(obj: &Map<String, Value>, key: &'static str) -> Option<E> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse::<E>() {
            Ok(e) => Some(e),
            Err(_) => {
                warn!(field = key, token = %s, "ignoring unknown answer token");
                None
            }
        },
        Some(_) => {
            warn!(field = key, "ignoring non-string answer token");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gx_core::{
        AccommodationCategory, CarType, ElectricitySource, FoodFrequency, ProjectActivityType,
        RoomOccupancy,
    };
    use serde_json::json;

    #[test]
    fn loose_numbers_accept_numeric_strings() {
        assert_eq!(LooseNumber::Number(3.0).value(), Some(3.0));
        assert_eq!(LooseNumber::Text(" 12.5 ".into()).value(), Some(12.5));
        assert_eq!(LooseNumber::Text("twelve".into()).value(), None);
        assert_eq!(LooseNumber::Text("NaN".into()).value(), None);
    }

    #[test]
    fn raw_rows_from_value_drop_malformed_elements() {
        let v = json!([
            {"activityType": "bus", "distanceKm": 120},
            {"activityType": "train", "distanceKm": "300"},
            {"distanceKm": 5},
            "not a row",
            {"activityType": "car", "distanceKm": true}
        ]);
        let rows = raw_activities_from_value(&v);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].distance_km.as_ref().and_then(LooseNumber::value), Some(300.0));

        let wrapped = json!({"activities": [{"activityType": "boat", "distanceKm": 20}]});
        assert_eq!(raw_activities_from_value(&wrapped).len(), 1);
        assert!(raw_activities_from_value(&json!(42)).is_empty());
    }

    #[test]
    fn ingest_filters_by_activity_set() {
        let raw = vec![
            RawActivity::new("bus", 120.0),
            RawActivity::new("plane", 800.0),
            RawActivity::new("unicycle", 3.0),
            RawActivity::new("train", -4.0),
            RawActivity { activity_type: "car".into(), distance_km: None },
        ];
        let project: Vec<ActivityRecord<ProjectActivityType>> = ingest_activities(&raw);
        assert_eq!(project, vec![ActivityRecord::new(ProjectActivityType::Bus, 120.0)]);

        let participant: Vec<ActivityRecord> = ingest_activities(&raw);
        assert_eq!(participant.len(), 2);
        assert_eq!(participant[1].activity_type, ActivityType::Plane);
    }

    #[test]
    fn unknown_types_contribute_zero() {
        let m = EmissionModel::v1();
        let raw = vec![RawActivity::new("unicycle", 100.0)];
        assert_eq!(activities_co2_from_raw(&m, &raw), 0.0);

        let raw = vec![RawActivity::new("unicycle", 100.0), RawActivity::new("train", "100")];
        assert!((activities_co2_from_raw(&m, &raw) - 4.1).abs() < 1e-9);
    }

    #[test]
    fn plane_counts_untyped_but_not_as_project_baseline() {
        let m = EmissionModel::v1();
        let raw = vec![RawActivity::new("plane", 1000.0), RawActivity::new("bus", 100.0)];
        let untyped = activities_co2_from_raw(&m, &raw);
        assert!((untyped - (1000.0 * m.transport.plane + 100.0 * m.transport.bus)).abs() < 1e-9);

        let baseline: Vec<ActivityRecord<ProjectActivityType>> = ingest_activities(&raw);
        let baseline_co2: f64 = baseline
            .iter()
            .map(|a| a.distance_km * m.transport.get(a.activity_type.into()))
            .sum();
        assert!((baseline_co2 - 100.0 * m.transport.bus).abs() < 1e-9);
    }

    #[test]
    fn answers_are_coerced() {
        let v = json!({
            "flightKm": "1200",
            "trainKm": -5,
            "busKm": "n/a",
            "carKm": 80,
            "carType": "electricCar",
            "carPassengers": 2.7,
            "days": "5",
            "accommodationCategory": "3★ Hotel",
            "roomOccupancy": "2 people",
            "electricity": "green energy",
            "food": "every day",
            "unrelated": true
        });
        let a = ingest_answers(&v);
        assert_eq!(a.flight_km, Some(1200.0));
        assert_eq!(a.train_km, None);
        assert_eq!(a.bus_km, None);
        assert_eq!(a.car_km, Some(80.0));
        assert_eq!(a.car_type, Some(CarType::Electric));
        assert_eq!(a.car_passengers, Some(2.7));
        assert_eq!(a.days, Some(5.0));
        assert_eq!(a.accommodation_category, Some(AccommodationCategory::Hotel3Star));
        assert_eq!(a.room_occupancy, Some(RoomOccupancy::Two));
        assert_eq!(a.electricity, Some(ElectricitySource::Green));
        assert_eq!(a.food, Some(FoodFrequency::EveryDay));
    }

    #[test]
    fn unknown_tokens_and_non_objects_become_unanswered() {
        let a = ingest_answers(&json!({"food": "daily", "accommodationCategory": 3}));
        assert_eq!(a.food, None);
        assert_eq!(a.accommodation_category, None);

        assert_eq!(ingest_answers(&json!([1, 2])), ParticipantAnswers::default());
        assert_eq!(ingest_answers(&Value::Null), ParticipantAnswers::default());
    }

    #[test]
    fn fractional_days_and_passengers_are_kept() {
        let a = ingest_answers(&json!({"days": 2.5, "carPassengers": "1.5"}));
        assert_eq!(a.days, Some(2.5));
        assert_eq!(a.car_passengers, Some(1.5));

        let half = ingest_answers(&json!({"days": 0.5}));
        assert_eq!(half.days, Some(0.5));
        assert_eq!(ingest_answers(&json!({"days": -1})).days, None);
    }
}
