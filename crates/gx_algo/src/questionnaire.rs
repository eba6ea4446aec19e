//! Questionnaire emission calculation (deterministic, order-preserving).
//!
//! Inputs:
//! - `model`: calibration constants
//! - `answers`: one participant's questionnaire (every field optional)
//! - `project_activities`: optional project baseline legs
//!
//! Order of operations (kept exactly; float sums are order-sensitive):
//! 1. flight, boat, train, bus: `km * factor` for each present, non-zero distance
//! 2. car: `(km * car_or_electric_factor) / passengers` (0 or missing passengers → default)
//! 3. transport subtotal × round-trip multiplier (transport only)
//! 4. accommodation: `days * base * occupancy * electricity` when days and category present
//! 5. food: `days * food_factor` when days and frequency present
//! 6. project baseline via `calculate_activities_co2`
//! 7. total = transport + accommodation + food + baseline; trees from the total
//!
//! Distances are trusted to be validated upstream (`gx_io::ingest`); missing
//! categorical answers drop their category to 0.

use gx_core::{
    ActivityRecord, ActivityType, CarType, EmissionCalculation, EmissionModel, ParticipantAnswers,
    ProjectActivityType, RoomOccupancy,
};

use crate::activities::calculate_activities_co2;
use crate::offset::trees_needed;

/// Present and truthy: `None`, zero and NaN all count as "not answered".
#[inline]
fn answered(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x != 0.0 && !x.is_nan())
}

/// Strictly positive; fractions are kept (half days, averaged car shares).
#[inline]
fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x > 0.0)
}

/// Steps 1–2: one-way transport CO₂ before the round-trip multiplier.
pub fn transport_one_way_co2(model: &EmissionModel, answers: &ParticipantAnswers) -> f64 {
    let t = &model.transport;
    let mut co2 = 0.0;

    if let Some(km) = answered(answers.flight_km) {
        co2 += km * t.get(ActivityType::Plane);
    }
    if let Some(km) = answered(answers.boat_km) {
        co2 += km * t.get(ActivityType::Boat);
    }
    if let Some(km) = answered(answers.train_km) {
        co2 += km * t.get(ActivityType::Train);
    }
    if let Some(km) = answered(answers.bus_km) {
        co2 += km * t.get(ActivityType::Bus);
    }
    if let Some(km) = answered(answers.car_km) {
        let car_type = answers.car_type.unwrap_or(CarType::Conventional);
        let factor = t.get(car_type.activity_type());
        let passengers =
            positive(answers.car_passengers).unwrap_or_else(|| f64::from(model.default_car_passengers));
        co2 += (km * factor) / passengers;
    }
    co2
}

fn accommodation_co2(model: &EmissionModel, answers: &ParticipantAnswers) -> f64 {
    match (positive(answers.days), answers.accommodation_category) {
        (Some(days), Some(category)) => {
            let occupancy = answers.room_occupancy.unwrap_or(RoomOccupancy::Alone);
            days * model.accommodation.get(category)
                * model.occupancy.get(occupancy)
                * model.electricity.get(answers.electricity)
        }
        _ => 0.0,
    }
}

fn food_co2(model: &EmissionModel, answers: &ParticipantAnswers) -> f64 {
    match (positive(answers.days), answers.food) {
        (Some(days), Some(food)) => days * model.food.get(food),
        _ => 0.0,
    }
}

/// Full per-category breakdown for one participant.
pub fn calculate_emissions(
    model: &EmissionModel,
    answers: &ParticipantAnswers,
    project_activities: Option<&[ActivityRecord<ProjectActivityType>]>,
) -> EmissionCalculation {
    // Round trip applies to the transport subtotal only, exactly once.
    let transport_co2 = transport_one_way_co2(model, answers) * model.round_trip_multiplier;
    let accommodation_co2 = accommodation_co2(model, answers);
    let food_co2 = food_co2(model, answers);
    let project_activities_co2 = project_activities
        .map(|legs| calculate_activities_co2(model, legs))
        .unwrap_or(0.0);

    let total_co2 = transport_co2 + accommodation_co2 + food_co2 + project_activities_co2;

    EmissionCalculation {
        transport_co2,
        accommodation_co2,
        food_co2,
        project_activities_co2,
        total_co2,
        trees_needed: trees_needed(total_co2, model),
    }
}

/// One-way legs implied by the answers, in questionnaire order.
///
/// Car sharing is not applied here: the legs describe distance travelled,
/// and project statistics fold them per activity type.
pub fn answers_to_activities(answers: &ParticipantAnswers) -> Vec<ActivityRecord> {
    let car_type = answers.car_type.unwrap_or(CarType::Conventional).activity_type();
    [
        (ActivityType::Plane, answers.flight_km),
        (ActivityType::Boat, answers.boat_km),
        (ActivityType::Train, answers.train_km),
        (ActivityType::Bus, answers.bus_km),
        (car_type, answers.car_km),
    ]
    .into_iter()
    .filter_map(|(t, km)| answered(km).map(|d| ActivityRecord::new(t, d)))
    .collect()
}
