//! model.rs — the versioned emission model.
//!
//! All calibration constants live in one immutable `EmissionModel` value that is
//! built once and passed by reference into every calculator. A recalibration is
//! a new model (new `version`), never an in-place edit.
//!
//! Each factor table is a struct with one field per member of its closed enum,
//! so `get` is a total function and the compiler rejects a missing factor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::categories::{
    AccommodationCategory, ActivityType, ElectricitySource, FoodFrequency, RoomOccupancy,
};
use crate::errors::CoreError;
use crate::tokens::is_token;

/// Version token of the built-in constant set.
pub const MODEL_VERSION: &str = "greendex-v1";

/// kg CO₂ absorbed by one tree per year.
pub const CO2_PER_TREE_PER_YEAR: f64 = 22.0;

/// Questionnaire distances are one-way; the return leg doubles them.
pub const ROUND_TRIP_MULTIPLIER: f64 = 2.0;

/// Occupants assumed in a car when the answer is missing or zero.
pub const DEFAULT_CAR_PASSENGERS: u32 = 1;

/// Accommodation multiplier for green electricity.
pub const GREEN_ENERGY_REDUCTION_FACTOR: f64 = 0.5;

/// Accommodation multiplier for every other electricity answer.
pub const CONVENTIONAL_ENERGY_FACTOR: f64 = 1.0;

// ----------------------------- Factor tables -----------------------------

/// kg CO₂ per km for each participant travel mode.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", deny_unknown_fields))]
pub struct TransportFactors {
    pub car: f64,
    pub bus: f64,
    pub train: f64,
    pub boat: f64,
    pub plane: f64,
    pub electric_car: f64,
}

impl TransportFactors {
    #[inline]
    pub fn get(&self, t: ActivityType) -> f64 {
        match t {
            ActivityType::Car => self.car,
            ActivityType::Bus => self.bus,
            ActivityType::Train => self.train,
            ActivityType::Boat => self.boat,
            ActivityType::Plane => self.plane,
            ActivityType::ElectricCar => self.electric_car,
        }
    }
}

/// kg CO₂ per night for each accommodation category (before adjustments).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct AccommodationFactors {
    #[cfg_attr(feature = "serde", serde(rename = "Camping"))]
    pub camping: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Hostel"))]
    pub hostel: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Apartment"))]
    pub apartment: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Friends/Family"))]
    pub friends_family: f64,
    #[cfg_attr(feature = "serde", serde(rename = "2★ Hotel"))]
    pub hotel_2_star: f64,
    #[cfg_attr(feature = "serde", serde(rename = "3★ Hotel"))]
    pub hotel_3_star: f64,
    #[cfg_attr(feature = "serde", serde(rename = "4★ Hotel"))]
    pub hotel_4_star: f64,
    #[cfg_attr(feature = "serde", serde(rename = "5★ Hotel"))]
    pub hotel_5_star: f64,
}

impl AccommodationFactors {
    #[inline]
    pub fn get(&self, c: AccommodationCategory) -> f64 {
        match c {
            AccommodationCategory::Camping => self.camping,
            AccommodationCategory::Hostel => self.hostel,
            AccommodationCategory::Apartment => self.apartment,
            AccommodationCategory::FriendsFamily => self.friends_family,
            AccommodationCategory::Hotel2Star => self.hotel_2_star,
            AccommodationCategory::Hotel3Star => self.hotel_3_star,
            AccommodationCategory::Hotel4Star => self.hotel_4_star,
            AccommodationCategory::Hotel5Star => self.hotel_5_star,
        }
    }
}

/// kg CO₂ per day for each food frequency band.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct FoodFactors {
    pub never: f64,
    pub rarely: f64,
    pub sometimes: f64,
    #[cfg_attr(feature = "serde", serde(rename = "almost every day"))]
    pub almost_every_day: f64,
    #[cfg_attr(feature = "serde", serde(rename = "every day"))]
    pub every_day: f64,
}

impl FoodFactors {
    #[inline]
    pub fn get(&self, f: FoodFrequency) -> f64 {
        match f {
            FoodFrequency::Never => self.never,
            FoodFrequency::Rarely => self.rarely,
            FoodFrequency::Sometimes => self.sometimes,
            FoodFrequency::AlmostEveryDay => self.almost_every_day,
            FoodFrequency::EveryDay => self.every_day,
        }
    }
}

/// Shared-room discount per occupancy answer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct OccupancyFactors {
    pub alone: f64,
    #[cfg_attr(feature = "serde", serde(rename = "2 people"))]
    pub two: f64,
    #[cfg_attr(feature = "serde", serde(rename = "3 people"))]
    pub three: f64,
    #[cfg_attr(feature = "serde", serde(rename = "4+ people"))]
    pub four_plus: f64,
}

impl OccupancyFactors {
    #[inline]
    pub fn get(&self, o: RoomOccupancy) -> f64 {
        match o {
            RoomOccupancy::Alone => self.alone,
            RoomOccupancy::Two => self.two,
            RoomOccupancy::Three => self.three,
            RoomOccupancy::FourPlus => self.four_plus,
        }
    }
}

/// Electricity multipliers: green vs. everything else.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", deny_unknown_fields))]
pub struct ElectricityFactors {
    pub green: f64,
    pub conventional: f64,
}

impl ElectricityFactors {
    /// Missing answers and "could not find out" both use the conventional factor.
    #[inline]
    pub fn get(&self, e: Option<ElectricitySource>) -> f64 {
        match e {
            Some(ElectricitySource::Green) => self.green,
            Some(ElectricitySource::Conventional | ElectricitySource::Unknown) | None => {
                self.conventional
            }
        }
    }
}

// ----------------------------- Model -----------------------------

/// Every calibration constant the calculators use, under one version token.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", deny_unknown_fields))]
pub struct EmissionModel {
    pub version: String,
    pub transport: TransportFactors,
    pub accommodation: AccommodationFactors,
    pub food: FoodFactors,
    pub occupancy: OccupancyFactors,
    pub electricity: ElectricityFactors,
    pub round_trip_multiplier: f64,
    pub default_car_passengers: u32,
    pub co2_per_tree_per_year: f64,
}

impl EmissionModel {
    /// The authoritative built-in constant set.
    pub fn v1() -> Self {
        EmissionModel {
            version: MODEL_VERSION.to_string(),
            transport: TransportFactors {
                car: 0.192,
                bus: 0.089,
                train: 0.041,
                boat: 0.115,
                plane: 0.255,
                electric_car: 0.053,
            },
            accommodation: AccommodationFactors {
                camping: 1.5,
                hostel: 3.0,
                apartment: 4.0,
                friends_family: 2.0,
                hotel_2_star: 4.0,
                hotel_3_star: 5.0,
                hotel_4_star: 7.5,
                hotel_5_star: 10.0,
            },
            food: FoodFactors {
                never: 1.5,
                rarely: 2.5,
                sometimes: 4.0,
                almost_every_day: 5.5,
                every_day: 7.0,
            },
            occupancy: OccupancyFactors {
                alone: 1.0,
                two: 0.6,
                three: 0.4,
                four_plus: 0.3,
            },
            electricity: ElectricityFactors {
                green: GREEN_ENERGY_REDUCTION_FACTOR,
                conventional: CONVENTIONAL_ENERGY_FACTOR,
            },
            round_trip_multiplier: ROUND_TRIP_MULTIPLIER,
            default_car_passengers: DEFAULT_CAR_PASSENGERS,
            co2_per_tree_per_year: CO2_PER_TREE_PER_YEAR,
        }
    }

    /// Domain checks for externally supplied models.
    ///
    /// Every factor must be finite and strictly positive; the error names the
    /// first offending constant.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !is_token(&self.version) {
            return Err(CoreError::InvalidToken);
        }
        for &t in ActivityType::ALL {
            check_positive("transport", self.transport.get(t))?;
        }
        for &c in AccommodationCategory::ALL {
            check_positive("accommodation", self.accommodation.get(c))?;
        }
        for &f in FoodFrequency::ALL {
            check_positive("food", self.food.get(f))?;
        }
        for &o in RoomOccupancy::ALL {
            check_positive("occupancy", self.occupancy.get(o))?;
        }
        check_positive("electricity.green", self.electricity.green)?;
        check_positive("electricity.conventional", self.electricity.conventional)?;
        check_positive("roundTripMultiplier", self.round_trip_multiplier)?;
        check_positive("co2PerTreePerYear", self.co2_per_tree_per_year)?;
        if self.default_car_passengers == 0 {
            return Err(CoreError::DomainOutOfRange("defaultCarPassengers"));
        }
        Ok(())
    }
}

impl Default for EmissionModel {
    fn default() -> Self { Self::v1() }
}

#[inline]
fn check_positive(name: &'static str, v: f64) -> Result<(), CoreError> {
    if v.is_finite() && v > 0.0 { Ok(()) } else { Err(CoreError::DomainOutOfRange(name)) }
}
