//! categories.rs — closed category sets with explicit wire tokens.
//!
//! Every enum here is the full domain of one factor table in `model.rs`, so a
//! factor lookup can never miss. Unknown tokens only exist at the input
//! boundary (`gx_io::ingest`), where `FromStr` reports them.
//!
//! Participant travel (`ActivityType`) is a strict superset of project-level
//! travel (`ProjectActivityType`): the conversions below are total in one
//! direction and fallible in the other.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Define a closed enum with explicit wire tokens (plus optional parse-only aliases).
macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident, $set:literal => {
            $($variant:ident = $token:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token $(, alias = $alias)*))]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire token.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($token $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(CoreError::UnknownToken($set)),
                }
            }
        }
    };
}

closed_set!(
    /// Travel modes that can be attached to a project as baseline activities.
    ProjectActivityType, "project activity type" => {
        Car   = "car",
        Bus   = "bus",
        Train = "train",
        Boat  = "boat",
    }
);

closed_set!(
    /// Travel modes a participant can report (superset of `ProjectActivityType`).
    ActivityType, "activity type" => {
        Car         = "car",
        Bus         = "bus",
        Train       = "train",
        Boat        = "boat",
        Plane       = "plane",
        ElectricCar = "electricCar",
    }
);

closed_set!(
    AccommodationCategory, "accommodation category" => {
        Camping       = "Camping",
        Hostel        = "Hostel",
        Apartment     = "Apartment",
        FriendsFamily = "Friends/Family",
        Hotel2Star    = "2★ Hotel",
        Hotel3Star    = "3★ Hotel",
        Hotel4Star    = "4★ Hotel",
        Hotel5Star    = "5★ Hotel",
    }
);

closed_set!(
    /// How many people share the room; drives the occupancy discount.
    RoomOccupancy, "room occupancy" => {
        Alone    = "alone",
        Two      = "2 people",
        Three    = "3 people",
        FourPlus = "4+ people",
    }
);

closed_set!(
    ElectricitySource, "electricity source" => {
        Green        = "green energy",
        Conventional = "conventional energy",
        Unknown      = "could not find out",
    }
);

closed_set!(
    /// Meat/dairy frequency bands, ordered from least to most frequent.
    FoodFrequency, "food frequency" => {
        Never          = "never",
        Rarely         = "rarely",
        Sometimes      = "sometimes",
        AlmostEveryDay = "almost every day",
        EveryDay       = "every day",
    }
);

closed_set!(
    /// `electricCar` is a legacy spelling still found in stored answers.
    CarType, "car type" => {
        Conventional = "conventional" | "car",
        Electric     = "electric" | "electricCar",
    }
);

impl Default for RoomOccupancy {
    fn default() -> Self { RoomOccupancy::Alone }
}

impl From<ProjectActivityType> for ActivityType {
    fn from(t: ProjectActivityType) -> Self {
        match t {
            ProjectActivityType::Car => ActivityType::Car,
            ProjectActivityType::Bus => ActivityType::Bus,
            ProjectActivityType::Train => ActivityType::Train,
            ProjectActivityType::Boat => ActivityType::Boat,
        }
    }
}

impl TryFrom<ActivityType> for ProjectActivityType {
    type Error = CoreError;
    fn try_from(t: ActivityType) -> Result<Self, Self::Error> {
        match t {
            ActivityType::Car => Ok(ProjectActivityType::Car),
            ActivityType::Bus => Ok(ProjectActivityType::Bus),
            ActivityType::Train => Ok(ProjectActivityType::Train),
            ActivityType::Boat => Ok(ProjectActivityType::Boat),
            ActivityType::Plane | ActivityType::ElectricCar => {
                Err(CoreError::UnknownToken("project activity type"))
            }
        }
    }
}

impl CarType {
    /// Participant activity type a car leg of this kind is recorded as.
    pub fn activity_type(self) -> ActivityType {
        match self {
            CarType::Conventional => ActivityType::Car,
            CarType::Electric => ActivityType::ElectricCar,
        }
    }
}
