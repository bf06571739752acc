use std::fmt;

use clap::ValueEnum;
use geo::Contains;
use serde::Serialize;

use crate::airspace::Restriction;
use crate::locations::FlightLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Legality {
    Legal,
    Illegal,
}

impl fmt::Display for Legality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Legality::Legal => write!(f, "Legal"),
            Legality::Illegal => write!(f, "Illegal"),
        }
    }
}

/// How a location inside several restrictions is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    /// One row per location, naming the first containing restriction.
    #[default]
    First,
    /// One row per containing restriction.
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub class: String,
    pub name: String,
    pub airport_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightVerdict {
    pub location: FlightLocation,
    pub conflict: Option<Conflict>,
}

impl FlightVerdict {
    pub fn legality(&self) -> Legality {
        match self.conflict {
            Some(_) => Legality::Illegal,
            None => Legality::Legal,
        }
    }
}

pub fn analyze_flights(
    restrictions: &[Restriction],
    locations: &[FlightLocation],
    policy: ConflictPolicy,
) -> Vec<FlightVerdict> {
    let limit = match policy {
        ConflictPolicy::First => 1,
        ConflictPolicy::All => usize::MAX,
    };
    let mut verdicts = Vec::with_capacity(locations.len());
    for location in locations {
        let conflicts = restrictions
            .iter()
            .filter(|restriction| restriction.area.contains(&location.point))
            .take(limit)
            .map(|restriction| Conflict {
                class: restriction.class.clone(),
                name: restriction.name.clone(),
                airport_id: restriction.ident.clone(),
            })
            .collect::<Vec<_>>();

        if conflicts.is_empty() {
            verdicts.push(FlightVerdict {
                location: location.clone(),
                conflict: None,
            });
            continue;
        }
        verdicts.extend(conflicts.into_iter().map(|conflict| FlightVerdict {
            location: location.clone(),
            conflict: Some(conflict),
        }));
    }
    verdicts
}
