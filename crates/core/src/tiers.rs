//! Customer tier labels derived from the average RFMP score.
//!
//! The banding is a fixed lookup over an immutable table. Every reachable
//! average (1.0..=5.0) falls into exactly one band, so there is no silent
//! default path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Excellent,
    Good,
    Average,
    Fair,
    Poor,
}

/// Band floors paired with their tier, best first. `from_average` walks this
/// table top down; `Poor` is the catch-all below every floor.
const BANDS: [(f64, Tier); 4] = [
    (5.0, Tier::Excellent),
    (4.0, Tier::Good),
    (3.0, Tier::Average),
    (2.0, Tier::Fair),
];

impl Tier {
    /// All tiers, best first, in band order.
    pub const ALL: [Tier; 5] = [Tier::Excellent, Tier::Good, Tier::Average, Tier::Fair, Tier::Poor];

    pub fn from_average(average: f64) -> Self {
        for (floor, tier) in BANDS {
            if average >= floor {
                return tier;
            }
        }
        Tier::Poor
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Average => "Average",
            Tier::Fair => "Fair",
            Tier::Poor => "Poor",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Excellent" => Ok(Tier::Excellent),
            "Good" => Ok(Tier::Good),
            "Average" => Ok(Tier::Average),
            "Fair" => Ok(Tier::Fair),
            "Poor" => Ok(Tier::Poor),
            other => Err(format!("unknown tier label `{other}`")),
        }
    }
}
