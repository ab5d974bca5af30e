use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CookingParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cooking {
    WithCooking,
    WithoutCooking,
}

impl Cooking {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cooking::WithCooking => "WITH_COOKING",
            Cooking::WithoutCooking => "WITHOUT_COOKING",
        }
    }
}

impl fmt::Display for Cooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cooking {
    type Err = CookingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "WITH_COOKING" => Ok(Cooking::WithCooking),
            "WITHOUT_COOKING" => Ok(Cooking::WithoutCooking),
            _ => Err(CookingParseError(s.to_string())),
        }
    }
}
