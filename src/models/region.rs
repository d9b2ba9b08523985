//! Ladder regions and their upstream platform routing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a region string matches no known shard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region: {0}")]
pub struct UnknownRegion(pub String);

/// A ranked-ladder region (one upstream platform shard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Euw,
    Eune,
    Na,
    Kr,
    Br,
    Jp,
    Lan,
    Las,
    Oce,
    Tr,
    Ru,
}

impl Region {
    /// All supported regions, in display order.
    pub fn all() -> &'static [Region] {
        &[
            Region::Euw,
            Region::Eune,
            Region::Na,
            Region::Kr,
            Region::Br,
            Region::Jp,
            Region::Lan,
            Region::Las,
            Region::Oce,
            Region::Tr,
            Region::Ru,
        ]
    }

    /// Hostname of the upstream platform shard serving this region.
    pub fn platform_host(&self) -> &'static str {
        match self {
            Region::Euw => "euw1.api.riotgames.com",
            Region::Eune => "eun1.api.riotgames.com",
            Region::Na => "na1.api.riotgames.com",
            Region::Kr => "kr.api.riotgames.com",
            Region::Br => "br1.api.riotgames.com",
            Region::Jp => "jp1.api.riotgames.com",
            Region::Lan => "la1.api.riotgames.com",
            Region::Las => "la2.api.riotgames.com",
            Region::Oce => "oc1.api.riotgames.com",
            Region::Tr => "tr1.api.riotgames.com",
            Region::Ru => "ru.api.riotgames.com",
        }
    }

    /// Canonical upper-case name, as used on the wire and in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Euw => "EUW",
            Region::Eune => "EUNE",
            Region::Na => "NA",
            Region::Kr => "KR",
            Region::Br => "BR",
            Region::Jp => "JP",
            Region::Lan => "LAN",
            Region::Las => "LAS",
            Region::Oce => "OCE",
            Region::Tr => "TR",
            Region::Ru => "RU",
        }
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EUW" => Ok(Region::Euw),
            "EUNE" => Ok(Region::Eune),
            "NA" => Ok(Region::Na),
            "KR" => Ok(Region::Kr),
            "BR" => Ok(Region::Br),
            "JP" => Ok(Region::Jp),
            "LAN" => Ok(Region::Lan),
            "LAS" => Ok(Region::Las),
            "OCE" => Ok(Region::Oce),
            "TR" => Ok(Region::Tr),
            "RU" => Ok(Region::Ru),
            other => Err(UnknownRegion(other.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
