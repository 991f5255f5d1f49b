//! Types for the remote catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an asset is sold or given away. Derived from the asset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetTag {
    Paid,
    Free,
}

impl AssetTag {
    /// Tag implied by `name` given the reserved paid prefix.
    pub fn from_name(name: &str, paid_prefix: &str) -> Self {
        if !paid_prefix.is_empty() && name.starts_with(paid_prefix) {
            AssetTag::Paid
        } else {
            AssetTag::Free
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetTag::Paid => "paid",
            AssetTag::Free => "free",
        }
    }
}

impl fmt::Display for AssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paid" => Ok(AssetTag::Paid),
            "free" => Ok(AssetTag::Free),
            other => Err(format!("unknown tag '{}', expected 'paid' or 'free'", other)),
        }
    }
}

/// One media item listed by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Opaque, stable remote identifier.
    pub id: String,
    /// File name. Also the dedup key.
    pub name: String,
    /// Size in bytes, when the catalog reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub tag: AssetTag,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size: Option<u64>,
        paid_prefix: &str,
    ) -> Self {
        let name = name.into();
        let tag = AssetTag::from_name(&name, paid_prefix);
        Self {
            id: id.into(),
            name,
            size,
            tag,
        }
    }
}
