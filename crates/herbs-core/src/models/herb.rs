//! Reference table record

use serde::{Deserialize, Serialize};

/// One row of the local read-only reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbRecord {
    /// Row identifier owned by the reference database
    pub id: i64,
    /// Herb name, the column searched by lookups
    pub name: String,
    /// Documented effect, when recorded
    pub effect: Option<String>,
    /// Associated organ, when recorded
    pub associated_organ: Option<String>,
}

impl HerbRecord {
    /// Effect text, or an empty string when the column is NULL
    #[must_use]
    pub fn effect_label(&self) -> &str {
        self.effect.as_deref().unwrap_or("")
    }

    /// Associated organ text, or an empty string when the column is NULL
    #[must_use]
    pub fn organ_label(&self) -> &str {
        self.associated_organ.as_deref().unwrap_or("")
    }
}
