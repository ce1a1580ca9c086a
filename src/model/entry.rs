use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use serde_json::Value;

use crate::domain::{EmailAddress, PersonName, PhoneNumber};

/// Campaign provenance recorded with every entry
pub const CONTEST_SOURCE: &str = "wine-festival-contest";
pub const CONTEST_PRIZE: &str = "Two Free Tastings ($50 value)";

/// Custom-field mapping carried on a customer record
pub type Metadata = BTreeMap<String, Value>;

/// A validated contest entry submission
#[derive(Debug)]
pub struct ContestEntry {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
}

/// Provenance metadata submitted with an entry.
/// Note that only the allow-listed subset of these keys survives the
/// customer upsert; the full set is mirrored to the marketing platform.
pub fn provenance_metadata(entered_at: DateTime<Utc>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".into(), Value::String(CONTEST_SOURCE.into()));
    metadata.insert(
        "contest_entry_date".into(),
        Value::String(entered_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    metadata.insert("contest_prize".into(), Value::String(CONTEST_PRIZE.into()));
    metadata
}
