//! Record identifiers.
//!
//! Identifiers are UUID v7 values: they sort in issue order and carry the
//! millisecond at which the record was extracted.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Identifier of a reasoning record, issued once at extraction time.
///
/// The nil UUID is never a valid identifier, whether parsed or deserialised.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct RecordId(Uuid);

impl RecordId {
    /// Issues a fresh identifier stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }

    /// Returns the time embedded in the identifier, if it carries one.
    #[must_use]
    pub fn issued_at(self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.0.get_timestamp()?.to_unix();
        DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl TryFrom<Uuid> for RecordId {
    type Error = Error;

    fn try_from(value: Uuid) -> Result<Self, Self::Error> {
        if value.is_nil() {
            return Err(Error::NilRecordId);
        }
        Ok(Self(value))
    }
}

impl From<RecordId> for Uuid {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(Uuid::parse_str(s.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_record_id() {
        let id = RecordId::generate();
        let parsed = id.to_string().parse::<RecordId>().expect("parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_id() {
        let err = "not-a-uuid".parse::<RecordId>().expect_err("should fail");
        assert!(matches!(err, Error::InvalidRecordId { .. }));
    }

    #[test]
    fn nil_is_rejected_everywhere() {
        let nil = Uuid::nil().to_string();
        assert!(matches!(
            nil.parse::<RecordId>(),
            Err(Error::NilRecordId)
        ));
        assert!(serde_json::from_str::<RecordId>(&format!("\"{nil}\"")).is_err());
    }

    #[test]
    fn identifiers_follow_issue_order() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let first = RecordId::generate();
        let second = RecordId::generate();
        assert!(first < second);

        let issued = first.issued_at().expect("v7 timestamp");
        assert!(issued >= before);
        assert!(issued <= Utc::now());
    }
}
