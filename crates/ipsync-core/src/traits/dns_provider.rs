// # DNS Provider Trait
//
// Interface to the provider API: name lookups for identifier resolution
// and the replace-content update request.
//
// Providers are single-shot: one API call per method invocation, errors
// propagated to the engine. The engine owns sequencing, persistence, and
// the decision of whether an update is needed; providers must not retry,
// cache, or consult state on their own.

use async_trait::async_trait;

use crate::config::RecordType;
use serde::{Deserialize, Serialize};

/// One zone returned by a zone lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneRef {
    /// Provider-internal zone identifier
    pub id: String,
    /// Zone name as known to the provider
    pub name: String,
}

/// One record returned by a record lookup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordRef {
    /// Provider-internal record identifier
    pub id: String,
    /// Record name as known to the provider
    pub name: String,
}

/// Body of a replace-content update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    /// Provider-internal record identifier
    #[serde(rename = "id")]
    pub identifier: String,
    /// Address family of the record
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// The address to publish
    pub content: String,
}

/// Trait for DNS provider implementations
///
/// Lookups return every match the provider reported; the engine applies
/// the first-match tie-break and maps empty lists to not-found errors.
/// Credentials are passed per call because each record may carry its own
/// token.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up zones by name
    ///
    /// Returns all matches; an empty list means the zone does not exist
    /// under this credential. Fails with `Auth` on credential rejection,
    /// `Network` on transport failure, `Protocol` on an uninterpretable
    /// response body.
    async fn lookup_zone(&self, zone_name: &str, token: &str)
    -> Result<Vec<ZoneRef>, crate::Error>;

    /// Look up records by name within a zone
    ///
    /// `zone_identifier` may be empty when the zone itself is unresolved;
    /// the call is still issued and the provider's rejection is returned
    /// as an error rather than short-circuited here.
    async fn lookup_record(
        &self,
        zone_identifier: &str,
        record_name: &str,
        token: &str,
    ) -> Result<Vec<RecordRef>, crate::Error>;

    /// Replace the content of a record
    ///
    /// Issues a single partial-update request addressed by zone and record
    /// identifier. Non-2xx responses surface as `Auth` or
    /// `ProviderRejected` carrying the provider's response payload.
    async fn update_record(
        &self,
        zone_identifier: &str,
        record_identifier: &str,
        update: &RecordUpdate,
        token: &str,
    ) -> Result<(), crate::Error>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_uses_wire_field_names() {
        let update = RecordUpdate {
            identifier: "rec-1".to_string(),
            record_type: RecordType::A,
            name: "home.example.com".to_string(),
            content: "5.6.7.8".to_string(),
        };

        let json: serde_json::Value = serde_json::to_value(&update).unwrap();
        assert_eq!(json["id"], "rec-1");
        assert_eq!(json["type"], "A");
        assert_eq!(json["name"], "home.example.com");
        assert_eq!(json["content"], "5.6.7.8");
    }
}
