// # Records
//
// A `Record` is one name/type/target tuple as the remote store knows it.
// Several records may share a `(zone, subdomain, type)` group; each one
// contributes a single target to the endpoint built from that group.

use serde::{Deserialize, Serialize};
use std::fmt;

/// TTL written when an endpoint does not configure one
///
/// The store substitutes its own zone default for this value.
pub const DEFAULT_TTL: u32 = 0;

/// DNS record type as carried by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Srv,
    Txt,
    /// Any type this crate does not manage (SOA, CAA, SPF, ...)
    Other(String),
}

impl RecordType {
    /// Whether records of this type are managed by the reconciler
    pub fn is_supported(&self) -> bool {
        !matches!(self, RecordType::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Other(other) => other,
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "MX" => RecordType::Mx,
            "NS" => RecordType::Ns,
            "SRV" => RecordType::Srv,
            "TXT" => RecordType::Txt,
            _ => RecordType::Other(value.to_string()),
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        RecordType::from(value.as_str())
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable fields sent when replacing a record by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    pub sub_domain: String,
    pub ttl: u32,
    pub target: String,
}

/// Fields sent when inserting a new record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub field_type: RecordType,
    #[serde(flatten)]
    pub update: RecordUpdate,
}

/// One record of a zone
///
/// `id == 0` means the record is not (yet) known to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: u64,
    pub zone: String,
    pub sub_domain: String,
    pub field_type: RecordType,
    pub target: String,
    #[serde(default)]
    pub ttl: u32,
}

impl Record {
    /// Build a transient record (id 0)
    pub fn new(
        zone: impl Into<String>,
        sub_domain: impl Into<String>,
        field_type: RecordType,
        target: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            id: 0,
            zone: zone.into(),
            sub_domain: sub_domain.into(),
            field_type,
            target: target.into(),
            ttl,
        }
    }

    /// Same record with a persisted id attached
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Fully qualified host name, without trailing dot
    ///
    /// The apex of a zone has an empty subdomain and maps to the zone name.
    pub fn dns_name(&self) -> String {
        if self.sub_domain.is_empty() {
            self.zone.clone()
        } else {
            format!("{}.{}", self.sub_domain, self.zone)
        }
    }

    /// Whether `self` belongs to the `(zone, subdomain, type)` group of `other`
    ///
    /// Names compare without regard to ASCII case.
    pub fn same_group(&self, other: &Record) -> bool {
        self.zone.eq_ignore_ascii_case(&other.zone)
            && self.sub_domain.eq_ignore_ascii_case(&other.sub_domain)
            && self.field_type == other.field_type
    }

    /// Exact `(zone, subdomain, type, target)` equality, ignoring id and ttl
    pub fn same_value(&self, other: &Record) -> bool {
        self.same_group(other) && self.target == other.target
    }

    pub fn fields(&self) -> RecordFields {
        RecordFields {
            field_type: self.field_type.clone(),
            update: self.update_fields(),
        }
    }

    pub fn update_fields(&self) -> RecordUpdate {
        RecordUpdate {
            sub_domain: self.sub_domain.clone(),
            ttl: self.ttl,
            target: self.target.clone(),
        }
    }
}

/// Subdomain of `dns_name` relative to `zone`
///
/// Trailing dots are ignored on both sides. The zone apex yields an empty
/// subdomain. A name outside the zone is returned unchanged.
pub fn subdomain_of(dns_name: &str, zone: &str) -> String {
    let name = dns_name.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');

    if name.eq_ignore_ascii_case(zone) {
        return String::new();
    }

    match name.len().checked_sub(zone.len() + 1) {
        Some(cut)
            if name.as_bytes()[cut] == b'.'
                && name[cut + 1..].eq_ignore_ascii_case(zone) =>
        {
            name[..cut].to_string()
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parsing() {
        assert_eq!(RecordType::from("a"), RecordType::A);
        assert_eq!(RecordType::from("AAAA"), RecordType::Aaaa);
        assert_eq!(RecordType::from("SOA"), RecordType::Other("SOA".into()));
        assert!(RecordType::Cname.is_supported());
        assert!(!RecordType::from("CAA").is_supported());
    }

    #[test]
    fn test_record_wire_shape() {
        let json = r#"{"id":10,"zone":"example.com","subDomain":"www","fieldType":"A","target":"1.1.1.1","ttl":60}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 10);
        assert_eq!(record.field_type, RecordType::A);
        assert_eq!(record.dns_name(), "www.example.com");

        let fields = serde_json::to_value(record.fields()).unwrap();
        assert_eq!(fields["fieldType"], "A");
        assert_eq!(fields["subDomain"], "www");
        assert_eq!(fields["ttl"], 60);
    }

    #[test]
    fn test_subdomain_of() {
        assert_eq!(subdomain_of("www.example.com", "example.com"), "www");
        assert_eq!(subdomain_of("a.b.example.com.", "example.com"), "a.b");
        assert_eq!(subdomain_of("example.com", "example.com"), "");
        assert_eq!(subdomain_of("notexample.com", "example.com"), "notexample.com");
    }

    #[test]
    fn test_group_ignores_name_case() {
        let stored = Record::new("example.com", "www", RecordType::A, "1.1.1.1", 60).with_id(10);
        let wanted = Record::new("Example.com", "WWW", RecordType::A, "1.1.1.1", 0);
        assert!(wanted.same_group(&stored));
        assert!(wanted.same_value(&stored));

        let other_type = Record::new("example.com", "www", RecordType::Aaaa, "1.1.1.1", 0);
        assert!(!other_type.same_group(&stored));
    }

    #[test]
    fn test_apex_dns_name() {
        let record = Record::new("example.com", "", RecordType::Mx, "10 mx.example.com", 0);
        assert_eq!(record.dns_name(), "example.com");
    }
}
