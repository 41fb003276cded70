//! Raw matter-record shapes and normalization into the canonical form.
//!
//! Three backends feed matter data into the portal and each uses a
//! different field-naming convention: the legacy feeds return either
//! PascalCase keys (`DisplayNumber`) or spaced keys (`"Display Number"`),
//! and the VNet-direct feed returns snake_case (`display_number`). Instead
//! of probing alias lists against untyped maps, each shape is an explicit
//! serde record type; the shape is detected from the identifier key present
//! and mapped exhaustively, so a new source shape fails loudly at the type
//! level rather than silently normalizing to empty.
//!
//! Normalization never fails. A record that matches no known shape, or
//! whose fields are malformed, degrades to a mostly-empty canonical record;
//! the merge engine drops records with no identifier.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matters::policy::{
    determine_matter_status, determine_user_role, MatterRole, MatterStatus,
};

/// Provenance tag for a normalized matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterDataSource {
    LegacyAll,
    LegacyUser,
    VnetDirect,
}

impl MatterDataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegacyAll => "legacy_all",
            Self::LegacyUser => "legacy_user",
            Self::VnetDirect => "vnet_direct",
        }
    }
}

/// The canonical matter record. Created once per raw record at
/// normalization time and never mutated; a higher-priority source replaces
/// the whole record, it is never patched field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMatter {
    pub matter_id: String,
    pub matter_name: String,
    pub display_number: String,
    pub instruction_ref: Option<String>,
    pub open_date: String,
    pub close_date: Option<String>,
    /// Derived via [`determine_matter_status`], never taken from upstream.
    pub status: MatterStatus,
    /// Whatever status field existed upstream, for display only.
    pub original_status: Option<String>,
    pub client_id: String,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub description: String,
    pub practice_area: String,
    pub source: Option<String>,
    pub referrer: Option<String>,
    pub value: Option<String>,
    pub responsible_solicitor: String,
    pub originating_solicitor: String,
    pub supervising_partner: Option<String>,
    pub opponent: Option<String>,
    pub opponent_solicitor: Option<String>,
    /// Derived relative to the requesting user via [`determine_user_role`].
    pub role: MatterRole,
    pub method_of_contact: Option<String>,
    pub ccl_date: Option<String>,
    pub rating: Option<String>,
    pub mod_stamp: Option<String>,
    pub data_source: MatterDataSource,
    /// The raw record as received. Debugging only; downstream logic must
    /// not read it.
    #[serde(rename = "_raw", default)]
    pub raw: Value,
}

/// Tolerant deserializers: the feeds are loose about types (numeric client
/// ids, numeric values), so string-ish fields accept strings and numbers
/// and treat anything else as absent.
mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Legacy record shape with PascalCase keys and no spaces.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PascalRecord {
    #[serde(rename = "MatterID", deserialize_with = "loose::string")]
    pub matter_id: String,
    #[serde(rename = "UniqueID", deserialize_with = "loose::string")]
    pub unique_id: String,
    #[serde(rename = "InstructionRef", deserialize_with = "loose::opt_string")]
    pub instruction_ref: Option<String>,
    #[serde(rename = "DisplayNumber", deserialize_with = "loose::string")]
    pub display_number: String,
    #[serde(rename = "OpenDate", deserialize_with = "loose::string")]
    pub open_date: String,
    #[serde(rename = "CloseDate", deserialize_with = "loose::opt_string")]
    pub close_date: Option<String>,
    #[serde(rename = "Status", deserialize_with = "loose::opt_string")]
    pub status: Option<String>,
    #[serde(rename = "ClientID", deserialize_with = "loose::string")]
    pub client_id: String,
    #[serde(rename = "ClientName", deserialize_with = "loose::string")]
    pub client_name: String,
    #[serde(rename = "ClientPhone", deserialize_with = "loose::opt_string")]
    pub client_phone: Option<String>,
    #[serde(rename = "ClientEmail", deserialize_with = "loose::opt_string")]
    pub client_email: Option<String>,
    #[serde(rename = "Description", deserialize_with = "loose::string")]
    pub description: String,
    #[serde(rename = "PracticeArea", deserialize_with = "loose::string")]
    pub practice_area: String,
    #[serde(rename = "Source", deserialize_with = "loose::opt_string")]
    pub source: Option<String>,
    #[serde(rename = "Referrer", deserialize_with = "loose::opt_string")]
    pub referrer: Option<String>,
    #[serde(rename = "ApproxValue", deserialize_with = "loose::opt_string")]
    pub approx_value: Option<String>,
    #[serde(rename = "ResponsibleSolicitor", deserialize_with = "loose::string")]
    pub responsible_solicitor: String,
    #[serde(rename = "OriginatingSolicitor", deserialize_with = "loose::string")]
    pub originating_solicitor: String,
    #[serde(rename = "SupervisingPartner", deserialize_with = "loose::opt_string")]
    pub supervising_partner: Option<String>,
    #[serde(rename = "Opponent", deserialize_with = "loose::opt_string")]
    pub opponent: Option<String>,
    #[serde(rename = "OpponentSolicitor", deserialize_with = "loose::opt_string")]
    pub opponent_solicitor: Option<String>,
    #[serde(rename = "method_of_contact", deserialize_with = "loose::opt_string")]
    pub method_of_contact: Option<String>,
    #[serde(rename = "CCL_date", deserialize_with = "loose::opt_string")]
    pub ccl_date: Option<String>,
    #[serde(rename = "Rating", deserialize_with = "loose::opt_string")]
    pub rating: Option<String>,
    #[serde(rename = "mod_stamp", deserialize_with = "loose::opt_string")]
    pub mod_stamp: Option<String>,
}

/// Legacy record shape with spaced keys ("Display Number").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpacedRecord {
    #[serde(rename = "Matter ID", deserialize_with = "loose::string")]
    pub matter_id: String,
    #[serde(rename = "Unique ID", deserialize_with = "loose::string")]
    pub unique_id: String,
    #[serde(rename = "Instruction Ref", deserialize_with = "loose::opt_string")]
    pub instruction_ref: Option<String>,
    #[serde(rename = "Display Number", deserialize_with = "loose::string")]
    pub display_number: String,
    #[serde(rename = "Open Date", deserialize_with = "loose::string")]
    pub open_date: String,
    #[serde(rename = "Close Date", deserialize_with = "loose::opt_string")]
    pub close_date: Option<String>,
    #[serde(rename = "Status", deserialize_with = "loose::opt_string")]
    pub status: Option<String>,
    #[serde(rename = "Client ID", deserialize_with = "loose::string")]
    pub client_id: String,
    #[serde(rename = "Client Name", deserialize_with = "loose::string")]
    pub client_name: String,
    #[serde(rename = "Client Phone", deserialize_with = "loose::opt_string")]
    pub client_phone: Option<String>,
    #[serde(rename = "Client Email", deserialize_with = "loose::opt_string")]
    pub client_email: Option<String>,
    #[serde(rename = "Description", deserialize_with = "loose::string")]
    pub description: String,
    #[serde(rename = "Practice Area", deserialize_with = "loose::string")]
    pub practice_area: String,
    #[serde(rename = "Source", deserialize_with = "loose::opt_string")]
    pub source: Option<String>,
    #[serde(rename = "Referrer", deserialize_with = "loose::opt_string")]
    pub referrer: Option<String>,
    #[serde(rename = "Approx. Value", deserialize_with = "loose::opt_string")]
    pub approx_value: Option<String>,
    #[serde(rename = "Responsible Solicitor", deserialize_with = "loose::string")]
    pub responsible_solicitor: String,
    #[serde(rename = "Originating Solicitor", deserialize_with = "loose::string")]
    pub originating_solicitor: String,
    #[serde(rename = "Supervising Partner", deserialize_with = "loose::opt_string")]
    pub supervising_partner: Option<String>,
    #[serde(rename = "Opponent", deserialize_with = "loose::opt_string")]
    pub opponent: Option<String>,
    #[serde(rename = "Opponent Solicitor", deserialize_with = "loose::opt_string")]
    pub opponent_solicitor: Option<String>,
    #[serde(rename = "method_of_contact", deserialize_with = "loose::opt_string")]
    pub method_of_contact: Option<String>,
    #[serde(rename = "CCL_date", deserialize_with = "loose::opt_string")]
    pub ccl_date: Option<String>,
    #[serde(rename = "Rating", deserialize_with = "loose::opt_string")]
    pub rating: Option<String>,
    #[serde(rename = "mod_stamp", deserialize_with = "loose::opt_string")]
    pub mod_stamp: Option<String>,
}

/// VNet-direct record shape with snake_case keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnakeRecord {
    #[serde(deserialize_with = "loose::string")]
    pub matter_id: String,
    #[serde(deserialize_with = "loose::string")]
    pub id: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub instruction_ref: Option<String>,
    #[serde(deserialize_with = "loose::string")]
    pub display_number: String,
    #[serde(deserialize_with = "loose::string")]
    pub number: String,
    #[serde(deserialize_with = "loose::string")]
    pub open_date: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub close_date: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "loose::string")]
    pub client_id: String,
    #[serde(deserialize_with = "loose::string")]
    pub client_name: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub client_phone: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub client_email: Option<String>,
    #[serde(deserialize_with = "loose::string")]
    pub description: String,
    #[serde(deserialize_with = "loose::string")]
    pub matter_name: String,
    #[serde(deserialize_with = "loose::string")]
    pub practice_area: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub source: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub referrer: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub approx_value: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub value: Option<String>,
    #[serde(deserialize_with = "loose::string")]
    pub responsible_solicitor: String,
    #[serde(deserialize_with = "loose::string")]
    pub originating_solicitor: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub supervising_partner: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub opponent: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub opponent_solicitor: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub method_of_contact: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub ccl_date: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub rating: Option<String>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub mod_stamp: Option<String>,
}

/// A raw matter record, tagged by the source shape it arrived in.
#[derive(Debug, Clone)]
pub enum RawMatterRecord {
    Pascal(PascalRecord),
    Spaced(SpacedRecord),
    Snake(SnakeRecord),
    /// No recognizable identifier key; normalizes to an empty record.
    Unknown,
}

const PASCAL_MARKERS: &[&str] = &["MatterID", "UniqueID", "DisplayNumber", "ClientName"];
const SPACED_MARKERS: &[&str] = &["Matter ID", "Unique ID", "Display Number", "Client Name"];
const SNAKE_MARKERS: &[&str] = &["matter_id", "display_number", "client_name", "id"];

fn parse_shape<T: DeserializeOwned + Default>(value: &Value) -> T {
    // Malformed records degrade to an all-default shape instead of failing
    // the merge.
    serde_json::from_value(value.clone()).unwrap_or_default()
}

impl RawMatterRecord {
    /// Detect the source shape of a raw JSON record. Detection order
    /// mirrors the portal's probe order: PascalCase, then spaced, then
    /// snake_case.
    pub fn classify(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Unknown;
        };

        if PASCAL_MARKERS.iter().any(|key| object.contains_key(*key)) {
            Self::Pascal(parse_shape(value))
        } else if SPACED_MARKERS.iter().any(|key| object.contains_key(*key)) {
            Self::Spaced(parse_shape(value))
        } else if SNAKE_MARKERS.iter().any(|key| object.contains_key(*key)) {
            Self::Snake(parse_shape(value))
        } else {
            Self::Unknown
        }
    }
}

/// Canonical fields before status/role derivation.
#[derive(Debug, Default)]
struct RecordFields {
    matter_id: String,
    matter_name: String,
    display_number: String,
    instruction_ref: Option<String>,
    open_date: String,
    close_date: Option<String>,
    original_status: Option<String>,
    client_id: String,
    client_name: String,
    client_phone: Option<String>,
    client_email: Option<String>,
    description: String,
    practice_area: String,
    source: Option<String>,
    referrer: Option<String>,
    value: Option<String>,
    responsible_solicitor: String,
    originating_solicitor: String,
    supervising_partner: Option<String>,
    opponent: Option<String>,
    opponent_solicitor: Option<String>,
    method_of_contact: Option<String>,
    ccl_date: Option<String>,
    rating: Option<String>,
    mod_stamp: Option<String>,
}

fn first_non_empty(primary: String, fallback: String) -> String {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

impl PascalRecord {
    fn into_fields(self) -> RecordFields {
        RecordFields {
            matter_id: first_non_empty(self.matter_id, self.unique_id),
            matter_name: self.description.clone(),
            display_number: self.display_number,
            instruction_ref: self.instruction_ref,
            open_date: self.open_date,
            close_date: self.close_date,
            original_status: self.status,
            client_id: self.client_id,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email,
            description: self.description,
            practice_area: self.practice_area,
            source: self.source,
            referrer: self.referrer,
            value: self.approx_value,
            responsible_solicitor: self.responsible_solicitor,
            originating_solicitor: self.originating_solicitor,
            supervising_partner: self.supervising_partner,
            opponent: self.opponent,
            opponent_solicitor: self.opponent_solicitor,
            method_of_contact: self.method_of_contact,
            ccl_date: self.ccl_date,
            rating: self.rating,
            mod_stamp: self.mod_stamp,
        }
    }
}

impl SpacedRecord {
    fn into_fields(self) -> RecordFields {
        RecordFields {
            matter_id: first_non_empty(self.matter_id, self.unique_id),
            matter_name: self.description.clone(),
            display_number: self.display_number,
            instruction_ref: self.instruction_ref,
            open_date: self.open_date,
            close_date: self.close_date,
            original_status: self.status,
            client_id: self.client_id,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email,
            description: self.description,
            practice_area: self.practice_area,
            source: self.source,
            referrer: self.referrer,
            value: self.approx_value,
            responsible_solicitor: self.responsible_solicitor,
            originating_solicitor: self.originating_solicitor,
            supervising_partner: self.supervising_partner,
            opponent: self.opponent,
            opponent_solicitor: self.opponent_solicitor,
            method_of_contact: self.method_of_contact,
            ccl_date: self.ccl_date,
            rating: self.rating,
            mod_stamp: self.mod_stamp,
        }
    }
}

impl SnakeRecord {
    fn into_fields(self) -> RecordFields {
        let description = first_non_empty(self.description, self.matter_name);
        RecordFields {
            matter_id: first_non_empty(self.matter_id, self.id),
            matter_name: description.clone(),
            display_number: first_non_empty(self.display_number, self.number),
            instruction_ref: self.instruction_ref,
            open_date: self.open_date,
            close_date: self.close_date,
            original_status: self.status,
            client_id: self.client_id,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email,
            description,
            practice_area: self.practice_area,
            source: self.source,
            referrer: self.referrer,
            value: self.approx_value.or(self.value),
            responsible_solicitor: self.responsible_solicitor,
            originating_solicitor: self.originating_solicitor,
            supervising_partner: self.supervising_partner,
            opponent: self.opponent,
            opponent_solicitor: self.opponent_solicitor,
            method_of_contact: self.method_of_contact,
            ccl_date: self.ccl_date,
            rating: self.rating,
            mod_stamp: self.mod_stamp,
        }
    }
}

/// Normalize a raw matter record from any source into the canonical form.
///
/// Never fails: unknown shapes and malformed records produce a record with
/// an empty `matter_id`, which the merge engine then drops. Normalization
/// and filtering are a deliberate two-stage contract.
pub fn normalize_matter_data(
    raw: &Value,
    user_full_name: &str,
    data_source: MatterDataSource,
) -> NormalizedMatter {
    let fields = match RawMatterRecord::classify(raw) {
        RawMatterRecord::Pascal(record) => record.into_fields(),
        RawMatterRecord::Spaced(record) => record.into_fields(),
        RawMatterRecord::Snake(record) => record.into_fields(),
        RawMatterRecord::Unknown => RecordFields::default(),
    };

    let status = determine_matter_status(fields.close_date.as_deref());
    let role = determine_user_role(
        user_full_name,
        &fields.responsible_solicitor,
        &fields.originating_solicitor,
    );

    NormalizedMatter {
        matter_id: fields.matter_id,
        matter_name: fields.matter_name,
        display_number: fields.display_number,
        instruction_ref: fields.instruction_ref,
        open_date: fields.open_date,
        close_date: fields.close_date,
        status,
        original_status: fields.original_status,
        client_id: fields.client_id,
        client_name: fields.client_name,
        client_phone: fields.client_phone,
        client_email: fields.client_email,
        description: fields.description,
        practice_area: fields.practice_area,
        source: fields.source,
        referrer: fields.referrer,
        value: fields.value,
        responsible_solicitor: fields.responsible_solicitor,
        originating_solicitor: fields.originating_solicitor,
        supervising_partner: fields.supervising_partner,
        opponent: fields.opponent,
        opponent_solicitor: fields.opponent_solicitor,
        role,
        method_of_contact: fields.method_of_contact,
        ccl_date: fields.ccl_date,
        rating: fields.rating,
        mod_stamp: fields.mod_stamp,
        data_source,
        raw: raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn classifies_pascal_spaced_and_snake_shapes() {
        assert!(matches!(
            RawMatterRecord::classify(&json!({"MatterID": "M-1"})),
            RawMatterRecord::Pascal(_)
        ));
        assert!(matches!(
            RawMatterRecord::classify(&json!({"Unique ID": "M-1"})),
            RawMatterRecord::Spaced(_)
        ));
        assert!(matches!(
            RawMatterRecord::classify(&json!({"matter_id": "M-1"})),
            RawMatterRecord::Snake(_)
        ));
        assert!(matches!(
            RawMatterRecord::classify(&json!({"unrelated": true})),
            RawMatterRecord::Unknown
        ));
        assert!(matches!(
            RawMatterRecord::classify(&json!("not an object")),
            RawMatterRecord::Unknown
        ));
    }

    #[test]
    fn normalizes_spaced_legacy_record() {
        let raw = json!({
            "Unique ID": "M-100",
            "Display Number": "HLX-100",
            "Client Name": "Acme Ltd",
            "Description": "Shareholder dispute",
            "Practice Area": "Commercial",
            "Open Date": "2023-01-05",
            "Close Date": "",
            "Status": "Open",
            "Responsible Solicitor": "Zemanek, Lukasz",
            "Originating Solicitor": "Jane Doe",
            "Approx. Value": "25000"
        });

        let matter = normalize_matter_data(&raw, "Luke Zemanek", MatterDataSource::LegacyAll);
        assert_eq!(matter.matter_id, "M-100");
        assert_eq!(matter.display_number, "HLX-100");
        assert_eq!(matter.matter_name, "Shareholder dispute");
        assert_eq!(matter.status, MatterStatus::Active);
        assert_eq!(matter.original_status.as_deref(), Some("Open"));
        assert_eq!(matter.role, MatterRole::Responsible);
        assert_eq!(matter.value.as_deref(), Some("25000"));
        assert_eq!(matter.data_source, MatterDataSource::LegacyAll);
        assert_eq!(matter.raw, raw);
    }

    #[test]
    fn normalizes_snake_vnet_record_with_fallback_keys() {
        let raw = json!({
            "id": "M-200",
            "number": "HLX-200",
            "client_name": "Beta LLP",
            "client_id": 4471,
            "matter_name": "Lease renewal",
            "close_date": "2024-02-01",
            "responsible_solicitor": "Jane Doe",
            "originating_solicitor": "Luke Zemanek",
            "value": 12000
        });

        let matter = normalize_matter_data(&raw, "Zemanek, Lukasz", MatterDataSource::VnetDirect);
        assert_eq!(matter.matter_id, "M-200");
        assert_eq!(matter.display_number, "HLX-200");
        assert_eq!(matter.description, "Lease renewal");
        assert_eq!(matter.client_id, "4471");
        assert_eq!(matter.status, MatterStatus::Closed);
        assert_eq!(matter.role, MatterRole::Originating);
        assert_eq!(matter.value.as_deref(), Some("12000"));
    }

    #[test]
    fn unknown_shape_degrades_to_empty_record() {
        let raw = json!({"totally": "different"});
        let matter = normalize_matter_data(&raw, "Luke Zemanek", MatterDataSource::LegacyUser);
        assert_eq!(matter.matter_id, "");
        assert_eq!(matter.status, MatterStatus::Active);
        assert_eq!(matter.role, MatterRole::None);
        assert_eq!(matter.raw, raw);
    }

    #[test]
    fn malformed_fields_degrade_rather_than_fail() {
        // A shape marker is present but the rest of the record is junk.
        let raw = json!({
            "matter_id": {"nested": "object"},
            "client_name": ["array"],
            "open_date": null
        });
        let matter = normalize_matter_data(&raw, "Luke Zemanek", MatterDataSource::VnetDirect);
        assert_eq!(matter.matter_id, "");
        assert_eq!(matter.client_name, "");
    }

    #[test]
    fn pascal_record_prefers_matter_id_over_unique_id() {
        let raw = json!({"MatterID": "M-1", "UniqueID": "U-1"});
        let matter = normalize_matter_data(&raw, "X", MatterDataSource::LegacyAll);
        assert_eq!(matter.matter_id, "M-1");

        let raw = json!({"UniqueID": "U-2", "ClientName": "Acme"});
        let matter = normalize_matter_data(&raw, "X", MatterDataSource::LegacyAll);
        assert_eq!(matter.matter_id, "U-2");
    }
}
