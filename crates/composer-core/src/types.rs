//! Core types for the composition workflow
//!
//! Defines the values that cross component boundaries:
//! - Parties and the generation request/response pair
//! - The draft document and its save request
//! - Saved contract summaries returned by the store

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Request parameter key carrying the client name
pub const CLIENT_NAME_KEY: &str = "clientName";
/// Request parameter key carrying the other party's name
pub const OTHER_PARTY_NAME_KEY: &str = "otherPartyName";

/// The two contracting parties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parties {
    /// The user's own name or company
    pub client_name: String,
    /// The counterparty
    pub other_party_name: String,
}

impl Parties {
    /// Create parties
    #[inline]
    #[must_use]
    pub fn new(client_name: impl Into<String>, other_party_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            other_party_name: other_party_name.into(),
        }
    }
}

/// Validated request sent to the generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Contract type id
    pub contract_type: String,
    /// Jurisdiction of the contract type
    pub jurisdiction: String,
    /// Parties followed by the schema parameters
    pub parameters: IndexMap<String, String>,
    /// Selected clause variations
    pub options: IndexMap<String, String>,
}

/// Successful generation service payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Generated document text (Markdown)
    pub contract: String,
    /// Contract type echoed by the service
    #[serde(default)]
    pub contract_type: String,
    /// Client name echoed by the service
    #[serde(default)]
    pub client_name: String,
    /// Other party echoed by the service
    #[serde(default)]
    pub other_party_name: String,
    /// Jurisdiction echoed by the service
    #[serde(default)]
    pub jurisdiction: String,
}

/// The generated document being reviewed and edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDocument {
    /// Title used for saving and the export filename
    pub title: String,
    /// Document text, edited verbatim
    pub content: String,
    /// Contract type id
    pub contract_type: String,
    /// Jurisdiction
    pub jurisdiction: String,
}

impl DraftDocument {
    /// Build the document from a generation response
    ///
    /// Fields the service left blank fall back to the submitted request.
    #[must_use]
    pub fn from_response(response: &GenerationResponse, request: &GenerationRequest) -> Self {
        let or_request = |value: &str, key: &str| {
            if value.trim().is_empty() {
                request.parameters.get(key).cloned().unwrap_or_default()
            } else {
                value.to_string()
            }
        };

        let contract_type = if response.contract_type.trim().is_empty() {
            request.contract_type.clone()
        } else {
            response.contract_type.clone()
        };
        let jurisdiction = if response.jurisdiction.trim().is_empty() {
            request.jurisdiction.clone()
        } else {
            response.jurisdiction.clone()
        };
        let client = or_request(&response.client_name, CLIENT_NAME_KEY);
        let other = or_request(&response.other_party_name, OTHER_PARTY_NAME_KEY);

        Self {
            title: format!("{contract_type} - {client} & {other}"),
            content: response.contract.clone(),
            contract_type,
            jurisdiction,
        }
    }
}

/// Request sent to the contract store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Document title
    pub title: String,
    /// Contract type id
    pub contract_type: String,
    /// Document text
    pub content: String,
}

impl From<&DraftDocument> for SaveRequest {
    fn from(document: &DraftDocument) -> Self {
        Self {
            title: document.title.clone(),
            contract_type: document.contract_type.clone(),
            content: document.content.clone(),
        }
    }
}

/// Identifier assigned by the store; numeric or textual on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractId {
    /// Integer id
    Number(i64),
    /// String id
    Text(String),
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Store acknowledgement of a save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    /// Human-readable message, if the store sent one
    #[serde(default)]
    pub message: Option<String>,
    /// Id of the stored contract, if the store sent one
    #[serde(default, alias = "contract_id")]
    pub id: Option<ContractId>,
}

/// Saved contract as listed by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSummary {
    /// Store id
    pub id: ContractId,
    /// Title given at save time
    pub title: String,
    /// Contract type id
    pub contract_type: String,
    /// Creation time
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Wire envelope of the contract list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractList {
    /// Saved contracts
    #[serde(default)]
    pub contracts: Vec<ContractSummary>,
}

/// ISO-8601 with offset, or without one (read as UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> GenerationRequest {
        let mut parameters = IndexMap::new();
        parameters.insert(CLIENT_NAME_KEY.to_string(), "Acme Inc.".to_string());
        parameters.insert(OTHER_PARTY_NAME_KEY.to_string(), "John Doe".to_string());
        GenerationRequest {
            contract_type: "California Employment Agreement".to_string(),
            jurisdiction: "California".to_string(),
            parameters,
            options: IndexMap::new(),
        }
    }

    #[test]
    fn generation_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["contractType"], "California Employment Agreement");
        assert_eq!(json["parameters"]["clientName"], "Acme Inc.");
        assert!(json["options"].as_object().unwrap().is_empty());
    }

    #[test]
    fn document_title_from_response() {
        let response: GenerationResponse = serde_json::from_str(
            r##"{"contract":"# Agreement","contractType":"California Employment Agreement",
                "clientName":"Acme Inc.","otherPartyName":"John Doe","jurisdiction":"California"}"##,
        )
        .unwrap();
        let doc = DraftDocument::from_response(&response, &request());

        assert_eq!(doc.title, "California Employment Agreement - Acme Inc. & John Doe");
        assert_eq!(doc.content, "# Agreement");
        assert_eq!(doc.jurisdiction, "California");
    }

    #[test]
    fn document_falls_back_to_request_fields() {
        let response: GenerationResponse = serde_json::from_str(r#"{"contract":"text"}"#).unwrap();
        let doc = DraftDocument::from_response(&response, &request());

        assert_eq!(doc.contract_type, "California Employment Agreement");
        assert_eq!(doc.jurisdiction, "California");
        assert_eq!(doc.title, "California Employment Agreement - Acme Inc. & John Doe");
    }

    #[test]
    fn save_request_wire_shape() {
        let doc = DraftDocument {
            title: "T".to_string(),
            content: "C".to_string(),
            contract_type: "NDA".to_string(),
            jurisdiction: "Delaware".to_string(),
        };
        let json = serde_json::to_value(SaveRequest::from(&doc)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "T", "contractType": "NDA", "content": "C"})
        );
    }

    #[test]
    fn contract_list_accepts_mixed_ids_and_timestamps() {
        let list: ContractList = serde_json::from_str(
            r#"{"contracts":[
                {"id":7,"title":"A","contract_type":"NDA","created_at":"2024-03-01T10:15:00Z"},
                {"id":"c-9","title":"B","contract_type":"NDA","created_at":"2024-03-02T08:00:00.123456"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.contracts[0].id, ContractId::Number(7));
        assert_eq!(list.contracts[1].id.to_string(), "c-9");
        assert_eq!(list.contracts[1].created_at.to_rfc3339(), "2024-03-02T08:00:00.123456+00:00");
    }

    #[test]
    fn save_ack_tolerates_unknown_payloads() {
        let ack: SaveAck = serde_json::from_str(r#"{"message":"Contract saved","contract_id":3,"x":1}"#).unwrap();
        assert_eq!(ack.message.as_deref(), Some("Contract saved"));
        assert_eq!(ack.id, Some(ContractId::Number(3)));

        let empty: SaveAck = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SaveAck::default());
    }
}
