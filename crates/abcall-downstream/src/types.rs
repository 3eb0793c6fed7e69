//! # Downstream data model
//!
//! Records returned by the backend services are owned by those services.
//! The gateway only reads the stable `id` of each record; every other field
//! is carried through untouched in `fields`.
//!
//! Request payload types mirror the exact JSON the backends accept.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Records ------------------------------------------------------------------

/// Company as returned by the directory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// User as returned by the directory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Incident as returned by the incident-query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// A user together with their incidents inside one company.
///
/// Serialized with the user's fields at the top level and the incidents
/// under `incidents`, matching the directory's user shape plus one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedUserView {
    #[serde(flatten)]
    pub user: UserRecord,
    pub incidents: Vec<IncidentRecord>,
}

/// A success body that does not have the shape the gateway must read.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("{record} body is not a JSON object with a UUID `id`: {source}")]
    Record {
        record: &'static str,
        source: serde_json::Error,
    },
    #[error("incident body is not a JSON array")]
    NotAList,
}

impl AggregatedUserView {
    /// Merge a user body and an incident-list body.
    ///
    /// Incident order is preserved as the incident-query service returned it.
    /// A user field named `incidents` is shadowed by the incident list.
    pub fn compose(
        user: serde_json::Value,
        incidents: serde_json::Value,
    ) -> Result<Self, ShapeError> {
        let mut user: UserRecord = serde_json::from_value(user).map_err(|source| {
            ShapeError::Record {
                record: "user",
                source,
            }
        })?;
        user.fields.remove("incidents");

        let serde_json::Value::Array(items) = incidents else {
            return Err(ShapeError::NotAList);
        };
        let incidents = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<IncidentRecord>, _>>()
            .map_err(|source| ShapeError::Record {
                record: "incident",
                source,
            })?;

        Ok(Self { user, incidents })
    }
}

// -- Request payloads ---------------------------------------------------------

/// Identity document lookup for `POST /user/companies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_type: String,
    pub document_id: String,
}

/// User id lookup for `POST /user/companies-user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdPayload {
    pub id: Uuid,
}

/// Incident lookup for `POST /user-company`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCompanyPayload {
    pub user_id: Uuid,
    pub company_id: Uuid,
}
