//! Inbound request bodies.
//!
//! Every body is deserialized with serde and then checked with [`Validate`]
//! before the gateway talks to any backend.

use std::sync::OnceLock;

use abcall_downstream::types::DocumentInfo;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractors::{Validate, ValidationErrors};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const PERSON_NAME_PATTERN: &str = r"^[a-zA-ZáéíóúñÁÉÍÓÚÑ\s]+$";
const PHONE_PATTERN: &str = r"^\+\d{2}\s\d{3}\s\d{3}\s\d{4}$";

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn email() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, EMAIL_PATTERN)
}

fn person_name() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, PERSON_NAME_PATTERN)
}

fn phone() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, PHONE_PATTERN)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

// ── Company creation ────────────────────────────────────────────────────────

/// Payload for creating a company together with its administrator account.
///
/// Forwarded to the directory service unchanged once valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompanyCreate {
    /// Administrator login, an e-mail address.
    #[schema(example = "admin@acme.co")]
    pub username: String,
    /// At least 8 characters.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Company name.
    pub name: String,
    pub birth_date: NaiveDate,
    /// `+NN NNN NNN NNNN`
    #[schema(example = "+57 300 123 4567")]
    pub phone_number: String,
    pub country: String,
    pub city: String,
}

impl Validate for CompanyCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.check(
            email().is_match(&self.username),
            "username",
            "must be a valid e-mail address",
        );
        errors.check(
            char_len(&self.password) >= 8,
            "password",
            "must be at least 8 characters",
        );
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            errors.check(
                (1..=50).contains(&char_len(value)),
                field,
                "must be between 1 and 50 characters",
            );
            errors.check(
                person_name().is_match(value),
                field,
                "may contain only letters and spaces",
            );
        }
        errors.check(
            (1..=100).contains(&char_len(&self.name)),
            "name",
            "must be between 1 and 100 characters",
        );
        errors.check(
            self.birth_date <= Utc::now().date_naive(),
            "birth_date",
            "cannot be in the future",
        );
        errors.check(
            phone().is_match(&self.phone_number),
            "phone_number",
            "must match +NN NNN NNN NNNN",
        );
        errors.check(not_blank(&self.country), "country", "must not be empty");
        errors.check(not_blank(&self.city), "city", "must not be empty");

        errors.into_result()
    }
}

// ── User lookups ────────────────────────────────────────────────────────────

/// Identity document used to find the companies a user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDocumentInfo {
    #[schema(example = "passport")]
    pub document_type: String,
    #[schema(example = "A1234567")]
    pub document_id: String,
}

impl Validate for UserDocumentInfo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(not_blank(&self.document_type), "document_type", "must not be empty");
        errors.check(not_blank(&self.document_id), "document_id", "must not be empty");
        errors.into_result()
    }
}

impl From<UserDocumentInfo> for DocumentInfo {
    fn from(info: UserDocumentInfo) -> Self {
        Self {
            document_type: info.document_type,
            document_id: info.document_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserCompanyRequest {
    pub user_id: Uuid,
    pub company_id: Uuid,
}
