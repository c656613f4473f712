//! Request and response bodies for the Salesforce REST API.

use serde::{Deserialize, Serialize};

/// Envelope returned by `/query`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub done: bool,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

/// The only User field the lookup selects.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Body of the `PermissionSetAssignment` create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionSetAssignmentRequest<'a> {
    pub assignee_id: &'a str,
    pub permission_set_id: &'a str,
}

/// Response of an sObject create call.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub success: bool,
}

/// One entry of a Salesforce error body.
///
/// Errors come back as a JSON array:
/// `[{"message": "...", "errorCode": "DUPLICATE_VALUE", "fields": []}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiErrorEntry {
    pub message: String,
    pub error_code: String,
    pub fields: Vec<String>,
}

/// Error code Salesforce uses for a unique-constraint violation.
pub const DUPLICATE_VALUE: &str = "DUPLICATE_VALUE";

impl ApiErrorEntry {
    /// The assignment already exists.
    pub fn is_duplicate(&self) -> bool {
        self.error_code == DUPLICATE_VALUE || self.message.to_lowercase().contains("duplicate")
    }
}

/// Parse a Salesforce error body. Non-JSON bodies yield no entries.
pub fn parse_api_errors(body: &[u8]) -> Vec<ApiErrorEntry> {
    if let Ok(entries) = serde_json::from_slice::<Vec<ApiErrorEntry>>(body) {
        return entries;
    }
    serde_json::from_slice::<ApiErrorEntry>(body)
        .map(|entry| vec![entry])
        .unwrap_or_default()
}

/// Human-readable message for an error body.
///
/// Uses the first parsed entry (`CODE: message`), else the raw body text.
pub fn api_error_message(body: &[u8]) -> String {
    let entries = parse_api_errors(body);
    if let Some(first) = entries.iter().find(|e| !e.message.is_empty()) {
        return if first.error_code.is_empty() {
            first.message.clone()
        } else {
            format!("{}: {}", first.error_code, first.message)
        };
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        text
    }
}

/// Result of asking Salesforce to create the assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// A new `PermissionSetAssignment` record was created.
    Created { assignment_id: Option<String> },
    /// The user already holds the permission set.
    AlreadyAssigned,
}
