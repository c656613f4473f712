//! Salesforce REST client for the two calls the action makes.

use std::sync::Arc;

use super::error::SalesforceError;
use super::types::{
    AssignmentOutcome, CreateResponse, PermissionSetAssignmentRequest, QueryResponse, UserRecord,
    api_error_message, parse_api_errors,
};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

/// REST API version used when the params don't name one.
pub const DEFAULT_API_VERSION: &str = "v61.0";

/// Salesforce REST client bound to one org and one Authorization header.
#[derive(Clone)]
pub struct SalesforceClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_version: String,
    authorization: String,
}

impl SalesforceClient {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Instance URL, e.g. `https://acme.my.salesforce.com`
    /// * `api_version` - REST API version, with or without the leading `v`
    /// * `authorization` - Full `Authorization` header value
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        api_version: &str,
        authorization: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: normalize_api_version(Some(api_version)),
            authorization: authorization.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}/services/data/{}{}", self.base_url, self.api_version, path)
    }

    /// URL of a SOQL query.
    pub fn query_url(&self, soql: &str) -> String {
        format!("{}?q={}", self.data_url("/query"), urlencoding::encode(soql))
    }

    /// URL of the `PermissionSetAssignment` sObject collection.
    pub fn assignment_url(&self) -> String {
        self.data_url("/sobjects/PermissionSetAssignment")
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SalesforceError> {
        let request = request
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json");

        tracing::debug!("{} {}", request.method.as_str(), request.url);
        let response = self.transport.send(request).await?;
        tracing::debug!("-> {}", response.status);
        Ok(response)
    }

    /// Resolve a username to its User record id.
    pub async fn find_user_id(&self, username: &str) -> Result<String, SalesforceError> {
        let url = self.query_url(&user_lookup_soql(username));
        let response = self.send(HttpRequest::get(url)).await?;

        if response.status == 404 {
            return Err(SalesforceError::UserNotFound(username.to_string()));
        }
        if !response.is_success() {
            return Err(SalesforceError::Api {
                operation: "User lookup",
                status: response.status,
                message: api_error_message(&response.body),
            });
        }

        let result: QueryResponse<UserRecord> = serde_json::from_slice(&response.body)?;
        result
            .records
            .into_iter()
            .next()
            .map(|record| record.id)
            .ok_or_else(|| SalesforceError::UserNotFound(username.to_string()))
    }

    /// Grant `permission_set_id` to `user_id`.
    ///
    /// A 400 reporting a duplicate is [`AssignmentOutcome::AlreadyAssigned`].
    pub async fn assign_permission_set(
        &self,
        user_id: &str,
        permission_set_id: &str,
    ) -> Result<AssignmentOutcome, SalesforceError> {
        let body = serde_json::to_vec(&PermissionSetAssignmentRequest {
            assignee_id: user_id,
            permission_set_id,
        })?;
        let request = HttpRequest::post(self.assignment_url(), body)
            .header("Content-Type", "application/json");
        let response = self.send(request).await?;

        if response.is_success() {
            let created: Option<CreateResponse> = serde_json::from_slice(&response.body).ok();
            let assignment_id = created.and_then(|c| c.id);
            return Ok(AssignmentOutcome::Created { assignment_id });
        }

        if response.status == 400
            && parse_api_errors(&response.body)
                .iter()
                .any(|e| e.is_duplicate())
        {
            return Ok(AssignmentOutcome::AlreadyAssigned);
        }

        Err(SalesforceError::Api {
            operation: "Permission set assignment",
            status: response.status,
            message: api_error_message(&response.body),
        })
    }
}

/// SOQL that selects the id of the user named `username`.
pub fn user_lookup_soql(username: &str) -> String {
    format!(
        "SELECT Id FROM User WHERE Username = '{}' LIMIT 1",
        escape_soql_literal(username)
    )
}

/// Escape a value for use inside a single-quoted SOQL string literal.
pub fn escape_soql_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out
}

/// `61` and `61.0` become `v61.0`; blank falls back to [`DEFAULT_API_VERSION`].
pub fn normalize_api_version(version: Option<&str>) -> String {
    let version = version.map(str::trim).filter(|v| !v.is_empty());
    let Some(version) = version else {
        return DEFAULT_API_VERSION.to_string();
    };

    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);
    if version.contains('.') {
        format!("v{version}")
    } else {
        format!("v{version}.0")
    }
}
