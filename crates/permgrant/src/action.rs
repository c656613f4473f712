//! The job action: lifecycle entry points the host framework calls.
//!
//! The host calls [`JobAction::invoke`] to run the job. If invoke fails it
//! calls [`JobAction::error`] with the failure message and schedules a retry
//! when the hook answers [`OutcomeStatus::RetryRequested`]. [`JobAction::halt`]
//! is called when the job is cancelled or times out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::AuthScheme;
use crate::context::{AssignParams, ErrorParams, HaltParams, JobContext};
use crate::error::{ActionError, ErrorClass};
use crate::http::HttpTransport;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::salesforce::{
    AssignmentOutcome, SalesforceClient, normalize_api_version, short_error_message,
};

/// `status` field of every entry point's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    RetryRequested,
    Halted,
}

/// Output of a successful invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeOutput {
    pub status: OutcomeStatus,
    pub username: String,
    pub user_id: String,
    pub permission_set_id: String,
    /// Absent when the assignment already existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    pub already_assigned: bool,
    pub address: String,
}

/// Output of the error hook when it asks for a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorOutcome {
    pub status: OutcomeStatus,
}

/// Output of halt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HaltOutput {
    pub status: OutcomeStatus,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub halted_at: DateTime<Utc>,
}

/// The three lifecycle entry points a host job framework expects.
#[async_trait]
pub trait JobAction: Send + Sync {
    type Params: Send;
    type Output: Serialize + Send;

    /// Run the job.
    async fn invoke(
        &self,
        params: Self::Params,
        ctx: &JobContext,
    ) -> Result<Self::Output, ActionError>;

    /// Decide whether a failed invoke should be retried.
    ///
    /// `Ok` asks the host to retry; `Err` hands the failure back to it.
    async fn error(&self, params: ErrorParams, ctx: &JobContext)
    -> Result<ErrorOutcome, ActionError>;

    /// Acknowledge cancellation. Never fails.
    async fn halt(&self, params: HaltParams, ctx: &JobContext) -> HaltOutput;
}

/// Assigns a Salesforce permission set to a user.
#[derive(Clone)]
pub struct AssignPermissionSet {
    transport: Arc<dyn HttpTransport>,
}

impl AssignPermissionSet {
    /// Create the action with a reqwest transport using `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ActionError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Ok(Self::new_with_transport(Arc::new(transport)))
    }

    pub fn new_with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

fn require<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ActionError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ActionError::MissingParameter(name))
    } else {
        Ok(value)
    }
}

#[async_trait]
impl JobAction for AssignPermissionSet {
    type Params = AssignParams;
    type Output = InvokeOutput;

    async fn invoke(
        &self,
        params: AssignParams,
        ctx: &JobContext,
    ) -> Result<InvokeOutput, ActionError> {
        let username = require(&params.username, "username")?;
        let permission_set_id = require(&params.permission_set_id, "permissionSetId")?;
        let address = ctx
            .base_url(params.address.as_deref())
            .ok_or(ActionError::MissingAddress)?;
        let api_version = normalize_api_version(params.api_version.as_deref());

        tracing::info!(
            "Assigning permission set {} to {} on {}",
            permission_set_id,
            username,
            address
        );

        let scheme = AuthScheme::select(ctx)?;
        tracing::debug!("Using {} authentication", scheme.kind());
        let authorization = scheme.authorization_header(self.transport.as_ref()).await?;

        let client = SalesforceClient::new(
            Arc::clone(&self.transport),
            &address,
            &api_version,
            authorization,
        );

        let user_id = client.find_user_id(username).await.inspect_err(|e| {
            tracing::warn!("User lookup for {} failed: {}", username, short_error_message(e));
        })?;
        tracing::debug!("Resolved {} to user {}", username, user_id);

        let outcome = client
            .assign_permission_set(&user_id, permission_set_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    "Assigning {} to {} failed: {}",
                    permission_set_id,
                    username,
                    short_error_message(e)
                );
            })?;

        let (assignment_id, already_assigned) = match outcome {
            AssignmentOutcome::Created { assignment_id } => {
                tracing::info!(
                    "Assigned permission set {} to {} ({})",
                    permission_set_id,
                    username,
                    assignment_id.as_deref().unwrap_or("no id returned")
                );
                (assignment_id, false)
            }
            AssignmentOutcome::AlreadyAssigned => {
                tracing::warn!(
                    "Permission set {} already assigned to {}, nothing to do",
                    permission_set_id,
                    username
                );
                (None, true)
            }
        };

        Ok(InvokeOutput {
            status: OutcomeStatus::Success,
            username: username.to_string(),
            user_id,
            permission_set_id: permission_set_id.to_string(),
            assignment_id,
            already_assigned,
            address,
        })
    }

    async fn error(
        &self,
        params: ErrorParams,
        _ctx: &JobContext,
    ) -> Result<ErrorOutcome, ActionError> {
        let message = params.error.message;
        let username = params.username.as_deref().unwrap_or("unknown");

        match ErrorClass::of(&message) {
            ErrorClass::Retryable => {
                tracing::info!("Retryable error for {}: {}", username, message);
                Ok(ErrorOutcome {
                    status: OutcomeStatus::RetryRequested,
                })
            }
            ErrorClass::Fatal => {
                tracing::error!("Authentication failure for {}: {}", username, message);
                Err(ActionError::Fatal(message))
            }
            ErrorClass::Unrecoverable => {
                tracing::error!("Unrecoverable error for {}: {}", username, message);
                Err(ActionError::Unrecoverable(message))
            }
        }
    }

    async fn halt(&self, params: HaltParams, _ctx: &JobContext) -> HaltOutput {
        let username = params
            .username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let reason = params.reason.filter(|r| !r.trim().is_empty());

        tracing::info!(
            "Job halted for {}: {}",
            username,
            reason.as_deref().unwrap_or("no reason given")
        );

        HaltOutput {
            status: OutcomeStatus::Halted,
            username,
            reason,
            halted_at: Utc::now(),
        }
    }
}
