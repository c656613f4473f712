//! permgrant - assign Salesforce permission sets from a host job framework.
//!
//! Given a username and a permission-set id, the action resolves the user's
//! record id with a SOQL query and creates a `PermissionSetAssignment`. An
//! assignment that already exists counts as success.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use permgrant::{AssignParams, AssignPermissionSet, JobAction, JobContext};
//!
//! let ctx: JobContext = serde_json::from_str(context_json)?;
//! let action = AssignPermissionSet::new(Duration::from_secs(30))?;
//! let params = AssignParams {
//!     username: "jane@acme.com".into(),
//!     permission_set_id: "0PS5e000000abcdGAA".into(),
//!     ..Default::default()
//! };
//! let output = action.invoke(params, &ctx).await?;
//! println!("{}", serde_json::to_string_pretty(&output)?);
//! ```

pub mod action;
pub mod auth;
pub mod context;
pub mod error;
pub mod http;
pub mod salesforce;

pub use action::{
    AssignPermissionSet, ErrorOutcome, HaltOutput, InvokeOutput, JobAction, OutcomeStatus,
};
pub use auth::{AuthError, AuthScheme};
pub use context::{AssignParams, ErrorInfo, ErrorParams, HaltParams, JobContext};
pub use error::{ActionError, ErrorClass};
pub use salesforce::{AssignmentOutcome, SalesforceClient, SalesforceError};
