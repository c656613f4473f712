//! Salesforce REST API access.
//!
//! Only what permission-set assignment needs: a SOQL user lookup and a
//! `PermissionSetAssignment` create call.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for Salesforce REST operations
//! - [`types`] - Request/response bodies and error-body parsing
//! - [`client`] - The REST client itself
//!
//! # Example
//!
//! ```ignore
//! use permgrant::salesforce::{AssignmentOutcome, SalesforceClient};
//!
//! let client = SalesforceClient::new(transport, "https://acme.my.salesforce.com", "v61.0", header);
//! let user_id = client.find_user_id("jane@acme.com").await?;
//! match client.assign_permission_set(&user_id, "0PS5e000000abcd").await? {
//!     AssignmentOutcome::Created { assignment_id } => println!("created {assignment_id:?}"),
//!     AssignmentOutcome::AlreadyAssigned => println!("nothing to do"),
//! }
//! ```

mod client;
pub mod error;
pub mod types;

pub use client::{
    DEFAULT_API_VERSION, SalesforceClient, escape_soql_literal, normalize_api_version,
    user_lookup_soql,
};
pub use error::{SalesforceError, short_error_message};
pub use types::AssignmentOutcome;
