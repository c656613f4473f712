use std::future::Future;

use permgrant::{
    ActionError, AssignParams, ErrorInfo, ErrorParams, HaltParams, JobAction, JobContext,
};
use serde::Serialize;

/// How an `invoke` run ended.
#[derive(Debug)]
pub(crate) enum RunOutcome {
    Completed(serde_json::Value),
    /// Interrupted and halted; carries the halt output.
    Halted(serde_json::Value),
}

fn to_json(value: &impl Serialize) -> Result<serde_json::Value, ActionError> {
    serde_json::to_value(value)
        .map_err(|e| ActionError::Unrecoverable(format!("Failed to serialize output: {}", e)))
}

/// Run `invoke`, calling `halt` instead if `interrupt` resolves first.
pub(crate) async fn run_invoke<A, I>(
    action: &A,
    params: AssignParams,
    ctx: &JobContext,
    interrupt: I,
) -> Result<RunOutcome, ActionError>
where
    A: JobAction<Params = AssignParams>,
    I: Future<Output = ()>,
{
    let username = params.username.clone();

    tokio::select! {
        result = action.invoke(params, ctx) => {
            let output = result?;
            Ok(RunOutcome::Completed(to_json(&output)?))
        }
        () = interrupt => {
            let halt = HaltParams {
                username: Some(username),
                reason: Some("interrupted".to_string()),
            };
            let output = action.halt(halt, ctx).await;
            Ok(RunOutcome::Halted(to_json(&output)?))
        }
    }
}

pub(crate) async fn run_error<A: JobAction>(
    action: &A,
    message: String,
    username: Option<String>,
    ctx: &JobContext,
) -> Result<serde_json::Value, ActionError> {
    let params = ErrorParams {
        error: ErrorInfo { message },
        username,
    };
    let output = action.error(params, ctx).await?;
    to_json(&output)
}

pub(crate) async fn run_halt<A: JobAction>(
    action: &A,
    params: HaltParams,
    ctx: &JobContext,
) -> Result<serde_json::Value, ActionError> {
    let output = action.halt(params, ctx).await;
    to_json(&output)
}

/// Print a JSON result on stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
