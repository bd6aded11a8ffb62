//! Units of work and their structured outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::AgentId;

/// One routed unit of work: an agent identity, the input text to hand it,
/// an optional batch priority, and an optional structured context payload.
///
/// Subtasks are ephemeral. The orchestrator creates them per prompt, the
/// registry consumes them, and they are discarded after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Identity of the agent this subtask targets.
    pub agent: AgentId,
    /// Input text for the agent. Routing passes the whole prompt, not just
    /// the matched fragment.
    pub input: String,
    /// Batch priority. Higher runs first when subtasks are executed as a
    /// batch; equal priorities keep their relative order.
    pub priority: i32,
    /// Optional structured payload forwarded to the agent and its
    /// post-execution hook.
    pub context: Option<Value>,
}

impl Subtask {
    /// Create a subtask with default priority (0) and no context.
    pub fn new(agent: AgentId, input: impl Into<String>) -> Self {
        Self {
            agent,
            input: input.into(),
            priority: 0,
            context: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Structured outcome of a single agent execution.
///
/// Every execution path returns an `AgentResult`; failures are represented
/// as results with `success == false`, never as errors crossing the
/// registry boundary. The well-formedness invariant (`success` implies no
/// attached error, failure implies one) is enforced by construction: the
/// fields are private and only [`AgentResult::ok`] and
/// [`AgentResult::failure`] can build a value. Deserialization validates
/// the same invariant, so a persisted document cannot smuggle in an
/// ill-formed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAgentResult")]
pub struct AgentResult {
    success: bool,
    output: String,
    error: Option<String>,
}

/// Unvalidated wire shape of an [`AgentResult`].
#[derive(Deserialize)]
struct RawAgentResult {
    success: bool,
    output: String,
    error: Option<String>,
}

/// A deserialized agent result violated the well-formedness invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed agent result: {0}")]
pub struct MalformedAgentResult(&'static str);

impl TryFrom<RawAgentResult> for AgentResult {
    type Error = MalformedAgentResult;

    fn try_from(raw: RawAgentResult) -> Result<Self, Self::Error> {
        match (raw.success, &raw.error) {
            (true, Some(_)) => Err(MalformedAgentResult(
                "success result carries an error",
            )),
            (false, None) => Err(MalformedAgentResult(
                "failure result lacks an error",
            )),
            _ => Ok(AgentResult {
                success: raw.success,
                output: raw.output,
                error: raw.error,
            }),
        }
    }
}

impl AgentResult {
    /// A successful result carrying the agent's own output text.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// A failure result. `output` is the caller-facing text, `error` the
    /// underlying detail.
    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
