//! Supported GraphQL operations
//!
//! A fixed vocabulary: each operation is recognised by its field name appearing
//! anywhere in the document and answered by hand-built payloads.

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::nodes::{connection, review_node, thread_node};
use crate::state::AppState;
use crate::store::CommentDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReviewThreads,
    Reviews,
    ResolveReviewThread,
    UnresolveReviewThread,
    AddPullRequestReviewThread,
}

/// Execution order when a document carries several operations.
const ALL: [Operation; 5] = [
    Operation::ReviewThreads,
    Operation::Reviews,
    Operation::ResolveReviewThread,
    Operation::UnresolveReviewThread,
    Operation::AddPullRequestReviewThread,
];

/// Request-level failure that aborts the whole document with a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadUserInput(pub String);

/// Partial response produced by one operation.
#[derive(Debug, Default)]
pub struct Outcome {
    pub data: Value,
    pub errors: Vec<Value>,
}

impl Outcome {
    fn data(data: Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    fn not_found(field: &str, message: String) -> Self {
        Self {
            data: json!({ field: null }),
            errors: vec![json!({
                "type": "NOT_FOUND",
                "path": [field],
                "message": message,
                "extensions": { "code": "NOT_FOUND" }
            })],
        }
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestVariables {
    owner: String,
    repo: String,
    #[serde(rename = "prNumber")]
    pr_number: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddThreadInput {
    pull_request_id: String,
    pull_request_review_id: String,
    body: String,
    path: String,
    #[serde(default)]
    line: Option<u64>,
    #[serde(default)]
    start_line: Option<u64>,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    start_side: Option<String>,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ReviewThreads => "reviewThreads",
            Operation::Reviews => "reviews",
            Operation::ResolveReviewThread => "resolveReviewThread",
            Operation::UnresolveReviewThread => "unresolveReviewThread",
            Operation::AddPullRequestReviewThread => "addPullRequestReviewThread",
        }
    }

    /// Operations whose field name occurs in `fields`, in execution order.
    pub fn detect(fields: &HashSet<String>) -> Vec<Operation> {
        ALL.into_iter()
            .filter(|op| fields.contains(op.name()))
            .collect()
    }

    pub async fn execute(
        &self,
        state: &AppState,
        query: &str,
        variables: &Value,
    ) -> Result<Outcome, BadUserInput> {
        debug!("Executing GraphQL operation {}", self.name());
        match self {
            Operation::ReviewThreads | Operation::Reviews => {
                pull_request_field(state, variables, *self).await
            }
            Operation::ResolveReviewThread => set_resolved(state, query, variables, *self, true).await,
            Operation::UnresolveReviewThread => {
                set_resolved(state, query, variables, *self, false).await
            }
            Operation::AddPullRequestReviewThread => add_thread(state, variables).await,
        }
    }
}

fn parse_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `repository { pullRequest { reviewThreads | reviews } }`
async fn pull_request_field(
    state: &AppState,
    variables: &Value,
    op: Operation,
) -> Result<Outcome, BadUserInput> {
    let vars = PullRequestVariables::deserialize(variables)
        .map_err(|e| BadUserInput(format!("Variables owner, repo and prNumber are required: {}", e)))?;
    let number = parse_number(&vars.pr_number)
        .ok_or_else(|| BadUserInput("Variable prNumber must be an integer".to_string()))?;
    debug!("Looking up {}/{}#{}", vars.owner, vars.repo, number);

    let data = state.load_repo_data(&vars.repo).await;
    let data = data.read().await;
    if data.pull(number).is_none() {
        return Ok(Outcome::data(json!({ "repository": null })));
    }

    let nodes = match op {
        Operation::Reviews => data
            .reviews_for(number)
            .into_iter()
            .map(|review| review_node(&data, review))
            .collect(),
        _ => data
            .threads_for(number)
            .into_iter()
            .map(|thread| thread_node(&data, thread))
            .collect(),
    };

    Ok(Outcome::data(json!({
        "repository": {
            "pullRequest": { op.name(): connection(nodes) }
        }
    })))
}

fn thread_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"threadId\s*:\s*"([^"]+)""#).ok())
        .as_ref()
}

/// Thread id from a literal in the query text, else from the variables.
fn thread_id(query: &str, variables: &Value) -> Option<String> {
    let literal = thread_id_pattern()
        .and_then(|pattern| pattern.captures(query))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string());

    literal.or_else(|| {
        variables
            .get("threadId")
            .or_else(|| variables.get("input").and_then(|input| input.get("threadId")))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// The flag is stored when the thread exists and echoed either way.
async fn set_resolved(
    state: &AppState,
    query: &str,
    variables: &Value,
    op: Operation,
    resolved: bool,
) -> Result<Outcome, BadUserInput> {
    let id = thread_id(query, variables)
        .ok_or_else(|| BadUserInput("Argument threadId is required".to_string()))?;

    let stored = state.set_thread_resolved(&id, resolved).await;
    debug!("Thread {} resolved={} (stored: {})", id, resolved, stored);

    Ok(Outcome::data(json!({
        op.name(): { "thread": { "id": id, "isResolved": resolved } }
    })))
}

async fn add_thread(state: &AppState, variables: &Value) -> Result<Outcome, BadUserInput> {
    let field = Operation::AddPullRequestReviewThread.name();
    let input = variables
        .get("input")
        .ok_or_else(|| BadUserInput("Variable input is required".to_string()))?;
    let input = AddThreadInput::deserialize(input)
        .map_err(|e| BadUserInput(format!("Invalid AddPullRequestReviewThreadInput: {}", e)))?;

    let Some((repo, data, number)) = state.find_pull_by_node_id(&input.pull_request_id).await else {
        return Ok(Outcome::not_found(
            field,
            format!(
                "Could not resolve to a node with the global id of '{}'.",
                input.pull_request_id
            ),
        ));
    };

    let mut data = data.write().await;
    let Some(review_id) = data
        .review_by_node_id(&input.pull_request_review_id)
        .map(|review| review.id)
    else {
        return Ok(Outcome::not_found(
            field,
            format!(
                "Could not resolve to a node with the global id of '{}'.",
                input.pull_request_review_id
            ),
        ));
    };

    let draft = CommentDraft {
        body: input.body,
        path: input.path,
        line: input.line,
        start_line: input.start_line,
        side: input.side,
        start_side: input.start_side,
        ..CommentDraft::default()
    };

    let thread = data
        .add_thread_comment(number, Some(review_id), draft, &state.user(), &state.links(&repo))
        .and_then(|thread_id| data.thread(&thread_id).map(|thread| thread_node(&data, thread)));

    match thread {
        Some(thread) => {
            info!("Added review thread comment on {}#{}", repo, number);
            Ok(Outcome::data(json!({ field: { "thread": thread } })))
        }
        None => Ok(Outcome::not_found(
            field,
            format!("Could not add a comment to pull request #{}.", number),
        )),
    }
}

/// Merge `source` into `target`, recursing through objects; other values are replaced.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (target, source) => *target = source,
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}
