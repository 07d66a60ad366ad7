//! Scripted wizard sessions.
//!
//! A script is a JSON array of steps replayed in order against an `App`:
//!
//! ```json
//! [
//!   { "step": "apply", "scope": "race:Half-Orc", "meta": { "tab": "species" },
//!     "changes": [{ "field": "skills", "value": { "type": "strings", "value": ["Intimidation"] } }] },
//!   { "step": "detect" },
//!   { "step": "autoResolve" },
//!   { "step": "export" }
//! ]
//! ```
//!
//! Query steps (`detect`, `options`, `autoResolve`, `resolve`, `revert`,
//! `export`) produce one output each. Cleanup services react asynchronously;
//! a `wait` step gives them time to settle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use charforge_domain::{
    compile_effects, Choice, ChoiceChanges, ConflictKind, DomainError, FeatureEffect, ScopeId,
    ScopeMeta,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::App;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("step {index} failed: {source}")]
    Step {
        index: usize,
        #[source]
        source: DomainError,
    },
}

/// One contribution as written in a script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScriptChoice {
    pub scope: ScopeId,
    pub meta: ScopeMeta,
    #[serde(default)]
    pub changes: ChoiceChanges,
}

impl From<ScriptChoice> for Choice {
    fn from(choice: ScriptChoice) -> Self {
        Choice::with_changes(choice.scope, choice.meta, choice.changes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum ScriptStep {
    Apply(ScriptChoice),
    ApplyBatch {
        choices: Vec<ScriptChoice>,
    },
    /// Compile a feature's effects plus the user's picks into one contribution.
    Feature {
        scope: ScopeId,
        meta: ScopeMeta,
        effects: Vec<FeatureEffect>,
        #[serde(default)]
        picks: Vec<String>,
    },
    Revert {
        scope: ScopeId,
    },
    Detect,
    Options,
    AutoResolve,
    Resolve {
        kind: ConflictKind,
        #[serde(default)]
        value: Option<String>,
        scope: ScopeId,
    },
    Wait {
        ms: u64,
    },
    Export,
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

pub async fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptStep>, ScriptError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_script(&json)
}

/// Run every step against the app, collecting the outputs of query steps.
pub async fn replay(app: &App, steps: Vec<ScriptStep>) -> Result<Vec<Value>, ScriptError> {
    let mut outputs = Vec::new();

    for (index, step) in steps.into_iter().enumerate() {
        tracing::debug!(index, ?step, "Replaying step");
        match step {
            ScriptStep::Apply(choice) => app.store.apply_choice(choice.into()),
            ScriptStep::ApplyBatch { choices } => {
                app.store
                    .apply_batch(choices.into_iter().map(Choice::from).collect());
            }
            ScriptStep::Feature {
                scope,
                meta,
                effects,
                picks,
            } => {
                let choice = compile_effects(scope, meta, &effects, &picks)
                    .map_err(|source| ScriptError::Step { index, source })?;
                app.store.apply_choice(choice);
            }
            ScriptStep::Revert { scope } => {
                let safe = app.store.can_safely_revert_scope(&scope);
                let reverted = app.store.smart_revert_scope(&scope);
                outputs.push(json!({
                    "step": "revert",
                    "scope": scope,
                    "reverted": reverted,
                    "userSelectable": safe,
                }));
            }
            ScriptStep::Detect => {
                let report = app.use_cases.conflicts.detect();
                outputs.push(json!({ "step": "detect", "report": report }));
            }
            ScriptStep::Options => {
                let report = app.use_cases.conflicts.detect();
                let options: Vec<_> = report
                    .conflicts
                    .iter()
                    .map(|c| app.use_cases.conflicts.options(c))
                    .collect();
                outputs.push(json!({ "step": "options", "options": options }));
            }
            ScriptStep::AutoResolve => {
                let outcome = app.use_cases.conflicts.auto_resolve();
                let manual = app.use_cases.conflicts.has_manual_conflicts();
                outputs.push(json!({
                    "step": "autoResolve",
                    "outcome": outcome,
                    "hasManualConflicts": manual,
                }));
            }
            ScriptStep::Resolve { kind, value, scope } => {
                let report = app.use_cases.conflicts.detect();
                let conflict = report
                    .conflicts
                    .iter()
                    .find(|c| c.kind() == kind && c.value() == value.as_deref());
                let resolved = match conflict {
                    Some(conflict) => app.use_cases.conflicts.resolve_by_reverting(conflict, &scope),
                    None => {
                        tracing::warn!(%kind, ?value, "No such conflict to resolve");
                        false
                    }
                };
                outputs.push(json!({
                    "step": "resolve",
                    "kind": kind,
                    "value": value,
                    "scope": scope,
                    "resolved": resolved,
                }));
            }
            ScriptStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            ScriptStep::Export => {
                let record = app.store.export_json()?;
                outputs.push(json!({ "step": "export", "record": record }));
            }
        }
    }

    Ok(outputs)
}
