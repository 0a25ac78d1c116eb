//! Lint task discovery
//!
//! Produces one `lll` task per workspace folder, linting the whole folder
//! while skipping `node_modules`. Independent of the language server.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_CHECKER;

/// Task type and source label
pub const TASK_TYPE: &str = "lll";

/// Problem matcher the editor applies to task output
pub const PROBLEM_MATCHER: &str = "$lll";

const TASK_ARGS: [&str; 3] = [".", "--skiplist", "node_modules"];

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Invalid task configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Task type {0:?} is not handled here, expected \"lll\"")]
    UnsupportedType(String),
}

/// Identifies a task as an `lll` task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(rename = "type")]
    pub task_type: String,
}

impl Default for TaskDefinition {
    fn default() -> Self {
        Self {
            task_type: TASK_TYPE.to_string(),
        }
    }
}

/// One entry of an editor's task configuration, e.g.
/// `{ "type": "lll", "label": "lint api" }`. Other keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfiguredTask {
    #[serde(flatten)]
    pub definition: TaskDefinition,
    #[serde(default)]
    pub label: Option<String>,
}

impl ConfiguredTask {
    pub fn from_json(json: &str) -> Result<Self, TaskError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    /// Names the folder after its last path component
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// Command line run by a task, without a shell in between
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellExecution {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl ShellExecution {
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.args(&self.args).current_dir(&self.cwd);
        command
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintTask {
    pub definition: TaskDefinition,
    pub scope: WorkspaceFolder,
    pub name: String,
    pub source: String,
    pub execution: ShellExecution,
    pub problem_matchers: Vec<String>,
}

fn create_execution(folder: &Path) -> ShellExecution {
    ShellExecution {
        command: DEFAULT_CHECKER.to_string(),
        args: TASK_ARGS.iter().map(|arg| arg.to_string()).collect(),
        cwd: folder.to_path_buf(),
    }
}

fn create_task(definition: TaskDefinition, scope: WorkspaceFolder, name: String) -> LintTask {
    LintTask {
        definition,
        execution: create_execution(&scope.path),
        scope,
        name,
        source: TASK_TYPE.to_string(),
        problem_matchers: vec![PROBLEM_MATCHER.to_string()],
    }
}

/// Returns one lint task per workspace folder, in folder order.
pub fn provide_tasks(folders: &[WorkspaceFolder]) -> Vec<LintTask> {
    folders
        .iter()
        .map(|folder| {
            let name = format!("lint {}", folder.name);
            create_task(TaskDefinition::default(), folder.clone(), name)
        })
        .collect()
}

/// Turns a task from the editor's task configuration into a runnable task
/// for `scope`. The configured label, if any, becomes the task name.
pub fn resolve_task(task: ConfiguredTask, scope: WorkspaceFolder) -> Result<LintTask, TaskError> {
    if task.definition.task_type != TASK_TYPE {
        return Err(TaskError::UnsupportedType(task.definition.task_type));
    }

    let name = task
        .label
        .unwrap_or_else(|| format!("lint {}", scope.name));
    Ok(create_task(task.definition, scope, name))
}
