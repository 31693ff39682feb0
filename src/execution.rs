// Reference execution engine for declared build graphs
// Runs tasks level by level, independent tasks of a level concurrently, and
// propagates failures to dependents and to aggregate tasks

use crate::error::{ExecutionError, Result};
use crate::graph::{BuildGraph, InMemoryBuildGraph, Task, TaskKind};
use crate::logging::utils::{log_task_completion, task_execution_span};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Performs the action of a single task on behalf of the host build
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// `Ok(true)` on success, `Ok(false)` when the task ran and failed
    async fn run(&self, task: &Task) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_parallel_tasks: usize,
    pub fail_fast: bool,
    pub task_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 4,
            fail_fast: false,
            task_timeout: None,
        }
    }
}

impl ExecutorConfig {
    pub fn with_max_parallel_tasks(mut self, max_parallel_tasks: usize) -> Self {
        self.max_parallel_tasks = max_parallel_tasks.max(1);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed { reason: String },
    Skipped { reason: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }
}

#[derive(Debug, Clone)]
pub struct TaskExecutionResult {
    pub task: String,
    pub kind: TaskKind,
    pub level: usize,
    pub outcome: TaskOutcome,
    pub duration: Duration,
}

/// Aggregated result of one graph execution
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub success: bool,
    pub tasks_passed: Vec<TaskExecutionResult>,
    pub tasks_failed: Vec<TaskExecutionResult>,
    pub tasks_skipped: Vec<TaskExecutionResult>,
    pub total_duration: Duration,
}

impl ExecutionResult {
    fn new() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    fn add_result(&mut self, result: TaskExecutionResult) {
        match result.outcome {
            TaskOutcome::Succeeded => self.tasks_passed.push(result),
            TaskOutcome::Failed { .. } => {
                self.success = false;
                self.tasks_failed.push(result);
            }
            TaskOutcome::Skipped { .. } => self.tasks_skipped.push(result),
        }
    }

    pub fn outcome(&self, task: &str) -> Option<&TaskOutcome> {
        self.tasks_passed
            .iter()
            .chain(&self.tasks_failed)
            .chain(&self.tasks_skipped)
            .find(|r| r.task == task)
            .map(|r| &r.outcome)
    }

    pub fn executed_count(&self) -> usize {
        self.tasks_passed.len() + self.tasks_failed.len()
    }
}

pub struct GraphExecutor {
    config: ExecutorConfig,
}

impl Default for GraphExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl GraphExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub async fn execute<R>(&self, graph: &InMemoryBuildGraph, runner: &R) -> Result<ExecutionResult>
    where
        R: TaskRunner + ?Sized,
    {
        let started = Instant::now();
        let levels = graph.execution_levels().map_err(|e| ExecutionError::Unschedulable {
            message: e.to_string(),
            problematic_tasks: graph.tasks().map(|t| t.name.clone()).collect(),
        })?;
        tracing::debug!("Executing {} task levels", levels.len());

        let mut result = ExecutionResult::new();
        let mut succeeded: HashSet<String> = HashSet::new();
        let mut halted = false;

        for (level_no, level) in levels.iter().enumerate() {
            let mut runnable = Vec::new();
            let mut settled = Vec::new();

            for name in level {
                let task = graph
                    .task(name)
                    .cloned()
                    .ok_or_else(|| ExecutionError::Unschedulable {
                        message: format!("task '{name}' vanished from the graph"),
                        problematic_tasks: vec![name.clone()],
                    })?;

                if halted {
                    settled.push(settled_result(
                        &task,
                        level_no,
                        TaskOutcome::Skipped {
                            reason: "execution stopped after an earlier failure".to_string(),
                        },
                    ));
                    continue;
                }

                let blocked: Vec<String> = graph
                    .prerequisites(name)?
                    .into_iter()
                    .filter(|p| !succeeded.contains(p))
                    .collect();

                let outcome = match (task.kind, blocked.is_empty()) {
                    (TaskKind::Aggregate, true) => Some(TaskOutcome::Succeeded),
                    (TaskKind::Aggregate, false) => Some(TaskOutcome::Failed {
                        reason: format!("prerequisites did not succeed: {}", blocked.join(", ")),
                    }),
                    (_, false) => Some(TaskOutcome::Skipped {
                        reason: format!("upstream tasks did not succeed: {}", blocked.join(", ")),
                    }),
                    (_, true) => None,
                };

                match outcome {
                    Some(outcome) => settled.push(settled_result(&task, level_no, outcome)),
                    None => runnable.push(task),
                }
            }

            let ran: Vec<TaskExecutionResult> = stream::iter(runnable)
                .map(|task| self.run_task(runner, task, level_no))
                .buffer_unordered(self.config.max_parallel_tasks.max(1))
                .collect()
                .await;

            let mut level_results: Vec<TaskExecutionResult> = settled.into_iter().chain(ran).collect();
            level_results.sort_by(|a, b| a.task.cmp(&b.task));

            for task_result in level_results {
                match task_result.outcome {
                    TaskOutcome::Succeeded => {
                        succeeded.insert(task_result.task.clone());
                    }
                    TaskOutcome::Failed { ref reason } => {
                        tracing::warn!(task = %task_result.task, reason = %reason, "Task failed");
                        if self.config.fail_fast {
                            halted = true;
                        }
                    }
                    TaskOutcome::Skipped { .. } => {}
                }
                result.add_result(task_result);
            }
        }

        result.total_duration = started.elapsed();
        Ok(result)
    }

    async fn run_task<R>(&self, runner: &R, task: Task, level: usize) -> TaskExecutionResult
    where
        R: TaskRunner + ?Sized,
    {
        let span = task_execution_span(&task.name, level);
        async {
            let start = Instant::now();
            let run = runner.run(&task);
            let outcome = match self.config.task_timeout {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ExecutionError::RunnerFailed {
                        task: task.name.clone(),
                        message: format!("timed out after {limit:?}"),
                    }
                    .into()),
                },
                None => run.await,
            };

            let outcome = match outcome {
                Ok(true) => TaskOutcome::Succeeded,
                Ok(false) => TaskOutcome::Failed {
                    reason: "task reported failure".to_string(),
                },
                Err(e) => TaskOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            let duration = start.elapsed();
            log_task_completion(&task.name, outcome.is_success(), duration);

            TaskExecutionResult {
                task: task.name,
                kind: task.kind,
                level,
                outcome,
                duration,
            }
        }
        .instrument(span)
        .await
    }
}

fn settled_result(task: &Task, level: usize, outcome: TaskOutcome) -> TaskExecutionResult {
    TaskExecutionResult {
        task: task.name.clone(),
        kind: task.kind,
        level,
        outcome,
        duration: Duration::ZERO,
    }
}

/// Runner that performs no work: every task succeeds unless marked as failing.
/// Records the order in which tasks were started.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    // None: the task fails, Some: the runner itself errors with the message
    failing: HashMap<String, Option<String>>,
    started: Mutex<Vec<String>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, task: impl Into<String>) -> Self {
        self.failing.insert(task.into(), None);
        self
    }

    /// Make the runner return an error for `task` instead of a plain failure
    pub fn erroring(mut self, task: impl Into<String>, message: impl Into<String>) -> Self {
        self.failing.insert(task.into(), Some(message.into()));
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }
}

#[async_trait]
impl TaskRunner for DryRunRunner {
    async fn run(&self, task: &Task) -> Result<bool> {
        self.started.lock().push(task.name.clone());
        match self.failing.get(&task.name) {
            None => Ok(true),
            Some(None) => Ok(false),
            Some(Some(message)) => Err(ExecutionError::RunnerFailed {
                task: task.name.clone(),
                message: message.clone(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Project, ProjectLayout};

    #[tokio::test]
    async fn test_all_tasks_succeed() {
        let mut project = Project::new(ProjectLayout::new("simple")).unwrap();
        project.add_language_version(11).unwrap();

        let runner = DryRunRunner::new();
        let result = GraphExecutor::default()
            .execute(project.graph(), &runner)
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.tasks_failed.is_empty());
        assert_eq!(result.outcome("check"), Some(&TaskOutcome::Succeeded));
        // aggregate tasks have no action of their own
        assert!(!runner.started().contains(&"check".to_string()));
    }

    #[tokio::test]
    async fn test_runner_error_becomes_failure() {
        let mut project = Project::new(ProjectLayout::new("simple")).unwrap();
        project.add_language_version(17).unwrap();

        let runner = DryRunRunner::new().erroring("compileJava17Java", "release 17 not supported");
        let result = GraphExecutor::default()
            .execute(project.graph(), &runner)
            .await
            .unwrap();

        assert!(!result.success);
        match result.outcome("compileJava17Java") {
            Some(TaskOutcome::Failed { reason }) => assert!(reason.contains("release 17 not supported")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(result.outcome("jar"), Some(TaskOutcome::Skipped { .. })));
    }
}
