//! Dependency-ordered execution of the registered stages for one tile.

use crate::plugins::base::PluginContext;
use crate::plugins::registry::PluginRegistry;
use crate::prelude::Arc;
use crate::{MapError, Result};
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinSet;

/// Where a stage is within one tile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginStatus {
    /// Not started yet.
    Todo,
    /// Started, not finished.
    Doing,
    /// Finished successfully; its outputs are published.
    Done,
    /// Failed itself, or never started because a dependency failed.
    Failed,
}

/// Outcome of running every stage for one tile.
#[derive(Debug, Clone)]
pub struct PluginRun {
    names: Vec<String>,
    statuses: Vec<PluginStatus>,
    started: Vec<String>,
    errors: Vec<(String, Arc<MapError>)>,
}

impl PluginRun {
    fn new(names: Vec<String>) -> Self {
        let statuses = vec![PluginStatus::Todo; names.len()];
        Self {
            names,
            statuses,
            started: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn status(&self, name: &str) -> Option<PluginStatus> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.statuses[i])
    }

    pub fn statuses(&self) -> impl Iterator<Item = (&str, PluginStatus)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.statuses.iter().copied())
    }

    /// Names of the stages that were launched, in launch order.
    pub fn started(&self) -> &[String] {
        &self.started
    }

    /// Errors of the stages that ran and failed, in completion order.
    pub fn errors(&self) -> &[(String, Arc<MapError>)] {
        &self.errors
    }

    /// Every stage is `Done`.
    pub fn is_success(&self) -> bool {
        self.statuses.iter().all(|s| *s == PluginStatus::Done)
    }

    pub fn first_error(&self) -> Option<Arc<MapError>> {
        self.errors.first().map(|(_, e)| e.clone())
    }
}

/// Runs the stages of a [`PluginRegistry`] against one tile.
///
/// A stage is launched as soon as all of its dependencies are `Done`; stages
/// that become eligible together run concurrently. Each completion triggers
/// the next launch pass. When a stage fails, everything that depends on it,
/// directly or transitively, is marked `Failed` without being started, while
/// unrelated stages keep going.
#[derive(Debug, Clone)]
pub struct PluginScheduler {
    registry: Arc<PluginRegistry>,
}

impl PluginScheduler {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Drives every stage to `Done` or `Failed`.
    ///
    /// Stage failures are reported in the returned [`PluginRun`]. The only
    /// error is [`MapError::Cancelled`], returned once the context's token
    /// fires; running stages are aborted.
    pub async fn run(&self, ctx: &PluginContext) -> Result<PluginRun> {
        let registry = &self.registry;
        let names = registry.names().into_iter().map(String::from).collect();
        let mut run = PluginRun::new(names);
        let mut waiting_on: Vec<usize> = (0..registry.len())
            .map(|i| registry.dependencies_of(i).len())
            .collect();
        let mut tasks: JoinSet<(usize, Result<()>)> = JoinSet::new();

        self.launch_ready(&mut run, &waiting_on, &mut tasks, ctx);

        while !tasks.is_empty() {
            let next = tokio::select! {
                biased;
                _ = ctx.cancel_token().cancelled() => None,
                joined = tasks.join_next() => Some(joined),
            };
            let Some(joined) = next else {
                tasks.abort_all();
                log::debug!("plugin run for tile {} cancelled", ctx.coord());
                return Err(MapError::Cancelled);
            };
            let Some(joined) = joined else { break };
            let (index, result) = joined.map_err(|e| {
                MapError::Plugin(format!("plugin task for tile {} was lost: {}", ctx.coord(), e))
            })?;

            match result {
                Ok(()) => {
                    run.statuses[index] = PluginStatus::Done;
                    log::debug!("plugin '{}' done for tile {}", run.names[index], ctx.coord());
                    for &dependent in registry.dependents_of(index) {
                        waiting_on[dependent] -= 1;
                    }
                }
                Err(error) => {
                    log::warn!(
                        "plugin '{}' failed for tile {}: {}",
                        run.names[index],
                        ctx.coord(),
                        error
                    );
                    run.statuses[index] = PluginStatus::Failed;
                    run.errors.push((run.names[index].clone(), Arc::new(error)));
                    self.fail_dependents(&mut run, index);
                }
            }

            self.launch_ready(&mut run, &waiting_on, &mut tasks, ctx);
        }

        Ok(run)
    }

    fn launch_ready(
        &self,
        run: &mut PluginRun,
        waiting_on: &[usize],
        tasks: &mut JoinSet<(usize, Result<()>)>,
        ctx: &PluginContext,
    ) {
        for index in 0..run.statuses.len() {
            if run.statuses[index] != PluginStatus::Todo || waiting_on[index] != 0 {
                continue;
            }
            run.statuses[index] = PluginStatus::Doing;
            run.started.push(run.names[index].clone());

            let plugin = self.registry.plugin(index).clone();
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let result = AssertUnwindSafe(plugin.create(&ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(MapError::Plugin(format!(
                            "plugin '{}' panicked: {}",
                            plugin.name(),
                            panic_message(panic.as_ref())
                        )))
                    });
                (index, result)
            });
        }
    }

    /// Marks every not-yet-started transitive dependent of `failed` as failed.
    fn fail_dependents(&self, run: &mut PluginRun, failed: usize) {
        let mut queue: VecDeque<usize> = self.registry.dependents_of(failed).iter().copied().collect();
        while let Some(index) = queue.pop_front() {
            if run.statuses[index] != PluginStatus::Todo {
                continue;
            }
            run.statuses[index] = PluginStatus::Failed;
            log::debug!(
                "skipping plugin '{}': dependency '{}' failed",
                run.names[index],
                run.names[failed]
            );
            queue.extend(self.registry.dependents_of(index).iter().copied());
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
