use super::graph::{ENTRY, Route, StageId, max_visits, route, validate_graph};
use super::stage::Stage;
use super::state::WorkflowState;
use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::observability::{NoopObserver, Observer, WorkflowEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use strum::IntoEnumIterator;
use tracing::debug;

/// Drives a run from the entry stage to END, one stage at a time.
pub struct Workflow {
    stages: BTreeMap<StageId, Box<dyn Stage>>,
    options: WorkflowConfig,
    observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .field("observer", &self.observer.name())
            .finish()
    }
}

pub struct WorkflowBuilder {
    stages: Vec<Box<dyn Stage>>,
    options: WorkflowConfig,
    observer: Arc<dyn Observer>,
}

impl WorkflowBuilder {
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Fails unless every stage of the graph has exactly one implementation
    /// and the graph itself is well formed.
    pub fn build(self) -> Result<Workflow, WorkflowError> {
        validate_graph(&self.options)?;

        let mut stages = BTreeMap::new();
        for stage in self.stages {
            let id = stage.id();
            if stages.insert(id, stage).is_some() {
                return Err(WorkflowError::DuplicateStage(id));
            }
        }
        if let Some(missing) = StageId::iter().find(|id| !stages.contains_key(id)) {
            return Err(WorkflowError::MissingStage(missing));
        }

        Ok(Workflow {
            stages,
            options: self.options,
            observer: self.observer,
        })
    }
}

impl Workflow {
    pub fn builder(options: WorkflowConfig) -> WorkflowBuilder {
        WorkflowBuilder {
            stages: Vec::new(),
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn options(&self) -> &WorkflowConfig {
        &self.options
    }

    /// Run to completion. Stage errors abort the run; everything else
    /// (command failures, policy vetoes, degraded collaborators) is carried
    /// in the returned state.
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        self.observer.record_event(&WorkflowEvent::RunStarted {
            incident_id: state.incident.id.clone(),
            service: state.incident.service.clone(),
            approved: state.is_approved(),
        });

        let limit = max_visits(&self.options);
        let mut current = ENTRY;
        let mut visits = 0_usize;

        loop {
            visits += 1;
            if visits > limit {
                return Err(WorkflowError::StepLimitExceeded { limit }.into());
            }

            let stage = self
                .stages
                .get(&current)
                .ok_or(WorkflowError::MissingStage(current))?;

            self.observer.record_event(&WorkflowEvent::StageStarted {
                stage: current,
                round: state.round,
            });
            let started = Instant::now();

            let update = stage.run(&state).await.map_err(|e| WorkflowError::Stage {
                stage: current,
                source: Box::new(e),
            })?;

            let messages_added = update.messages.len();
            let vetoed = update
                .policy_violations
                .as_ref()
                .map_or(0, Vec::len);
            state.apply(update);

            self.observer.record_event(&WorkflowEvent::StageCompleted {
                stage: current,
                duration: started.elapsed(),
                messages_added,
            });
            if vetoed > 0 {
                self.observer
                    .record_event(&WorkflowEvent::PolicyVetoed { violations: vetoed });
            }

            match route(current, &state, &self.options) {
                Route::End => break,
                Route::Stage(next) => {
                    debug!(from = %current, to = %next, "route");
                    current = next;
                }
            }
        }

        self.observer.record_event(&WorkflowEvent::RunFinished {
            incident_id: state.incident.id.clone(),
            done: state.done,
            actions: state.actions.len(),
        });
        self.observer.flush();
        Ok(state)
    }
}
