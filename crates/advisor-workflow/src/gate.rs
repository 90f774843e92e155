//! Approval gate: the suspend/resume state machine.

use advisor_core::error::WorkflowError;
use advisor_core::traits::{validate_thread_id, CheckpointStore, PortfolioLedger};
use advisor_core::types::{
    ApprovalCheckpoint, ApprovalPayload, CancellationRecord, Decision, DecisionRecord,
    ExecutionResult, ProposalModifications, ProposalStatus, ResumeCommand, ThreadState,
    TradeProposal, TradeRequest, WorkflowEvent, WorkflowOutcome, WorkflowStage,
};
use advisor_ledger::Executor;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::builder::ProposalBuilder;
use crate::simulator::{PortfolioSimulator, Simulation};

/// Result of resuming a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum ResumeOutcome {
    /// An edit was re-simulated; the thread waits on a new checkpoint
    Suspended(ApprovalPayload),
    Executed(ExecutionResult),
    Cancelled(CancellationRecord),
    /// The thread had already finished; nothing was done
    Duplicate(WorkflowOutcome),
}

/// Per-thread approval workflow over a durable checkpoint store.
///
/// Each thread is anchored to the portfolio as it was when the thread
/// started. Every simulation of the thread, including re-simulation after an
/// edit, runs against that original portfolio. Execution runs against the live
/// ledger portfolio instead.
pub struct ApprovalGate {
    store: Arc<dyn CheckpointStore>,
    builder: ProposalBuilder,
    simulator: PortfolioSimulator,
    executor: Executor,
    locks: ThreadLocks,
}

type ThreadLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Exclusive hold on one thread. On drop the thread's lock entry is removed
/// unless another caller is already waiting on it, so the map only holds
/// threads with work in flight.
struct ThreadGuard<'a> {
    locks: &'a ThreadLocks,
    thread_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for ThreadGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference from the map, one from this guard.
        if locks
            .get(&self.thread_id)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2)
        {
            locks.remove(&self.thread_id);
        }
    }
}

impl ApprovalGate {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        builder: ProposalBuilder,
        simulator: PortfolioSimulator,
        executor: Executor,
    ) -> Self {
        Self {
            store,
            builder,
            simulator,
            executor,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The ledger trades are committed to.
    pub fn ledger(&self) -> &Arc<dyn PortfolioLedger> {
        self.executor.ledger()
    }

    /// Start a thread: build, simulate and suspend a proposal.
    ///
    /// Nothing is persisted when building or simulating fails.
    pub async fn start(
        &self,
        thread_id: &str,
        portfolio_id: &str,
        request: &TradeRequest,
    ) -> Result<ApprovalPayload, WorkflowError> {
        validate_thread_id(thread_id)?;
        let _guard = self.lock_thread(thread_id).await;

        if self.store.load(thread_id).await?.is_some() {
            return Err(WorkflowError::ThreadExists(thread_id.to_string()));
        }

        let portfolio = self.ledger().portfolio(portfolio_id).await?;
        let mut state = ThreadState::new(thread_id, portfolio);

        let proposal = self.builder.build(request).await?;
        state.advance(WorkflowEvent::ProposalBuilt)?;

        let simulation = self
            .simulator
            .simulate(&state.original_portfolio, &proposal)
            .await?;
        let payload = self.suspend(&mut state, proposal, simulation).await?;

        info!(
            thread_id,
            portfolio_id,
            ticker = %payload.proposal.ticker,
            side = %payload.proposal.side,
            total = %payload.proposal.total_amount,
            "Awaiting approval"
        );
        Ok(payload)
    }

    /// Resume a suspended thread with a reviewer decision.
    ///
    /// Resuming a finished thread returns its outcome as
    /// [`ResumeOutcome::Duplicate`] without side effects. A thread found in
    /// `Executing` was interrupted after approval; its execution is re-run,
    /// which the executor makes idempotent.
    pub async fn resume(
        &self,
        thread_id: &str,
        command: ResumeCommand,
    ) -> Result<ResumeOutcome, WorkflowError> {
        validate_thread_id(thread_id)?;
        let _guard = self.lock_thread(thread_id).await;

        let state = self
            .store
            .load(thread_id)
            .await?
            .ok_or_else(|| WorkflowError::ThreadNotFound(thread_id.to_string()))?;

        if let Some(outcome) = &state.outcome {
            info!(thread_id, stage = %state.stage, "Thread already finished, ignoring resume");
            return Ok(ResumeOutcome::Duplicate(outcome.clone()));
        }

        if state.stage == WorkflowStage::Executing {
            warn!(thread_id, "Recovering interrupted execution");
            return self.execute(state).await;
        }

        let event = command.event();
        let checkpoint = match (&state.checkpoint, state.stage) {
            (Some(checkpoint), WorkflowStage::AwaitingApproval) => checkpoint.clone(),
            _ => {
                return Err(WorkflowError::InvalidTransition {
                    from: state.stage,
                    event,
                })
            }
        };

        match event {
            WorkflowEvent::Approve => self.approve(state, &checkpoint, command).await,
            WorkflowEvent::Edit => self.edit(state, &checkpoint, command).await,
            WorkflowEvent::Reject => self.reject(state, &checkpoint, command).await,
            other => Err(WorkflowError::InvalidTransition {
                from: state.stage,
                event: other,
            }),
        }
    }

    /// Get the stored state of a thread.
    pub async fn status(&self, thread_id: &str) -> Result<ThreadState, WorkflowError> {
        self.store
            .load(thread_id)
            .await?
            .ok_or_else(|| WorkflowError::ThreadNotFound(thread_id.to_string()))
    }

    /// Ids of all stored threads.
    pub async fn threads(&self) -> Result<Vec<String>, WorkflowError> {
        Ok(self.store.list().await?)
    }

    /// Drop all state for a thread.
    pub async fn discard(&self, thread_id: &str) -> Result<(), WorkflowError> {
        let _guard = self.lock_thread(thread_id).await;
        self.store.clear(thread_id).await?;
        Ok(())
    }

    async fn lock_thread(&self, thread_id: &str) -> ThreadGuard<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(thread_id.to_string())
            .or_default()
            .clone();

        ThreadGuard {
            locks: &self.locks,
            thread_id: thread_id.to_string(),
            _guard: lock.lock_owned().await,
        }
    }

    async fn suspend(
        &self,
        state: &mut ThreadState,
        proposal: TradeProposal,
        simulation: Simulation,
    ) -> Result<ApprovalPayload, WorkflowError> {
        let checkpoint = ApprovalCheckpoint {
            thread_id: state.thread_id.clone(),
            revision: state.revision,
            proposal,
            portfolio_before: simulation.before.view(),
            portfolio_after: simulation.after.view(),
            risk_before: simulation.risk_before,
            risk_after: simulation.risk_after,
            modifiable_fields: ProposalModifications::FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            created_at: Utc::now(),
        };
        let payload = checkpoint.payload();

        state.checkpoint = Some(checkpoint);
        state.advance(WorkflowEvent::Suspended)?;
        self.store.save(&state.thread_id, state).await?;
        Ok(payload)
    }

    async fn approve(
        &self,
        mut state: ThreadState,
        checkpoint: &ApprovalCheckpoint,
        command: ResumeCommand,
    ) -> Result<ResumeOutcome, WorkflowError> {
        state.advance(WorkflowEvent::Approve)?;
        state.history.push(decision_record(checkpoint, Decision::Approved, command.notes));
        state.approved = Some(checkpoint.proposal.with_status(ProposalStatus::Approved));

        // Consume the checkpoint before touching the ledger.
        self.store.save(&state.thread_id, &state).await?;
        info!(thread_id = %state.thread_id, proposal_id = %checkpoint.proposal.id, "Proposal approved");

        self.execute(state).await
    }

    async fn execute(&self, mut state: ThreadState) -> Result<ResumeOutcome, WorkflowError> {
        let approved = state.approved.clone().ok_or(WorkflowError::InvalidTransition {
            from: state.stage,
            event: WorkflowEvent::Committed,
        })?;

        let sector = state
            .checkpoint
            .as_ref()
            .and_then(|c| {
                c.portfolio_after
                    .positions
                    .iter()
                    .find(|p| p.ticker == approved.ticker)
            })
            .and_then(|p| p.sector.clone());

        match self
            .executor
            .execute(&state.portfolio_id, &approved, sector)
            .await
        {
            Ok(result) => {
                state.advance(WorkflowEvent::Committed)?;
                state.approved = Some(approved.with_status(ProposalStatus::Executed));
                state.checkpoint = None;
                state.outcome = Some(WorkflowOutcome::Executed(result.clone()));
                self.store.save(&state.thread_id, &state).await?;

                info!(
                    thread_id = %state.thread_id,
                    order_id = %result.order_id,
                    total = %result.total,
                    "Thread executed"
                );
                Ok(ResumeOutcome::Executed(result))
            }
            Err(e) => {
                warn!(
                    thread_id = %state.thread_id,
                    error = %e,
                    "Execution failed, returning thread to approval"
                );
                state.approved = None;
                state.advance(WorkflowEvent::ExecutionFailed)?;
                self.store.save(&state.thread_id, &state).await?;
                Err(e.into())
            }
        }
    }

    async fn edit(
        &self,
        mut state: ThreadState,
        checkpoint: &ApprovalCheckpoint,
        command: ResumeCommand,
    ) -> Result<ResumeOutcome, WorkflowError> {
        let modifications = command
            .modifications
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                WorkflowError::InvalidModification(
                    "edit requires at least one of quantity, price, side".to_string(),
                )
            })?;

        // Nothing is saved until the new checkpoint exists; a failed edit
        // leaves the stored one pending.
        state.advance(WorkflowEvent::Edit)?;
        let amended = self.builder.amend(&checkpoint.proposal, &modifications).await?;
        state.advance(WorkflowEvent::Resimulate)?;
        let simulation = self
            .simulator
            .simulate(&state.original_portfolio, &amended)
            .await?;

        state.history.push(decision_record(checkpoint, Decision::Edit, command.notes));
        state.revision += 1;
        let payload = self.suspend(&mut state, amended, simulation).await?;

        info!(
            thread_id = %state.thread_id,
            revision = state.revision,
            quantity = %payload.proposal.quantity,
            "Proposal edited, awaiting approval"
        );
        Ok(ResumeOutcome::Suspended(payload))
    }

    async fn reject(
        &self,
        mut state: ThreadState,
        checkpoint: &ApprovalCheckpoint,
        command: ResumeCommand,
    ) -> Result<ResumeOutcome, WorkflowError> {
        state.advance(WorkflowEvent::Reject)?;

        let record = CancellationRecord {
            thread_id: state.thread_id.clone(),
            proposal_id: checkpoint.proposal.id,
            reason: command
                .notes
                .clone()
                .unwrap_or_else(|| "rejected by reviewer".to_string()),
            notes: command.notes.clone(),
            timestamp: Utc::now(),
        };

        state.history.push(decision_record(checkpoint, Decision::Rejected, command.notes));
        state.checkpoint = None;
        state.outcome = Some(WorkflowOutcome::Cancelled(record.clone()));
        self.store.save(&state.thread_id, &state).await?;

        info!(thread_id = %state.thread_id, reason = %record.reason, "Thread cancelled");
        Ok(ResumeOutcome::Cancelled(record))
    }
}

fn decision_record(
    checkpoint: &ApprovalCheckpoint,
    decision: Decision,
    notes: Option<String>,
) -> DecisionRecord {
    DecisionRecord {
        revision: checkpoint.revision,
        proposal_id: checkpoint.proposal.id,
        decision,
        notes,
        at: Utc::now(),
    }
}
