// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The cycle orchestrator: one single-threaded cooperative poll loop per
//! module instance.
//!
//! Every cycle re-reads chain and contract state from scratch, rebuilds
//! the report, re-evaluates the tracker and dispatches at most one
//! transaction. Nothing is cached across cycles except the resolved
//! reference blockstamp (immutable once finalized) and the slot threshold
//! used to sleep through already-handled finalized slots.

use std::{
    io::{BufRead, Write as _},
    sync::Arc,
    time::Instant,
};

use quorus_types::{
    config::{ExecutionMode, OracleConfig},
    consensus::{FrameState, OracleAction},
    data::{BlockStamp, ReferenceBlockStamp, SlotNumber},
    error::{OracleError, Result},
    traits::{
        chain_reader::ChainReader,
        consensus_contract::ConsensusContract,
        keys_api::KeysApi,
        metrics::Metrics,
        report::{BuildContext, OracleReport, ReportModule},
        storage::ReportCache,
        tx_sender::TransactionSender,
    },
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    bunker::BunkerDetector,
    consensus::{evaluate, Resolution, TrackerContext},
    frame::{FrameCalculator, FrameStatus},
    metrics::OracleMetricsValue,
};

/// How long to sleep after a cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CycleDelay {
    /// Poll again after the configured cycle sleep.
    NextSlot,
    /// Nothing will change until a new slot is finalized; skip cycles
    /// until the finalized head moves past the recorded threshold.
    NextFinalizedEpoch,
}

/// Result of one completed (non-errored) cycle.
#[derive(Copy, Clone, Debug)]
struct CycleOutcome {
    /// Finalized slot the cycle worked from.
    finalized_slot: SlotNumber,
    /// Requested pacing for the next cycle.
    delay: CycleDelay,
}

/// External collaborators an orchestrator is wired to.
pub struct Collaborators {
    /// Consensus-layer reader.
    pub chain: Arc<dyn ChainReader>,
    /// Consensus/report contract reader.
    pub contract: Arc<dyn ConsensusContract>,
    /// Transaction sender.
    pub sender: Arc<dyn TransactionSender>,
    /// Operator key registry.
    pub keys: Arc<dyn KeysApi>,
    /// Persisted fragment cache.
    pub cache: Arc<dyn ReportCache>,
}

/// Drives the poll loop for one oracle module.
pub struct CycleOrchestrator<M: ReportModule> {
    /// The module's report builder.
    module: M,
    /// Injected collaborators.
    io: Collaborators,
    /// Immutable instance configuration.
    config: OracleConfig,
    /// Metric handles.
    metrics: OracleMetricsValue,
    /// Frame calculation and reference-slot resolution.
    calculator: FrameCalculator,
    /// Bunker-mode detection.
    bunker: BunkerDetector,
    /// Finalized slots at or below this were fully handled; cycles skip
    /// early until the head moves past it.
    slot_threshold: SlotNumber,
    /// Reference slot of the frame seen last cycle.
    last_ref_slot: Option<SlotNumber>,
    /// Whether that frame reached full delivery.
    last_frame_completed: bool,
}

impl<M: ReportModule> CycleOrchestrator<M> {
    /// Wire up an orchestrator.
    #[must_use]
    pub fn new(
        module: M,
        io: Collaborators,
        config: OracleConfig,
        metrics: &dyn Metrics,
    ) -> Self {
        let calculator = FrameCalculator::new(Arc::clone(&io.chain));
        let bunker = BunkerDetector::new(config.bunker_anomaly_threshold_gwei);
        Self {
            module,
            io,
            metrics: OracleMetricsValue::new(metrics),
            calculator,
            bunker,
            config,
            slot_threshold: SlotNumber::genesis(),
            last_ref_slot: None,
            last_frame_completed: false,
        }
    }

    /// Run per the configured execution mode.
    ///
    /// In daemon mode, loops until a shutdown signal or a fatal error; in
    /// one-shot mode, runs exactly one cycle.
    ///
    /// # Errors
    ///
    /// Only fatal errors (configuration, committee membership, hash
    /// disagreement) escape; everything else is logged and retried.
    pub async fn run(&mut self) -> Result<()> {
        match self.config.execution_mode {
            ExecutionMode::OneShot => self.cycle_handler().await,
            ExecutionMode::Daemon => {
                info!(
                    module = %self.module.kind(),
                    consensus_version = self.module.consensus_version(),
                    "run module as daemon"
                );
                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("shutdown signal received");
                            return Ok(());
                        }
                        result = self.cycle_and_sleep() => result?,
                    }
                }
            }
        }
    }

    /// One cycle followed by the inter-cycle sleep.
    async fn cycle_and_sleep(&mut self) -> Result<()> {
        self.cycle_handler().await?;
        debug!(sleep = ?self.config.cycle_sleep, "cycle end, sleeping");
        tokio::time::sleep(self.config.cycle_sleep).await;
        Ok(())
    }

    /// Run one cycle under the lifetime budget, converting every
    /// recoverable failure into a logged outcome plus a metric increment.
    async fn cycle_handler(&mut self) -> Result<()> {
        let started = Instant::now();
        self.metrics.cycles_run.add(1);

        let outcome = tokio::time::timeout(self.config.max_cycle_lifetime, self.cycle()).await;
        self.metrics
            .cycle_duration
            .add_point(started.elapsed().as_secs_f64());

        match outcome {
            Err(_elapsed) => {
                // The cycle future was dropped before any send: transactions
                // only go out after every read and compute step succeeded.
                let err = OracleError::CycleTimeout(self.config.max_cycle_lifetime);
                error!(%err, "cycle aborted");
                self.metrics.cycle_errors.add(1);
                Ok(())
            }
            Ok(Err(err)) if err.is_fatal() => {
                error!(%err, "fatal error, stopping so an operator can intervene");
                Err(err)
            }
            Ok(Err(err)) => {
                error!(%err, "cycle failed, retrying next cycle");
                self.metrics.cycle_errors.add(1);
                Ok(())
            }
            Ok(Ok(outcome)) => {
                if outcome.delay == CycleDelay::NextFinalizedEpoch {
                    self.slot_threshold = outcome.finalized_slot;
                }
                Ok(())
            }
        }
    }

    /// The cycle body: read, compute, evaluate, dispatch. Strictly
    /// sequential; every step works from the snapshot taken in step one.
    #[instrument(skip_all, fields(module = %self.module.kind()))]
    async fn cycle(&mut self) -> Result<CycleOutcome> {
        // 1. Chain head and finalization state.
        let finalized = self.io.chain.finalized_blockstamp().await?;
        self.metrics
            .last_finalized_slot
            .set(usize::try_from(*finalized.slot_number).unwrap_or(usize::MAX));
        if finalized.slot_number <= self.slot_threshold {
            info!(
                threshold = %self.slot_threshold,
                "skipping the cycle, waiting for a new finalized slot"
            );
            return Ok(CycleOutcome {
                finalized_slot: finalized.slot_number,
                delay: CycleDelay::NextSlot,
            });
        }

        // 2. Current frame.
        let chain_config = self.io.contract.chain_config().await?;
        let frame_config = self.io.contract.frame_config().await?;
        let frame = self
            .calculator
            .current_frame(&finalized, &chain_config, &frame_config)?;
        self.metrics
            .current_frame
            .set(usize::try_from(*frame.index).unwrap_or(usize::MAX));
        self.note_frame_progress(frame.ref_slot)?;

        let status = self
            .calculator
            .resolve(&frame, &finalized, &chain_config, &frame_config)
            .await?;
        let stamp = match status {
            FrameStatus::AwaitingFinality => {
                return Ok(CycleOutcome {
                    finalized_slot: finalized.slot_number,
                    delay: CycleDelay::NextFinalizedEpoch,
                })
            }
            FrameStatus::DeadlinePassed => {
                // A missed frame is not retried; the protocol handles
                // missed-report penalties externally.
                warn!(ref_slot = %frame.ref_slot, "frame deadline passed without completion");
                self.metrics.frames_missed.add(1);
                return Ok(CycleOutcome {
                    finalized_slot: finalized.slot_number,
                    delay: CycleDelay::NextFinalizedEpoch,
                });
            }
            FrameStatus::Reportable(stamp) => stamp,
        };

        // 3. Build the report.
        let report = self.build_report(&stamp, &chain_config, &frame_config).await?;
        let local_hash = report.hash();
        info!(ref_slot = %frame.ref_slot, hash = %local_hash, "report built");

        // 4. Consensus state and tracker evaluation.
        let roster = self.io.contract.member_roster().await?;
        let member_info = match self.config.member_address {
            Some(me) => Some(self.io.contract.member_info(me, frame.ref_slot).await?),
            None => None,
        };
        let snapshot = self.io.contract.consensus_snapshot(frame.ref_slot).await?;
        let processing = self.io.contract.processing_state(frame.ref_slot).await?;

        let resolution = evaluate(&TrackerContext {
            frame: &frame,
            now_slot: finalized.slot_number,
            me: self.config.member_address,
            member_info: member_info.as_ref(),
            local_hash,
            snapshot: &snapshot,
            processing: &processing,
            roster: &roster,
            submit_delay_slots: self.config.submit_delay_slots,
        })?;
        info!(state = ?resolution.state, action = ?resolution.action, "frame evaluated");

        // 5. Policy gate and dispatch.
        let action = self.apply_bunker_gate(resolution, &stamp).await?;
        self.dispatch(action, &frame.ref_slot, &report).await?;

        let completed = matches!(
            resolution.state,
            FrameState::ExtraDataSubmitted | FrameState::Closed
        );
        if completed {
            self.last_frame_completed = true;
        }
        Ok(CycleOutcome {
            finalized_slot: finalized.slot_number,
            delay: if completed {
                CycleDelay::NextFinalizedEpoch
            } else {
                CycleDelay::NextSlot
            },
        })
    }

    /// Track reference-slot movement between cycles: backward movement is
    /// an impossible chain state, forward movement past an incomplete frame
    /// is a missed frame.
    fn note_frame_progress(&mut self, ref_slot: SlotNumber) -> Result<()> {
        if let Some(previous) = self.last_ref_slot {
            if ref_slot < previous {
                return Err(OracleError::InconsistentChainState(format!(
                    "reference slot moved backward from {previous} to {ref_slot}"
                )));
            }
            if ref_slot > previous {
                if !self.last_frame_completed {
                    warn!(%previous, "frame ended without full delivery");
                    self.metrics.frames_missed.add(1);
                }
                self.last_frame_completed = false;
            }
        }
        self.last_ref_slot = Some(ref_slot);
        Ok(())
    }

    /// Build the report through the module capability.
    async fn build_report(
        &self,
        stamp: &ReferenceBlockStamp,
        chain_config: &quorus_types::frame::ChainConfig,
        frame_config: &quorus_types::frame::FrameConfig,
    ) -> Result<M::Report> {
        let ctx = BuildContext {
            chain: &*self.io.chain,
            keys: &*self.io.keys,
            cache: &*self.io.cache,
            chain_config,
            frame_config,
            config: &self.config,
        };
        self.module.build_report(stamp, &ctx).await
    }

    /// Suppress report effects while bunker mode is active, unless
    /// explicitly allowed. Hash submission always passes: consensus
    /// formation must not stall while the protocol is defensive.
    async fn apply_bunker_gate(
        &self,
        resolution: Resolution,
        stamp: &ReferenceBlockStamp,
    ) -> Result<OracleAction> {
        let action = resolution.action;
        if !matches!(
            action,
            OracleAction::SubmitReport | OracleAction::SubmitExtraData { .. }
        ) {
            return Ok(action);
        }

        let bunker = self.bunker.is_active(&*self.io.chain, stamp).await?;
        self.metrics.bunker_mode_active.set(usize::from(bunker));
        if bunker && !self.config.allow_reporting_in_bunker {
            warn!(?action, "bunker mode is active, suppressing report submission");
            return Ok(OracleAction::Wait);
        }
        Ok(action)
    }

    /// Hand the action to the transaction sender.
    ///
    /// On success nothing is cached: the next cycle's contract reads will
    /// reflect the transaction, or it was dropped and the same action will
    /// be recommended again.
    async fn dispatch(
        &self,
        action: OracleAction,
        ref_slot: &SlotNumber,
        report: &M::Report,
    ) -> Result<()> {
        if !action.sends_transaction() {
            return Ok(());
        }
        if self.config.is_dry_run() {
            info!(?action, "dry run, not sending");
            return Ok(());
        }
        if self.config.confirm_sends && !confirm_on_stdin(&action) {
            info!(?action, "operator declined the send");
            return Ok(());
        }

        match action {
            OracleAction::SubmitHash(hash) => {
                self.io.sender.submit_report_hash(*ref_slot, hash).await?;
                info!(%hash, "report hash submitted");
            }
            OracleAction::SubmitReport => {
                self.io
                    .sender
                    .submit_report(*ref_slot, report.encode()?)
                    .await?;
                info!("report data submitted");
            }
            OracleAction::SubmitExtraData { next_chunk } => {
                let chunks = report.extra_data();
                let chunk = chunks
                    .iter()
                    .find(|chunk| chunk.index == next_chunk)
                    .ok_or_else(|| {
                        OracleError::InconsistentChainState(format!(
                            "contract expects extra data chunk {next_chunk} \
                             but the local report has {} chunks",
                            chunks.len()
                        ))
                    })?;
                self.io
                    .sender
                    .submit_extra_data_chunk(*ref_slot, chunk)
                    .await?;
                info!(chunk = next_chunk, "extra data chunk submitted");
            }
            OracleAction::Noop | OracleAction::Wait => {}
        }
        self.metrics.transactions_submitted.add(1);
        Ok(())
    }

    /// Finalized blockstamp of the last cycle's threshold, for tests and
    /// the readiness probe.
    #[must_use]
    pub fn slot_threshold(&self) -> SlotNumber {
        self.slot_threshold
    }
}

/// Ask the operator to confirm a send on stdin (one-shot mode only).
fn confirm_on_stdin(action: &OracleAction) -> bool {
    print!("about to {action:?}; proceed? [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

/// Helper for wiring a [`BlockStamp`] into log fields in tests and probes.
#[must_use]
pub fn describe_stamp(stamp: &BlockStamp) -> String {
    format!(
        "slot {} (block {} / {:#x})",
        stamp.slot_number, stamp.block_number, stamp.block_hash
    )
}
