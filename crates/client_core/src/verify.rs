//! Verification task abstraction: a cancellable operation reporting discrete
//! progress events and a terminal outcome. The backing implementation here is
//! simulated, but the interface is the one a real verification call exposes.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::info;

use shared::{
    domain::Identity,
    error::{ApiError, ErrorCode},
    protocol::{
        ProgressEvent, SubmissionPayload, VerificationOutcome, VerificationReport,
        VerificationStage,
    },
};

use crate::wizard::{Wizard, WizardError};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// Cooperative cancellation handle shared between the caller and a running
/// verification.
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract of the external verification service: consume a submission,
/// stream progress, resolve to a terminal report or a coded error.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    async fn verify(
        &self,
        payload: &SubmissionPayload,
        events: mpsc::Sender<ProgressEvent>,
        cancel: CancelToken,
    ) -> Result<VerificationReport, ApiError>;
}

/// Timer-driven stand-in for the real service: progress climbs in fixed
/// increments per tick, stages follow the fixed thresholds, and the outcome
/// is always `Verified`. No external calls are made.
pub struct SimulatedVerifier {
    tick: Duration,
    step_percent: u8,
}

impl SimulatedVerifier {
    pub fn new() -> Self {
        // 2 percent per 60ms tick: three seconds start to finish.
        Self::with_timing(Duration::from_millis(60), 2)
    }

    pub fn with_timing(tick: Duration, step_percent: u8) -> Self {
        Self {
            tick,
            step_percent: step_percent.max(1),
        }
    }
}

impl Default for SimulatedVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationBackend for SimulatedVerifier {
    async fn verify(
        &self,
        payload: &SubmissionPayload,
        events: mpsc::Sender<ProgressEvent>,
        cancel: CancelToken,
    ) -> Result<VerificationReport, ApiError> {
        let started_at = Utc::now();
        info!(
            submission = %payload.submission_id,
            mode = %payload.verification_mode,
            "verification started"
        );

        let mut ticker = tokio::time::interval(self.tick);
        // The first tick resolves immediately.
        ticker.tick().await;

        let mut percent: u8 = 0;
        while percent < 100 {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ApiError::new(ErrorCode::Internal, "verification cancelled"));
                }
                _ = ticker.tick() => {
                    percent = percent.saturating_add(self.step_percent).min(100);
                    let event = ProgressEvent {
                        percent,
                        stage: VerificationStage::for_percent(percent),
                    };
                    // A dropped receiver only loses presentation updates.
                    let _ = events.send(event).await;
                }
            }
        }

        info!(submission = %payload.submission_id, "verification finished");
        Ok(VerificationReport {
            submission_id: payload.submission_id,
            outcome: VerificationOutcome::Verified,
            mode: payload.verification_mode,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Submits the wizard's aggregate and drives the backend to completion,
/// mirroring progress into the wizard (and the caller's observer) as it
/// arrives. Once started, the run is never cancelled from here.
pub async fn process_submission(
    wizard: &mut Wizard,
    identity: &Identity,
    backend: &dyn VerificationBackend,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<(SubmissionPayload, VerificationReport), ProcessError> {
    let payload = wizard.submit(identity)?;

    let (events_tx, events_rx) = mpsc::channel(32);
    let cancel = CancelToken::new();
    let mut events = ReceiverStream::new(events_rx);

    // Scoped so the backend future releases its borrow of the payload.
    let report = {
        let verify = backend.verify(&payload, events_tx, cancel);
        tokio::pin!(verify);
        loop {
            tokio::select! {
                Some(event) = events.next() => {
                    wizard.record_progress(event);
                    on_progress(event);
                }
                result = &mut verify => {
                    match result {
                        Ok(report) => break report,
                        Err(err) => {
                            wizard.reset_processing();
                            return Err(err.into());
                        }
                    }
                }
            }
        }
    };

    // Events still buffered when the backend resolved.
    while let Some(event) = events.next().await {
        wizard.record_progress(event);
        on_progress(event);
    }

    wizard.complete(report.clone());
    Ok((payload, report))
}

#[cfg(test)]
#[path = "tests/verify_tests.rs"]
mod tests;
