//! Operator review for the interactive (`bilenko`) algorithm.
//!
//! The engine never talks to a terminal. It hands a [`ReviewRequest`] to a
//! [`Reviewer`] and blocks until a [`Decision`] comes back. Requests from
//! parallel workers are serialized so an operator sees one pair at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

use serde::Serialize;

use crate::error::LinkError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRequest {
    pub left_row: usize,
    pub right_row: usize,
    /// Position of the field in the match spec.
    pub field: usize,
    pub left_column: String,
    pub right_column: String,
    /// Normalized values being compared.
    pub left_value: String,
    pub right_value: String,
    /// Preliminary automatic similarity.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
    /// Cancel the whole match run.
    Abort,
}

pub trait Reviewer: Sync {
    fn review(&self, request: &ReviewRequest) -> Decision;
}

impl<F> Reviewer for F
where
    F: Fn(&ReviewRequest) -> Decision + Sync,
{
    fn review(&self, request: &ReviewRequest) -> Decision {
        self(request)
    }
}

// ---------------------------------------------------------------------------
// Channel operator
// ---------------------------------------------------------------------------

struct Pending {
    request: ReviewRequest,
    reply: mpsc::SyncSender<Decision>,
}

/// Create a synchronous request/response pair. The engine side blocks in
/// [`Reviewer::review`] until the operator answers through the endpoint.
/// Dropping the endpoint, or a pending review without answering it, aborts
/// the run.
pub fn channel() -> (ChannelReviewer, OperatorEndpoint) {
    let (tx, rx) = mpsc::channel();
    (
        ChannelReviewer { requests: Mutex::new(tx) },
        OperatorEndpoint { requests: rx },
    )
}

pub struct ChannelReviewer {
    requests: Mutex<mpsc::Sender<Pending>>,
}

impl Reviewer for ChannelReviewer {
    fn review(&self, request: &ReviewRequest) -> Decision {
        // Held across the round trip: one outstanding request at a time.
        let Ok(sender) = self.requests.lock() else {
            return Decision::Abort;
        };
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let pending = Pending {
            request: request.clone(),
            reply: reply_tx,
        };
        if sender.send(pending).is_err() {
            return Decision::Abort;
        }
        reply_rx.recv().unwrap_or(Decision::Abort)
    }
}

pub struct OperatorEndpoint {
    requests: mpsc::Receiver<Pending>,
}

impl OperatorEndpoint {
    /// Block until the engine asks for a decision. `None` once the engine
    /// side is gone.
    pub fn next(&self) -> Option<PendingReview> {
        self.requests.recv().ok().map(PendingReview)
    }

    /// Answer every request with `decide` until the engine side is dropped.
    pub fn serve<F: FnMut(&ReviewRequest) -> Decision>(&self, mut decide: F) {
        while let Some(pending) = self.next() {
            let decision = decide(pending.request());
            pending.decide(decision);
        }
    }
}

pub struct PendingReview(Pending);

impl PendingReview {
    pub fn request(&self) -> &ReviewRequest {
        &self.0.request
    }

    pub fn decide(self, decision: Decision) {
        // The engine may already have given up; nothing to do then.
        let _ = self.0.reply.send(decision);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-run wrapper: one prompt at a time, and no further prompts once any
/// worker has seen an abort.
pub(crate) struct ReviewSession<'a> {
    reviewer: &'a dyn Reviewer,
    gate: Mutex<()>,
    aborted: AtomicBool,
}

impl<'a> ReviewSession<'a> {
    pub(crate) fn new(reviewer: &'a dyn Reviewer) -> Self {
        Self {
            reviewer,
            gate: Mutex::new(()),
            aborted: AtomicBool::new(false),
        }
    }

    pub(crate) fn ask(&self, request: &ReviewRequest) -> Result<bool, LinkError> {
        let interrupted = || LinkError::Interrupted {
            reason: "operator aborted review".into(),
        };
        if self.aborted.load(Ordering::Acquire) {
            return Err(interrupted());
        }
        let _guard = self.gate.lock().map_err(|_| LinkError::Interrupted {
            reason: "review gate poisoned".into(),
        })?;
        if self.aborted.load(Ordering::Acquire) {
            return Err(interrupted());
        }

        match self.reviewer.review(request) {
            Decision::Accept => Ok(true),
            Decision::Reject => Ok(false),
            Decision::Abort => {
                self.aborted.store(true, Ordering::Release);
                log::info!(
                    "review aborted at left row {}, right row {}",
                    request.left_row,
                    request.right_row
                );
                Err(interrupted())
            }
        }
    }
}
