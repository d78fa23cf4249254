use super::Mount;
use crate::domain::{Solution, SolutionId, UpvoteTally};
use crate::AppContext;
use crowdsolve_errors::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDisplay {
    pub count: usize,
    pub has_upvoted: bool,
    /// False without a session or while a toggle is in flight.
    pub enabled: bool,
}

#[derive(Debug)]
pub enum VoteOutcome {
    Applied(UpvoteTally),
    /// Nobody is logged in; nothing was sent.
    Inert,
    /// A toggle from this control is still outstanding.
    Busy,
    Failed(AppError),
    /// The view was closed before a failure came back; nothing is shown.
    Discarded,
}

/// Upvote control embedded in every solution presentation.
#[derive(Clone)]
pub struct VoteController {
    ctx: AppContext,
    solution: Solution,
    mount: Mount,
    in_flight: Arc<AtomicBool>,
    last_error: Arc<Mutex<Option<AppError>>>,
}

impl VoteController {
    pub fn new(ctx: AppContext, solution: Solution, mount: Mount) -> Self {
        Self {
            ctx,
            solution,
            mount,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn solution_id(&self) -> &SolutionId {
        &self.solution.id
    }

    /// The service's last answer wins over anything derived from the upvote set.
    pub fn display(&self) -> VoteDisplay {
        let viewer = self.ctx.current_user();
        let solution = self
            .ctx
            .store
            .solution(&self.solution.id)
            .unwrap_or_else(|| self.solution.clone());
        let member = viewer
            .as_ref()
            .is_some_and(|user| solution.upvoted_by(&user.id));

        let (count, has_upvoted) = match self.ctx.store.tally(&self.solution.id) {
            Some(recorded) => {
                let has_upvoted = match &viewer {
                    Some(user) if user.id == recorded.voter => recorded.tally.has_upvoted,
                    _ => member,
                };
                (recorded.tally.upvotes, has_upvoted)
            }
            None => (solution.upvotes.len(), member),
        };

        VoteDisplay {
            count,
            has_upvoted,
            enabled: viewer.is_some() && !self.is_in_flight(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Diagnostics only; failures never change what is displayed.
    pub fn last_error(&self) -> Option<AppError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn toggle_upvote(&self) -> VoteOutcome {
        let Some(session) = self.ctx.current_session() else {
            return VoteOutcome::Inert;
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return VoteOutcome::Busy;
        }
        let _in_flight = InFlight(Arc::clone(&self.in_flight));

        let result = self
            .ctx
            .api
            .toggle_upvote(&session, &self.solution.id)
            .await;

        let mut last_error = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            // The tally is authoritative, so it reaches the store even for a closed view.
            Ok(tally) => {
                self.ctx
                    .store
                    .record_tally(&self.solution.id, &session.user.id, tally);
                *last_error = None;
                VoteOutcome::Applied(tally)
            }
            Err(err) if !self.mount.is_live() => {
                tracing::debug!(
                    "Dropping upvote failure for closed view ({}): {}",
                    self.solution.id,
                    err
                );
                VoteOutcome::Discarded
            }
            Err(err) => {
                tracing::warn!("Upvote on {} failed: {}", self.solution.id, err);
                *last_error = Some(err.clone());
                VoteOutcome::Failed(err)
            }
        }
    }
}

struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
