use super::forms::{MutationForm, ProblemDraft, SubmitOutcome};
use super::ownership::is_owner;
use super::Mount;
use crate::domain::{Problem, ProblemId};
use crate::AppContext;
use crowdsolve_errors::AppError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    /// Intent recorded; waiting for explicit confirmation.
    Confirming,
    Deleting,
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    /// `confirm_delete` without a preceding `request_delete`.
    NotConfirmed,
    Busy,
    Failed(AppError),
    /// The view was closed before a failure came back; nothing is shown.
    Discarded,
}

struct ActionsState {
    menu_open: bool,
    delete: DeletePhase,
    error: Option<String>,
}

/// Ownership-gated edit and delete for one problem, wherever it is rendered.
#[derive(Clone)]
pub struct ProblemActions {
    ctx: AppContext,
    snapshot: Problem,
    mount: Mount,
    edit_form: MutationForm<ProblemDraft>,
    state: Arc<Mutex<ActionsState>>,
}

impl ProblemActions {
    pub fn new(ctx: AppContext, snapshot: Problem, mount: Mount) -> Self {
        Self {
            ctx,
            snapshot,
            mount,
            edit_form: MutationForm::for_edit(),
            state: Arc::new(Mutex::new(ActionsState {
                menu_open: false,
                delete: DeletePhase::Idle,
                error: None,
            })),
        }
    }

    /// Same menu, delete phase and edit form, bound to another view's lifecycle.
    /// Used when a card is rebuilt in a new layout.
    pub fn rebind(&self, mount: Mount) -> Self {
        Self {
            ctx: self.ctx.clone(),
            snapshot: self.snapshot.clone(),
            mount,
            edit_form: self.edit_form.clone(),
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActionsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn problem_id(&self) -> &ProblemId {
        &self.snapshot.id
    }

    /// Stored version if still present, else the version this view was opened with.
    pub fn problem(&self) -> Problem {
        self.ctx
            .store
            .problem(&self.snapshot.id)
            .unwrap_or_else(|| self.snapshot.clone())
    }

    pub fn is_owner(&self) -> bool {
        is_owner(self.ctx.current_user().as_ref(), &self.problem())
    }

    pub fn menu_open(&self) -> bool {
        self.lock().menu_open
    }

    /// Returns whether the menu is now open. Non-owners never get one.
    pub fn toggle_menu(&self) -> bool {
        let owner = self.is_owner();
        let mut state = self.lock();
        state.menu_open = owner && !state.menu_open;
        state.menu_open
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn edit_form(&self) -> &MutationForm<ProblemDraft> {
        &self.edit_form
    }

    /// Opens the edit form pre-populated with the current field values.
    pub fn begin_edit(&self) -> bool {
        if !self.is_owner() {
            return false;
        }
        self.edit_form.open_with(ProblemDraft::from(&self.problem()));
        self.lock().menu_open = false;
        true
    }

    /// On success the edited problem supersedes the stored one by id.
    pub async fn submit_edit(&self) -> SubmitOutcome<Problem> {
        let ctx = self.ctx.clone();
        let id = self.snapshot.id.clone();
        let outcome = self
            .edit_form
            .submit(|draft| async move {
                let session = ctx.require_session()?;
                ctx.api.update_problem(&session, &id, draft.payload()).await
            })
            .await;

        if let SubmitOutcome::Delivered(problem) = &outcome {
            self.ctx.store.replace_problem(problem.clone());
        }
        outcome
    }

    pub fn delete_phase(&self) -> DeletePhase {
        self.lock().delete
    }

    /// First phase of the two-phase delete.
    pub fn request_delete(&self) -> bool {
        if !self.is_owner() {
            return false;
        }
        let mut state = self.lock();
        if state.delete == DeletePhase::Idle {
            state.delete = DeletePhase::Confirming;
        }
        state.menu_open = false;
        true
    }

    pub fn cancel_delete(&self) {
        let mut state = self.lock();
        if state.delete == DeletePhase::Confirming {
            state.delete = DeletePhase::Idle;
        }
    }

    /// Issues the destructive call. Only valid after [`ProblemActions::request_delete`].
    ///
    /// A confirmed delete always reaches the shared store, even when this view
    /// was unmounted while the call was out.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        {
            let mut state = self.lock();
            match state.delete {
                DeletePhase::Idle => return DeleteOutcome::NotConfirmed,
                DeletePhase::Deleting => return DeleteOutcome::Busy,
                DeletePhase::Confirming => {
                    state.delete = DeletePhase::Deleting;
                    state.error = None;
                }
            }
        }

        let result = match self.ctx.require_session() {
            Ok(session) => {
                self.ctx
                    .api
                    .delete_problem(&session, &self.snapshot.id)
                    .await
            }
            Err(err) => Err(err),
        };

        let live = self.mount.is_live();
        let outcome = {
            let mut state = self.lock();
            state.delete = DeletePhase::Idle;
            match result {
                Ok(()) => {
                    state.menu_open = false;
                    DeleteOutcome::Deleted
                }
                Err(err) if !live => {
                    tracing::debug!(
                        "Dropping delete failure for closed view ({}): {}",
                        self.snapshot.id,
                        err
                    );
                    DeleteOutcome::Discarded
                }
                Err(err) => {
                    tracing::warn!("Deleting problem {} failed: {}", self.snapshot.id, err);
                    state.error = Some(err.user_message().to_string());
                    DeleteOutcome::Failed(err)
                }
            }
        };

        if matches!(outcome, DeleteOutcome::Deleted) {
            self.ctx.store.remove_problem(&self.snapshot.id);
            self.edit_form.close();
            tracing::info!("Problem {} deleted", self.snapshot.id);
        }
        outcome
    }
}
