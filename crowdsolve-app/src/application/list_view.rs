use super::actions::DeleteOutcome;
use super::card::{Layout, ProblemCard};
use super::detail::DetailOverlay;
use super::forms::{MutationForm, ProblemDraft, SubmitOutcome};
use super::Mount;
use crate::domain::{Problem, ProblemId};
use crate::AppContext;
use crowdsolve_errors::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ListState {
    layout: Layout,
    loading: bool,
    fetched: bool,
    error: Option<String>,
    detail: Option<DetailOverlay>,
    /// Problem whose delete was requested from a card and awaits confirmation.
    pending_delete: Option<ProblemId>,
}

/// Dashboard listing every problem in grid or list layout.
#[derive(Clone)]
pub struct ListView {
    ctx: AppContext,
    lifecycle: Mount,
    create_form: MutationForm<ProblemDraft>,
    state: Arc<Mutex<ListState>>,
    cards: Arc<Mutex<HashMap<ProblemId, ProblemCard>>>,
}

impl ListView {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            lifecycle: Mount::new(),
            create_form: MutationForm::new(),
            state: Arc::new(Mutex::new(ListState::default())),
            cards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cards(&self) -> MutexGuard<'_, HashMap<ProblemId, ProblemCard>> {
        self.cards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the problems once per mount.
    pub async fn mount(&self) -> Result<(), AppError> {
        if self.lock().fetched {
            return Ok(());
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<(), AppError> {
        {
            let mut state = self.lock();
            if state.loading {
                return Ok(());
            }
            state.loading = true;
        }

        let ticket = self.ctx.store.begin_problems_fetch();
        let result = self.ctx.api.list_problems().await;

        if !self.lifecycle.is_live() {
            tracing::debug!("Dropping problems for unmounted list view");
            return Ok(());
        }

        let mut state = self.lock();
        state.loading = false;
        state.fetched = true;
        match result {
            Ok(problems) => {
                tracing::info!("Loaded {} problems", problems.len());
                state.error = None;
                self.ctx.store.fill_problems(ticket, problems);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Loading problems failed: {}", err);
                state.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    pub fn unmount(&self) {
        self.lifecycle.end();
        self.lock().pending_delete = None;
        for (_, card) in self.lock_cards().drain() {
            card.unmount();
        }
        self.close_detail();
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.ctx.store.problems()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn layout(&self) -> Layout {
        self.lock().layout
    }

    /// Switching layout remounts every card in the new variant. Pending
    /// deletes and open edit forms survive the switch.
    pub fn set_layout(&self, layout: Layout) {
        {
            let mut state = self.lock();
            if state.layout == layout {
                return;
            }
            state.layout = layout;
        }
        for card in self.lock_cards().values_mut() {
            let remounted = card.remount_as(layout);
            card.unmount();
            *card = remounted;
        }
    }

    /// Cards for the current problems, in display order. Cards of removed problems
    /// are unmounted.
    pub fn cards(&self) -> Vec<ProblemCard> {
        let problems = self.problems();
        let layout = self.layout();
        let mut cards = self.lock_cards();

        cards.retain(|id, card| {
            let keep = problems.iter().any(|p| &p.id == id);
            if !keep {
                card.unmount();
            }
            keep
        });

        problems
            .into_iter()
            .map(|problem| {
                cards
                    .entry(problem.id.clone())
                    .or_insert_with(|| ProblemCard::new(self.ctx.clone(), problem, layout))
                    .clone()
            })
            .collect()
    }

    pub fn card(&self, id: &ProblemId) -> Option<ProblemCard> {
        self.cards().into_iter().find(|card| card.id() == id)
    }

    /// First phase of deleting a problem from its card. Any other pending
    /// delete is cancelled. Returns false for unknown ids and non-owners.
    pub fn request_delete(&self, id: &ProblemId) -> bool {
        let Some(card) = self.card(id) else {
            return false;
        };
        if !card.actions().request_delete() {
            return false;
        }
        let previous = self.lock().pending_delete.replace(id.clone());
        if let Some(previous) = previous.filter(|previous| previous != id) {
            if let Some(card) = self.card(&previous) {
                card.actions().cancel_delete();
            }
        }
        true
    }

    pub fn pending_delete(&self) -> Option<ProblemId> {
        self.lock().pending_delete.clone()
    }

    /// Confirms the pending delete on whichever card currently shows the problem.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let Some(id) = self.lock().pending_delete.take() else {
            return DeleteOutcome::NotConfirmed;
        };
        match self.card(&id) {
            Some(card) => card.confirm_delete().await,
            None => {
                tracing::debug!("Pending delete of {} has no card any more", id);
                DeleteOutcome::NotConfirmed
            }
        }
    }

    /// Returns whether a pending delete was cancelled.
    pub fn cancel_delete(&self) -> bool {
        let Some(id) = self.lock().pending_delete.take() else {
            return false;
        };
        if let Some(card) = self.card(&id) {
            card.actions().cancel_delete();
        }
        true
    }

    pub fn create_form(&self) -> &MutationForm<ProblemDraft> {
        &self.create_form
    }

    pub async fn create_problem(&self, draft: ProblemDraft) -> SubmitOutcome<Problem> {
        self.create_form.open_with(draft);
        self.submit_problem().await
    }

    /// A created problem is prepended without re-fetching the list.
    pub async fn submit_problem(&self) -> SubmitOutcome<Problem> {
        let ctx = self.ctx.clone();
        let outcome = self
            .create_form
            .submit(|draft| async move {
                let session = ctx.require_session()?;
                ctx.api.create_problem(&session, draft.payload()).await
            })
            .await;

        if let SubmitOutcome::Delivered(problem) = &outcome {
            if self.lifecycle.is_live() {
                tracing::info!("Problem {} created", problem.id);
                self.ctx.store.prepend_problem(problem.clone());
            }
        }
        outcome
    }

    /// Opens the detail view for `id`, closing any other one first.
    /// The caller mounts the returned overlay.
    pub fn open_detail(&self, id: &ProblemId) -> Option<DetailOverlay> {
        let problem = self.ctx.store.problem(id)?;
        let overlay = DetailOverlay::new(self.ctx.clone(), problem);
        if let Some(previous) = self.lock().detail.replace(overlay.clone()) {
            previous.close();
        }
        Some(overlay)
    }

    pub fn detail(&self) -> Option<DetailOverlay> {
        self.lock().detail.clone()
    }

    pub fn close_detail(&self) {
        if let Some(overlay) = self.lock().detail.take() {
            overlay.close();
        }
    }
}
