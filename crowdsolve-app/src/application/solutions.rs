use super::forms::{MutationForm, SolutionDraft, SubmitOutcome};
use super::solution_view::SolutionPresentation;
use super::Mount;
use crate::domain::{ProblemId, Solution, SolutionId};
use crate::AppContext;
use crowdsolve_errors::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct PanelState {
    loading: bool,
    error: Option<String>,
}

/// The solutions section shared by cards and the detail overlay.
#[derive(Clone)]
pub struct SolutionsPanel {
    ctx: AppContext,
    problem_id: ProblemId,
    mount: Mount,
    form: MutationForm<SolutionDraft>,
    state: Arc<Mutex<PanelState>>,
    presentations: Arc<Mutex<HashMap<SolutionId, SolutionPresentation>>>,
}

impl SolutionsPanel {
    pub fn new(ctx: AppContext, problem_id: ProblemId, mount: Mount) -> Self {
        Self {
            ctx,
            problem_id,
            mount,
            form: MutationForm::new(),
            state: Arc::new(Mutex::new(PanelState::default())),
            presentations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A fresh panel for the same problem under another lifecycle. The pending
    /// solution draft carries over.
    pub fn rebind(&self, mount: Mount) -> Self {
        Self {
            form: self.form.clone(),
            ..Self::new(self.ctx.clone(), self.problem_id.clone(), mount)
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reuses the shared cache when another view already loaded it.
    pub async fn load(&self) -> Result<(), AppError> {
        if self.ctx.store.solutions_loaded(&self.problem_id) {
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

        let ticket = self.ctx.store.begin_solutions_fetch(&self.problem_id);
        let result = self.ctx.api.list_solutions(&self.problem_id).await;

        if !self.mount.is_live() {
            tracing::debug!("Dropping solutions for closed view ({})", self.problem_id);
            return Ok(());
        }

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(solutions) => {
                state.error = None;
                self.ctx.store.fill_solutions(ticket, solutions);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Loading solutions for {} failed: {}", self.problem_id, err);
                state.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    pub fn solutions(&self) -> Vec<Solution> {
        self.ctx.store.solutions(&self.problem_id)
    }

    pub fn count(&self) -> usize {
        self.ctx.store.solution_count(&self.problem_id)
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// One presentation per solution, in display order. A presentation keeps its
    /// comment state for as long as this panel lives.
    pub fn presentations(&self) -> Vec<SolutionPresentation> {
        let mut cache = self
            .presentations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.solutions()
            .into_iter()
            .map(|solution| {
                cache
                    .entry(solution.id.clone())
                    .or_insert_with(|| {
                        SolutionPresentation::new(self.ctx.clone(), solution, self.mount.clone())
                    })
                    .clone()
            })
            .collect()
    }

    pub fn presentation(&self, id: &SolutionId) -> Option<SolutionPresentation> {
        self.presentations().into_iter().find(|p| p.id() == id)
    }

    pub fn form(&self) -> &MutationForm<SolutionDraft> {
        &self.form
    }

    pub async fn create_solution(&self, description: impl Into<String>) -> SubmitOutcome<Solution> {
        let description = description.into();
        self.form.update(|draft| draft.description = description);
        self.submit().await
    }

    /// Success prepends into the shared store, so every view of the problem sees it.
    pub async fn submit(&self) -> SubmitOutcome<Solution> {
        let ctx = self.ctx.clone();
        let problem_id = self.problem_id.clone();
        let outcome = self
            .form
            .submit(|draft| async move {
                let session = ctx.require_session()?;
                ctx.api
                    .create_solution(&session, &problem_id, draft.description.trim())
                    .await
            })
            .await;

        if let SubmitOutcome::Delivered(solution) = &outcome {
            self.ctx
                .store
                .prepend_solution(&self.problem_id, solution.clone());
        }
        outcome
    }
}
