use super::actions::{DeleteOutcome, ProblemActions};
use super::solutions::SolutionsPanel;
use super::Mount;
use crate::domain::{Problem, ProblemId};
use crate::AppContext;
use crowdsolve_errors::AppError;

/// Modal view bound to one problem.
///
/// Opening always performs its own fetch of the problem's solutions, so the shared
/// cache is never older than the last time a detail view was opened.
#[derive(Clone)]
pub struct DetailOverlay {
    ctx: AppContext,
    lifecycle: Mount,
    actions: ProblemActions,
    solutions: SolutionsPanel,
}

impl DetailOverlay {
    pub fn new(ctx: AppContext, problem: Problem) -> Self {
        let lifecycle = Mount::new();
        let solutions = SolutionsPanel::new(ctx.clone(), problem.id.clone(), lifecycle.clone());
        let actions = ProblemActions::new(ctx.clone(), problem, lifecycle.clone());
        Self {
            ctx,
            lifecycle,
            actions,
            solutions,
        }
    }

    pub fn id(&self) -> &ProblemId {
        self.actions.problem_id()
    }

    pub async fn mount(&self) -> Result<(), AppError> {
        tracing::info!("Opening detail view for {}", self.id());
        self.solutions.refresh().await
    }

    /// Ends the fetch lifecycle; late responses are dropped.
    pub fn close(&self) {
        self.lifecycle.end();
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle.is_live()
    }

    pub fn problem(&self) -> Problem {
        self.actions.problem()
    }

    /// The problem was deleted while this view stayed open. The view keeps showing
    /// its snapshot; it does not close itself.
    pub fn is_orphaned(&self) -> bool {
        self.ctx.store.problems_loaded() && self.ctx.store.problem(self.id()).is_none()
    }

    pub fn solution_count(&self) -> usize {
        self.solutions.count()
    }

    pub fn is_owner(&self) -> bool {
        self.actions.is_owner()
    }

    pub fn actions(&self) -> &ProblemActions {
        &self.actions
    }

    pub fn solutions(&self) -> &SolutionsPanel {
        &self.solutions
    }

    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let outcome = self.actions.confirm_delete().await;
        if matches!(outcome, DeleteOutcome::Deleted) {
            self.solutions.form().close();
        }
        outcome
    }
}
