use super::actions::{DeleteOutcome, ProblemActions};
use super::solution_view::SolutionPresentation;
use super::solutions::SolutionsPanel;
use super::Mount;
use crate::domain::{Problem, ProblemId};
use crate::AppContext;
use crowdsolve_errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Grid,
    List,
}

/// Per-problem presentation inside the list view.
#[derive(Clone)]
pub struct ProblemCard {
    variant: Layout,
    lifecycle: Mount,
    actions: ProblemActions,
    solutions: SolutionsPanel,
}

impl ProblemCard {
    pub fn new(ctx: AppContext, problem: Problem, variant: Layout) -> Self {
        let lifecycle = Mount::new();
        let solutions = SolutionsPanel::new(ctx.clone(), problem.id.clone(), lifecycle.clone());
        let actions = ProblemActions::new(ctx, problem, lifecycle.clone());
        Self {
            variant,
            lifecycle,
            actions,
            solutions,
        }
    }

    /// A mounted copy of this card in `variant`. Menu, delete phase and open
    /// forms carry over; the old card is left for the caller to unmount.
    pub fn remount_as(&self, variant: Layout) -> Self {
        let lifecycle = Mount::new();
        Self {
            variant,
            actions: self.actions.rebind(lifecycle.clone()),
            solutions: self.solutions.rebind(lifecycle.clone()),
            lifecycle,
        }
    }

    pub fn variant(&self) -> Layout {
        self.variant
    }

    pub fn id(&self) -> &ProblemId {
        self.actions.problem_id()
    }

    pub fn problem(&self) -> Problem {
        self.actions.problem()
    }

    /// Loads the solutions needed for the count.
    pub async fn mount(&self) -> Result<(), AppError> {
        self.solutions.load().await
    }

    pub fn unmount(&self) {
        self.lifecycle.end();
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_live()
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

    /// Only the list variant renders solutions inline; the grid shows a count.
    pub fn solution_views(&self) -> Vec<SolutionPresentation> {
        match self.variant {
            Layout::List => self.solutions.presentations(),
            Layout::Grid => Vec::new(),
        }
    }

    /// Deletes and closes every sub-form hosted by this card.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let outcome = self.actions.confirm_delete().await;
        if matches!(outcome, DeleteOutcome::Deleted) {
            self.solutions.form().close();
        }
        outcome
    }
}
