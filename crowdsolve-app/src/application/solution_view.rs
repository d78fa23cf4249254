use super::comments::CommentThread;
use super::vote::VoteController;
use super::Mount;
use crate::domain::{Solution, SolutionId};
use crate::AppContext;
use crowdsolve_errors::AppError;

/// One solution with its vote control and comment thread.
#[derive(Clone)]
pub struct SolutionPresentation {
    ctx: AppContext,
    solution: Solution,
    vote: VoteController,
    comments: CommentThread,
}

impl SolutionPresentation {
    pub fn new(ctx: AppContext, solution: Solution, mount: Mount) -> Self {
        let vote = VoteController::new(ctx.clone(), solution.clone(), mount.clone());
        let comments = CommentThread::new(ctx.clone(), solution.id.clone(), mount);
        Self {
            ctx,
            solution,
            vote,
            comments,
        }
    }

    pub fn id(&self) -> &SolutionId {
        &self.solution.id
    }

    /// Current stored version, or the one this presentation was built from.
    pub fn solution(&self) -> Solution {
        self.ctx
            .store
            .solution(&self.solution.id)
            .unwrap_or_else(|| self.solution.clone())
    }

    /// Loads the comment thread the first time the solution is shown.
    pub async fn present(&self) -> Result<(), AppError> {
        self.comments.present().await
    }

    pub fn vote(&self) -> &VoteController {
        &self.vote
    }

    pub fn comments(&self) -> &CommentThread {
        &self.comments
    }
}
