use super::forms::{CommentDraft, MutationForm, SubmitOutcome};
use super::Mount;
use crate::domain::{Comment, SolutionId};
use crate::AppContext;
use crowdsolve_errors::AppError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ThreadState {
    presented: bool,
    loading: bool,
    error: Option<String>,
}

/// Comments under one solution, newest first.
#[derive(Clone)]
pub struct CommentThread {
    ctx: AppContext,
    solution_id: SolutionId,
    mount: Mount,
    form: MutationForm<CommentDraft>,
    state: Arc<Mutex<ThreadState>>,
}

impl CommentThread {
    pub fn new(ctx: AppContext, solution_id: SolutionId, mount: Mount) -> Self {
        Self {
            ctx,
            solution_id,
            mount,
            form: MutationForm::new(),
            state: Arc::new(Mutex::new(ThreadState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches on first presentation only; later calls are no-ops. Comments
    /// another view already loaded are reused.
    pub async fn present(&self) -> Result<(), AppError> {
        {
            let mut state = self.lock();
            if state.presented {
                return Ok(());
            }
            state.presented = true;
        }
        if self.ctx.store.comments_loaded(&self.solution_id) {
            return Ok(());
        }
        self.fetch().await
    }

    /// Explicit re-fetch, bypassing the first-presentation guard.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.lock().presented = true;
        self.fetch().await
    }

    async fn fetch(&self) -> Result<(), AppError> {
        {
            let mut state = self.lock();
            if state.loading {
                return Ok(());
            }
            state.loading = true;
        }

        let ticket = self.ctx.store.begin_comments_fetch(&self.solution_id);
        let result = self.ctx.api.list_comments(&self.solution_id).await;

        if !self.mount.is_live() {
            tracing::debug!("Dropping comments for closed view ({})", self.solution_id);
            return Ok(());
        }

        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(comments) => {
                state.error = None;
                self.ctx.store.fill_comments(ticket, comments);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Loading comments for {} failed: {}", self.solution_id, err);
                state.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.ctx.store.comments(&self.solution_id)
    }

    pub fn count(&self) -> usize {
        self.comments().len()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn form(&self) -> &MutationForm<CommentDraft> {
        &self.form
    }

    /// Posts `text`; on success it is prepended and the input cleared,
    /// on failure the input is kept for resubmission.
    pub async fn create_comment(&self, text: impl Into<String>) -> SubmitOutcome<Comment> {
        let text = text.into();
        self.form.update(|draft| draft.text = text);
        self.submit().await
    }

    pub async fn submit(&self) -> SubmitOutcome<Comment> {
        let ctx = self.ctx.clone();
        let solution_id = self.solution_id.clone();
        let outcome = self
            .form
            .submit(|draft| async move {
                let session = ctx.require_session()?;
                ctx.api
                    .create_comment(&session, &solution_id, draft.text.trim())
                    .await
            })
            .await;

        if let SubmitOutcome::Delivered(comment) = &outcome {
            self.ctx
                .store
                .prepend_comment(&self.solution_id, comment.clone());
        }
        outcome
    }
}
