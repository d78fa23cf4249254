use crate::domain::{ImageUpload, Problem};
use crate::infrastructure::api::{LoginRequest, ProblemPayload, RegisterRequest};
use crowdsolve_errors::AppError;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Field values a form collects before submission.
pub trait Draft: Clone + Default + Send + 'static {
    /// First required field left blank, if any. Whitespace counts as blank.
    fn missing_field(&self) -> Option<&'static str>;

    fn check(&self) -> Result<(), AppError> {
        match self.missing_field() {
            Some(field) => Err(AppError::validation(field)),
            None => Ok(()),
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Left out of the request entirely when `None`.
    pub image: Option<ImageUpload>,
}

impl ProblemDraft {
    pub fn payload(&self) -> ProblemPayload<'_> {
        ProblemPayload {
            title: &self.title,
            description: &self.description,
            location: &self.location,
            image: self.image.as_ref(),
        }
    }
}

/// Pre-populates the edit form; the stored image is kept unless a new one is chosen.
impl From<&Problem> for ProblemDraft {
    fn from(problem: &Problem) -> Self {
        Self {
            title: problem.title.clone(),
            description: problem.description.clone(),
            location: problem.location.clone(),
            image: None,
        }
    }
}

impl Draft for ProblemDraft {
    fn missing_field(&self) -> Option<&'static str> {
        if blank(&self.title) {
            Some("title")
        } else if blank(&self.description) {
            Some("description")
        } else if blank(&self.location) {
            Some("location")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionDraft {
    pub description: String,
}

impl Draft for SolutionDraft {
    fn missing_field(&self) -> Option<&'static str> {
        blank(&self.description).then_some("description")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
}

impl Draft for CommentDraft {
    fn missing_field(&self) -> Option<&'static str> {
        blank(&self.text).then_some("text")
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginDraft {
    pub email: String,
    pub password: String,
}

impl LoginDraft {
    pub fn request(&self) -> LoginRequest<'_> {
        LoginRequest {
            email: self.email.trim(),
            password: &self.password,
        }
    }
}

impl Draft for LoginDraft {
    fn missing_field(&self) -> Option<&'static str> {
        if blank(&self.email) {
            Some("email")
        } else if self.password.is_empty() {
            Some("password")
        } else {
            None
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignupDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupDraft {
    /// The confirmation never leaves the client.
    pub fn request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            username: self.username.trim(),
            email: self.email.trim(),
            password: &self.password,
        }
    }
}

impl Draft for SignupDraft {
    fn missing_field(&self) -> Option<&'static str> {
        if blank(&self.username) {
            Some("username")
        } else if blank(&self.email) {
            Some("email")
        } else if self.password.is_empty() {
            Some("password")
        } else if self.confirm_password.is_empty() {
            Some("confirm password")
        } else {
            None
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if let Some(field) = self.missing_field() {
            return Err(AppError::validation(field));
        }
        if self.password != self.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
}

#[derive(Debug)]
pub enum SubmitOutcome<T> {
    /// The service accepted the request; the result goes to the owning view.
    Delivered(T),
    /// Blocked client-side; no request was sent.
    Invalid(AppError),
    Failed(AppError),
    /// A submission from this form is already in flight.
    Busy,
}

impl<T> SubmitOutcome<T> {
    pub fn delivered(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Invalid(err) | Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterSuccess {
    Reset,
    Keep,
}

struct FormInner<D> {
    draft: D,
    state: FormState,
    error: Option<String>,
    open: bool,
}

/// The one submit state machine behind every create/edit form:
/// `Idle -> Submitting -> Idle`, closing on success and keeping the draft on failure.
pub struct MutationForm<D> {
    inner: Arc<Mutex<FormInner<D>>>,
    after_success: AfterSuccess,
}

impl<D> Clone for MutationForm<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            after_success: self.after_success,
        }
    }
}

impl<D: Draft> MutationForm<D> {
    /// A create form: the draft is cleared once delivered.
    pub fn new() -> Self {
        Self::with(AfterSuccess::Reset)
    }

    /// An edit form: the draft is supplied by [`MutationForm::open_with`].
    pub fn for_edit() -> Self {
        Self::with(AfterSuccess::Keep)
    }

    fn with(after_success: AfterSuccess) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FormInner {
                draft: D::default(),
                state: FormState::Idle,
                error: None,
                open: false,
            })),
            after_success,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormInner<D>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) {
        let mut inner = self.lock();
        inner.open = true;
        inner.error = None;
    }

    pub fn open_with(&self, draft: D) {
        let mut inner = self.lock();
        inner.draft = draft;
        inner.open = true;
        inner.error = None;
    }

    pub fn close(&self) {
        let mut inner = self.lock();
        inner.open = false;
        inner.error = None;
        if self.after_success == AfterSuccess::Reset {
            inner.draft = D::default();
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn draft(&self) -> D {
        self.lock().draft.clone()
    }

    pub fn update(&self, edit: impl FnOnce(&mut D)) {
        edit(&mut self.lock().draft);
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn state(&self) -> FormState {
        self.lock().state
    }

    pub fn is_submitting(&self) -> bool {
        self.state() == FormState::Submitting
    }

    /// Validates, then hands a snapshot of the draft to `request`.
    pub async fn submit<T, F, Fut>(&self, request: F) -> SubmitOutcome<T>
    where
        F: FnOnce(D) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let draft = {
            let mut inner = self.lock();
            if inner.state == FormState::Submitting {
                return SubmitOutcome::Busy;
            }
            if let Err(err) = inner.draft.check() {
                inner.error = Some(err.user_message().to_string());
                return SubmitOutcome::Invalid(err);
            }
            inner.state = FormState::Submitting;
            inner.error = None;
            inner.draft.clone()
        };

        let mut guard = SubmitGuard {
            inner: Arc::clone(&self.inner),
            armed: true,
        };
        let result = request(draft).await;
        guard.armed = false;

        let mut inner = self.lock();
        inner.state = FormState::Idle;
        match result {
            Ok(value) => {
                inner.error = None;
                inner.open = false;
                if self.after_success == AfterSuccess::Reset {
                    inner.draft = D::default();
                }
                SubmitOutcome::Delivered(value)
            }
            Err(err) => {
                inner.error = Some(err.user_message().to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }
}

impl<D: Draft> Default for MutationForm<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the form to `Idle` if the submission future is dropped mid-flight.
struct SubmitGuard<D> {
    inner: Arc<Mutex<FormInner<D>>>,
    armed: bool,
}

impl<D> Drop for SubmitGuard<D> {
    fn drop(&mut self) {
        if self.armed {
            self.inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .state = FormState::Idle;
        }
    }
}
