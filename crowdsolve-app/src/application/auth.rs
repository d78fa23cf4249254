use super::forms::{LoginDraft, MutationForm, SignupDraft, SubmitOutcome};
use crate::domain::{Session, User};
use crate::AppContext;
use crowdsolve_errors::AppError;

/// Exchanges credentials for a session and persists it for later calls.
pub async fn login(ctx: &AppContext, form: &MutationForm<LoginDraft>) -> SubmitOutcome<User> {
    let outcome = form
        .submit(|draft| async move { ctx.api.login(&draft.request()).await })
        .await;
    persist(ctx, outcome)
}

pub async fn register(ctx: &AppContext, form: &MutationForm<SignupDraft>) -> SubmitOutcome<User> {
    let outcome = form
        .submit(|draft| async move { ctx.api.register(&draft.request()).await })
        .await;
    persist(ctx, outcome)
}

/// Local only: the service keeps no server-side session to revoke.
pub fn logout(ctx: &AppContext) -> Result<(), AppError> {
    ctx.sessions.clear()
}

fn persist(ctx: &AppContext, outcome: SubmitOutcome<Session>) -> SubmitOutcome<User> {
    match outcome {
        SubmitOutcome::Delivered(session) => match ctx.sessions.save(&session) {
            Ok(()) => {
                tracing::info!("Signed in as {}", session.user.username);
                SubmitOutcome::Delivered(session.user)
            }
            Err(err) => {
                tracing::error!("Could not persist session: {}", err);
                SubmitOutcome::Failed(err)
            }
        },
        SubmitOutcome::Invalid(err) => SubmitOutcome::Invalid(err),
        SubmitOutcome::Failed(err) => SubmitOutcome::Failed(err),
        SubmitOutcome::Busy => SubmitOutcome::Busy,
    }
}
