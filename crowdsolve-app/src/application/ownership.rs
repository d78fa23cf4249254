use crate::domain::{Problem, User};

/// Whether the edit/delete affordance is shown for `problem`.
///
/// This only hides controls. The service enforces ownership on its own.
pub fn is_owner(current_user: Option<&User>, problem: &Problem) -> bool {
    let Some(user) = current_user else {
        return false;
    };
    problem
        .posted_by
        .as_ref()
        .and_then(|author| author.resolved())
        .is_some_and(|author| author.id == user.id)
}
