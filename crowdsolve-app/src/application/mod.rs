mod actions;
pub mod auth;
mod card;
mod collection;
mod comments;
mod detail;
mod forms;
mod list_view;
mod mount;
mod ownership;
mod solution_view;
mod solutions;
mod store;
mod vote;

pub use actions::{DeleteOutcome, DeletePhase, ProblemActions};
pub use card::{Layout, ProblemCard};
pub use collection::{Collection, Entity};
pub use comments::CommentThread;
pub use detail::DetailOverlay;
pub use forms::{
    CommentDraft, Draft, FormState, LoginDraft, MutationForm, ProblemDraft, SignupDraft,
    SolutionDraft, SubmitOutcome,
};
pub use list_view::ListView;
pub use mount::Mount;
pub use ownership::is_owner;
pub use solution_view::SolutionPresentation;
pub use solutions::SolutionsPanel;
pub use store::{EntityStore, FetchTicket, RecordedTally, StoreEvent};
pub use vote::{VoteController, VoteDisplay, VoteOutcome};
