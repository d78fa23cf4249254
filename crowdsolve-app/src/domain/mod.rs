mod comment;
mod ids;
mod image_upload;
mod problem;
mod session;
mod solution;
mod user;
mod vote;

pub use comment::Comment;
pub use ids::{CommentId, ProblemId, SolutionId, UserId};
pub use image_upload::ImageUpload;
pub use problem::{Problem, ProblemStatus};
pub use session::Session;
pub use solution::Solution;
pub use user::{AuthorRef, User, UserRef};
pub use vote::UpvoteTally;
