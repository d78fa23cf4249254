use chrono::{DateTime, Utc};
use crowdsolve_app::application::{Layout, VoteDisplay};
use crowdsolve_app::domain::{AuthorRef, Comment, Problem, Solution};

const GRID_TITLE_WIDTH: usize = 32;

fn author(posted_by: Option<&AuthorRef>) -> &str {
    posted_by
        .and_then(|a| a.username())
        .filter(|name| !name.is_empty())
        .unwrap_or("anonymous")
}

fn date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn card(position: usize, problem: &Problem, solutions: usize, owner: bool, layout: Layout) -> String {
    let marker = if owner { " *" } else { "" };
    match layout {
        Layout::Grid => format!(
            "[{position}] {:<width$} {:<10} {}{marker}",
            truncate(&problem.title, GRID_TITLE_WIDTH),
            problem.status.as_str(),
            plural(solutions, "solution"),
            width = GRID_TITLE_WIDTH,
        ),
        Layout::List => format!(
            "[{position}] {}{marker}\n    {} | {} | {}\n    by {} on {}\n    {}",
            problem.title,
            problem.location,
            problem.status.as_str(),
            plural(solutions, "solution"),
            author(problem.posted_by.as_ref()),
            date(problem.created_at),
            problem.description,
        ),
    }
}

pub fn detail(problem: &Problem, owner: bool, orphaned: bool) -> String {
    let mut out = format!(
        "== {} ==\nLocation: {}\nStatus:   {}\nPosted:   by {} on {}\n",
        problem.title,
        problem.location,
        problem.status.as_str(),
        author(problem.posted_by.as_ref()),
        date(problem.created_at),
    );
    if let Some(image) = &problem.image {
        out.push_str(&format!("Image:    {image}\n"));
    }
    out.push('\n');
    out.push_str(&problem.description);
    if owner {
        out.push_str("\n(you posted this: edit/delete available)");
    }
    if orphaned {
        out.push_str("\n(this problem has been deleted)");
    }
    out
}

pub fn solution(position: usize, solution: &Solution, vote: VoteDisplay) -> String {
    let arrow = if vote.has_upvoted { "^" } else { " " };
    format!(
        "  {position}. [{arrow}{}] {} ({}, {})",
        vote.count,
        solution.description,
        author(solution.posted_by.as_ref()),
        date(solution.created_at),
    )
}

pub fn comment(comment: &Comment) -> String {
    format!(
        "     - {}: {}",
        author(comment.posted_by.as_ref()),
        comment.text
    )
}

pub fn error(message: &str) -> String {
    format!("! {message}")
}
