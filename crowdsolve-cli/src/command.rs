use clap::{CommandFactory, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// One input line; its first word names the command.
#[derive(Parser, Debug)]
#[command(
    name = "crowdsolve",
    multicall = true,
    disable_help_subcommand = true,
    about = "Commands. Fields are separated by `|`."
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an account: <username>|<email>|<password>|<confirm password>
    Register {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Sign in: <email>|<password>
    Login {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Sign out of this machine.
    Logout,
    /// Show who is signed in.
    #[command(name = "whoami")]
    WhoAmI,
    /// Reload and show the problem list.
    Problems,
    /// Show problems as a compact grid.
    Grid,
    /// Show problems with their solutions.
    List,
    /// Open problem <n> in the detail view.
    Open { n: NonZeroUsize },
    /// Close the detail view.
    Close,
    /// Post a problem: <title>|<description>|<location>[|<image path>]
    Post {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Edit problem <n>: <title>|<description>|<location>[|<image path>]
    Edit {
        n: NonZeroUsize,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        fields: Vec<String>,
    },
    /// Ask to delete problem <n>.
    Delete { n: NonZeroUsize },
    /// Go ahead with the pending delete.
    Confirm,
    /// Keep the problem after all.
    Cancel,
    /// Propose a solution to problem <n>.
    Solve {
        n: NonZeroUsize,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Toggle your upvote on solution <n> of the open problem.
    Upvote { n: NonZeroUsize },
    /// Show comments of solution <n> of the open problem.
    Comments { n: NonZeroUsize },
    /// Comment on solution <n> of the open problem.
    Comment {
        n: NonZeroUsize,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Show this help.
    #[command(alias = "?")]
    Help,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, clap::Error> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        Line::try_parse_from(words).map(|line| Some(line.command))
    }
}

pub fn help() -> String {
    Line::command().render_help().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub image: Option<PathBuf>,
}

/// Free text as typed, with runs of whitespace collapsed.
pub fn text(words: &[String]) -> String {
    words.join(" ")
}

fn split_fields(words: &[String]) -> Vec<String> {
    text(words)
        .split('|')
        .map(|field| field.trim().to_string())
        .collect()
}

/// Empty fields are passed through; the forms decide what is missing.
pub fn exactly<const N: usize>(words: &[String], name: &str) -> Result<[String; N], String> {
    split_fields(words)
        .try_into()
        .map_err(|_| format!("`{name}` takes {N} fields separated by `|`"))
}

pub fn problem_fields(words: &[String]) -> Result<ProblemFields, String> {
    let mut parts = split_fields(words).into_iter();
    let mut next = || parts.next().unwrap_or_default();
    let (title, description, location, image) = (next(), next(), next(), next());
    if parts.next().is_some() {
        return Err("Too many fields; expected title|description|location[|image]".to_string());
    }

    Ok(ProblemFields {
        title,
        description,
        location,
        image: (!image.is_empty()).then(|| PathBuf::from(image)),
    })
}
