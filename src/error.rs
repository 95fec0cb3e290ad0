//! Error types for graph walks.
//!
//! Every failure a walk can produce is a [`CommandError`]. The display text of
//! each variant is what the user sees on stderr, so the wording is part of the
//! contract and covered by tests.

use thiserror::Error;

/// Errors produced while matching input against a command graph.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An argument received fewer tokens than its minimum arity.
    #[error("Argument \"{name}\" requires at least {min} argument{}, got {got}", plural(.min))]
    NotEnoughArgs { name: String, min: usize, got: usize },

    /// A token could not be parsed as the argument's declared type.
    #[error("failed to parse \"{token}\" as {kind}: {message}")]
    Conversion {
        token: String,
        kind: &'static str,
        message: String,
    },

    /// A validator rejected the typed value.
    #[error("validation for \"{name}\" failed: [{validator}] {message}")]
    Validation {
        name: String,
        validator: String,
        message: String,
    },

    /// A transformer failed or broke the type/length invariant.
    #[error("transformer for \"{name}\" {message}")]
    Transform { name: String, message: String },

    /// A default function returned an error.
    #[error("failed to get default: {message}")]
    Default { message: String },

    /// A flag appeared twice in the same invocation.
    #[error("Flag \"{name}\" is already set")]
    FlagAlreadySet { name: String },

    /// A combined short-flag token contained a letter with no flag behind it.
    #[error("Unknown flag code \"{code}\" used in multi-flag \"{token}\"")]
    UnknownFlagCode { code: char, token: String },

    /// A branch token matched no key and there is no default node.
    #[error("Branching argument must be one of [{}]", .keys.join(" "))]
    Branch { keys: Vec<String> },

    /// Complete-for-execute found no candidate.
    #[error("nil completion returned for \"{name}\"")]
    NilCompletion { name: String },

    /// Complete-for-execute found more than one candidate.
    #[error(
        "requires exactly one suggestion to be returned for \"{name}\", got {}: [{}]",
        .suggestions.len(),
        .suggestions.join(" ")
    )]
    AmbiguousCompletion {
        name: String,
        suggestions: Vec<String>,
    },

    /// A completer returned an error.
    #[error("failed to fetch completion for \"{name}\": {message}")]
    CompletionFetch { name: String, message: String },

    /// Tokens were left over after the walk finished.
    #[error("Unprocessed extra args: [{}]", .args.join(" "))]
    ExtraArgs { args: Vec<String> },

    /// A bash snippet used to populate a value failed.
    #[error("failed to execute bash command for \"{name}\": {message}")]
    Bash { name: String, message: String },

    /// An executable-line producer or deferred executor failed.
    #[error("{0}")]
    Execution(String),

    /// The invocation named a CLI that is not registered.
    #[error("unknown CLI \"{0}\"")]
    UnknownCli(String),

    /// The invocation started with an unsupported verb.
    #[error("unknown verb \"{0}\" (expected execute, autocomplete or usage)")]
    UnknownVerb(String),
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl CommandError {
    /// True for arity shortfalls, the one error kind completion turns into a
    /// suggestion request.
    pub fn is_not_enough_args(&self) -> bool {
        matches!(self, CommandError::NotEnoughArgs { .. })
    }

    /// True for leftover-token failures.
    pub fn is_extra_args(&self) -> bool {
        matches!(self, CommandError::ExtraArgs { .. })
    }

    /// True for the three complete-for-execute failures that best-effort
    /// resolution swallows.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            CommandError::NilCompletion { .. }
                | CommandError::AmbiguousCompletion { .. }
                | CommandError::CompletionFetch { .. }
        )
    }

    /// Short machine-readable kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::NotEnoughArgs { .. } => "arity",
            CommandError::Conversion { .. } => "conversion",
            CommandError::Validation { .. } => "validation",
            CommandError::Transform { .. } => "transform",
            CommandError::Default { .. } => "default",
            CommandError::FlagAlreadySet { .. } | CommandError::UnknownFlagCode { .. } => "flag",
            CommandError::Branch { .. } => "branch",
            CommandError::NilCompletion { .. }
            | CommandError::AmbiguousCompletion { .. }
            | CommandError::CompletionFetch { .. } => "complete_for_execute",
            CommandError::ExtraArgs { .. } => "extra_args",
            CommandError::Bash { .. } => "bash",
            CommandError::Execution(_) => "execution",
            CommandError::UnknownCli(_) | CommandError::UnknownVerb(_) => "invocation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enough_args_pluralizes() {
        let one = CommandError::NotEnoughArgs {
            name: "FILE".to_string(),
            min: 1,
            got: 0,
        };
        assert_eq!(
            one.to_string(),
            "Argument \"FILE\" requires at least 1 argument, got 0"
        );

        let many = CommandError::NotEnoughArgs {
            name: "FILES".to_string(),
            min: 3,
            got: 2,
        };
        assert_eq!(
            many.to_string(),
            "Argument \"FILES\" requires at least 3 arguments, got 2"
        );
        assert!(many.is_not_enough_args());
        assert_eq!(many.kind(), "arity");
    }

    #[test]
    fn test_ambiguous_completion_message() {
        let err = CommandError::AmbiguousCompletion {
            name: "GREETING".to_string(),
            suggestions: vec!["Hello".into(), "Hello!".into(), "HelloThere".into()],
        };
        assert_eq!(
            err.to_string(),
            "requires exactly one suggestion to be returned for \"GREETING\", got 3: [Hello Hello! HelloThere]"
        );
        assert!(err.is_resolution());
    }

    #[test]
    fn test_extra_args_message() {
        let err = CommandError::ExtraArgs {
            args: vec!["ghi".into(), "jkl".into()],
        };
        assert_eq!(err.to_string(), "Unprocessed extra args: [ghi jkl]");
        assert!(err.is_extra_args());
    }
}
