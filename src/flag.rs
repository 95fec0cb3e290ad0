//! Flag registry: long/short lookup and combined short flags.

use std::collections::BTreeSet;

use crate::argument::Argument;
use crate::completion::Completion;
use crate::error::CommandError;
use crate::value::ValueType;
use crate::walker::{Completed, Mode, Step, Walk};

/// A single flag definition.
///
/// The long name is the argument name (`--name`). Only boolean flags are
/// combinable into `-abc` tokens.
#[derive(Debug, Clone)]
pub struct Flag {
    argument: Argument,
    short: Option<char>,
    combinable: bool,
}

impl Flag {
    /// Value-taking flag; the argument's arity applies to the tokens after it.
    pub fn new(argument: Argument) -> Self {
        Self {
            argument,
            short: None,
            combinable: false,
        }
    }

    /// Presence flag, `false` unless given.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            argument: Argument::new(name, ValueType::Bool)
                .with_arity(0, Some(0))
                .with_default(false),
            short: None,
            combinable: true,
        }
    }

    pub fn with_short(mut self, code: char) -> Self {
        self.short = Some(code);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.argument = self.argument.with_description(description);
        self
    }

    pub fn name(&self) -> &str {
        self.argument.name()
    }

    /// `--name` spelling.
    pub fn long(&self) -> String {
        format!("--{}", self.name())
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn is_boolean(&self) -> bool {
        self.combinable
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// Check if this definition matches the given token.
    pub fn matches(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return long == self.name();
        }
        match (token.strip_prefix('-'), self.short) {
            (Some(rest), Some(code)) => {
                let mut chars = rest.chars();
                chars.next() == Some(code) && chars.next().is_none()
            }
            _ => false,
        }
    }
}

/// How one token relates to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagToken<'a> {
    /// `--name` or `-c` naming a registered flag.
    Single(&'a Flag),
    /// `-abc` where every letter is a combinable flag.
    Combined(Vec<&'a Flag>),
    /// Anything else, including unknown `--x` and negative numbers.
    Positional,
}

impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

/// The flags of one command, processed as a unit.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    flags: Vec<Flag>,
}

impl FlagRegistry {
    pub fn new(flags: Vec<Flag>) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn find(&self, token: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.matches(token))
    }

    fn find_short(&self, code: char) -> Option<&Flag> {
        self.flags.iter().find(|f| f.short == Some(code))
    }

    /// Classify a token against the registry.
    pub fn classify(&self, token: &str) -> Result<FlagToken<'_>, CommandError> {
        if let Some(flag) = self.find(token) {
            return Ok(FlagToken::Single(flag));
        }

        let Some(codes) = token.strip_prefix('-') else {
            return Ok(FlagToken::Positional);
        };
        if codes.chars().count() < 2 || !codes.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(FlagToken::Positional);
        }

        let mut flags = Vec::new();
        for code in codes.chars() {
            let flag = self
                .find_short(code)
                .ok_or_else(|| CommandError::UnknownFlagCode {
                    code,
                    token: token.to_string(),
                })?;
            flags.push(flag);
        }
        // A value flag inside the group means this was never a multi-flag.
        if flags.iter().any(|f| !f.combinable) {
            return Ok(FlagToken::Positional);
        }
        Ok(FlagToken::Combined(flags))
    }

    /// Pull registered flags out of the remaining input.
    ///
    /// Tokens are scanned left to right from the cursor. Value flags match
    /// their argument at the flag's own position, treating registered flag
    /// spellings as list breakers. Flags not seen get their defaults.
    pub(crate) fn process(&self, w: &mut Walk<'_>) -> Result<Step, CommandError> {
        let base = w.input.cursor();
        let result = self.scan(w, base);
        w.input.set_cursor(base);
        result
    }

    fn scan(&self, w: &mut Walk<'_>, base: usize) -> Result<Step, CommandError> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut position = 0;

        while let Some(token) = w.input.peek_at(position).map(str::to_string) {
            if w.mode == Mode::Complete && token.starts_with('-') && w.input.is_final(position) {
                return Ok(Step::Suggest(self.suggest(&token, &seen)));
            }

            match self.classify(&token)? {
                FlagToken::Positional => position += 1,
                FlagToken::Single(flag) => {
                    w.input.pop_at(position);
                    if !seen.insert(flag.name()) {
                        return Err(CommandError::FlagAlreadySet {
                            name: flag.name().to_string(),
                        });
                    }
                    tracing::debug!(flag = flag.name(), "flag set");

                    if flag.combinable {
                        w.data.set(flag.name(), true);
                        continue;
                    }
                    w.input.set_cursor(base + position);
                    let is_flag = |t: &str| self.find(t).is_some();
                    let step = flag.argument.process(w, &is_flag);
                    w.input.set_cursor(base);
                    if let Step::Suggest(completed) = step? {
                        return Ok(Step::Suggest(completed));
                    }
                }
                FlagToken::Combined(flags) => {
                    w.input.pop_at(position);
                    for flag in flags {
                        if !seen.insert(flag.name()) {
                            return Err(CommandError::FlagAlreadySet {
                                name: flag.name().to_string(),
                            });
                        }
                        w.data.set(flag.name(), true);
                    }
                    tracing::debug!(token = %token, "combined flags set");
                }
            }
        }

        for flag in self.flags.iter().filter(|f| !seen.contains(f.name())) {
            flag.argument.apply_default(w)?;
        }
        Ok(Step::Continue)
    }

    /// `--long` names of flags not set yet.
    fn suggest(&self, partial: &str, seen: &BTreeSet<&str>) -> Completed {
        let names: Vec<String> = self
            .flags
            .iter()
            .filter(|f| !seen.contains(f.name()))
            .map(Flag::long)
            .collect();
        Completed::new(Completion::new(names).filter(partial, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FlagRegistry {
        FlagRegistry::new(vec![
            Flag::boolean("quiet").with_short('q'),
            Flag::boolean("wide").with_short('w'),
            Flag::new(Argument::string("name")).with_short('n'),
        ])
    }

    #[test]
    fn test_classify_single() {
        let r = registry();
        assert!(matches!(r.classify("--quiet").unwrap(), FlagToken::Single(f) if f.name() == "quiet"));
        assert!(matches!(r.classify("-n").unwrap(), FlagToken::Single(f) if f.name() == "name"));
        assert_eq!(r.classify("--nope").unwrap(), FlagToken::Positional);
        assert_eq!(r.classify("-5").unwrap(), FlagToken::Positional);
        assert_eq!(r.classify("plain").unwrap(), FlagToken::Positional);
    }

    #[test]
    fn test_classify_combined() {
        let r = registry();
        match r.classify("-qw").unwrap() {
            FlagToken::Combined(flags) => {
                let names: Vec<&str> = flags.iter().map(|f| f.name()).collect();
                assert_eq!(names, ["quiet", "wide"]);
            }
            other => panic!("expected combined flags, got {:?}", other),
        }
        assert_eq!(r.classify("-qn").unwrap(), FlagToken::Positional);
        assert_eq!(
            r.classify("-qx").unwrap_err().to_string(),
            "Unknown flag code \"x\" used in multi-flag \"-qx\""
        );
    }

    #[test]
    fn test_long_spelling() {
        let flag = Flag::boolean("dry-run");
        assert_eq!(flag.long(), "--dry-run");
        assert!(flag.matches("--dry-run"));
        assert!(!flag.matches("-d"));
        assert!(flag.is_boolean());
    }
}
