//! Input token cursor.
//!
//! Tokens are never removed from the underlying list. Consumption is tracked as
//! a sorted list of unconsumed token indices, and speculative work is undone
//! through a journal of consumption records rather than by copying tokens.
//!
//! ```text
//! tokens     [a, --flag, b, c]
//! remaining  [0, 2, 3]          (--flag consumed)
//! cursor     0                  (pops happen at remaining[cursor])
//! ```

use crate::error::CommandError;

/// Handle returned by [`Input::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(usize);

/// Decision for one token during [`Input::pop_n`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    /// Consume the token as a value.
    Value,
    /// Stop before the token, leaving it for whatever follows.
    Break,
    /// Consume the token without keeping it, then stop.
    Discard,
}

/// Tokens consumed by one [`Input::pop_n`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Popped {
    pub values: Vec<String>,
    /// Token index of each value, parallel to `values`.
    pub indices: Vec<usize>,
    /// Whether a break/discard decision ended the pop.
    pub broken: bool,
}

#[derive(Debug, Clone)]
enum Entry {
    Used { position: usize, index: usize },
    Replaced { index: usize, previous: String },
    Appended,
    Pushed { at: usize, position: usize, count: usize },
}

/// Ordered token stream with a cursor and nested rollback points.
#[derive(Debug, Clone, Default)]
pub struct Input {
    tokens: Vec<String>,
    remaining: Vec<usize>,
    cursor: usize,
    journal: Vec<Entry>,
    snapshots: Vec<usize>,
    /// Tokens added by [`Input::append_used`]. They always sit at the tail.
    appended: usize,
}

impl Input {
    pub fn new(tokens: Vec<String>) -> Self {
        let remaining = (0..tokens.len()).collect();
        Self {
            tokens,
            remaining,
            ..Self::default()
        }
    }

    /// Build input from a shell completion line (see [`parse_comp_line`]).
    pub fn from_comp_line(line: &str) -> Self {
        Self::new(parse_comp_line(line))
    }

    /// Every token, consumed or not, in stream order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Indices of tokens not yet consumed, in stream order.
    pub fn remaining(&self) -> &[usize] {
        &self.remaining
    }

    /// Literal unconsumed tokens, in stream order.
    pub fn leftover(&self) -> Vec<String> {
        self.remaining
            .iter()
            .map(|&i| self.tokens[i].clone())
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to an offset within the unconsumed tokens.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.remaining.len());
    }

    pub fn peek(&self) -> Option<&str> {
        self.peek_at(0)
    }

    /// Token `offset` positions after the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<&str> {
        self.remaining
            .get(self.cursor + offset)
            .map(|&i| self.tokens[i].as_str())
    }

    pub fn pop(&mut self) -> Option<String> {
        self.pop_at(0)
    }

    /// Consume the token `offset` positions after the cursor.
    pub fn pop_at(&mut self, offset: usize) -> Option<String> {
        let position = self.cursor + offset;
        if position >= self.remaining.len() {
            return None;
        }
        let index = self.remaining.remove(position);
        self.record(Entry::Used { position, index });
        Some(self.tokens[index].clone())
    }

    /// Consume up to `max` tokens at the cursor (`None` is unbounded),
    /// asking `check` about each token before it is taken.
    pub fn pop_n(&mut self, max: Option<usize>, mut check: impl FnMut(&str) -> Take) -> Popped {
        let mut popped = Popped::default();
        while max.map_or(true, |m| popped.values.len() < m) {
            let Some(&index) = self.remaining.get(self.cursor) else {
                break;
            };
            match check(&self.tokens[index]) {
                Take::Value => {
                    if let Some(value) = self.pop() {
                        popped.values.push(value);
                        popped.indices.push(index);
                    }
                }
                Take::Break => {
                    popped.broken = true;
                    break;
                }
                Take::Discard => {
                    self.pop();
                    popped.broken = true;
                    break;
                }
            }
        }
        popped
    }

    /// Mark a token as consumed by its index. Returns false if it already was.
    pub fn mark_used(&mut self, index: usize) -> bool {
        let Some(position) = self.remaining.iter().position(|&i| i == index) else {
            return false;
        };
        self.remaining.remove(position);
        if position < self.cursor {
            self.cursor -= 1;
        }
        self.record(Entry::Used { position, index });
        true
    }

    /// Overwrite a token's text, e.g. with a resolved completion.
    pub fn replace(&mut self, index: usize, value: impl Into<String>) {
        if let Some(token) = self.tokens.get_mut(index) {
            let previous = std::mem::replace(token, value.into());
            self.record(Entry::Replaced { index, previous });
        }
    }

    /// Append a token that is consumed from the start. Returns its index.
    pub fn append_used(&mut self, value: impl Into<String>) -> usize {
        self.tokens.push(value.into());
        self.appended += 1;
        self.record(Entry::Appended);
        self.tokens.len() - 1
    }

    /// Insert tokens ahead of the next unconsumed token.
    pub fn push_front(&mut self, tokens: Vec<String>) {
        if tokens.is_empty() {
            return;
        }
        let count = tokens.len();
        let position = self.cursor;
        let at = self
            .remaining
            .get(position)
            .copied()
            .unwrap_or(self.tokens.len() - self.appended);

        self.shift(at, count as isize);
        self.tokens.splice(at..at, tokens);
        self.remaining.splice(position..position, at..at + count);
        self.record(Entry::Pushed {
            at,
            position,
            count,
        });
    }

    /// No unconsumed token is left at or after the cursor.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.remaining.len()
    }

    /// Every token has been consumed.
    pub fn fully_processed(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Whether the token `offset` positions after the cursor is the last
    /// token of the stream (the word being completed).
    pub fn is_final(&self, offset: usize) -> bool {
        let typed = self.tokens.len() - self.appended;
        match self.remaining.get(self.cursor + offset) {
            Some(&index) => index + 1 == typed,
            None => false,
        }
    }

    /// Fail with the leftover tokens if anything was not consumed.
    pub fn check_processed(&self) -> Result<(), CommandError> {
        if self.fully_processed() {
            return Ok(());
        }
        Err(CommandError::ExtraArgs {
            args: self.leftover(),
        })
    }

    /// Open a rollback point. Snapshots nest.
    pub fn snapshot(&mut self) -> Snapshot {
        self.snapshots.push(self.journal.len());
        Snapshot(self.snapshots.len() - 1)
    }

    /// Undo everything recorded since `snapshot` and close it along with any
    /// snapshot opened after it.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let Some(&mark) = self.snapshots.get(snapshot.0) else {
            return;
        };
        while self.journal.len() > mark {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.snapshots.truncate(snapshot.0);
        self.forget_if_unwatched();
    }

    /// Close `snapshot` (and any nested in it) keeping its effects.
    pub fn release(&mut self, snapshot: Snapshot) {
        if snapshot.0 < self.snapshots.len() {
            self.snapshots.truncate(snapshot.0);
        }
        self.forget_if_unwatched();
    }

    fn record(&mut self, entry: Entry) {
        if !self.snapshots.is_empty() {
            self.journal.push(entry);
        }
    }

    fn forget_if_unwatched(&mut self) {
        if self.snapshots.is_empty() {
            self.journal.clear();
        }
    }

    fn undo(&mut self, entry: Entry) {
        match entry {
            Entry::Used { position, index } => {
                let position = position.min(self.remaining.len());
                self.remaining.insert(position, index);
                if position < self.cursor {
                    self.cursor += 1;
                }
            }
            Entry::Replaced { index, previous } => {
                if let Some(token) = self.tokens.get_mut(index) {
                    *token = previous;
                }
            }
            Entry::Appended => {
                self.tokens.pop();
                self.appended -= 1;
            }
            Entry::Pushed {
                at,
                position,
                count,
            } => {
                self.remaining.drain(position..position + count);
                self.tokens.drain(at..at + count);
                self.shift(at + count, -(count as isize));
            }
        }
        self.cursor = self.cursor.min(self.remaining.len());
    }

    /// Shift every recorded index at or above `from` by `delta`.
    fn shift(&mut self, from: usize, delta: isize) {
        let moved = |i: &mut usize| {
            if *i >= from {
                *i = (*i as isize + delta) as usize;
            }
        };
        for index in self.remaining.iter_mut() {
            moved(index);
        }
        for entry in &mut self.journal {
            match entry {
                Entry::Used { index, .. } | Entry::Replaced { index, .. } => moved(index),
                Entry::Pushed { at, .. } => moved(at),
                Entry::Appended => {}
            }
        }
    }
}

/// Split a shell completion line into words.
///
/// Single quotes, double quotes and backslash escapes group characters into
/// one word. A line that ends in unquoted whitespace (or is empty) gets a final
/// empty word, since that is the word being completed.
pub fn parse_comp_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    in_word = true;
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }

    // Unterminated quotes still count as the (partial) last word.
    if in_word || quote.is_some() {
        words.push(current);
    } else {
        words.push(String::new());
    }
    words
}
