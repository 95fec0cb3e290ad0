//! Argument declarations and the matching routine shared by both walkers.
//!
//! Matching pipeline for one argument:
//! - Stage 1: pop up to `max` tokens, stopping at a list breaker
//! - Stage 2: complete mode hands the final word to the completer and stops
//! - Stage 3: complete-for-execute rewrites abbreviated tokens
//! - Stage 4: arity check, or the default for an empty optional argument
//! - Stage 5: conversion, validation, transformation, store

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::completion::Completer;
use crate::data::Data;
use crate::env::Env;
use crate::error::CommandError;
use crate::input::Take;
use crate::resolve::{self, CompleteForExecute};
use crate::value::{Value, ValueType};
use crate::walker::{Completed, Mode, Step, Walk};

/// Stop predicate that never stops.
pub(crate) fn never(_: &str) -> bool {
    false
}

// ============================================================================
// Validators
// ============================================================================

type CheckFn = Rc<dyn Fn(&Value, &Data) -> Result<()>>;

/// Named check run on the typed value before it is stored.
#[derive(Clone)]
pub struct Validator {
    name: String,
    check: CheckFn,
}

impl Validator {
    pub fn new(name: impl Into<String>, check: impl Fn(&Value, &Data) -> Result<()> + 'static) -> Self {
        Self {
            name: name.into(),
            check: Rc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every token of the value must be one of `options`.
    pub fn one_of<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        Self::new("OneOf", move |value, _| {
            for token in value.to_tokens() {
                if !options.contains(&token) {
                    bail!("{:?} is not one of [{}]", token, options.join(" "));
                }
            }
            Ok(())
        })
    }

    /// Strings must not be empty; lists must have at least one element.
    pub fn non_empty() -> Self {
        Self::new("NonEmpty", |value, _| {
            if length(value) == 0 {
                bail!("value must not be empty");
            }
            Ok(())
        })
    }

    /// String length in characters, or list length, must be at least `min`.
    pub fn min_length(min: usize) -> Self {
        Self::new("MinLength", move |value, _| {
            let len = length(value);
            if len < min {
                bail!("length must be at least {}, got {}", min, len);
            }
            Ok(())
        })
    }

    /// String length in characters, or list length, must be at most `max`.
    pub fn max_length(max: usize) -> Self {
        Self::new("MaxLength", move |value, _| {
            let len = length(value);
            if len > max {
                bail!("length must be at most {}, got {}", max, len);
            }
            Ok(())
        })
    }

    pub fn positive() -> Self {
        Self::new("Positive", |value, _| {
            for n in numbers(value)? {
                if n <= 0.0 {
                    bail!("value must be positive, got {}", n);
                }
            }
            Ok(())
        })
    }

    pub fn non_negative() -> Self {
        Self::new("NonNegative", |value, _| {
            for n in numbers(value)? {
                if n < 0.0 {
                    bail!("value must be non-negative, got {}", n);
                }
            }
            Ok(())
        })
    }

    /// Every number must lie in `[lo, hi]`.
    pub fn between(lo: f64, hi: f64) -> Self {
        Self::new("Between", move |value, _| {
            for n in numbers(value)? {
                if n < lo || n > hi {
                    bail!("value must be between {} and {}, got {}", lo, hi, n);
                }
            }
            Ok(())
        })
    }

    /// List elements must not repeat.
    pub fn distinct_values() -> Self {
        Self::new("Distinct", |value, _| {
            let mut seen = BTreeSet::new();
            for token in value.to_tokens() {
                if !seen.insert(token.clone()) {
                    bail!("duplicate value {:?}", token);
                }
            }
            Ok(())
        })
    }

    fn check(&self, value: &Value, data: &Data) -> Result<()> {
        (self.check)(value, data)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({})", self.name)
    }
}

fn length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.len(),
    }
}

fn numbers(value: &Value) -> Result<Vec<f64>> {
    match value {
        Value::Int(i) => Ok(vec![*i as f64]),
        Value::Float(f) => Ok(vec![*f]),
        Value::IntList(v) => Ok(v.iter().map(|i| *i as f64).collect()),
        Value::FloatList(v) => Ok(v.clone()),
        other => bail!("expects a numeric value, got {}", other.value_type().kind()),
    }
}

// ============================================================================
// Transformers
// ============================================================================

type TransformFn = Rc<dyn Fn(Value, &Data, &Env) -> Result<Value>>;

/// Rewrites the typed value before it is stored. Must keep the type and, for
/// lists, the length.
#[derive(Clone)]
pub struct Transformer {
    f: TransformFn,
}

impl Transformer {
    pub fn new(f: impl Fn(Value, &Data) -> Result<Value> + 'static) -> Self {
        Self {
            f: Rc::new(move |value: Value, data: &Data, _env: &Env| f(value, data)),
        }
    }

    /// Transformer that also needs the injected collaborators.
    pub fn with_env(f: impl Fn(Value, &Data, &Env) -> Result<Value> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    pub fn trim() -> Self {
        Self::new(|value, _| map_strings(value, |s| Ok(s.trim().to_string())))
    }

    pub fn lowercase() -> Self {
        Self::new(|value, _| map_strings(value, |s| Ok(s.to_lowercase())))
    }

    pub fn uppercase() -> Self {
        Self::new(|value, _| map_strings(value, |s| Ok(s.to_uppercase())))
    }

    /// Resolve paths against the working directory of the injected filesystem.
    pub fn absolute_path() -> Self {
        Self::with_env(|value, _, env| {
            map_strings(value, |s| {
                let path = env.fs().absolute(Path::new(s))?;
                Ok(path.to_string_lossy().into_owned())
            })
        })
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transformer")
    }
}

fn map_strings(value: Value, f: impl Fn(&str) -> Result<String>) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(f(&s)?)),
        Value::StringList(v) => Ok(Value::StringList(
            v.iter().map(|s| f(s)).collect::<Result<_>>()?,
        )),
        other => bail!("expects string values, got {}", other.value_type().kind()),
    }
}

// ============================================================================
// Defaults and list breakers
// ============================================================================

type DefaultFn = Rc<dyn Fn(&Data, &Env) -> Result<Value>>;

#[derive(Clone)]
enum DefaultValue {
    Static(Value),
    Func(DefaultFn),
}

/// Ends a list argument early when a token matches.
#[derive(Clone)]
pub struct ListBreaker {
    matches: Rc<dyn Fn(&str) -> bool>,
    discard: bool,
}

impl ListBreaker {
    pub fn new(matches: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            matches: Rc::new(matches),
            discard: false,
        }
    }

    /// Break at the first token equal to `sentinel`.
    pub fn until(sentinel: impl Into<String>) -> Self {
        let sentinel = sentinel.into();
        Self::new(move |token| token == sentinel)
    }

    /// Consume the breaking token instead of leaving it for what follows.
    pub fn discard(mut self) -> Self {
        self.discard = true;
        self
    }

    fn take(&self, token: &str) -> Option<Take> {
        if !(self.matches)(token) {
            return None;
        }
        Some(if self.discard { Take::Discard } else { Take::Break })
    }
}

impl fmt::Debug for ListBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBreaker")
            .field("discard", &self.discard)
            .finish()
    }
}

// ============================================================================
// Argument
// ============================================================================

/// A named, typed positional value with its arity and hooks.
#[derive(Clone)]
pub struct Argument {
    name: String,
    description: String,
    value_type: ValueType,
    min: usize,
    /// `None` is unbounded.
    max: Option<usize>,
    validators: Vec<Validator>,
    transformer: Option<Transformer>,
    default: Option<DefaultValue>,
    completer: Option<Rc<dyn Completer>>,
    breakers: Vec<ListBreaker>,
    complete_for_execute: Option<CompleteForExecute>,
}

impl Argument {
    /// Required argument; scalars take exactly one token, lists one or more.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let max = if value_type.is_list() { None } else { Some(1) };
        Self {
            name: name.into(),
            description: String::new(),
            value_type,
            min: 1,
            max,
            validators: Vec::new(),
            transformer: None,
            default: None,
            completer: None,
            breakers: Vec::new(),
            complete_for_execute: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Bool)
    }

    /// List taking `min` tokens plus up to `optional` more (`None` = unbounded).
    pub fn string_list(name: impl Into<String>, min: usize, optional: Option<usize>) -> Self {
        Self::new(name, ValueType::StringList).with_arity(min, optional)
    }

    pub fn int_list(name: impl Into<String>, min: usize, optional: Option<usize>) -> Self {
        Self::new(name, ValueType::IntList).with_arity(min, optional)
    }

    pub fn float_list(name: impl Into<String>, min: usize, optional: Option<usize>) -> Self {
        Self::new(name, ValueType::FloatList).with_arity(min, optional)
    }

    pub fn bool_list(name: impl Into<String>, min: usize, optional: Option<usize>) -> Self {
        Self::new(name, ValueType::BoolList).with_arity(min, optional)
    }

    /// Accept between `min` and `min + optional` tokens. Scalars never take
    /// more than one.
    pub fn with_arity(mut self, min: usize, optional: Option<usize>) -> Self {
        self.min = min;
        self.max = optional.map(|o| min + o);
        if !self.value_type.is_list() {
            self.min = self.min.min(1);
            self.max = Some(self.max.map_or(1, |max| max.min(1)));
        }
        self
    }

    /// Make the argument optional, keeping its upper bound.
    pub fn optional(mut self) -> Self {
        self.min = 0;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Value stored when an optional argument receives no tokens.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Like [`Argument::with_default`], computed from earlier values.
    pub fn with_default_fn(mut self, f: impl Fn(&Data, &Env) -> Result<Value> + 'static) -> Self {
        self.default = Some(DefaultValue::Func(Rc::new(f)));
        self
    }

    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Rc::new(completer));
        self
    }

    pub fn with_breaker(mut self, breaker: ListBreaker) -> Self {
        self.breakers.push(breaker);
        self
    }

    pub fn with_complete_for_execute(mut self, policy: CompleteForExecute) -> Self {
        self.complete_for_execute = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub(crate) fn completer(&self) -> Option<&dyn Completer> {
        self.completer.as_deref()
    }

    /// Match this argument at the cursor.
    ///
    /// `stop` ends a list early without consuming the token, the same way a
    /// non-discarding breaker does.
    pub(crate) fn process(&self, w: &mut Walk<'_>, stop: &dyn Fn(&str) -> bool) -> Result<Step, CommandError> {
        // Stage 1: pop
        let popped = w.input.pop_n(self.max, |token| self.take(token, stop));
        let reached_end = w.input.at_end() && !popped.broken;

        // Stage 2: the deepest argument owns the final word
        if w.mode == Mode::Complete
            && reached_end
            && (popped.values.len() < self.min || !popped.values.is_empty())
        {
            return Ok(Step::Suggest(self.suggest(w, &popped.values)));
        }

        // Stage 3: complete-for-execute
        let values = match self.complete_for_execute {
            Some(policy) => resolve::resolve(self, policy, popped.values, &popped.indices, reached_end, w)?,
            None => popped.values,
        };

        self.store(w, values)?;
        Ok(Step::Continue)
    }

    fn take(&self, token: &str, stop: &dyn Fn(&str) -> bool) -> Take {
        if let Some(take) = self.breakers.iter().find_map(|b| b.take(token)) {
            return take;
        }
        if stop(token) {
            return Take::Break;
        }
        Take::Value
    }

    /// Stages 4 and 5.
    fn store(&self, w: &mut Walk<'_>, values: Vec<String>) -> Result<(), CommandError> {
        if values.is_empty() && self.min == 0 {
            return self.apply_default(w);
        }
        let shortfall = || CommandError::NotEnoughArgs {
            name: self.name.clone(),
            min: self.min,
            got: values.len(),
        };
        if values.is_empty() {
            return Err(shortfall());
        }

        // Conversion failures win over a shortfall.
        let value = self.value_type.parse(&values)?;
        if values.len() < self.min {
            w.data.set(self.name.clone(), value);
            return Err(shortfall());
        }
        for validator in &self.validators {
            validator
                .check(&value, w.data)
                .map_err(|e| CommandError::Validation {
                    name: self.name.clone(),
                    validator: validator.name().to_string(),
                    message: format!("{:#}", e),
                })?;
        }
        let value = self.transform(value, w)?;
        w.data.set(self.name.clone(), value);
        Ok(())
    }

    fn transform(&self, value: Value, w: &Walk<'_>) -> Result<Value, CommandError> {
        let Some(transformer) = &self.transformer else {
            return Ok(value);
        };
        let failed = |message: String| CommandError::Transform {
            name: self.name.clone(),
            message,
        };

        let before = value.len();
        let out = (transformer.f)(value, &*w.data, w.env).map_err(|e| failed(format!("failed: {:#}", e)))?;
        if out.value_type() != self.value_type {
            return Err(failed(format!(
                "returned {:?} value, expected {:?}",
                out.value_type(),
                self.value_type
            )));
        }
        if self.value_type.is_list() && out.len() != before {
            return Err(failed(format!(
                "changed list length from {} to {}",
                before,
                out.len()
            )));
        }
        Ok(out)
    }

    /// Store the default, if any, for an argument that received no tokens.
    pub(crate) fn apply_default(&self, w: &mut Walk<'_>) -> Result<(), CommandError> {
        let value = match &self.default {
            None => return Ok(()),
            Some(DefaultValue::Static(value)) => value.clone(),
            Some(DefaultValue::Func(f)) => f(&*w.data, w.env).map_err(|e| CommandError::Default {
                message: format!("{:#}", e),
            })?,
        };
        w.data.set(self.name.clone(), value);
        Ok(())
    }

    /// Complete the last popped word (empty when nothing was popped).
    fn suggest(&self, w: &mut Walk<'_>, values: &[String]) -> Completed {
        if let Ok(typed) = self.value_type.parse(values) {
            w.data.set(self.name.clone(), typed);
        }
        let Some(completer) = self.completer() else {
            return Completed::default();
        };

        let (partial, chosen) = match values.split_last() {
            Some((last, earlier)) => (last.as_str(), earlier),
            None => ("", values),
        };
        match completer.complete(partial, &*w.data, w.env) {
            Ok(Some(completion)) => Completed::new(completion.filter(partial, chosen)),
            Ok(None) => Completed::default(),
            Err(e) => Completed::failed(CommandError::CompletionFetch {
                name: self.name.clone(),
                message: format!("{:#}", e),
            }),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}
