//! Transformation functions offered by the visual SQL builder
//!
//! A [`FunctionKind`] is the registry tag shown in the function dropdown. It
//! resolves, through a single `match`, to an empty [`FunctionConfig`] and to
//! the [`EditorKind`] the host uses to render its parameter form. The live
//! [`TransformationFunction`] wraps that config together with the change
//! stream the chain builder listens to.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::helpers::{is_filled, quote_literal};
use crate::notify::{ChangeNotifier, Subscription};
use crate::{PerseusError, Result};

/// Which transformation a step applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    #[serde(rename = "REPLACE")]
    Replace,
    #[serde(rename = "DATEPART")]
    DatePart,
    #[serde(rename = "DATEADD")]
    DateAdd,
    #[serde(rename = "CASE")]
    Case,
    #[serde(rename = "TRIM")]
    Trim,
    #[serde(rename = "UPPER")]
    Upper,
    #[serde(rename = "LOWER")]
    Lower,
}

impl FunctionKind {
    /// Registry order, as presented in the dropdown.
    pub const ALL: [FunctionKind; 7] = [
        FunctionKind::Replace,
        FunctionKind::DatePart,
        FunctionKind::DateAdd,
        FunctionKind::Case,
        FunctionKind::Trim,
        FunctionKind::Upper,
        FunctionKind::Lower,
    ];

    pub fn all() -> &'static [FunctionKind] {
        &Self::ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            FunctionKind::Replace => "REPLACE",
            FunctionKind::DatePart => "DATEPART",
            FunctionKind::DateAdd => "DATEADD",
            FunctionKind::Case => "CASE",
            FunctionKind::Trim => "TRIM",
            FunctionKind::Upper => "UPPER",
            FunctionKind::Lower => "LOWER",
        }
    }

    /// Parameter editor used to render this function.
    pub fn editor(&self) -> EditorKind {
        match self {
            FunctionKind::Replace => EditorKind::Replace,
            FunctionKind::DatePart => EditorKind::DatePart,
            FunctionKind::DateAdd => EditorKind::DateAdd,
            FunctionKind::Case => EditorKind::SwitchCase,
            FunctionKind::Trim | FunctionKind::Upper | FunctionKind::Lower => EditorKind::NoArgs,
        }
    }

    /// Instantiate a fresh, unconfigured function of this kind.
    pub fn create(&self) -> TransformationFunction {
        TransformationFunction::new(FunctionConfig::empty(*self))
    }

    /// Constructor stored in this kind's registry entry.
    pub fn factory(&self) -> fn() -> TransformationFunction {
        match self {
            FunctionKind::Replace => || FunctionKind::Replace.create(),
            FunctionKind::DatePart => || FunctionKind::DatePart.create(),
            FunctionKind::DateAdd => || FunctionKind::DateAdd.create(),
            FunctionKind::Case => || FunctionKind::Case.create(),
            FunctionKind::Trim => || FunctionKind::Trim.create(),
            FunctionKind::Upper => || FunctionKind::Upper.create(),
            FunctionKind::Lower => || FunctionKind::Lower.create(),
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FunctionKind {
    type Err = PerseusError;

    fn from_str(s: &str) -> Result<Self> {
        FunctionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PerseusError::UnknownFunction(s.to_string()))
    }
}

/// Render strategy tag for the parameter editor of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Replace,
    DatePart,
    DateAdd,
    SwitchCase,
    NoArgs,
}

/// Immutable registry entry: one per function kind, not one per use.
#[derive(Debug, Clone, Copy)]
pub struct FunctionType {
    pub kind: FunctionKind,
    pub name: &'static str,
    pub editor: EditorKind,
    pub factory: fn() -> TransformationFunction,
}

impl FunctionType {
    pub fn create(&self) -> TransformationFunction {
        (self.factory)()
    }
}

impl From<FunctionKind> for FunctionType {
    fn from(kind: FunctionKind) -> Self {
        Self {
            kind,
            name: kind.name(),
            editor: kind.editor(),
            factory: kind.factory(),
        }
    }
}

impl From<&FunctionType> for FunctionKind {
    fn from(function_type: &FunctionType) -> Self {
        function_type.kind
    }
}

/// The functions available to the builder dropdown.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    types: Vec<FunctionType>,
}

impl FunctionRegistry {
    pub fn standard() -> Self {
        Self {
            types: FunctionKind::ALL.iter().copied().map(FunctionType::from).collect(),
        }
    }

    pub fn get(&self, kind: FunctionKind) -> Option<&FunctionType> {
        self.types.iter().find(|t| t.kind == kind)
    }

    pub fn find(&self, name: &str) -> Result<&FunctionType> {
        let kind: FunctionKind = name.parse()?;
        self.get(kind)
            .ok_or_else(|| PerseusError::UnknownFunction(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Capability set every function variant exposes.
pub trait SqlFunction {
    /// True only once every required parameter is specified.
    fn is_valid(&self) -> bool;

    /// Wrap `input`, an SQL expression, in this transformation.
    fn apply(&self, input: &str) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceParams {
    pub old: String,
    pub new: String,
}

impl SqlFunction for ReplaceParams {
    // An empty replacement is legitimate: it deletes every occurrence.
    fn is_valid(&self) -> bool {
        !self.old.is_empty()
    }

    fn apply(&self, input: &str) -> String {
        format!(
            "REPLACE({}, {}, {})",
            input,
            quote_literal(&self.old),
            quote_literal(&self.new)
        )
    }
}

/// Date part keywords accepted by `DATEPART` and `DATEADD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatePartUnit {
    Year,
    Quarter,
    Month,
    DayOfYear,
    Day,
    Week,
    Weekday,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl DatePartUnit {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DatePartUnit::Year => "YEAR",
            DatePartUnit::Quarter => "QUARTER",
            DatePartUnit::Month => "MONTH",
            DatePartUnit::DayOfYear => "DAYOFYEAR",
            DatePartUnit::Day => "DAY",
            DatePartUnit::Week => "WEEK",
            DatePartUnit::Weekday => "WEEKDAY",
            DatePartUnit::Hour => "HOUR",
            DatePartUnit::Minute => "MINUTE",
            DatePartUnit::Second => "SECOND",
            DatePartUnit::Millisecond => "MILLISECOND",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePartParams {
    pub part: Option<DatePartUnit>,
}

impl SqlFunction for DatePartParams {
    fn is_valid(&self) -> bool {
        self.part.is_some()
    }

    fn apply(&self, input: &str) -> String {
        match self.part {
            Some(part) => format!("DATEPART({}, {})", part.as_sql(), input),
            None => input.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAddParams {
    pub part: Option<DatePartUnit>,
    pub amount: Option<i64>,
}

impl SqlFunction for DateAddParams {
    fn is_valid(&self) -> bool {
        self.part.is_some() && self.amount.is_some()
    }

    fn apply(&self, input: &str) -> String {
        match (self.part, self.amount) {
            (Some(part), Some(amount)) => {
                format!("DATEADD({}, {}, {})", part.as_sql(), amount, input)
            }
            _ => input.to_string(),
        }
    }
}

/// One `WHEN ... THEN ...` arm of a CASE expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub when: String,
    pub then: String,
}

impl CaseBranch {
    pub fn new(when: impl Into<String>, then: impl Into<String>) -> Self {
        Self {
            when: when.into(),
            then: then.into(),
        }
    }

    fn is_complete(&self) -> bool {
        is_filled(&self.when) && is_filled(&self.then)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseParams {
    pub cases: Vec<CaseBranch>,
    pub default: Option<String>,
}

impl SqlFunction for CaseParams {
    fn is_valid(&self) -> bool {
        !self.cases.is_empty() && self.cases.iter().all(CaseBranch::is_complete)
    }

    fn apply(&self, input: &str) -> String {
        let mut sql = format!("CASE {}", input);
        for branch in &self.cases {
            sql.push_str(&format!(
                " WHEN {} THEN {}",
                quote_literal(&branch.when),
                quote_literal(&branch.then)
            ));
        }
        if let Some(default) = &self.default {
            sql.push_str(&format!(" ELSE {}", quote_literal(default)));
        }
        sql.push_str(" END");
        sql
    }
}

/// Parameters of a function, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FunctionConfig {
    #[serde(rename = "REPLACE")]
    Replace(ReplaceParams),
    #[serde(rename = "DATEPART")]
    DatePart(DatePartParams),
    #[serde(rename = "DATEADD")]
    DateAdd(DateAddParams),
    #[serde(rename = "CASE")]
    Case(CaseParams),
    #[serde(rename = "TRIM")]
    Trim,
    #[serde(rename = "UPPER")]
    Upper,
    #[serde(rename = "LOWER")]
    Lower,
}

impl FunctionConfig {
    /// Unconfigured parameters for `kind`.
    pub fn empty(kind: FunctionKind) -> Self {
        match kind {
            FunctionKind::Replace => FunctionConfig::Replace(ReplaceParams::default()),
            FunctionKind::DatePart => FunctionConfig::DatePart(DatePartParams::default()),
            FunctionKind::DateAdd => FunctionConfig::DateAdd(DateAddParams::default()),
            FunctionKind::Case => FunctionConfig::Case(CaseParams::default()),
            FunctionKind::Trim => FunctionConfig::Trim,
            FunctionKind::Upper => FunctionConfig::Upper,
            FunctionKind::Lower => FunctionConfig::Lower,
        }
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            FunctionConfig::Replace(_) => FunctionKind::Replace,
            FunctionConfig::DatePart(_) => FunctionKind::DatePart,
            FunctionConfig::DateAdd(_) => FunctionKind::DateAdd,
            FunctionConfig::Case(_) => FunctionKind::Case,
            FunctionConfig::Trim => FunctionKind::Trim,
            FunctionConfig::Upper => FunctionKind::Upper,
            FunctionConfig::Lower => FunctionKind::Lower,
        }
    }
}

impl SqlFunction for FunctionConfig {
    fn is_valid(&self) -> bool {
        match self {
            FunctionConfig::Replace(p) => p.is_valid(),
            FunctionConfig::DatePart(p) => p.is_valid(),
            FunctionConfig::DateAdd(p) => p.is_valid(),
            FunctionConfig::Case(p) => p.is_valid(),
            FunctionConfig::Trim | FunctionConfig::Upper | FunctionConfig::Lower => true,
        }
    }

    fn apply(&self, input: &str) -> String {
        match self {
            FunctionConfig::Replace(p) => p.apply(input),
            FunctionConfig::DatePart(p) => p.apply(input),
            FunctionConfig::DateAdd(p) => p.apply(input),
            FunctionConfig::Case(p) => p.apply(input),
            FunctionConfig::Trim => format!("TRIM({})", input),
            FunctionConfig::Upper => format!("UPPER({})", input),
            FunctionConfig::Lower => format!("LOWER({})", input),
        }
    }
}

struct FunctionState {
    config: RefCell<FunctionConfig>,
    changes: ChangeNotifier,
}

/// Live function instance shared between its editor and the chain.
///
/// Clones share the same parameters and change stream.
#[derive(Clone)]
pub struct TransformationFunction {
    inner: Rc<FunctionState>,
}

impl TransformationFunction {
    pub fn new(config: FunctionConfig) -> Self {
        Self {
            inner: Rc::new(FunctionState {
                config: RefCell::new(config),
                changes: ChangeNotifier::new(),
            }),
        }
    }

    pub fn kind(&self) -> FunctionKind {
        self.inner.config.borrow().kind()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.config.borrow().is_valid()
    }

    /// Snapshot of the current parameters as an `input -> output` function.
    pub fn sql(&self) -> impl Fn(&str) -> String + 'static {
        let config = self.config();
        move |input: &str| config.apply(input)
    }

    pub fn apply(&self, input: &str) -> String {
        self.inner.config.borrow().apply(input)
    }

    pub fn config(&self) -> FunctionConfig {
        self.inner.config.borrow().clone()
    }

    /// Edit the parameters in place, then notify listeners.
    ///
    /// The edit must keep the function's kind; a kind-changing edit is rolled
    /// back and nothing is emitted.
    pub fn update<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut FunctionConfig),
    {
        {
            let mut config = self.inner.config.borrow_mut();
            let before = config.clone();
            edit(&mut config);
            if config.kind() != before.kind() {
                let found = config.kind();
                *config = before;
                return Err(PerseusError::KindMismatch {
                    expected: config.kind(),
                    found,
                });
            }
        }
        debug!(kind = %self.kind(), valid = self.is_valid(), "transformation function edited");
        self.inner.changes.notify();
        Ok(())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.inner.changes.subscribe(move |_| listener())
    }

    pub fn change_notifier(&self) -> &ChangeNotifier {
        &self.inner.changes
    }

    pub fn ptr_eq(&self, other: &TransformationFunction) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for TransformationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationFunction")
            .field("config", &*self.inner.config.borrow())
            .field("listeners", &self.inner.changes.listener_count())
            .finish()
    }
}
