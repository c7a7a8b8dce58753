//! Visual transformation chain builder
//!
//! The chain is an ordered list of steps, newest first. Each configured step
//! owns one subscription to its function's change stream; every change
//! recomputes the preview synchronously. The preview nests the steps so that
//! the first step in the list becomes the outermost call:
//! `[TRIM, UPPER]` renders as `TRIM(UPPER(value))`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::function::{EditorKind, FunctionConfig, FunctionKind, TransformationFunction};
use crate::notify::Subscription;
use crate::telemetry::UiMetrics;
use crate::{PerseusError, Result};

/// Column placeholder the innermost step is applied to.
pub const PREVIEW_SEED: &str = "value";

/// Read-only surface displaying the composed SQL.
#[cfg_attr(test, mockall::automock)]
pub trait PreviewSurface {
    fn set_value(&mut self, sql: &str);
}

/// Mount points for function parameter editors, one per step index.
#[cfg_attr(test, mockall::automock)]
pub trait EditorSlots {
    fn mount(&mut self, index: usize, editor: EditorKind, function: &TransformationFunction);
}

/// In-memory preview keeping every value it was given.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreview {
    history: Rc<RefCell<Vec<String>>>,
}

impl MemoryPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> String {
        self.history.borrow().last().cloned().unwrap_or_default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl PreviewSurface for MemoryPreview {
    fn set_value(&mut self, sql: &str) {
        self.history.borrow_mut().push(sql.to_string());
    }
}

/// Slot provider for chains with no editor UI attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSlots;

impl EditorSlots for NoopSlots {
    fn mount(&mut self, _index: usize, _editor: EditorKind, _function: &TransformationFunction) {}
}

/// One entry of the chain. Empty until a function is selected.
#[derive(Debug, Default)]
pub struct TransformationStep {
    kind: Option<FunctionKind>,
    value: Option<TransformationFunction>,
    subscription: Option<Subscription>,
}

impl TransformationStep {
    pub fn kind(&self) -> Option<FunctionKind> {
        self.kind
    }

    pub fn function(&self) -> Option<&TransformationFunction> {
        self.value.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().map_or(false, Subscription::is_active)
    }

    fn release(&mut self) -> bool {
        match self.subscription.take() {
            Some(mut subscription) => {
                let was_active = subscription.is_active();
                subscription.unsubscribe();
                was_active
            }
            None => false,
        }
    }

    fn composable(&self) -> Option<&TransformationFunction> {
        match (self.kind, &self.value) {
            (Some(_), Some(function)) if function.is_valid() => Some(function),
            _ => None,
        }
    }
}

/// Compose the preview SQL for `steps`.
///
/// Steps without a function or with missing parameters are skipped. The
/// remaining ones are applied last-to-first starting from [`PREVIEW_SEED`].
pub fn compute_preview(steps: &[TransformationStep]) -> String {
    let retained: Vec<&TransformationFunction> =
        steps.iter().filter_map(TransformationStep::composable).collect();

    if retained.is_empty() {
        return String::new();
    }

    retained
        .iter()
        .rev()
        .fold(PREVIEW_SEED.to_string(), |acc, function| function.apply(&acc))
        .trim()
        .to_string()
}

struct ChainState {
    steps: Vec<TransformationStep>,
    preview: String,
    surface: Box<dyn PreviewSurface>,
}

impl ChainState {
    fn refresh_preview(&mut self) {
        let preview = compute_preview(&self.steps);
        trace!(steps = self.steps.len(), preview = %preview, "preview recomputed");
        UiMetrics::preview_recomputed();
        self.surface.set_value(&preview);
        self.preview = preview;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.steps.len() {
            Ok(())
        } else {
            warn!(index, len = self.steps.len(), "step index out of range");
            Err(PerseusError::StepOutOfRange {
                index,
                len: self.steps.len(),
            })
        }
    }
}

/// Serializable description of a chain, in list order.
///
/// `None` entries are steps without a selected function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub steps: Vec<Option<FunctionConfig>>,
}

/// Ordered transformation steps with a live SQL preview.
pub struct TransformationChain {
    state: Rc<RefCell<ChainState>>,
    slots: Box<dyn EditorSlots>,
}

impl TransformationChain {
    pub fn new(surface: Box<dyn PreviewSurface>, slots: Box<dyn EditorSlots>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChainState {
                steps: Vec::new(),
                preview: String::new(),
                surface,
            })),
            slots,
        }
    }

    /// Chain with an in-memory preview and no editor slots.
    pub fn detached() -> Self {
        Self::new(Box::new(MemoryPreview::new()), Box::new(NoopSlots))
    }

    /// Build a detached chain reproducing `spec`.
    pub fn from_spec(spec: &ChainSpec) -> Result<Self> {
        let mut chain = Self::detached();
        for entry in spec.steps.iter().rev() {
            chain.add_step();
            if let Some(config) = entry {
                let function = chain.select_function(config.kind(), 0)?;
                function.update(|current| *current = config.clone())?;
            }
        }
        Ok(chain)
    }

    /// Put a new empty step at the front of the list.
    pub fn add_step(&mut self) {
        let mut state = self.state.borrow_mut();
        state.steps.insert(0, TransformationStep::default());
        debug!(steps = state.steps.len(), "step added");
    }

    /// Drop the step at `index`, releasing its subscription first.
    pub fn remove_step(&mut self, index: usize) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check_index(index)?;

        let mut step = state.steps.remove(index);
        let released = step.release();
        debug!(index, released, steps = state.steps.len(), "step removed");

        state.refresh_preview();
        Ok(())
    }

    /// Replace the function of the step at `index` with a fresh one of `kind`.
    ///
    /// The previous subscription is released before the new function is
    /// created. Returns the new function so the caller can edit it.
    pub fn select_function(
        &mut self,
        kind: impl Into<FunctionKind>,
        index: usize,
    ) -> Result<TransformationFunction> {
        let kind = kind.into();
        {
            let mut state = self.state.borrow_mut();
            state.check_index(index)?;
            state.steps[index].release();
        }

        let function = kind.create();
        self.slots.mount(index, kind.editor(), &function);

        let chain: Weak<RefCell<ChainState>> = Rc::downgrade(&self.state);
        let subscription = function.subscribe(move || {
            if let Some(state) = chain.upgrade() {
                state.borrow_mut().refresh_preview();
            }
        });

        let mut state = self.state.borrow_mut();
        let step = &mut state.steps[index];
        step.kind = Some(kind);
        step.value = Some(function.clone());
        step.subscription = Some(subscription);
        debug!(index, kind = %kind, "function selected");

        state.refresh_preview();
        Ok(function)
    }

    /// Last composed preview.
    pub fn preview(&self) -> String {
        self.state.borrow().preview.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().steps.is_empty()
    }

    pub fn step_kind(&self, index: usize) -> Option<FunctionKind> {
        self.state.borrow().steps.get(index).and_then(TransformationStep::kind)
    }

    pub fn function(&self, index: usize) -> Option<TransformationFunction> {
        self.state
            .borrow()
            .steps
            .get(index)
            .and_then(|step| step.function().cloned())
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state
            .borrow()
            .steps
            .iter()
            .filter(|step| step.is_subscribed())
            .count()
    }

    /// Tear the chain down, releasing every remaining subscription.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for TransformationChain {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            let released = state
                .steps
                .iter_mut()
                .map(TransformationStep::release)
                .filter(|released| *released)
                .count();
            debug!(released, "transformation chain closed");
        }
    }
}

impl fmt::Debug for TransformationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TransformationChain")
            .field("steps", &state.steps)
            .field("preview", &state.preview)
            .finish()
    }
}
