//! CDM conversion form

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DbSettings;
use crate::notify::{Notifier, Subscription, TickQueue};

/// Connection form for one side of the conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectForm {
    prefix: String,
    pub settings: DbSettings,
}

impl ConnectForm {
    pub fn new(prefix: impl Into<String>, settings: DbSettings) -> Self {
        Self {
            prefix: prefix.into(),
            settings,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Element id of the field `name`, unique per form.
    pub fn id(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, name)
    }

    /// Clear every connection field. The database type is chosen outside the
    /// form and survives a reset.
    pub fn reset(&mut self) {
        self.settings = DbSettings {
            db_type: std::mem::take(&mut self.settings.db_type),
            ..DbSettings::default()
        };
    }

    pub fn is_valid(&self) -> bool {
        self.settings.is_valid()
    }
}

/// Settings remembered between openings of the CDM dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdmState {
    pub source_db_settings: DbSettings,
    pub destination_db_settings: DbSettings,
}

/// In-memory holder of [`CdmState`], shared by every form instance.
#[derive(Debug, Clone, Default)]
pub struct CdmStateService {
    state: Rc<RefCell<CdmState>>,
}

impl CdmStateService {
    pub fn new(state: CdmState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn state(&self) -> CdmState {
        self.state.borrow().clone()
    }

    pub fn set_state(&self, state: CdmState) {
        *self.state.borrow_mut() = state;
    }
}

/// Everything the CDM builder needs to run a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdmSettings {
    pub source: DbSettings,
    pub destination: DbSettings,
    pub vocabulary: DbSettings,
}

/// Source and destination connection forms plus the convert action.
pub struct CdmForm {
    state_service: CdmStateService,
    vocabulary: DbSettings,
    source: Rc<RefCell<ConnectForm>>,
    destination: Rc<RefCell<ConnectForm>>,
    convert_disabled: Rc<Cell<bool>>,
    convert: Notifier<CdmSettings>,
}

impl CdmForm {
    /// Open the form with the last saved state.
    pub fn load(state_service: CdmStateService, vocabulary: DbSettings) -> Self {
        let CdmState {
            source_db_settings,
            destination_db_settings,
        } = state_service.state();

        Self {
            state_service,
            vocabulary,
            source: Rc::new(RefCell::new(ConnectForm::new("source", source_db_settings))),
            destination: Rc::new(RefCell::new(ConnectForm::new(
                "destination",
                destination_db_settings,
            ))),
            convert_disabled: Rc::new(Cell::new(true)),
            convert: Notifier::new(),
        }
    }

    pub fn source(&self) -> Rc<RefCell<ConnectForm>> {
        Rc::clone(&self.source)
    }

    pub fn destination(&self) -> Rc<RefCell<ConnectForm>> {
        Rc::clone(&self.destination)
    }

    /// Re-read child validity once the current pass has settled.
    pub fn after_view_checked(&self, queue: &TickQueue) {
        let source = Rc::clone(&self.source);
        let destination = Rc::clone(&self.destination);
        let disabled = Rc::clone(&self.convert_disabled);
        queue.defer(move || {
            disabled.set(!source.borrow().is_valid() || !destination.borrow().is_valid());
        });
    }

    pub fn is_convert_disabled(&self) -> bool {
        self.convert_disabled.get()
    }

    pub fn on_convert<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CdmSettings) + 'static,
    {
        self.convert.subscribe(listener)
    }

    /// Assemble the builder settings and publish them to convert listeners.
    pub fn convert(&self) -> CdmSettings {
        let settings = CdmSettings {
            source: self.source.borrow().settings.clone(),
            destination: self.destination.borrow().settings.clone(),
            vocabulary: self.vocabulary.clone(),
        };
        debug!(
            source = %settings.source.database,
            destination = %settings.destination.database,
            "cdm conversion requested"
        );
        self.convert.emit(&settings);
        settings
    }

    /// Close the form. Same as dropping it.
    pub fn close(self) {
        drop(self)
    }
}

impl Drop for CdmForm {
    /// Save what was entered for the next opening, however the form goes away.
    fn drop(&mut self) {
        let (Ok(source), Ok(destination)) =
            (self.source.try_borrow(), self.destination.try_borrow())
        else {
            debug!("cdm form dropped while a connect form was borrowed; state not saved");
            return;
        };

        self.state_service.set_state(CdmState {
            source_db_settings: source.settings.clone(),
            destination_db_settings: destination.settings.clone(),
        });
        debug!("cdm form state saved");
    }
}
