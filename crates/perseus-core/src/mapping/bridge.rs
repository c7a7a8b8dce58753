//! Event bus shared by the source and destination panels

use tracing::debug;

use super::Connection;
use crate::notify::{ChangeNotifier, Notifier, Subscription};

/// Publishes connection events and the bulk "delete all" signal.
#[derive(Debug, Default)]
pub struct Bridge {
    connection: Notifier<Connection>,
    delete_all: ChangeNotifier,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, connection: Connection) {
        debug!(
            source_table = connection.source.table_id,
            source_row = connection.source.id,
            destination_table = connection.destination.table_id,
            destination_row = connection.destination.id,
            "connection created"
        );
        self.connection.emit(&connection);
    }

    pub fn delete_all(&self) {
        debug!("deleting all connections");
        self.delete_all.notify();
    }

    pub fn on_connection<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Connection) + 'static,
    {
        self.connection.subscribe(listener)
    }

    pub fn on_delete_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.delete_all.subscribe(move |_| listener())
    }

    pub fn listener_count(&self) -> usize {
        self.connection.listener_count() + self.delete_all.listener_count()
    }
}
