//! Per-row "has a link" bookkeeping for the mapping panels

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::{Area, Bridge, Connection, Row, Table};
use crate::notify::Subscription;
use crate::telemetry::UiMetrics;

/// Visual marker shown on rows that take part in a connection.
#[cfg_attr(test, mockall::automock)]
pub trait LinkMarkers {
    fn clear_link_marker(&mut self, row_key: &str);
}

/// Marker sink for panels rendered without a DOM.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMarkers;

impl LinkMarkers for NoopMarkers {
    fn clear_link_marker(&mut self, _row_key: &str) {}
}

/// Tracks which rows of a table are linked to another table.
///
/// State only grows through connection events and only shrinks all at once
/// through [`RowLinkTracker::on_delete_all`].
pub struct RowLinkTracker {
    row_connections: HashMap<String, bool>,
    markers: Box<dyn LinkMarkers>,
}

impl RowLinkTracker {
    pub fn new(markers: Box<dyn LinkMarkers>) -> Self {
        Self {
            row_connections: HashMap::new(),
            markers,
        }
    }

    /// Forget every link. Markers are cleared for all tracked rows before the
    /// mapping is emptied, within the same call.
    pub fn on_delete_all(&mut self) {
        for key in self.row_connections.keys() {
            self.markers.clear_link_marker(key);
        }
        let cleared = self.row_connections.len();
        self.row_connections.clear();

        UiMetrics::links_cleared(cleared);
        debug!(cleared, "row links cleared");
    }

    /// Record the source endpoint of `connection` if it belongs to `table`.
    ///
    /// Only tables on the source side track links.
    pub fn on_connection_created(&mut self, table: &Table, connection: &Connection) {
        if table.area != Area::Source {
            return;
        }

        for row in table.rows.iter().filter(|row| row.matches(&connection.source)) {
            trace!(row_key = %row.key, "row linked");
            self.row_connections.insert(row.key.clone(), true);
            UiMetrics::link_recorded(table.area.as_str());
        }
    }

    /// Unknown rows report unlinked.
    pub fn is_linked(&self, row: &Row) -> bool {
        self.row_connections.get(&row.key).copied().unwrap_or(false)
    }

    pub fn linked_count(&self) -> usize {
        self.row_connections.values().filter(|linked| **linked).count()
    }
}

impl Default for RowLinkTracker {
    fn default() -> Self {
        Self::new(Box::new(NoopMarkers))
    }
}

struct PanelState {
    table: Table,
    links: RowLinkTracker,
    active_row: Option<Row>,
}

/// A table panel bound to the bridge for as long as it lives.
pub struct PanelTable {
    state: Rc<RefCell<PanelState>>,
    subscriptions: Vec<Subscription>,
}

impl PanelTable {
    pub fn bind(table: Table, bridge: &Bridge, markers: Box<dyn LinkMarkers>) -> Self {
        let state = Rc::new(RefCell::new(PanelState {
            table,
            links: RowLinkTracker::new(markers),
            active_row: None,
        }));

        let weak: Weak<RefCell<PanelState>> = Rc::downgrade(&state);
        let on_delete_all = bridge.on_delete_all(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().links.on_delete_all();
            }
        });

        let weak: Weak<RefCell<PanelState>> = Rc::downgrade(&state);
        let on_connection = bridge.on_connection(move |connection| {
            if let Some(state) = weak.upgrade() {
                let mut guard = state.borrow_mut();
                let PanelState { table, links, .. } = &mut *guard;
                links.on_connection_created(table, connection);
            }
        });

        {
            let state = state.borrow();
            debug!(table = %state.table.name, area = %state.table.area, "panel table bound");
        }

        Self {
            state,
            subscriptions: vec![on_delete_all, on_connection],
        }
    }

    pub fn area(&self) -> Area {
        self.state.borrow().table.area
    }

    pub fn rows(&self) -> Vec<Row> {
        self.state.borrow().table.rows.clone()
    }

    pub fn visible_rows(&self) -> Vec<Row> {
        self.state.borrow().table.visible_rows().cloned().collect()
    }

    pub fn total_rows_number(&self) -> usize {
        self.state.borrow().table.total_rows_number()
    }

    pub fn visible_rows_number(&self) -> usize {
        self.state.borrow().table.visible_rows_number()
    }

    pub fn is_row_has_a_link(&self, row: &Row) -> bool {
        self.state.borrow().links.is_linked(row)
    }

    pub fn has_comment(&self, row: &Row) -> bool {
        !row.comments.is_empty()
    }

    pub fn set_active_row(&self, row: &Row) {
        self.state.borrow_mut().active_row = Some(row.clone());
    }

    pub fn active_row(&self) -> Option<Row> {
        self.state.borrow().active_row.clone()
    }

    pub fn is_bound(&self) -> bool {
        self.subscriptions.iter().all(Subscription::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::RowRef;

    fn source_table() -> Table {
        Table::new(1, Area::Source, "patients")
            .with_row("id")
            .with_row("sex")
            .with_row("birth_date")
    }

    fn link(source: RowRef) -> Connection {
        Connection::new(source, RowRef::new(100, 0))
    }

    #[test]
    fn test_unknown_row_is_unlinked() {
        let tracker = RowLinkTracker::default();
        let row = Row::new(5, 5, "nowhere", "nothing");
        assert!(!tracker.is_linked(&row));
        assert_eq!(tracker.linked_count(), 0);
    }

    #[test]
    fn test_connection_marks_matching_source_row() {
        let table = source_table();
        let mut tracker = RowLinkTracker::default();

        tracker.on_connection_created(&table, &link(RowRef::new(1, 1)));

        assert!(tracker.is_linked(&table.rows[1]));
        assert!(!tracker.is_linked(&table.rows[0]));
        assert!(!tracker.is_linked(&table.rows[2]));
    }

    #[test]
    fn test_connection_from_other_table_is_ignored() {
        let table = source_table();
        let mut tracker = RowLinkTracker::default();

        tracker.on_connection_created(&table, &link(RowRef::new(2, 1)));

        assert_eq!(tracker.linked_count(), 0);
    }

    #[test]
    fn test_destination_table_never_tracks_links() {
        let table = Table::new(1, Area::Destination, "person").with_row("person_id");
        let mut tracker = RowLinkTracker::default();

        tracker.on_connection_created(&table, &link(RowRef::new(1, 0)));

        assert!(!tracker.is_linked(&table.rows[0]));
    }

    #[test]
    fn test_delete_all_clears_markers_then_links() {
        let table = source_table();
        let mut markers = MockLinkMarkers::new();
        markers
            .expect_clear_link_marker()
            .withf(|key| key == "patients-id" || key == "patients-birth_date")
            .times(2)
            .return_const(());

        let mut tracker = RowLinkTracker::new(Box::new(markers));
        tracker.on_connection_created(&table, &link(RowRef::new(1, 0)));
        tracker.on_connection_created(&table, &link(RowRef::new(1, 2)));
        assert_eq!(tracker.linked_count(), 2);

        tracker.on_delete_all();

        assert_eq!(tracker.linked_count(), 0);
        for row in &table.rows {
            assert!(!tracker.is_linked(row));
        }
    }

    #[test]
    fn test_panel_follows_bridge_events() {
        let bridge = Bridge::new();
        let panel = PanelTable::bind(source_table(), &bridge, Box::new(NoopMarkers));
        let rows = panel.rows();

        bridge.connect(link(RowRef::new(1, 2)));
        assert!(panel.is_row_has_a_link(&rows[2]));

        bridge.delete_all();
        assert!(!panel.is_row_has_a_link(&rows[2]));

        bridge.connect(link(RowRef::new(1, 0)));
        assert!(panel.is_row_has_a_link(&rows[0]));
    }

    #[test]
    fn test_dropping_panel_unsubscribes_from_bridge() {
        let bridge = Bridge::new();
        let panel = PanelTable::bind(source_table(), &bridge, Box::new(NoopMarkers));
        assert!(panel.is_bound());
        assert_eq!(bridge.listener_count(), 2);

        drop(panel);

        assert_eq!(bridge.listener_count(), 0);
        bridge.connect(link(RowRef::new(1, 0)));
    }

    #[test]
    fn test_panel_rows_comments_and_active_row() {
        let mut table = source_table();
        table.rows[0] = table.rows[0].clone().with_comment("primary key");
        table.rows[2].visible = false;

        let panel = PanelTable::bind(table, &Bridge::new(), Box::new(NoopMarkers));
        let rows = panel.rows();

        assert_eq!(panel.area(), Area::Source);
        assert_eq!(panel.total_rows_number(), 3);
        assert_eq!(panel.visible_rows_number(), 2);
        assert_eq!(panel.visible_rows().len(), 2);
        assert!(panel.has_comment(&rows[0]));
        assert!(!panel.has_comment(&rows[1]));

        assert!(panel.active_row().is_none());
        panel.set_active_row(&rows[1]);
        assert_eq!(panel.active_row().map(|row| row.key), Some("patients-sex".to_string()));
    }
}
