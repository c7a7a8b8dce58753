use perseus::mapping::{LinkMarkers, NoopMarkers};
use perseus::{Area, Bridge, Connection, PanelTable, RowRef, Table};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct RecordingMarkers {
    cleared: Rc<RefCell<Vec<String>>>,
}

impl LinkMarkers for RecordingMarkers {
    fn clear_link_marker(&mut self, row_key: &str) {
        self.cleared.borrow_mut().push(row_key.to_string());
    }
}

fn tables() -> (Table, Table) {
    let source = Table::new(1, Area::Source, "patients")
        .with_row("patient_id")
        .with_row("gender");
    let destination = Table::new(2, Area::Destination, "person")
        .with_row("person_id")
        .with_row("gender_concept_id");
    (source, destination)
}

#[test]
fn test_only_source_panel_tracks_links() {
    let bridge = Bridge::new();
    let (source, destination) = tables();
    let source_panel = PanelTable::bind(source, &bridge, Box::new(NoopMarkers));
    let destination_panel = PanelTable::bind(destination, &bridge, Box::new(NoopMarkers));

    bridge.connect(Connection::new(RowRef::new(1, 1), RowRef::new(2, 1)));

    let source_rows = source_panel.rows();
    let destination_rows = destination_panel.rows();
    assert!(source_panel.is_row_has_a_link(&source_rows[1]));
    assert!(!source_panel.is_row_has_a_link(&source_rows[0]));
    assert!(!destination_panel.is_row_has_a_link(&destination_rows[1]));
}

#[test]
fn test_delete_all_resets_links_and_markers() {
    let bridge = Bridge::new();
    let markers = RecordingMarkers::default();
    let (source, _) = tables();
    let panel = PanelTable::bind(source, &bridge, Box::new(markers.clone()));
    let rows = panel.rows();

    bridge.connect(Connection::new(RowRef::new(1, 0), RowRef::new(2, 0)));
    bridge.connect(Connection::new(RowRef::new(1, 0), RowRef::new(2, 1)));
    assert!(panel.is_row_has_a_link(&rows[0]));

    bridge.delete_all();

    assert!(rows.iter().all(|row| !panel.is_row_has_a_link(row)));
    assert_eq!(*markers.cleared.borrow(), vec!["patients-patient_id".to_string()]);
}
