use perseus::{
    CaseBranch, ChainSpec, DatePartUnit, EditorKind, EditorSlots, FunctionConfig, FunctionKind,
    FunctionRegistry, MemoryPreview, PerseusError, TransformationChain, TransformationFunction,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct RecordingSlots {
    mounted: Rc<RefCell<Vec<(usize, EditorKind)>>>,
}

impl EditorSlots for RecordingSlots {
    fn mount(&mut self, index: usize, editor: EditorKind, _function: &TransformationFunction) {
        self.mounted.borrow_mut().push((index, editor));
    }
}

#[test]
fn test_dropdown_selection_builds_nested_preview() {
    let registry = FunctionRegistry::standard();
    let preview = MemoryPreview::new();
    let slots = RecordingSlots::default();
    let mut chain = TransformationChain::new(Box::new(preview.clone()), Box::new(slots.clone()));

    chain.add_step();
    chain.select_function(registry.find("UPPER").unwrap(), 0).unwrap();
    assert_eq!(preview.value(), "UPPER(value)");

    chain.add_step();
    chain.select_function(registry.find("TRIM").unwrap(), 0).unwrap();
    assert_eq!(preview.value(), "TRIM(UPPER(value))");

    assert_eq!(
        *slots.mounted.borrow(),
        vec![(0, EditorKind::NoArgs), (0, EditorKind::NoArgs)]
    );
}

#[test]
fn test_editing_parameters_updates_preview_live() {
    let mut chain = TransformationChain::detached();
    chain.add_step();
    let add = chain.select_function(FunctionKind::DateAdd, 0).unwrap();
    chain.add_step();
    let part = chain.select_function(FunctionKind::DatePart, 0).unwrap();

    assert_eq!(chain.preview(), "");

    add.update(|config| {
        *config = FunctionConfig::DateAdd(perseus::DateAddParams {
            part: Some(DatePartUnit::Day),
            amount: Some(1),
        })
    })
    .unwrap();
    assert_eq!(chain.preview(), "DATEADD(DAY, 1, value)");

    part.update(|config| {
        *config = FunctionConfig::DatePart(perseus::DatePartParams {
            part: Some(DatePartUnit::Weekday),
        })
    })
    .unwrap();
    assert_eq!(chain.preview(), "DATEPART(WEEKDAY, DATEADD(DAY, 1, value))");
}

#[test]
fn test_invalid_middle_step_does_not_break_composition() {
    let spec = ChainSpec {
        steps: vec![
            Some(FunctionConfig::Lower),
            Some(FunctionConfig::Case(perseus::CaseParams {
                cases: vec![CaseBranch::new("1", "")],
                default: None,
            })),
            Some(FunctionConfig::Trim),
        ],
    };

    let chain = TransformationChain::from_spec(&spec).unwrap();
    assert_eq!(chain.preview(), "LOWER(TRIM(value))");
}

#[test]
fn test_steps_without_function_give_empty_preview() {
    let chain = TransformationChain::from_spec(&ChainSpec {
        steps: vec![None, None, None],
    })
    .unwrap();

    assert_eq!(chain.len(), 3);
    assert_eq!(chain.preview(), "");
    assert_eq!(chain.active_subscriptions(), 0);
}

#[test]
fn test_removed_step_never_fires_again() {
    let preview = MemoryPreview::new();
    let mut chain = TransformationChain::new(
        Box::new(preview.clone()),
        Box::new(RecordingSlots::default()),
    );
    chain.add_step();
    let replace = chain.select_function(FunctionKind::Replace, 0).unwrap();

    chain.remove_step(0).unwrap();
    let pushed = preview.history().len();

    replace
        .update(|config| {
            if let FunctionConfig::Replace(params) = config {
                params.old = "x".to_string();
            }
        })
        .unwrap();

    assert_eq!(preview.history().len(), pushed);
    assert_eq!(replace.change_notifier().listener_count(), 0);
    assert!(matches!(
        chain.remove_step(0),
        Err(PerseusError::StepOutOfRange { index: 0, len: 0 })
    ));
}
