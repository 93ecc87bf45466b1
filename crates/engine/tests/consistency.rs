// End-to-end consistency checks across mixed command sequences.
// Run with: cargo test -p ruleboard-engine --test consistency

use ruleboard_engine::{
    BoardEvent, ConditionSeed, FormulaField, FormulaSeed, MoveOutcome, RuleBoard, Table,
};

fn formula_seed(var: &str, order: u32) -> FormulaSeed {
    FormulaSeed {
        output_variable: var.into(),
        expression: format!("={var}*2"),
        order,
        extra1: String::new(),
        extra2: String::new(),
    }
}

fn condition_seed(expr: &str, tags: &str) -> ConditionSeed {
    ConditionSeed {
        condition_expr: expr.into(),
        failure_handling: "alarm".into(),
        impact_tags: tags.into(),
    }
}

fn loaded_board(tags: &[&str], formulas: u32) -> RuleBoard {
    let mut board = RuleBoard::new();
    board.set_device(Some("press-7".into()));
    board.set_data_type(Some("vibration".into()));
    let ticket = board.begin_load();
    let seeds = (1..=formulas)
        .map(|i| formula_seed(&format!("f{i}"), i))
        .collect();
    let conditions = tags.iter().map(|t| condition_seed("x > 1", t)).collect();
    assert!(board.apply_rows(ticket, conditions, seeds));
    board.take_events();
    board
}

fn orders(board: &RuleBoard) -> Vec<u32> {
    board.snapshot().formulas.iter().map(|f| f.order).collect()
}

fn tags(board: &RuleBoard, index: usize) -> String {
    board.snapshot().conditions[index].impact_tags.clone()
}

fn assert_invariants(board: &RuleBoard) {
    let view = board.snapshot();
    let n = view.formulas.len() as u32;
    assert_eq!(
        orders(board),
        (1..=n).collect::<Vec<_>>(),
        "orders must be dense 1..=N"
    );
    for c in &view.conditions {
        for part in c.impact_tags.split(',').filter(|p| !p.is_empty()) {
            let tag: u32 = part.parse().expect("tags are decimal");
            assert!(
                (1..=n).contains(&tag),
                "dangling tag {tag} with {n} formulas"
            );
        }
    }
}

#[test]
fn mixed_sequence_preserves_invariants() {
    let mut board = loaded_board(&["1,2,4", "3"], 4);

    // Move f4 to the front: [f4, f1, f2, f3].
    let f4 = board.snapshot().formulas[3].id;
    board
        .move_formula(MoveOutcome {
            row: f4,
            target_order: 1,
        })
        .unwrap();
    assert_invariants(&board);
    assert_eq!(tags(&board, 0), "1,2,3");
    assert_eq!(tags(&board, 1), "4");

    // Delete the rows now at orders 1 and 3 (f4 and f2).
    let doomed: Vec<_> = [0usize, 2].iter().map(|i| board.snapshot().formulas[*i].id).collect();
    for id in doomed {
        board.toggle_formula_selected(id).unwrap();
    }
    assert_eq!(board.delete_selected_formulas().unwrap(), 2);
    assert_invariants(&board);
    assert_eq!(tags(&board, 0), "1");
    assert_eq!(tags(&board, 1), "2");

    // Append and edit the new row.
    let added = board.add_formula();
    assert_invariants(&board);
    board
        .start_formula_edit(added, FormulaField::OutputVariable)
        .unwrap();
    board.set_draft("f5").unwrap();
    board.commit_edit().unwrap();
    let view = board.snapshot();
    assert_eq!(view.formulas[2].output_variable, "f5");
    assert_eq!(view.formulas[2].order, 3);
}

#[test]
fn delete_events_carry_the_permutation() {
    let mut board = loaded_board(&["2,4"], 4);
    let victim = board.snapshot().formulas[1].id;
    board.toggle_formula_selected(victim).unwrap();
    board.delete_selected_formulas().unwrap();

    let events = board.take_events();
    let mapping = events
        .iter()
        .find_map(|e| match e {
            BoardEvent::OrdersRemapped(m) => Some(m),
            _ => None,
        })
        .expect("delete must announce the remap");
    assert_eq!(mapping.translate(2), None);
    assert_eq!(mapping.translate(4), Some(3));
    assert!(events.contains(&BoardEvent::RowsChanged(Table::Formulas)));
    assert!(events.contains(&BoardEvent::RowsChanged(Table::Conditions)));
}

#[test]
fn identity_remap_only_normalizes_sort_order() {
    // "3,1" is stored unordered on the wire; with no structural change the
    // rendered form is the ascending normalization and nothing else.
    let board = loaded_board(&["3,1"], 3);
    assert_eq!(tags(&board, 0), "1,3");
}

#[test]
fn deleting_every_formula_empties_all_tags() {
    let mut board = loaded_board(&["1,2,3"], 3);
    let all: Vec<_> = board.snapshot().formulas.iter().map(|f| f.id).collect();
    for id in all {
        board.toggle_formula_selected(id).unwrap();
    }
    assert_eq!(board.delete_selected_formulas().unwrap(), 3);
    assert_invariants(&board);
    assert_eq!(tags(&board, 0), "");
    assert!(board.snapshot().formulas.is_empty());
}

#[test]
fn association_survives_a_reorder_mid_session() {
    // Dragging while associating is allowed; picks track identities, so the
    // confirm lands on the same rows under their new orders.
    let mut board = loaded_board(&[""], 3);
    let condition = board.snapshot().conditions[0].id;
    board.start_association(condition).unwrap();

    let f1 = board.snapshot().formulas[0].id;
    board.toggle_association_pick(f1).unwrap();
    board
        .move_formula(MoveOutcome {
            row: f1,
            target_order: 3,
        })
        .unwrap();
    board.confirm_association().unwrap();

    assert_eq!(tags(&board, 0), "3");
    assert_invariants(&board);
}

#[test]
fn snapshot_serializes_for_renderers() {
    let board = loaded_board(&["1"], 2);
    let json = serde_json::to_value(board.snapshot()).unwrap();
    assert_eq!(json["device"], "press-7");
    assert_eq!(json["formulas"][1]["order"], 2);
    assert_eq!(json["conditions"][0]["impact_tags"], "1");
    assert_eq!(json["selection_enabled"], true);
}
