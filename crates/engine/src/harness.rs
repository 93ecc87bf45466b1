//! Test harness for board commands with event tracking.
//!
//! Wraps a `RuleBoard`, drains events into a collector after every step,
//! and provides the invariant assertions the consistency tests share.

use crate::events::EventCollector;
use crate::ruleboard::{ConditionSeed, FormulaSeed, RuleBoard};
use crate::row::RowId;

pub struct BoardHarness {
    pub board: RuleBoard,
    pub events: EventCollector,
}

impl BoardHarness {
    pub fn new() -> Self {
        Self {
            board: RuleBoard::new(),
            events: EventCollector::new(),
        }
    }

    /// Board pre-loaded with `n` formulas (orders 1..=n) and one condition
    /// per tag list in `tag_lists`.
    pub fn seeded(n: u32, tag_lists: &[&str]) -> Self {
        let mut harness = Self::new();
        harness.board.set_device(Some("dev-a".into()));
        harness.board.set_data_type(Some("type-a".into()));

        let formulas = (1..=n)
            .map(|i| FormulaSeed {
                output_variable: format!("v{i}"),
                expression: format!("x + {i}"),
                order: i,
                extra1: String::new(),
                extra2: String::new(),
            })
            .collect();
        let conditions = tag_lists
            .iter()
            .map(|tags| ConditionSeed {
                condition_expr: "x > 0".into(),
                failure_handling: String::new(),
                impact_tags: (*tags).into(),
            })
            .collect();

        let ticket = harness.board.begin_load();
        assert!(harness.board.apply_rows(ticket, conditions, formulas));
        harness.drain();
        harness.events.clear();
        harness
    }

    /// Pull pending events into the collector.
    pub fn drain(&mut self) {
        self.events.extend(self.board.take_events());
    }

    pub fn formula_id_at_order(&self, order: u32) -> RowId {
        self.board.formulas()[order as usize - 1].id
    }

    pub fn condition_id(&self, index: usize) -> RowId {
        self.board.conditions()[index].id
    }

    pub fn tags_of(&self, index: usize) -> String {
        let id = self.condition_id(index);
        self.board.rendered_tags(id).unwrap()
    }

    /// Formula output variables in display order.
    pub fn variables(&self) -> Vec<String> {
        self.board
            .formulas()
            .iter()
            .map(|r| r.output_variable.clone())
            .collect()
    }

    /// Invariant: orders are exactly the permutation 1..=N.
    pub fn assert_dense(&self) {
        let n = self.board.formulas().len();
        let mut orders: Vec<u32> = self
            .board
            .formulas()
            .iter()
            .map(|r| self.board.orders().order_of(r.id).expect("row not indexed"))
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, (1..=n as u32).collect::<Vec<_>>());

        // Snapshot orders must agree with the registry.
        for (idx, view) in self.board.snapshot().formulas.iter().enumerate() {
            assert_eq!(view.order, idx as u32 + 1);
        }
    }

    /// Invariant: every rendered tag resolves to an existing order.
    pub fn assert_refs_valid(&self) {
        let n = self.board.formulas().len() as u32;
        for view in self.board.snapshot().conditions {
            for tag in crate::remap::parse_tags(&view.impact_tags) {
                assert!(
                    tag >= 1 && tag <= n,
                    "tag {tag} out of range 1..={n} in '{}'",
                    view.impact_tags
                );
            }
        }
    }
}
