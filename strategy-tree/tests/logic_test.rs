mod common;

use common::{at, Universe};
use std::sync::Arc;
use strategy_tree::TreeError;
use trading::memory::MemoryStrategy;
use trading::{ExecutionContext, Strategy};

/// Logic that books a fixed AUM for the execution day.
fn reports_aum(value: f64) -> trading::memory::StrategyLogic {
    Arc::new(move |s: &MemoryStrategy, ctx: &ExecutionContext| {
        s.set_value(ctx.order_date, value);
        Ok(())
    })
}

#[test]
fn test_children_run_before_parent_and_residual_last() {
    let u = Universe::new();
    u.root(u.trading(1));
    u.child(1, u.trading(2));
    u.child(1, u.trading(3));
    u.residual(1, u.trading(4));

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert!(u.before("logic:2", "logic:1"));
    assert!(u.before("logic:3", "logic:1"));
    assert!(u.before("logic:1", "logic:4"));
    assert_eq!(u.journal.count("logic:4"), 1);
}

#[test]
fn test_revived_children_trigger_exactly_one_more_pass() {
    let u = Universe::new();
    let root = u.root(u.trading(1).with_logic(reports_aum(1_000.0)));
    let child = u.child(1, u.trading(2));
    // Both carry Friday's AUM, the child reports nothing for Monday.
    root.set_value(at(1, 0), 900.0);
    child.set_value(at(1, 0), 100.0);

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(child.executions(), 2);
    assert_eq!(root.executions(), 2);
}

#[test]
fn test_child_reporting_aum_during_its_run_is_still_run_again() {
    let u = Universe::new();
    let root = u.root(u.trading(1));
    let child = u.child(1, u.trading(2).with_logic(reports_aum(100.0)));
    root.set_value(at(1, 0), 900.0);
    child.set_value(at(1, 0), 100.0);

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(child.executions(), 2);
    assert_eq!(root.executions(), 2);
}

#[test]
fn test_no_second_pass_when_children_start_with_aum() {
    let u = Universe::new();
    let root = u.root(u.trading(1));
    let child = u.child(1, u.trading(2));
    root.set_value(at(1, 0), 900.0);
    child.set_value(at(1, 0), 100.0);
    child.set_value(at(4, 0), 100.0);

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(child.executions(), 1);
    assert_eq!(root.executions(), 1);
}

#[test]
fn test_ineligible_children_do_not_run() {
    let u = Universe::new();
    u.root(u.trading(1));
    // Ends before the next day, so it cannot trade on the 4th.
    let ending = u.child(1, u.trading(2).with_dates(at(1, 0), at(4, 12)));
    let index = u.child(1, u.index(3));
    let later = u.child(1, u.trading(5).with_dates(at(5, 0), at(29, 0)));

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(ending.executions(), 0);
    assert_eq!(index.executions(), 0);
    assert_eq!(later.executions(), 0);
}

#[test]
fn test_failing_child_does_not_stop_parent() {
    let u = Universe::new();
    let root = u.root(u.trading(1));
    let failing = u.child(
        1,
        u.trading(2)
            .with_logic(Arc::new(|_: &MemoryStrategy, _: &ExecutionContext| {
                Err(anyhow::anyhow!("signal unavailable"))
            })),
    );
    let sibling = u.child(1, u.trading(3));

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(failing.executions(), 1);
    assert_eq!(sibling.executions(), 1);
    assert_eq!(root.executions(), 1);
}

#[test]
fn test_parent_failure_is_reported() {
    let u = Universe::new();
    u.root(u.trading(1).with_logic(Arc::new(
        |_: &MemoryStrategy, _: &ExecutionContext| Err(anyhow::anyhow!("risk limit")),
    )));
    let err = u.scheduler.execute_logic(1, at(4, 10), false).unwrap_err();
    assert!(matches!(err, TreeError::Collaborator(_)));
}

#[test]
fn test_busy_root_is_not_run() {
    let u = Universe::new();
    let root = u.root(u.trading(1));
    let _gate = root.gate().try_enter().unwrap();

    let err = u.scheduler.execute_logic(1, at(4, 10), false).unwrap_err();
    assert!(matches!(err, TreeError::Busy(1)));
    assert_eq!(root.executions(), 0);
}

#[test]
fn test_uninitialized_root_only_runs_children() {
    let u = Universe::new();
    let root = Arc::new(u.trading(1));
    u.scheduler.get_or_create(root.clone());
    let child = u.child(1, u.trading(2));

    u.scheduler.execute_logic(1, at(4, 10), false).unwrap();
    assert_eq!(root.executions(), 0);
    assert_eq!(child.executions(), 1);
}
