use runsweep::engine::{
    plan_cancel, plan_confirm, plan_discard, plan_run, ActionPlan, Run, RunActions,
    RunPermissions, Workspace, RUN_ERRORED,
};

fn restricted_run(id: &str, status: &str) -> Run {
    Run {
        id: id.to_string(),
        status: status.to_string(),
        permissions: RunPermissions::default(),
        actions: RunActions::default(),
    }
}

fn open_run(id: &str, status: &str) -> Run {
    Run {
        id: id.to_string(),
        status: status.to_string(),
        permissions: RunPermissions {
            can_apply: true,
            can_cancel: true,
            can_discard: true,
        },
        actions: RunActions {
            is_confirmable: true,
            is_cancelable: true,
            is_discardable: true,
        },
    }
}

fn workspace(id: &str, can_queue_run: bool, current_run: Run) -> Workspace {
    Workspace {
        id: id.to_string(),
        name: format!("{id}-name"),
        auto_apply: false,
        can_queue_run,
        current_run,
    }
}

#[test]
fn plan_run_keeps_only_workspaces_with_queue_permission() {
    let workspaces = vec![
        workspace("ws-1", true, restricted_run("run-1", "applied")),
        workspace("ws-2", false, restricted_run("run-2", "applied")),
        workspace("ws-3", true, restricted_run("run-3", "planned")),
    ];
    let plan = plan_run("acme", &workspaces, false);
    assert_eq!(plan.creates, vec!["ws-1".to_string(), "ws-3".to_string()]);
    assert!(plan.confirms.is_empty());
    assert!(plan.cancels.is_empty());
    assert!(plan.discards.is_empty());
    assert!(plan.skips.is_empty());
}

#[test]
fn plan_run_errored_only_requires_errored_current_run() {
    let workspaces = vec![
        workspace("ws-1", true, restricted_run("run-1", RUN_ERRORED)),
        workspace("ws-2", true, restricted_run("run-2", "applied")),
        workspace("ws-3", false, restricted_run("run-3", RUN_ERRORED)),
    ];
    let plan = plan_run("acme", &workspaces, true);
    assert_eq!(plan.creates, vec!["ws-1".to_string()]);
}

#[test]
fn plan_confirm_collects_only_confirmable_current_runs() {
    let workspaces = vec![
        workspace("ws-1", true, open_run("run-1", "planned")),
        workspace("ws-2", true, restricted_run("run-2", "planned")),
    ];
    let plan = plan_confirm("acme", &workspaces);
    assert_eq!(plan.confirms, vec!["run-1".to_string()]);
    assert_eq!(plan.change_count(), 1);
}

#[test]
fn plan_discard_collects_only_discardable_current_runs() {
    let workspaces = vec![
        workspace("ws-1", true, restricted_run("run-1", "planned")),
        workspace("ws-2", true, open_run("run-2", "planned")),
    ];
    let plan = plan_discard("acme", &workspaces);
    assert_eq!(plan.discards, vec!["run-2".to_string()]);
}

#[test]
fn plan_cancel_collects_only_cancelable_current_runs() {
    let workspaces = vec![
        workspace("ws-1", true, open_run("run-1", "planning")),
        workspace("ws-2", true, restricted_run("run-2", "planning")),
        workspace("ws-3", true, open_run("run-3", "planning")),
    ];
    let plan = plan_cancel("acme", &workspaces);
    assert_eq!(plan.cancels, vec!["run-1".to_string(), "run-3".to_string()]);
}

#[test]
fn change_count_sums_every_batch_including_skips() {
    let plan = ActionPlan {
        creates: vec!["ws-1".to_string()],
        confirms: vec!["run-1".to_string()],
        cancels: vec!["run-2".to_string(), "run-3".to_string()],
        discards: vec!["run-4".to_string()],
        skips: vec!["run-5".to_string()],
    };
    assert_eq!(plan.change_count(), 6);
    assert_eq!(ActionPlan::default().change_count(), 0);
}
