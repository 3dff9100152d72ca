use crate::api::{ApiError, Client};

pub const RUN_PENDING: &str = "pending";
pub const RUN_ERRORED: &str = "errored";
pub const DEFAULT_STUCK_STATUS: &str = "cost_estimated";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPermissions {
    pub can_apply: bool,
    pub can_cancel: bool,
    pub can_discard: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunActions {
    pub is_confirmable: bool,
    pub is_cancelable: bool,
    pub is_discardable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub status: String,
    pub permissions: RunPermissions,
    pub actions: RunActions,
}

/// A workspace as seen by one invocation: fetched fresh, never persisted.
/// Workspaces without a current run are filtered out during retrieval, so
/// `current_run` is always present here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub auto_apply: bool,
    pub can_queue_run: bool,
    pub current_run: Run,
}

// A run may only be acted on when the caller holds the permission AND the
// server reports the matching action as currently available. Permission
// alone is not sufficient.

pub fn confirm_eligible(permissions: &RunPermissions, actions: &RunActions) -> bool {
    permissions.can_apply && actions.is_confirmable
}

pub fn cancel_eligible(permissions: &RunPermissions, actions: &RunActions) -> bool {
    permissions.can_cancel && actions.is_cancelable
}

pub fn discard_eligible(permissions: &RunPermissions, actions: &RunActions) -> bool {
    permissions.can_discard && actions.is_discardable
}

/// The full set of calls one invocation intends to make. `creates` holds
/// workspace ids; the other lists hold run ids. `skips` is informational
/// only and never produces a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    pub creates: Vec<String>,
    pub confirms: Vec<String>,
    pub cancels: Vec<String>,
    pub discards: Vec<String>,
    pub skips: Vec<String>,
}

impl ActionPlan {
    pub fn change_count(&self) -> usize {
        self.creates.len()
            + self.confirms.len()
            + self.cancels.len()
            + self.discards.len()
            + self.skips.len()
    }
}

pub fn plan_run(org: &str, workspaces: &[Workspace], errored_only: bool) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for ws in workspaces {
        if !ws.can_queue_run {
            eprintln!("warning: {org} {}: no queue-run permission, skipping", ws.name);
            continue;
        }
        if errored_only && ws.current_run.status != RUN_ERRORED {
            continue;
        }
        eprintln!("{org} {} will start run", ws.name);
        plan.creates.push(ws.id.clone());
    }
    plan
}

pub fn plan_confirm(org: &str, workspaces: &[Workspace]) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for ws in workspaces {
        let run = &ws.current_run;
        if confirm_eligible(&run.permissions, &run.actions) {
            eprintln!("{org} {} will confirm {}", ws.name, run.id);
            plan.confirms.push(run.id.clone());
        } else {
            eprintln!("warning: {org} {}: run {} is not confirmable, skipping", ws.name, run.id);
        }
    }
    plan
}

pub fn plan_discard(org: &str, workspaces: &[Workspace]) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for ws in workspaces {
        let run = &ws.current_run;
        if discard_eligible(&run.permissions, &run.actions) {
            eprintln!("{org} {} will discard {}", ws.name, run.id);
            plan.discards.push(run.id.clone());
        } else {
            eprintln!("warning: {org} {}: run {} is not discardable, skipping", ws.name, run.id);
        }
    }
    plan
}

pub fn plan_cancel(org: &str, workspaces: &[Workspace]) -> ActionPlan {
    let mut plan = ActionPlan::default();
    for ws in workspaces {
        let run = &ws.current_run;
        if cancel_eligible(&run.permissions, &run.actions) {
            eprintln!("{org} {} will cancel {}", ws.name, run.id);
            plan.cancels.push(run.id.clone());
        } else {
            eprintln!("warning: {org} {}: run {} is not cancelable, skipping", ws.name, run.id);
        }
    }
    plan
}

/// Build the cleanup plan for every workspace whose current run sits at
/// `stuck_status`. The run queue is fetched lazily per workspace through
/// `fetch_queue`; a retrieval error aborts planning entirely so no mutation
/// is ever attempted on partial knowledge.
pub fn plan_cleanup<F, E>(
    org: &str,
    workspaces: &[Workspace],
    stuck_status: &str,
    mut fetch_queue: F,
) -> Result<ActionPlan, E>
where
    F: FnMut(&Workspace) -> Result<Vec<Run>, E>,
{
    let mut plan = ActionPlan::default();
    for ws in workspaces {
        if ws.current_run.status != stuck_status {
            continue;
        }
        let queue = fetch_queue(ws)?;
        triage_queue(org, ws, &queue, stuck_status, &mut plan);
    }
    Ok(plan)
}

/// Walk one workspace's run queue in order. Position 0 is the active run and
/// the only position that may ever be confirmed; every run behind it must be
/// cleared (discarded if stuck, cancelled if merely queued) before the next
/// run can become head.
pub fn triage_queue(
    org: &str,
    ws: &Workspace,
    queue: &[Run],
    stuck_status: &str,
    plan: &mut ActionPlan,
) {
    for (position, run) in queue.iter().enumerate() {
        if position == 0 {
            if run.status == stuck_status {
                if !ws.auto_apply {
                    eprintln!(
                        "{org} {}: auto-apply disabled, leaving {} for manual confirmation",
                        ws.name, run.id
                    );
                } else if confirm_eligible(&run.permissions, &run.actions) {
                    eprintln!("{org} {} will confirm {}", ws.name, run.id);
                    plan.confirms.push(run.id.clone());
                } else {
                    eprintln!(
                        "warning: {org} {}: run {} is not confirmable, skipping",
                        ws.name, run.id
                    );
                }
            } else if run.status == RUN_PENDING {
                // Expected to queue itself once the runs behind it are cleared.
                eprintln!("{org} {} will skip {}", ws.name, run.id);
                plan.skips.push(run.id.clone());
            }
        } else if run.status == stuck_status {
            if discard_eligible(&run.permissions, &run.actions) {
                eprintln!("{org} {} will discard {}", ws.name, run.id);
                plan.discards.push(run.id.clone());
            } else {
                eprintln!(
                    "warning: {org} {}: run {} is not discardable, skipping",
                    ws.name, run.id
                );
            }
        } else if run.status == RUN_PENDING {
            if cancel_eligible(&run.permissions, &run.actions) {
                eprintln!("{org} {} will cancel {}", ws.name, run.id);
                plan.cancels.push(run.id.clone());
            } else {
                eprintln!(
                    "warning: {org} {}: run {} is not cancelable, skipping",
                    ws.name, run.id
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub started: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub discarded: usize,
    pub skipped: usize,
}

/// Issue the planned calls strictly in sequence. Batch order is fixed:
/// cancels, then discards, then confirms, then creates. A discard mutates the
/// workspace's head/queue relationship, so pending cancellations must land
/// first. The first error aborts the remainder; completed calls are not
/// rolled back.
pub fn dispatch(client: &Client, plan: &ActionPlan) -> Result<DispatchReport, ApiError> {
    let mut report = DispatchReport {
        skipped: plan.skips.len(),
        ..DispatchReport::default()
    };
    for run_id in &plan.cancels {
        eprintln!("canceling {run_id}");
        client.cancel_run(run_id)?;
        report.cancelled += 1;
    }
    for run_id in &plan.discards {
        eprintln!("discarding {run_id}");
        client.discard_run(run_id)?;
        report.discarded += 1;
    }
    for run_id in &plan.confirms {
        eprintln!("confirming {run_id}");
        client.apply_run(run_id)?;
        report.confirmed += 1;
    }
    for workspace_id in &plan.creates {
        let run_id = client.create_run(workspace_id)?;
        eprintln!("started {run_id}");
        report.started += 1;
    }
    Ok(report)
}
