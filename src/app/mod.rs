use crate::api::{ApiError, Client};
use crate::engine::{self, ActionPlan};
use crate::prompt::confirm_gate;
use self::cli::{Action, CliOptions};

pub mod cli;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(cli::help_text());
    }
    let options = cli::parse_args(&args)?;
    let client = Client::from_env().map_err(|e| e.to_string())?;
    execute(&client, &options).map_err(|e| e.to_string())
}

fn execute(client: &Client, options: &CliOptions) -> Result<String, ApiError> {
    let workspaces = client.list_workspaces(&options.org, &options.search)?;

    let plan: ActionPlan = match options.action {
        Action::Run => engine::plan_run(&options.org, &workspaces, options.errored_only),
        Action::Confirm => engine::plan_confirm(&options.org, &workspaces),
        Action::Discard => engine::plan_discard(&options.org, &workspaces),
        Action::Cancel => engine::plan_cancel(&options.org, &workspaces),
        Action::Cleanup => {
            engine::plan_cleanup(&options.org, &workspaces, &options.stuck_status, |ws| {
                client.list_waiting_runs(&ws.id, &options.stuck_status)
            })?
        }
    };

    let stdin = std::io::stdin();
    if !confirm_gate(plan.change_count(), options.assume_yes, &mut stdin.lock()) {
        return Ok("no changes applied".to_string());
    }

    let report = engine::dispatch(client, &plan)?;
    Ok(format!(
        "{} complete\nstarted={} confirmed={} cancelled={} discarded={} skipped={}",
        options.action.name(),
        report.started,
        report.confirmed,
        report.cancelled,
        report.discarded,
        report.skipped
    ))
}
