use crate::engine::DEFAULT_STUCK_STATUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    Confirm,
    Discard,
    Cancel,
    Cleanup,
}

impl Action {
    pub fn parse(input: &str) -> Option<Action> {
        match input {
            "run" => Some(Action::Run),
            "confirm" => Some(Action::Confirm),
            "discard" => Some(Action::Discard),
            "cancel" => Some(Action::Cancel),
            "cleanup" => Some(Action::Cleanup),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Run => "run",
            Action::Confirm => "confirm",
            Action::Discard => "discard",
            Action::Cancel => "cancel",
            Action::Cleanup => "cleanup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub action: Action,
    pub org: String,
    pub search: String,
    pub assume_yes: bool,
    pub stuck_status: String,
    pub errored_only: bool,
}

pub fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let action = Action::parse(args[0].as_str())
        .ok_or_else(|| format!("unknown action `{}`\n\n{}", args[0], usage()))?;

    let mut org = String::new();
    let mut search = String::new();
    let mut assume_yes = false;
    let mut stuck_status = DEFAULT_STUCK_STATUS.to_string();
    let mut errored_only = false;

    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--org" => org = required_value(&mut iter, "--org")?,
            "--search" => search = required_value(&mut iter, "--search")?,
            "--assume-yes" => assume_yes = true,
            "--stuck-status" => stuck_status = required_value(&mut iter, "--stuck-status")?,
            "--errored-only" => errored_only = true,
            other => return Err(format!("unknown flag `{other}`\n\n{}", usage())),
        }
    }

    if org.trim().is_empty() {
        return Err(format!("--org is required\n\n{}", usage()));
    }

    Ok(CliOptions {
        action,
        org,
        search,
        assume_yes,
        stuck_status,
        errored_only,
    })
}

fn required_value<'a, I>(iter: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .map(|v| v.to_string())
        .ok_or_else(|| format!("flag `{flag}` requires a value"))
}

pub fn usage() -> String {
    [
        "usage: runsweep <action> --org <name> [options]",
        "",
        "Actions:",
        "  run       Queue a new run on each workspace that allows it",
        "  confirm   Apply each workspace's confirmable current run",
        "  discard   Discard each workspace's discardable current run",
        "  cancel    Cancel each workspace's cancelable current run",
        "  cleanup   Clear stuck run queues: cancel queued pending runs,",
        "            discard queued stuck runs, confirm the head on",
        "            auto-apply workspaces",
        "",
        "Options:",
        "  --org <name>            Organization name (required)",
        "  --search <substring>    Workspace name filter (optional)",
        "  --assume-yes            Skip the confirmation prompt",
        "  --stuck-status <status> Status where runs wait for confirmation",
        "                          (cleanup only; default: cost_estimated)",
        "  --errored-only          Only start runs on workspaces whose",
        "                          current run errored (run only)",
    ]
    .join("\n")
}

pub fn help_text() -> String {
    format!(
        "runsweep\nBulk lifecycle operations for Terraform Cloud/Enterprise workspace runs.\n\n{}\n\nEnvironment:\n  TFE_TOKEN    API token (required)\n  TFE_ADDRESS  API base address (default: https://app.terraform.io)",
        usage()
    )
}
