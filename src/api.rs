use crate::engine::{Run, RunActions, RunPermissions, Workspace, RUN_PENDING};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

const DEFAULT_TFE_ADDRESS: &str = "https://app.terraform.io";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Environment variable 'TFE_TOKEN' not found")]
    MissingToken,
    #[error("tfe api request failed: {0}")]
    Request(String),
}

/// Minimal blocking client for the Terraform Cloud/Enterprise v2 API. One
/// request outstanding at a time; retries, if any, are the transport's
/// business, not ours.
#[derive(Debug, Clone)]
pub struct Client {
    api_base: String,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceListDocument {
    #[serde(default)]
    data: Vec<WorkspaceResource>,
    #[serde(default)]
    included: Vec<RunResource>,
    #[serde(default)]
    meta: DocumentMeta,
}

#[derive(Debug, Clone, Deserialize)]
struct RunListDocument {
    #[serde(default)]
    data: Vec<RunResource>,
    #[serde(default)]
    meta: DocumentMeta,
}

#[derive(Debug, Clone, Deserialize)]
struct RunDocument {
    data: RunResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DocumentMeta {
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Pagination {
    #[serde(default, rename = "next-page")]
    next_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceResource {
    id: String,
    attributes: WorkspaceAttributes,
    #[serde(default)]
    relationships: WorkspaceRelationships,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceAttributes {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "auto-apply")]
    auto_apply: bool,
    #[serde(default)]
    permissions: WorkspacePermissions,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspacePermissions {
    #[serde(default, rename = "can-queue-run")]
    can_queue_run: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspaceRelationships {
    #[serde(default, rename = "current-run")]
    current_run: Option<RelationshipRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RelationshipRef {
    #[serde(default)]
    data: Option<ResourceIdentifier>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResourceIdentifier {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RunResource {
    id: String,
    #[serde(default)]
    attributes: RunAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RunAttributes {
    #[serde(default)]
    status: String,
    #[serde(default)]
    permissions: RunPermissionsWire,
    #[serde(default)]
    actions: RunActionsWire,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RunPermissionsWire {
    #[serde(default, rename = "can-apply")]
    can_apply: bool,
    #[serde(default, rename = "can-cancel")]
    can_cancel: bool,
    #[serde(default, rename = "can-discard")]
    can_discard: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RunActionsWire {
    #[serde(default, rename = "is-confirmable")]
    is_confirmable: bool,
    #[serde(default, rename = "is-cancelable")]
    is_cancelable: bool,
    #[serde(default, rename = "is-discardable")]
    is_discardable: bool,
}

fn run_from_resource(resource: RunResource) -> Run {
    Run {
        id: resource.id,
        status: resource.attributes.status,
        permissions: RunPermissions {
            can_apply: resource.attributes.permissions.can_apply,
            can_cancel: resource.attributes.permissions.can_cancel,
            can_discard: resource.attributes.permissions.can_discard,
        },
        actions: RunActions {
            is_confirmable: resource.attributes.actions.is_confirmable,
            is_cancelable: resource.attributes.actions.is_cancelable,
            is_discardable: resource.attributes.actions.is_discardable,
        },
    }
}

impl Client {
    /// Reads the required `TFE_TOKEN` credential from the environment. The
    /// `TFE_ADDRESS` override exists for Terraform Enterprise installs and
    /// tests.
    pub fn from_env() -> Result<Self, ApiError> {
        let token = std::env::var("TFE_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;
        Ok(Self::new(token))
    }

    pub fn new(token: String) -> Self {
        let api_base = std::env::var("TFE_ADDRESS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TFE_ADDRESS.to_string());
        Self { api_base, token }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{url}?{encoded}");
        }

        let response = ureq::get(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/vnd.api+json")
            .call()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        response
            .into_json::<T>()
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = ureq::post(&self.endpoint(path))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/vnd.api+json")
            .send_json(body)
            .map_err(|e| ApiError::Request(e.to_string()))?;

        response
            .into_json::<T>()
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    // Apply/cancel/discard respond 202 with no useful body.
    fn post_action(&self, path: &str) -> Result<(), ApiError> {
        ureq::post(&self.endpoint(path))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Content-Type", "application/vnd.api+json")
            .send_json(json!({}))
            .map(|_| ())
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    /// List every workspace in `org` matching the optional name filter,
    /// following pagination to exhaustion. Workspaces whose current-run
    /// relationship does not resolve to an included run are dropped: every
    /// downstream decision needs the current run's status and flags. An error
    /// on any page discards the partial result.
    pub fn list_workspaces(&self, org: &str, search: &str) -> Result<Vec<Workspace>, ApiError> {
        let mut workspaces = Vec::new();
        let mut page = 1u32;
        loop {
            let mut query = vec![
                ("page[number]", page.to_string()),
                ("include", "current_run".to_string()),
            ];
            if !search.trim().is_empty() {
                query.push(("search[name]", search.to_string()));
            }

            let doc: WorkspaceListDocument =
                self.get_json(&format!("organizations/{org}/workspaces"), &query)?;

            let included: BTreeMap<String, Run> = doc
                .included
                .into_iter()
                .map(|resource| (resource.id.clone(), run_from_resource(resource)))
                .collect();
            for resource in doc.data {
                let current_run = resource
                    .relationships
                    .current_run
                    .as_ref()
                    .and_then(|rel| rel.data.as_ref())
                    .and_then(|ident| included.get(&ident.id));
                if let Some(run) = current_run {
                    workspaces.push(Workspace {
                        id: resource.id,
                        name: resource.attributes.name,
                        auto_apply: resource.attributes.auto_apply,
                        can_queue_run: resource.attributes.permissions.can_queue_run,
                        current_run: run.clone(),
                    });
                }
            }

            match doc.meta.pagination.next_page {
                Some(next) if next > page => page = next,
                _ => {
                    eprintln!("found {} workspace(s)", workspaces.len());
                    return Ok(workspaces);
                }
            }
        }
    }

    /// Retrieve the run queue for `workspace_id`, keeping only runs at the
    /// stuck status or `pending`. Pagination continues only while the last
    /// run on the current page is still pending; the server orders pending
    /// runs contiguously at the queue tail, so a non-pending frontier means
    /// nothing further back is worth fetching. An empty page also stops.
    pub fn list_waiting_runs(
        &self,
        workspace_id: &str,
        stuck_status: &str,
    ) -> Result<Vec<Run>, ApiError> {
        let mut runs = Vec::new();
        let mut page = 1u32;
        loop {
            let query = vec![("page[number]", page.to_string())];
            let doc: RunListDocument =
                self.get_json(&format!("workspaces/{workspace_id}/runs"), &query)?;

            let frontier_pending = doc
                .data
                .last()
                .map(|resource| resource.attributes.status == RUN_PENDING)
                .unwrap_or(false);
            for resource in doc.data {
                let run = run_from_resource(resource);
                if run.status == stuck_status || run.status == RUN_PENDING {
                    runs.push(run);
                }
            }

            match doc.meta.pagination.next_page {
                Some(next) if frontier_pending && next > page => page = next,
                _ => return Ok(runs),
            }
        }
    }

    /// Queue a new run on the workspace and return the new run's id.
    pub fn create_run(&self, workspace_id: &str) -> Result<String, ApiError> {
        let body = json!({
            "data": {
                "type": "runs",
                "relationships": {
                    "workspace": {
                        "data": { "type": "workspaces", "id": workspace_id }
                    }
                }
            }
        });
        let doc: RunDocument = self.post_json("runs", body)?;
        Ok(doc.data.id)
    }

    pub fn apply_run(&self, run_id: &str) -> Result<(), ApiError> {
        self.post_action(&format!("runs/{run_id}/actions/apply"))
    }

    pub fn cancel_run(&self, run_id: &str) -> Result<(), ApiError> {
        self.post_action(&format!("runs/{run_id}/actions/cancel"))
    }

    pub fn discard_run(&self, run_id: &str) -> Result<(), ApiError> {
        self.post_action(&format!("runs/{run_id}/actions/discard"))
    }
}
