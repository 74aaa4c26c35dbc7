//! Blocking HTTP client for the compute-management API.

use std::collections::BTreeMap;

use derby_core::types::short_instance_ref;
use derby_core::{
    ClientError, ClientResult, ComputeClient, InstanceGroupPolicy, InstanceGroupSummary,
    MetadataStore, Operation, Project,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::wire::{AggregatedGroupsPage, ManagedInstancesPage, error_message};

/// Compute Engine beta API root.
pub const DEFAULT_ENDPOINT: &str = "https://compute.googleapis.com/compute/beta/";

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

#[derive(Clone)]
pub struct ComputeRestClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ComputeRestClient {
    pub fn new(endpoint: &str, token: Option<&str>) -> ClientResult<Self> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| ClientError::Transport(format!("invalid endpoint {endpoint}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "invalid endpoint {endpoint}: not a base URL"
            )));
        }
        let http = Client::builder()
            .user_agent(concat!("rollerderby/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url,
            token: token.map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the endpoint.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn group_url(&self, project_id: &str, zone: &str, group: &str) -> Url {
        self.url(&[
            "projects",
            project_id,
            "zones",
            zone,
            "instanceGroupManagers",
            group,
        ])
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let response = req.send().map_err(transport)?;
        let status = response.status();
        let body = response.text().map_err(transport)?;
        debug!(status = status.as_u16(), bytes = body.len(), "compute api response");

        if status == StatusCode::PRECONDITION_FAILED {
            return Err(ClientError::PreconditionFailed(error_message(&body)));
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl ComputeClient for ComputeRestClient {
    fn get_project(&self, project_id: &str) -> ClientResult<Project> {
        let url = self.url(&["projects", project_id]);
        self.send(self.http.get(url))
    }

    fn set_common_metadata(
        &self,
        project_id: &str,
        metadata: &MetadataStore,
    ) -> ClientResult<Operation> {
        let url = self.url(&["projects", project_id, "setCommonInstanceMetadata"]);
        self.send(self.http.post(url).json(metadata))
    }

    fn get_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<InstanceGroupPolicy> {
        let url = self.group_url(project_id, zone, group);
        self.send(self.http.get(url))
    }

    fn patch_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
        policy: &InstanceGroupPolicy,
    ) -> ClientResult<Operation> {
        let url = self.group_url(project_id, zone, group);
        self.send(self.http.patch(url).json(policy))
    }

    fn list_managed_instances(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<Vec<String>> {
        let mut url = self.group_url(project_id, zone, group);
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("listManagedInstances");
        }

        let mut refs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self.http.post(url.clone());
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let page: ManagedInstancesPage = self.send(req)?;
            refs.extend(
                page.managed_instances
                    .iter()
                    .filter(|m| !m.instance.is_empty())
                    .map(|m| short_instance_ref(&m.instance)),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(refs)
    }

    fn aggregated_list_instance_groups(
        &self,
        project_id: &str,
    ) -> ClientResult<BTreeMap<String, Vec<InstanceGroupSummary>>> {
        let url = self.url(&["projects", project_id, "aggregated", "instanceGroupManagers"]);

        let mut scopes: BTreeMap<String, Vec<InstanceGroupSummary>> = BTreeMap::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self.http.get(url.clone());
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let page: AggregatedGroupsPage = self.send(req)?;
            for (scope, groups) in page.items {
                if !groups.instance_group_managers.is_empty() {
                    scopes
                        .entry(scope)
                        .or_default()
                        .extend(groups.instance_group_managers);
                }
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(scopes)
    }
}
