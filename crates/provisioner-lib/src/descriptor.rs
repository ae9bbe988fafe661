//! Workload descriptor builder
//!
//! Maps a [`WorkloadIntent`] onto a complete Deployment description with the
//! provisioner's fixed policy applied:
//! - one replica
//! - a generate-on-create name prefix instead of a final name
//! - a single `web` container with request == limit for every resource
//! - selector and pod template labels taken from the same label value

use crate::models::{
    ContainerSpec, PortProtocol, PortSpec, ResourceBound, ResourceKind, WorkloadDescriptor,
    WorkloadIntent,
};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const REPLICAS: i32 = 1;
pub const CONTAINER_NAME: &str = "web";
pub const CONTAINER_IMAGE: &str = "nginx:1.12";
pub const HTTP_PORT_NAME: &str = "http";
pub const HTTP_PORT: i32 = 80;
/// Half a core
pub const CPU_QUANTITY: &str = "500m";
pub const MEMORY_QUANTITY: &str = "100Mi";

/// Build the descriptor for an intent. Never fails.
pub fn build(intent: &WorkloadIntent) -> WorkloadDescriptor {
    let labels = intent.labels().clone();

    WorkloadDescriptor {
        name_prefix: name_prefix(intent.base_name()),
        namespace: DEFAULT_NAMESPACE.to_string(),
        selector: labels.clone(),
        template_labels: labels,
        container: web_container(),
        replicas: REPLICAS,
    }
}

fn name_prefix(base_name: &str) -> String {
    format!("{}-", base_name)
}

fn web_container() -> ContainerSpec {
    ContainerSpec {
        name: CONTAINER_NAME.to_string(),
        image: CONTAINER_IMAGE.to_string(),
        resources: vec![
            ResourceBound::guaranteed(ResourceKind::Cpu, CPU_QUANTITY),
            ResourceBound::guaranteed(ResourceKind::Memory, MEMORY_QUANTITY),
        ],
        ports: vec![PortSpec {
            name: HTTP_PORT_NAME.to_string(),
            protocol: PortProtocol::Tcp,
            container_port: HTTP_PORT,
        }],
    }
}

impl ContainerSpec {
    fn to_container(&self) -> Container {
        let requests: BTreeMap<String, Quantity> = self
            .resources
            .iter()
            .map(|r| (r.kind().as_str().to_string(), r.request().clone()))
            .collect();
        let limits: BTreeMap<String, Quantity> = self
            .resources
            .iter()
            .map(|r| (r.kind().as_str().to_string(), r.limit().clone()))
            .collect();

        let ports = self
            .ports
            .iter()
            .map(|p| ContainerPort {
                name: Some(p.name.clone()),
                protocol: Some(p.protocol.as_str().to_string()),
                container_port: p.container_port,
                ..Default::default()
            })
            .collect();

        Container {
            name: self.name.clone(),
            image: Some(self.image.clone()),
            ports: Some(ports),
            resources: Some(ResourceRequirements {
                requests: Some(requests),
                limits: Some(limits),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl WorkloadDescriptor {
    /// Render the Deployment object sent to the API server.
    ///
    /// Only `generateName` is set; `metadata.name` stays empty so the server
    /// picks the final name.
    pub fn to_deployment(&self) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                generate_name: Some(self.name_prefix.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_labels: Some(self.selector.to_btree()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(self.template_labels.to_btree()),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![self.container.to_container()],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
