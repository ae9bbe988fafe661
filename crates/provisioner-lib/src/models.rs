//! Core data models for the workload provisioner

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while validating a workload intent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    #[error("workload name must not be empty")]
    EmptyName,

    #[error("invalid workload name {0:?}: use lowercase alphanumerics, '-' or '.'")]
    InvalidName(String),

    #[error("workload needs at least one label to be selectable")]
    NoLabels,

    #[error("label keys must not be empty")]
    EmptyLabelKey,
}

/// Immutable label set shared between a selector and a pod template.
///
/// Clones share the same underlying map, so two fields built from one
/// `Labels` value cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Arc<BTreeMap<String, String>>);

impl Labels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self(Arc::new(labels))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if both values point at the same label map
    pub fn shares_storage(&self, other: &Labels) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Owned copy in the shape the Kubernetes API types expect
    pub fn to_btree(&self) -> BTreeMap<String, String> {
        self.0.as_ref().clone()
    }
}

/// What the caller wants deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIntent {
    base_name: String,
    labels: Labels,
}

impl WorkloadIntent {
    /// Validate and build an intent
    pub fn new(
        base_name: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Result<Self, IntentError> {
        let base_name = base_name.into();
        validate_name(&base_name)?;

        if labels.is_empty() {
            return Err(IntentError::NoLabels);
        }
        if labels.keys().any(|k| k.is_empty()) {
            return Err(IntentError::EmptyLabelKey);
        }

        Ok(Self {
            base_name,
            labels: Labels::new(labels),
        })
    }

    /// Intent labelled `app=<name>`
    pub fn with_app_label(name: impl Into<String>) -> Result<Self, IntentError> {
        let name = name.into();
        let labels = BTreeMap::from([("app".to_string(), name.clone())]);
        Self::new(name, labels)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}

/// DNS-1123 subdomain rules for the generated name. Each dot-separated
/// segment starts and ends with an alphanumeric; the last may end in `-`
/// since the server appends an alphanumeric suffix after the prefix.
fn validate_name(name: &str) -> Result<(), IntentError> {
    if name.is_empty() {
        return Err(IntentError::EmptyName);
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let segments: Vec<&str> = name.split('.').collect();
    let last = segments.len() - 1;

    let valid = segments.iter().enumerate().all(|(i, segment)| {
        let (Some(first), Some(end)) = (segment.chars().next(), segment.chars().last()) else {
            return false;
        };
        alnum(first)
            && (alnum(end) || (i == last && end == '-'))
            && segment.chars().all(|c| alnum(c) || c == '-')
    });

    if !valid {
        return Err(IntentError::InvalidName(name.to_string()));
    }

    Ok(())
}

/// Countable resource kinds the builder bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    /// Key used in a Kubernetes resource list
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paired request and limit for one resource kind
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBound {
    kind: ResourceKind,
    request: Quantity,
    limit: Quantity,
}

impl ResourceBound {
    /// Request equal to limit (Guaranteed QoS)
    pub fn guaranteed(kind: ResourceKind, quantity: &str) -> Self {
        Self {
            kind,
            request: Quantity(quantity.to_string()),
            limit: Quantity(quantity.to_string()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn request(&self) -> &Quantity {
        &self.request
    }

    pub fn limit(&self) -> &Quantity {
        &self.limit
    }
}

/// Transport protocol of an exposed port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProtocol {
    Tcp,
}

impl PortProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortProtocol::Tcp => "TCP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub protocol: PortProtocol,
    pub container_port: i32,
}

/// A single container of the workload
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub resources: Vec<ResourceBound>,
    pub ports: Vec<PortSpec>,
}

impl ContainerSpec {
    /// Bound for a resource kind, if the container declares one
    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceBound> {
        self.resources.iter().find(|r| r.kind() == kind)
    }
}

/// Complete, submittable description of a workload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadDescriptor {
    /// Prefix the cluster completes into a unique name on create
    pub name_prefix: String,
    pub namespace: String,
    pub selector: Labels,
    pub template_labels: Labels,
    pub container: ContainerSpec,
    pub replicas: i32,
}

/// Deployment as created by the cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedWorkload {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_requires_labels() {
        let err = WorkloadIntent::new("web", BTreeMap::new()).unwrap_err();
        assert_eq!(err, IntentError::NoLabels);
    }

    #[test]
    fn test_intent_rejects_bad_names() {
        assert_eq!(
            WorkloadIntent::with_app_label("").unwrap_err(),
            IntentError::EmptyName
        );
        assert!(matches!(
            WorkloadIntent::with_app_label("Screen-Recorder"),
            Err(IntentError::InvalidName(_))
        ));
        assert!(matches!(
            WorkloadIntent::with_app_label("-leading"),
            Err(IntentError::InvalidName(_))
        ));
        assert!(matches!(
            WorkloadIntent::with_app_label("under_score"),
            Err(IntentError::InvalidName(_))
        ));
    }

    #[test]
    fn test_intent_rejects_bad_dot_segments() {
        for name in ["web.", "a..b", ".web", "a-.b", "a.-b"] {
            assert_eq!(
                WorkloadIntent::with_app_label(name).unwrap_err(),
                IntentError::InvalidName(name.to_string()),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_intent_accepts_subdomain_names() {
        for name in ["web", "app.v2", "screen-recorder", "batch-", "a1.b2.c3"] {
            assert!(WorkloadIntent::with_app_label(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_intent_rejects_empty_label_key() {
        let labels = BTreeMap::from([(String::new(), "x".to_string())]);
        assert_eq!(
            WorkloadIntent::new("web", labels).unwrap_err(),
            IntentError::EmptyLabelKey
        );
    }

    #[test]
    fn test_with_app_label() {
        let intent = WorkloadIntent::with_app_label("screen-recorder").unwrap();
        assert_eq!(intent.base_name(), "screen-recorder");
        assert_eq!(intent.labels().get("app"), Some("screen-recorder"));
        assert_eq!(intent.labels().len(), 1);
    }

    #[test]
    fn test_guaranteed_bound() {
        let bound = ResourceBound::guaranteed(ResourceKind::Memory, "100Mi");
        assert_eq!(bound.request(), bound.limit());
        assert_eq!(bound.kind().as_str(), "memory");
    }

    #[test]
    fn test_labels_clone_shares_storage() {
        let labels = Labels::new(BTreeMap::from([("app".to_string(), "a".to_string())]));
        let copy = labels.clone();
        assert!(labels.shares_storage(&copy));

        let separate = Labels::new(labels.to_btree());
        assert_eq!(labels, separate);
        assert!(!labels.shares_storage(&separate));
    }
}
