//! Rendered values of a cluster.
//!
//! These types describe workloads without committing to a client library, the `render`
//! module translates them into k8s objects.
use std::collections::BTreeMap;

use crate::cluster::spec::{Toleration, VolumeSourceKind};

/// A stable identity, ordered set of replicas. Rendered as a stateful set.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadTemplate {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    /// Governing service of the replicas.
    pub service_name: String,
    pub replicas: i32,
    pub update_policy: UpdatePolicy,
    pub pod: PodTemplate,
    /// Claims instantiated once per replica.
    pub claim_templates: Vec<ClaimTemplate>,
}

/// How replicas are replaced when the pod template changes.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePolicy {
    /// Replace replicas in order, at most this percentage of them down at once.
    RollingUpdate { max_unavailable_percent: u8 },
}

/// Template every replica is created from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PodTemplate {
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub placement: Placement,
    /// Run to completion, in order, before any of `containers` start.
    pub init_containers: Vec<ContainerTemplate>,
    pub containers: Vec<ContainerTemplate>,
    pub volumes: Vec<VolumeTemplate>,
    pub restart_policy: Option<String>,
}

/// Where pods may be scheduled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub node_selector: Option<BTreeMap<String, String>>,
    pub tolerations: Option<Vec<Toleration>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContainerTemplate {
    pub name: String,
    pub image: String,
    pub image_pull_policy: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<EnvVar>,
    pub ports: Vec<ContainerPort>,
    pub volume_mounts: Vec<VolumeMount>,
    pub readiness_probe: Option<Probe>,
    /// Linux capabilities added to the container.
    pub capabilities: Vec<String>,
    /// Resource limits keyed by resource name.
    pub limits: BTreeMap<String, String>,
    pub termination_message: Option<TerminationMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvVar {
    pub name: String,
    pub value: EnvValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnvValue {
    Literal(String),
    /// Path of a field of the pod itself, i.e. `metadata.name`.
    PodField(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerPort {
    pub name: String,
    pub port: i32,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    TcpSocket { port: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerminationMessage {
    pub path: String,
    pub policy: String,
}

/// A volume mounted into every replica.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTemplate {
    pub name: String,
    pub source: VolumeBacking,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VolumeBacking {
    ConfigMap {
        name: String,
        default_mode: Option<i32>,
    },
    Secret {
        secret_name: String,
        items: Vec<KeyToPath>,
        default_mode: Option<i32>,
    },
    HostPath {
        path: String,
        type_: Option<String>,
    },
    EmptyDir,
    /// Storage declared once for the whole cluster.
    Declared(VolumeSourceKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyToPath {
    pub key: String,
    pub path: String,
    pub mode: Option<i32>,
}

/// A per-replica storage request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimTemplate {
    pub name: String,
    pub size: String,
    pub storage_class_name: Option<String>,
    pub access_modes: Vec<String>,
}

/// Network identity of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTemplate {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ContainerPort>,
    /// Headless services have no cluster IP, replicas are addressed by DNS.
    pub headless: bool,
}

/// A job run on a schedule. Rendered as a cron job.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkJobTemplate {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub schedule: String,
    pub active_deadline_seconds: i64,
    pub successful_jobs_history_limit: i32,
    pub failed_jobs_history_limit: i32,
    pub pod: PodTemplate,
}

/// Everything rendered for a node role.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeManifests {
    pub service: ServiceTemplate,
    pub workload: WorkloadTemplate,
}

/// Everything rendered for a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterManifests {
    pub controller: NodeManifests,
    pub worker: NodeManifests,
    pub benchmark: Option<BenchmarkJobTemplate>,
}
