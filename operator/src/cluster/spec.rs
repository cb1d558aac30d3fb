//! Place all spec types into a single module so they can be used as a lightweight dependency
use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::ManifestError;

/// Primary CRD for describing a Slurm cluster.
#[derive(CustomResource, Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "slurm.nebius.ai",
    version = "v1",
    kind = "SlurmCluster",
    plural = "slurmclusters",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SlurmClusterSpec {
    /// Named node filters. Node roles reference one of these by name to decide where their
    /// pods are scheduled.
    pub k8s_node_filters: Vec<K8sNodeFilter>,
    /// Named volume sources that node volumes may reference instead of requesting a
    /// per-replica claim.
    #[serde(default)]
    pub volume_sources: Vec<VolumeSource>,
    /// Secrets shared by every node of the cluster.
    pub secrets: Secrets,
    /// Slurm node roles.
    pub slurm_nodes: SlurmNodes,
    /// Periodic NCCL benchmark run on the worker nodes.
    /// If unset no benchmark is scheduled.
    pub nccl_benchmark: Option<NcclBenchmarkSpec>,
}

/// Decode a SlurmCluster manifest written as YAML or JSON.
///
/// The document is read into a JSON value first so that tagged enums such as
/// [`NodeVolume`] are written as plain single key maps, the same as the API server
/// stores them.
pub fn decode_manifest(manifest: &str) -> Result<SlurmCluster, ManifestError> {
    let value: serde_json::Value = serde_yaml::from_str(manifest)?;
    Ok(serde_json::from_value(value)?)
}

/// Describes a set of k8s nodes that pods may be scheduled to.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct K8sNodeFilter {
    /// Unique name of the filter.
    pub name: String,
    /// Node labels a node must carry.
    pub node_selector: Option<BTreeMap<String, String>>,
    /// Taints tolerated by pods using this filter.
    pub tolerations: Option<Vec<Toleration>>,
}

/// Toleration of a node taint.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Taint key, empty matches every key.
    pub key: Option<String>,
    /// Either `Exists` or `Equal`.
    pub operator: Option<String>,
    /// Taint value to match with `Equal`.
    pub value: Option<String>,
    /// Taint effect to match, empty matches every effect.
    pub effect: Option<String>,
    /// Time a `NoExecute` taint is tolerated for.
    pub toleration_seconds: Option<i64>,
}

/// A named volume source declared once for the whole cluster.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSource {
    /// Unique name node volumes use to reference this source.
    pub name: String,
    /// Underlying storage.
    #[serde(flatten)]
    pub source: VolumeSourceKind,
}

/// Underlying storage of a declared volume source.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSourceKind {
    /// An existing persistent volume claim.
    #[serde(rename_all = "camelCase")]
    PersistentVolumeClaim {
        /// Name of the claim
        claim_name: String,
        /// Mount read only
        #[serde(default)]
        read_only: bool,
    },
    /// A path on the k8s node.
    #[serde(rename_all = "camelCase")]
    HostPath {
        /// Path on the node
        path: String,
        /// Host path type, i.e. `Directory` or `DirectoryOrCreate`
        #[serde(rename = "type")]
        type_: Option<String>,
    },
    /// An NFS export.
    #[serde(rename_all = "camelCase")]
    Nfs {
        /// NFS server address
        server: String,
        /// Exported path
        path: String,
        /// Mount read only
        #[serde(default)]
        read_only: bool,
    },
    /// Scratch space living as long as the pod.
    #[serde(rename_all = "camelCase")]
    EmptyDir {
        /// Storage medium, i.e. `Memory`
        medium: Option<String>,
        /// Size limit
        size_limit: Option<String>,
    },
}

/// Secrets shared by the cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Secrets {
    /// Secret holding the munge authentication key.
    pub munge_key: SecretKey,
}

/// Reference to a single key of a secret.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKey {
    /// Name of the secret
    pub name: String,
    /// Key within the secret
    pub key: String,
}

/// All Slurm node roles of the cluster.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlurmNodes {
    /// Slurm controller nodes running slurmctld.
    pub controller: SlurmNodeController,
    /// Slurm worker nodes running slurmd.
    pub worker: SlurmNodeWorker,
}

/// Properties shared by every Slurm node role.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlurmNode {
    /// Number of replicas
    pub size: i32,
    /// Name of the k8s node filter pods of this role are scheduled with.
    pub k8s_node_filter_name: String,
}

/// Describes the Slurm controller nodes.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlurmNodeController {
    /// Shared node properties
    #[serde(flatten)]
    pub node: SlurmNode,
    /// slurmctld container
    pub slurmctld: NodeContainer,
    /// munge sidecar container
    pub munge: NodeContainer,
    /// Storage of the node
    pub volumes: NodeVolumes,
}

/// Describes the Slurm worker nodes.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlurmNodeWorker {
    /// Shared node properties
    #[serde(flatten)]
    pub node: SlurmNode,
    /// slurmd container
    pub slurmd: NodeContainer,
    /// munge sidecar container
    pub munge: NodeContainer,
    /// Image of the init container waiting for the NVIDIA container toolkit.
    pub toolkit_validation_image: Option<String>,
    /// Number of GPUs requested by each worker.
    #[serde(default)]
    pub max_gpu: i32,
    /// Storage of the node
    pub volumes: NodeVolumes,
}

/// Describes a single container of a node.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeContainer {
    /// Image of the container
    pub image: String,
    /// Pull policy for the image
    pub image_pull_policy: Option<String>,
    /// Port the daemon listens on, ignored for sidecars.
    pub port: Option<i32>,
    /// Resource limits of the container
    pub resources: Option<ResourceLimitsSpec>,
}

/// Resource limits of a container.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimitsSpec {
    /// Cpu resource limit
    pub cpu: Option<String>,
    /// Memory resource limit
    pub memory: Option<String>,
    /// Ephemeral storage resource limit
    pub ephemeral_storage: Option<String>,
}

/// Logical volumes of a node.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeVolumes {
    /// Slurm spool directory of the daemon.
    pub spool: NodeVolume,
    /// Jail filesystem shared by the cluster.
    pub jail: NodeVolume,
}

impl Default for NodeVolumes {
    fn default() -> Self {
        Self {
            spool: NodeVolume::VolumeClaimTemplateSpec(Default::default()),
            jail: NodeVolume::VolumeClaimTemplateSpec(Default::default()),
        }
    }
}

/// How a logical volume is provisioned.
///
/// Exactly one strategy is chosen, a manifest naming both or neither is rejected when
/// decoded.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NodeVolume {
    /// Mount the declared volume source with this name.
    VolumeSourceName(String),
    /// Request a dedicated claim for every replica.
    VolumeClaimTemplateSpec(ClaimTemplateSpec),
}

/// Request for dynamically provisioned storage.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTemplateSpec {
    /// Requested size
    #[serde(default = "default_claim_size")]
    pub size: String,
    /// Name of the storage class, the cluster default is used when unset.
    pub storage_class_name: Option<String>,
    /// Access modes of the claim
    #[serde(default = "default_access_modes")]
    pub access_modes: Vec<String>,
}

fn default_claim_size() -> String {
    "10Gi".to_owned()
}

fn default_access_modes() -> Vec<String> {
    vec!["ReadWriteOnce".to_owned()]
}

impl Default for ClaimTemplateSpec {
    fn default() -> Self {
        Self {
            size: default_claim_size(),
            storage_class_name: None,
            access_modes: default_access_modes(),
        }
    }
}

/// Describes the periodic NCCL benchmark.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NcclBenchmarkSpec {
    /// When false no benchmark is scheduled, defaults to true.
    pub enabled: Option<bool>,
    /// Cron schedule of the benchmark.
    pub schedule: Option<String>,
    /// Seconds a single run may take before it is terminated.
    pub active_deadline_seconds: Option<i64>,
    /// Number of successful runs kept.
    pub successful_jobs_history_limit: Option<i32>,
    /// Number of failed runs kept.
    pub failed_jobs_history_limit: Option<i32>,
    /// Image of the benchmark container.
    pub image: String,
    /// Pull policy for the image.
    pub image_pull_policy: Option<String>,
    /// Name of the k8s node filter benchmark pods are scheduled with.
    /// Defaults to the filter of the workers.
    pub k8s_node_filter_name: Option<String>,
    /// Arguments passed to the benchmark.
    pub nccl_settings: Option<NcclSettingsSpec>,
    /// What to do when the benchmark fails.
    pub failure_actions: Option<FailureActionsSpec>,
}

/// Arguments of an NCCL benchmark run.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NcclSettingsSpec {
    /// Smallest message size
    pub min_bytes: Option<String>,
    /// Largest message size
    pub max_bytes: Option<String>,
    /// Multiplier between message sizes
    pub step_factor: Option<String>,
    /// Timeout of a single run, `MM:SS`
    pub timeout: Option<String>,
    /// Minimal acceptable bus bandwidth in GB/s
    pub threshold_more_than: Option<String>,
    /// Run over infiniband
    pub use_infiniband: Option<bool>,
}

/// Reaction to a failed benchmark.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailureActionsSpec {
    /// Drain the Slurm node the benchmark failed on.
    pub set_slurm_node_drain_state: Option<bool>,
}
