//! Helper methods only available for tests
use std::collections::BTreeMap;

use crate::cluster::{
    spec::{
        K8sNodeFilter, NcclBenchmarkSpec, NodeContainer, NodeVolume, NodeVolumes, SecretKey,
        Secrets, SlurmNode, SlurmNodeController, SlurmNodeWorker, SlurmNodes, Toleration,
        VolumeSource, VolumeSourceKind,
    },
    ClusterIdentity, SlurmClusterSpec,
};

impl ClusterIdentity {
    /// A normal test cluster identity
    pub fn test() -> Self {
        Self {
            name: "slurm1".to_owned(),
            namespace: "slurm".to_owned(),
        }
    }
}

// Add tests specific implementation to the cluster spec
impl SlurmClusterSpec {
    /// A normal test cluster.
    ///
    /// The controller claims all of its volumes, the workers mount the shared jail.
    pub fn test() -> Self {
        Self {
            k8s_node_filters: vec![
                K8sNodeFilter {
                    name: "cpu".to_owned(),
                    ..Default::default()
                },
                K8sNodeFilter {
                    name: "gpu".to_owned(),
                    node_selector: Some(BTreeMap::from_iter([(
                        "nvidia.com/gpu.present".to_owned(),
                        "true".to_owned(),
                    )])),
                    tolerations: Some(vec![Toleration {
                        key: Some("nvidia.com/gpu".to_owned()),
                        operator: Some("Exists".to_owned()),
                        effect: Some("NoSchedule".to_owned()),
                        ..Default::default()
                    }]),
                },
            ],
            volume_sources: vec![VolumeSource {
                name: "shared-jail".to_owned(),
                source: VolumeSourceKind::PersistentVolumeClaim {
                    claim_name: "jail-pvc".to_owned(),
                    read_only: false,
                },
            }],
            secrets: Secrets {
                munge_key: SecretKey {
                    name: "slurm1-munge-key".to_owned(),
                    key: "munge.key".to_owned(),
                },
            },
            slurm_nodes: SlurmNodes {
                controller: SlurmNodeController {
                    node: SlurmNode {
                        size: 1,
                        k8s_node_filter_name: "cpu".to_owned(),
                    },
                    slurmctld: NodeContainer {
                        image: "slurmctld:24.05".to_owned(),
                        ..Default::default()
                    },
                    munge: NodeContainer {
                        image: "munge:24.05".to_owned(),
                        ..Default::default()
                    },
                    volumes: NodeVolumes::default(),
                },
                worker: SlurmNodeWorker {
                    node: SlurmNode {
                        size: 2,
                        k8s_node_filter_name: "gpu".to_owned(),
                    },
                    slurmd: NodeContainer {
                        image: "slurmd:24.05".to_owned(),
                        ..Default::default()
                    },
                    munge: NodeContainer {
                        image: "munge:24.05".to_owned(),
                        ..Default::default()
                    },
                    toolkit_validation_image: None,
                    max_gpu: 8,
                    volumes: NodeVolumes {
                        spool: NodeVolume::VolumeClaimTemplateSpec(Default::default()),
                        jail: NodeVolume::VolumeSourceName("shared-jail".to_owned()),
                    },
                },
            },
            nccl_benchmark: Some(NcclBenchmarkSpec::test()),
        }
    }
    /// Modify the cluster to schedule controllers with another node filter
    pub fn with_controller_node_filter(mut self, name: &str) -> Self {
        self.slurm_nodes.controller.node.k8s_node_filter_name = name.to_owned();
        self
    }
    /// Modify the cluster to provision controller volumes differently
    pub fn with_controller_volumes(mut self, spool: NodeVolume, jail: NodeVolume) -> Self {
        self.slurm_nodes.controller.volumes = NodeVolumes { spool, jail };
        self
    }
    /// Modify the cluster to provision worker volumes differently
    pub fn with_worker_volumes(mut self, spool: NodeVolume, jail: NodeVolume) -> Self {
        self.slurm_nodes.worker.volumes = NodeVolumes { spool, jail };
        self
    }
    /// Modify the cluster to have an expected benchmark
    pub fn with_benchmark(self, benchmark: NcclBenchmarkSpec) -> Self {
        Self {
            nccl_benchmark: Some(benchmark),
            ..self
        }
    }
}

impl NcclBenchmarkSpec {
    /// A benchmark relying on defaults for everything but the image
    pub fn test() -> Self {
        Self {
            image: "nccl-benchmark:24.05".to_owned(),
            ..Default::default()
        }
    }
}
