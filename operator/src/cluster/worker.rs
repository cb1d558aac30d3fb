//! Worker nodes run slurmd on GPU hosts.
//!
//! Pods wait for the NVIDIA container toolkit of their host before slurmd starts, so
//! jobs never land on a node that cannot reach its GPUs.
use rand::RngCore;

use crate::cluster::{
    consts::{
        ComponentType, CONTAINER_NAME_MUNGE, CONTAINER_NAME_SLURMD,
        CONTAINER_NAME_TOOLKIT_VALIDATION, SLURMD_NAME, SLURMD_PORT, VOLUME_MOUNT_PATH_NVIDIA,
    },
    container::{self, ContainerConfig, ContainerPolicy},
    error::Result,
    model::{ContainerPort, ContainerTemplate, ServiceTemplate, WorkloadTemplate},
    node_filter, versions,
    volume::{self, ResolvedVolumes},
    workload::{self, NodePod},
    ClusterIdentity, SlurmClusterSpec, SlurmNodeWorker,
};

const COMPONENT: ComponentType = ComponentType::Worker;

/// Image waiting for the container toolkit unless the worker sets `toolkitValidationImage`.
pub const DEFAULT_TOOLKIT_VALIDATION_IMAGE: &str =
    "nvcr.io/nvidia/cloud-native/gpu-operator-validator:v23.9.1";

/// Container configs of a worker with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub slurmd: ContainerConfig,
    pub munge: ContainerConfig,
    pub toolkit_validation_image: String,
}

impl From<&SlurmNodeWorker> for WorkerConfig {
    fn from(value: &SlurmNodeWorker) -> Self {
        let mut slurmd =
            ContainerConfig::from_spec(&value.slurmd, ContainerConfig::defaults(SLURMD_PORT));
        slurmd.resource_limits = slurmd.resource_limits.with_gpu(value.max_gpu);
        Self {
            slurmd,
            munge: ContainerConfig::from_spec(&value.munge, container::munge_defaults()),
            toolkit_validation_image: value
                .toolkit_validation_image
                .to_owned()
                .unwrap_or_else(|| DEFAULT_TOOLKIT_VALIDATION_IMAGE.to_owned()),
        }
    }
}

/// Headless service giving every worker a stable DNS name.
pub fn service_template(identity: &ClusterIdentity, spec: &SlurmClusterSpec) -> ServiceTemplate {
    let config = WorkerConfig::from(&spec.slurm_nodes.worker);
    workload::service(
        identity,
        COMPONENT,
        ContainerPort {
            name: SLURMD_NAME.to_owned(),
            port: config.slurmd.port,
            protocol: "TCP".to_owned(),
        },
        true,
    )
}

/// Stateful workload of the worker nodes.
pub fn workload_template(
    identity: &ClusterIdentity,
    spec: &SlurmClusterSpec,
    rng: &mut impl RngCore,
) -> Result<WorkloadTemplate> {
    let worker = &spec.slurm_nodes.worker;
    let config = WorkerConfig::from(worker);

    let placement =
        node_filter::placement(&spec.k8s_node_filters, &worker.node.k8s_node_filter_name)
            .map_err(|err| err.at(COMPONENT, "k8sNodeFilterName"))?;
    let resolved = ResolvedVolumes::resolve(COMPONENT, &worker.volumes, &spec.volume_sources)?;
    let versions = versions::generate_placeholders(rng)?;

    let slurmd = container::build(
        CONTAINER_NAME_SLURMD,
        &config.slurmd,
        ContainerPolicy::daemon(
            SLURMD_NAME,
            vec![
                volume::mount_slurm_configs(),
                volume::mount_spool(COMPONENT, SLURMD_NAME),
                volume::mount_jail(),
                volume::mount_munge_socket(),
                volume::mount_nvidia(),
                volume::mount_boot(),
            ],
        ),
    );

    Ok(workload::assemble(
        identity,
        COMPONENT,
        worker.node.size,
        placement,
        resolved,
        NodePod {
            init_containers: vec![toolkit_validation(&config.toolkit_validation_image)],
            containers: vec![slurmd, container::munge(&config.munge)],
            volumes: vec![
                volume::slurm_configs(&identity.name),
                volume::munge_key(&spec.secrets.munge_key),
                volume::munge_socket(),
                volume::nvidia(),
                volume::boot(),
            ],
            unconfined: vec![CONTAINER_NAME_SLURMD, CONTAINER_NAME_MUNGE],
        },
        &versions,
    ))
}

fn toolkit_validation(image: &str) -> ContainerTemplate {
    container::wait_for_file(
        CONTAINER_NAME_TOOLKIT_VALIDATION,
        image,
        &format!("{VOLUME_MOUNT_PATH_NVIDIA}/validations/toolkit-ready"),
        "nvidia container stack to be setup",
        vec![volume::mount_nvidia()],
    )
}
