//! Controller nodes run slurmctld next to a munge sidecar.
use rand::RngCore;

use crate::cluster::{
    consts::{
        ComponentType, CONTAINER_NAME_MUNGE, CONTAINER_NAME_SLURMCTLD, SLURMCTLD_NAME,
        SLURMCTLD_PORT,
    },
    container::{self, ContainerConfig, ContainerPolicy},
    error::Result,
    model::{ContainerPort, ServiceTemplate, WorkloadTemplate},
    node_filter, versions,
    volume::{self, ResolvedVolumes},
    workload::{self, NodePod},
    ClusterIdentity, SlurmClusterSpec, SlurmNodeController,
};

const COMPONENT: ComponentType = ComponentType::Controller;

/// Container configs of a controller with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub slurmctld: ContainerConfig,
    pub munge: ContainerConfig,
}

impl From<&SlurmNodeController> for ControllerConfig {
    fn from(value: &SlurmNodeController) -> Self {
        Self {
            slurmctld: ContainerConfig::from_spec(
                &value.slurmctld,
                ContainerConfig::defaults(SLURMCTLD_PORT),
            ),
            munge: ContainerConfig::from_spec(&value.munge, container::munge_defaults()),
        }
    }
}

/// Service fronting slurmctld.
pub fn service_template(identity: &ClusterIdentity, spec: &SlurmClusterSpec) -> ServiceTemplate {
    let config = ControllerConfig::from(&spec.slurm_nodes.controller);
    workload::service(
        identity,
        COMPONENT,
        ContainerPort {
            name: SLURMCTLD_NAME.to_owned(),
            port: config.slurmctld.port,
            protocol: "TCP".to_owned(),
        },
        false,
    )
}

/// Stateful workload of the controller nodes.
pub fn workload_template(
    identity: &ClusterIdentity,
    spec: &SlurmClusterSpec,
    rng: &mut impl RngCore,
) -> Result<WorkloadTemplate> {
    let controller = &spec.slurm_nodes.controller;
    let config = ControllerConfig::from(controller);

    let placement = node_filter::placement(
        &spec.k8s_node_filters,
        &controller.node.k8s_node_filter_name,
    )
    .map_err(|err| err.at(COMPONENT, "k8sNodeFilterName"))?;
    let resolved = ResolvedVolumes::resolve(COMPONENT, &controller.volumes, &spec.volume_sources)?;
    let versions = versions::generate_placeholders(rng)?;

    let slurmctld = container::build(
        CONTAINER_NAME_SLURMCTLD,
        &config.slurmctld,
        ContainerPolicy::daemon(
            SLURMCTLD_NAME,
            vec![
                volume::mount_slurm_configs(),
                volume::mount_spool(COMPONENT, SLURMCTLD_NAME),
                volume::mount_jail(),
                volume::mount_munge_socket(),
            ],
        ),
    );

    Ok(workload::assemble(
        identity,
        COMPONENT,
        controller.node.size,
        placement,
        resolved,
        NodePod {
            containers: vec![slurmctld, container::munge(&config.munge)],
            volumes: vec![
                volume::slurm_configs(&identity.name),
                volume::munge_key(&spec.secrets.munge_key),
                volume::munge_socket(),
            ],
            unconfined: vec![CONTAINER_NAME_MUNGE],
            ..Default::default()
        },
        &versions,
    ))
}
