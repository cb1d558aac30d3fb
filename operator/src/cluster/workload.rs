//! Pieces shared by the stateful node roles.
use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    cluster::{
        consts::{ANNOTATION_APPARMOR_KEY, ANNOTATION_APPARMOR_VALUE_UNCONFINED, ComponentType},
        model::{
            ContainerPort, ContainerTemplate, Placement, PodTemplate, ServiceTemplate, UpdatePolicy,
            VolumeTemplate, WorkloadTemplate,
        },
        naming,
        versions::VersionPlaceholders,
        volume::ResolvedVolumes,
        ClusterIdentity,
    },
    labels::{component_labels, selector_labels},
};

/// Replicas of a node role are replaced a fifth at a time.
const MAX_UNAVAILABLE_PERCENT: u8 = 20;

/// Contents of the pod of a node role.
#[derive(Debug, Default)]
pub struct NodePod {
    pub init_containers: Vec<ContainerTemplate>,
    pub containers: Vec<ContainerTemplate>,
    /// Volumes owned by the role, resolved logical volumes are appended to these.
    pub volumes: Vec<VolumeTemplate>,
    /// Containers that run without an AppArmor profile.
    pub unconfined: Vec<&'static str>,
}

/// Combine the parts of a node role into its workload.
pub fn assemble(
    identity: &ClusterIdentity,
    component: ComponentType,
    replicas: i32,
    placement: Placement,
    resolved: ResolvedVolumes,
    pod: NodePod,
    versions: &VersionPlaceholders,
) -> WorkloadTemplate {
    let labels = component_labels(component, &identity.name);

    let mut annotations = versions.pod_annotations();
    annotations.append(&mut apparmor_unconfined(&pod.unconfined));

    let mut volumes = pod.volumes;
    volumes.extend(resolved.inline);

    let workload = WorkloadTemplate {
        name: naming::workload_name(component, &identity.name),
        namespace: identity.namespace.to_owned(),
        labels: labels.clone(),
        selector: selector_labels(component, &identity.name),
        annotations: versions.workload_annotations(),
        service_name: naming::service_name(component, &identity.name),
        replicas,
        update_policy: UpdatePolicy::RollingUpdate {
            max_unavailable_percent: MAX_UNAVAILABLE_PERCENT,
        },
        pod: PodTemplate {
            labels,
            annotations,
            placement,
            init_containers: pod.init_containers,
            containers: pod.containers,
            volumes,
            restart_policy: None,
        },
        claim_templates: resolved.claim_templates,
    };
    debug!(
        name = %workload.name,
        %component,
        replicas,
        claim_templates = workload.claim_templates.len(),
        "assembled workload"
    );
    workload
}

/// Service fronting the daemon of a node role.
pub fn service(
    identity: &ClusterIdentity,
    component: ComponentType,
    port: ContainerPort,
    headless: bool,
) -> ServiceTemplate {
    ServiceTemplate {
        name: naming::service_name(component, &identity.name),
        namespace: identity.namespace.to_owned(),
        labels: component_labels(component, &identity.name),
        selector: selector_labels(component, &identity.name),
        ports: vec![port],
        headless,
    }
}

/// AppArmor annotations lifting confinement of `containers`.
pub fn apparmor_unconfined(containers: &[&str]) -> BTreeMap<String, String> {
    containers
        .iter()
        .map(|container| {
            (
                format!("{ANNOTATION_APPARMOR_KEY}/{container}"),
                ANNOTATION_APPARMOR_VALUE_UNCONFINED.to_owned(),
            )
        })
        .collect()
}
