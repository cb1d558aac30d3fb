use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{
        Capabilities, ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource,
        EnvVar, EnvVarSource, HostPathVolumeSource, KeyToPath, NFSVolumeSource,
        ObjectFieldSelector, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Probe,
        ResourceRequirements, SecretVolumeSource, SecurityContext, TCPSocketAction, Toleration,
        Volume, VolumeMount,
    },
    apimachinery::pkg::{
        api::resource::Quantity, apis::meta::v1::ObjectMeta, util::intstr::IntOrString,
    },
};

use crate::cluster::{model, Toleration as TolerationSpec, VolumeSourceKind};

/// Render a pod template.
pub fn pod_template(pod: &model::PodTemplate) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(pod.labels.clone()),
            annotations: (!pod.annotations.is_empty()).then(|| pod.annotations.clone()),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            node_selector: pod.placement.node_selector.clone(),
            tolerations: pod
                .placement
                .tolerations
                .as_ref()
                .map(|tolerations| tolerations.iter().map(toleration).collect()),
            init_containers: (!pod.init_containers.is_empty())
                .then(|| pod.init_containers.iter().map(container).collect()),
            containers: pod.containers.iter().map(container).collect(),
            volumes: (!pod.volumes.is_empty()).then(|| pod.volumes.iter().map(volume).collect()),
            restart_policy: pod.restart_policy.clone(),
            ..Default::default()
        }),
    }
}

fn toleration(value: &TolerationSpec) -> Toleration {
    Toleration {
        key: value.key.clone(),
        operator: value.operator.clone(),
        value: value.value.clone(),
        effect: value.effect.clone(),
        toleration_seconds: value.toleration_seconds,
    }
}

/// Render a container.
pub fn container(value: &model::ContainerTemplate) -> Container {
    Container {
        name: value.name.clone(),
        image: Some(value.image.clone()),
        image_pull_policy: Some(value.image_pull_policy.clone()),
        command: non_empty(&value.command),
        args: non_empty(&value.args),
        env: (!value.env.is_empty()).then(|| value.env.iter().map(env_var).collect()),
        ports: (!value.ports.is_empty()).then(|| value.ports.iter().map(container_port).collect()),
        volume_mounts: (!value.volume_mounts.is_empty())
            .then(|| value.volume_mounts.iter().map(volume_mount).collect()),
        readiness_probe: value.readiness_probe.as_ref().map(probe),
        security_context: (!value.capabilities.is_empty()).then(|| SecurityContext {
            capabilities: Some(Capabilities {
                add: Some(value.capabilities.clone()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        resources: (!value.limits.is_empty()).then(|| ResourceRequirements {
            limits: Some(quantities(&value.limits)),
            ..Default::default()
        }),
        termination_message_path: value
            .termination_message
            .as_ref()
            .map(|message| message.path.clone()),
        termination_message_policy: value
            .termination_message
            .as_ref()
            .map(|message| message.policy.clone()),
        ..Default::default()
    }
}

/// Render a container port.
pub fn container_port(value: &model::ContainerPort) -> ContainerPort {
    ContainerPort {
        name: Some(value.name.clone()),
        container_port: value.port,
        protocol: Some(value.protocol.clone()),
        ..Default::default()
    }
}

fn env_var(value: &model::EnvVar) -> EnvVar {
    match &value.value {
        model::EnvValue::Literal(literal) => EnvVar {
            name: value.name.clone(),
            value: Some(literal.clone()),
            ..Default::default()
        },
        model::EnvValue::PodField(field_path) => EnvVar {
            name: value.name.clone(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: field_path.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
    }
}

fn volume_mount(value: &model::VolumeMount) -> VolumeMount {
    VolumeMount {
        name: value.name.clone(),
        mount_path: value.mount_path.clone(),
        read_only: value.read_only.then_some(true),
        ..Default::default()
    }
}

fn probe(value: &model::Probe) -> Probe {
    match value {
        model::Probe::TcpSocket { port } => Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::Int(*port),
                ..Default::default()
            }),
            ..Default::default()
        },
    }
}

/// Render a pod volume.
pub fn volume(value: &model::VolumeTemplate) -> Volume {
    let name = value.name.clone();
    match &value.source {
        model::VolumeBacking::ConfigMap { name: config_map, default_mode } => Volume {
            name,
            config_map: Some(ConfigMapVolumeSource {
                name: Some(config_map.clone()),
                default_mode: *default_mode,
                ..Default::default()
            }),
            ..Default::default()
        },
        model::VolumeBacking::Secret {
            secret_name,
            items,
            default_mode,
        } => Volume {
            name,
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret_name.clone()),
                items: Some(
                    items
                        .iter()
                        .map(|item| KeyToPath {
                            key: item.key.clone(),
                            path: item.path.clone(),
                            mode: item.mode,
                        })
                        .collect(),
                ),
                default_mode: *default_mode,
                ..Default::default()
            }),
            ..Default::default()
        },
        model::VolumeBacking::HostPath { path, type_ } => host_path(name, path, type_),
        model::VolumeBacking::EmptyDir => Volume {
            name,
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        },
        model::VolumeBacking::Declared(source) => declared(name, source),
    }
}

fn host_path(name: String, path: &str, type_: &Option<String>) -> Volume {
    Volume {
        name,
        host_path: Some(HostPathVolumeSource {
            path: path.to_owned(),
            type_: type_.clone(),
        }),
        ..Default::default()
    }
}

fn declared(name: String, source: &VolumeSourceKind) -> Volume {
    match source {
        VolumeSourceKind::PersistentVolumeClaim {
            claim_name,
            read_only,
        } => Volume {
            name,
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim_name.clone(),
                read_only: read_only.then_some(true),
            }),
            ..Default::default()
        },
        VolumeSourceKind::HostPath { path, type_ } => host_path(name, path, type_),
        VolumeSourceKind::Nfs {
            server,
            path,
            read_only,
        } => Volume {
            name,
            nfs: Some(NFSVolumeSource {
                server: server.clone(),
                path: path.clone(),
                read_only: read_only.then_some(true),
            }),
            ..Default::default()
        },
        VolumeSourceKind::EmptyDir { medium, size_limit } => Volume {
            name,
            empty_dir: Some(EmptyDirVolumeSource {
                medium: medium.clone(),
                size_limit: size_limit.clone().map(Quantity),
            }),
            ..Default::default()
        },
    }
}

/// Convert plain quantities to k8s quantities.
pub fn quantities(values: &BTreeMap<String, String>) -> BTreeMap<String, Quantity> {
    values
        .iter()
        .map(|(name, value)| (name.clone(), Quantity(value.clone())))
        .collect()
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}
