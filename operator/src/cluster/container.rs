//! Builds the containers of every node role.
//!
//! A container is the combination of what the cluster spec says about it (image, port,
//! resources) and a fixed policy owned by the role (mounts, probes, capabilities).
use crate::cluster::{
    consts::{CAPABILITY_SYS_ADMIN, CONTAINER_NAME_MUNGE},
    model::{
        ContainerPort, ContainerTemplate, EnvValue, EnvVar, Probe, TerminationMessage,
        VolumeMount,
    },
    resource_limits::ResourceLimitsConfig,
    spec::NodeContainer,
    volume,
};

/// Everything the cluster spec configures about a container, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    pub image: String,
    pub image_pull_policy: String,
    pub port: i32,
    pub resource_limits: ResourceLimitsConfig,
}

impl ContainerConfig {
    /// Defaults for a daemon listening on `port`.
    pub fn defaults(port: i32) -> Self {
        Self {
            image: String::new(),
            // TODO pin images by digest and default to IfNotPresent
            image_pull_policy: "Always".to_owned(),
            port,
            resource_limits: ResourceLimitsConfig {
                cpu: "1".to_owned(),
                memory: "1Gi".to_owned(),
                ephemeral_storage: "10Gi".to_owned(),
                gpu: None,
            },
        }
    }

    pub fn from_spec(spec: &NodeContainer, defaults: Self) -> Self {
        Self {
            image: spec.image.to_owned(),
            image_pull_policy: spec
                .image_pull_policy
                .to_owned()
                .unwrap_or(defaults.image_pull_policy),
            port: spec.port.unwrap_or(defaults.port),
            resource_limits: ResourceLimitsConfig::from_spec(
                spec.resources.clone(),
                defaults.resource_limits,
            ),
        }
    }
}

/// Fixed, role owned part of a container.
#[derive(Debug, Clone, Default)]
pub struct ContainerPolicy {
    volume_mounts: Vec<VolumeMount>,
    env: Vec<EnvVar>,
    /// Expose and probe the configured port under this name.
    serve_port: Option<String>,
    capabilities: Vec<String>,
    expose_pod_identity: bool,
}

impl ContainerPolicy {
    /// Policy of a primary Slurm daemon.
    ///
    /// The daemon serves on its port, is ready once the port accepts connections and
    /// needs `SYS_ADMIN` to manage user sessions.
    pub fn daemon(name: &str, volume_mounts: Vec<VolumeMount>) -> Self {
        Self {
            volume_mounts,
            serve_port: Some(name.to_owned()),
            capabilities: vec![CAPABILITY_SYS_ADMIN.to_owned()],
            expose_pod_identity: true,
            ..Default::default()
        }
    }

    /// Policy of a helper container running next to a daemon.
    pub fn sidecar(volume_mounts: Vec<VolumeMount>) -> Self {
        Self {
            volume_mounts,
            ..Default::default()
        }
    }

    /// Policy of a privileged job container configured through its environment.
    pub fn job(volume_mounts: Vec<VolumeMount>, env: Vec<EnvVar>) -> Self {
        Self {
            volume_mounts,
            env,
            capabilities: vec![CAPABILITY_SYS_ADMIN.to_owned()],
            ..Default::default()
        }
    }
}

/// Build a container from its config and policy.
pub fn build(name: &str, config: &ContainerConfig, policy: ContainerPolicy) -> ContainerTemplate {
    let mut env = Vec::new();
    if policy.expose_pod_identity {
        env.push(pod_field_env("K8S_POD_NAME", "metadata.name"));
        env.push(pod_field_env("K8S_POD_NAMESPACE", "metadata.namespace"));
    }
    env.extend(policy.env);

    let (ports, readiness_probe) = match policy.serve_port {
        Some(port_name) => (
            vec![ContainerPort {
                name: port_name,
                port: config.port,
                protocol: "TCP".to_owned(),
            }],
            Some(Probe::TcpSocket { port: config.port }),
        ),
        None => (Vec::new(), None),
    };

    ContainerTemplate {
        name: name.to_owned(),
        image: config.image.to_owned(),
        image_pull_policy: config.image_pull_policy.to_owned(),
        env,
        ports,
        volume_mounts: policy.volume_mounts,
        readiness_probe,
        capabilities: policy.capabilities,
        limits: config.resource_limits.clone().into(),
        ..Default::default()
    }
}

/// Build an init container that blocks until `marker` exists.
///
/// Main containers only start once every init container exited successfully, so this
/// gates the pod on whatever creates the marker.
pub fn wait_for_file(
    name: &str,
    image: &str,
    marker: &str,
    waiting_for: &str,
    volume_mounts: Vec<VolumeMount>,
) -> ContainerTemplate {
    ContainerTemplate {
        name: name.to_owned(),
        image: image.to_owned(),
        image_pull_policy: "IfNotPresent".to_owned(),
        command: vec!["sh".to_owned(), "-c".to_owned()],
        args: vec![
            format!("until [ -f {marker} ]; do"),
            format!("echo 'waiting for {waiting_for}';"),
            "sleep 5;".to_owned(),
            "done".to_owned(),
        ],
        volume_mounts,
        termination_message: Some(TerminationMessage {
            path: "/dev/termination-log".to_owned(),
            policy: "File".to_owned(),
        }),
        ..Default::default()
    }
}

/// Build the munge sidecar that authenticates Slurm daemons to each other.
pub fn munge(config: &ContainerConfig) -> ContainerTemplate {
    build(
        CONTAINER_NAME_MUNGE,
        config,
        ContainerPolicy::sidecar(vec![
            volume::mount_munge_key(),
            volume::mount_munge_socket(),
        ]),
    )
}

/// Default config of the munge sidecar.
pub fn munge_defaults() -> ContainerConfig {
    ContainerConfig {
        resource_limits: ResourceLimitsConfig {
            cpu: "500m".to_owned(),
            memory: "512Mi".to_owned(),
            ephemeral_storage: "1Gi".to_owned(),
            gpu: None,
        },
        ..ContainerConfig::defaults(0)
    }
}

fn pod_field_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: EnvValue::PodField(field_path.to_owned()),
    }
}

/// Environment variable with a literal value.
pub fn literal_env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: EnvValue::Literal(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{consts::RESOURCE_MEMORY, spec::ResourceLimitsSpec};

    fn config() -> ContainerConfig {
        ContainerConfig::from_spec(
            &NodeContainer {
                image: "slurmd:24.05".to_owned(),
                resources: Some(ResourceLimitsSpec {
                    memory: Some("8Gi".to_owned()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ContainerConfig::defaults(6818),
        )
    }

    #[test]
    fn config_from_spec() {
        let config = config();
        assert_eq!(config.image, "slurmd:24.05");
        assert_eq!(config.image_pull_policy, "Always");
        assert_eq!(config.port, 6818);
        assert_eq!(config.resource_limits.memory, "8Gi");
        assert_eq!(config.resource_limits.cpu, "1");
    }

    #[test]
    fn daemon_is_probed_on_its_port() {
        let container = build(
            "slurmd",
            &config(),
            ContainerPolicy::daemon("slurmd", vec![volume::mount_jail()]),
        );
        assert_eq!(
            container.readiness_probe,
            Some(Probe::TcpSocket { port: 6818 })
        );
        assert_eq!(container.ports.len(), 1);
        assert_eq!(container.ports[0].name, "slurmd");
        assert_eq!(container.capabilities, vec![CAPABILITY_SYS_ADMIN.to_owned()]);
        assert_eq!(
            container.env,
            vec![
                pod_field_env("K8S_POD_NAME", "metadata.name"),
                pod_field_env("K8S_POD_NAMESPACE", "metadata.namespace"),
            ]
        );
        assert_eq!(
            container.limits.get(RESOURCE_MEMORY).map(String::as_str),
            Some("8Gi")
        );
    }

    #[test]
    fn sidecar_is_not_probed() {
        let container = munge(&ContainerConfig {
            image: "munge:1".to_owned(),
            ..munge_defaults()
        });
        assert_eq!(container.name, CONTAINER_NAME_MUNGE);
        assert!(container.readiness_probe.is_none());
        assert!(container.ports.is_empty());
        assert!(container.capabilities.is_empty());
        assert!(container.env.is_empty());
        assert_eq!(container.volume_mounts.len(), 2);
    }

    #[test]
    fn job_env_is_kept_in_order() {
        let container = build(
            "job",
            &config(),
            ContainerPolicy::job(
                Vec::new(),
                vec![literal_env("B", "2"), literal_env("A", "1")],
            ),
        );
        let names: Vec<_> = container.env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(container.readiness_probe.is_none());
    }

    #[test]
    fn wait_for_file_polls_marker() {
        let container = wait_for_file(
            "wait",
            "busybox",
            "/run/ready",
            "readiness marker",
            Vec::new(),
        );
        assert_eq!(container.command, vec!["sh", "-c"]);
        assert_eq!(container.args[0], "until [ -f /run/ready ]; do");
        assert!(container.readiness_probe.is_none());
        assert!(container.limits.is_empty());
    }
}
