//! Volumes of node pods.
//!
//! Logical node volumes (spool, jail) either mount a volume source declared for the
//! whole cluster or become a claim template instantiated once per replica. All other
//! volumes are fixed per role.
use tracing::trace;

use crate::cluster::{
    consts::{
        ComponentType, SECRET_MUNGE_KEY_FILE_MODE, SECRET_MUNGE_KEY_FILE_NAME,
        VOLUME_MOUNT_PATH_BOOT, VOLUME_MOUNT_PATH_JAIL, VOLUME_MOUNT_PATH_MUNGE_KEY,
        VOLUME_MOUNT_PATH_MUNGE_SOCKET, VOLUME_MOUNT_PATH_NVIDIA, VOLUME_MOUNT_PATH_SLURM_CONFIGS,
        VOLUME_MOUNT_PATH_SPOOL, VOLUME_NAME_BOOT, VOLUME_NAME_MUNGE_KEY, VOLUME_NAME_MUNGE_SOCKET,
        VOLUME_NAME_NVIDIA, VOLUME_NAME_SLURM_CONFIGS,
    },
    error::{ConfigurationError, Result},
    model::{ClaimTemplate, KeyToPath, VolumeBacking, VolumeMount, VolumeTemplate},
    naming,
    spec::{NodeVolume, NodeVolumes, SecretKey, VolumeSource},
};

/// Outcome of resolving a single logical volume.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeResolution {
    /// Mount a declared volume source into every replica.
    Inline(VolumeTemplate),
    /// Provision a claim per replica.
    ClaimTemplate(ClaimTemplate),
}

/// Resolve the logical volume `name` against the declared volume sources.
///
/// A referenced source has to be declared exactly once.
pub fn resolve(
    name: String,
    volume: &NodeVolume,
    sources: &[VolumeSource],
) -> Result<VolumeResolution, ConfigurationError> {
    match volume {
        NodeVolume::VolumeSourceName(source_name) => {
            let mut matching = sources.iter().filter(|source| &source.name == source_name);
            let source = matching
                .next()
                .ok_or_else(|| ConfigurationError::UnknownVolumeSource(source_name.to_owned()))?;
            if matching.next().is_some() {
                return Err(ConfigurationError::DuplicateVolumeSource(source_name.to_owned()));
            }
            trace!(%name, source = %source_name, "mounting volume source");
            Ok(VolumeResolution::Inline(VolumeTemplate {
                name,
                source: VolumeBacking::Declared(source.source.clone()),
            }))
        }
        NodeVolume::VolumeClaimTemplateSpec(spec) => {
            trace!(%name, size = %spec.size, "requesting claim template");
            Ok(VolumeResolution::ClaimTemplate(ClaimTemplate {
                name,
                size: spec.size.to_owned(),
                storage_class_name: spec.storage_class_name.to_owned(),
                access_modes: spec.access_modes.clone(),
            }))
        }
    }
}

/// Resolve a logical volume that can only be mounted, never claimed.
pub fn resolve_inline(
    name: String,
    volume: &NodeVolume,
    sources: &[VolumeSource],
) -> Result<VolumeTemplate, ConfigurationError> {
    match resolve(name, volume, sources)? {
        VolumeResolution::Inline(volume) => Ok(volume),
        VolumeResolution::ClaimTemplate(_) => Err(ConfigurationError::ClaimTemplateUnsupported),
    }
}

/// Logical volumes of a node role split by how they are provisioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedVolumes {
    pub inline: Vec<VolumeTemplate>,
    pub claim_templates: Vec<ClaimTemplate>,
}

impl ResolvedVolumes {
    /// Resolve the spool and jail volumes of `component`.
    pub fn resolve(
        component: ComponentType,
        volumes: &NodeVolumes,
        sources: &[VolumeSource],
    ) -> Result<Self> {
        let mut resolved = Self::default();
        resolved.push(
            resolve(naming::spool_volume_name(component), &volumes.spool, sources)
                .map_err(|err| err.at(component, "volumes.spool"))?,
        );
        resolved.push(
            resolve(naming::jail_volume_name(), &volumes.jail, sources)
                .map_err(|err| err.at(component, "volumes.jail"))?,
        );
        Ok(resolved)
    }

    fn push(&mut self, resolution: VolumeResolution) {
        match resolution {
            VolumeResolution::Inline(volume) => self.inline.push(volume),
            VolumeResolution::ClaimTemplate(claim) => self.claim_templates.push(claim),
        }
    }
}

pub fn slurm_configs(cluster: &str) -> VolumeTemplate {
    VolumeTemplate {
        name: VOLUME_NAME_SLURM_CONFIGS.to_owned(),
        source: VolumeBacking::ConfigMap {
            name: naming::slurm_configs_name(cluster),
            default_mode: Some(0o444),
        },
    }
}

/// Project the munge key to a file only its owner may read.
pub fn munge_key(secret: &SecretKey) -> VolumeTemplate {
    VolumeTemplate {
        name: VOLUME_NAME_MUNGE_KEY.to_owned(),
        source: VolumeBacking::Secret {
            secret_name: secret.name.to_owned(),
            items: vec![KeyToPath {
                key: secret.key.to_owned(),
                path: SECRET_MUNGE_KEY_FILE_NAME.to_owned(),
                mode: Some(SECRET_MUNGE_KEY_FILE_MODE),
            }],
            default_mode: Some(SECRET_MUNGE_KEY_FILE_MODE),
        },
    }
}

pub fn munge_socket() -> VolumeTemplate {
    VolumeTemplate {
        name: VOLUME_NAME_MUNGE_SOCKET.to_owned(),
        source: VolumeBacking::EmptyDir,
    }
}

pub fn nvidia() -> VolumeTemplate {
    VolumeTemplate {
        name: VOLUME_NAME_NVIDIA.to_owned(),
        source: VolumeBacking::HostPath {
            path: VOLUME_MOUNT_PATH_NVIDIA.to_owned(),
            type_: Some("DirectoryOrCreate".to_owned()),
        },
    }
}

pub fn boot() -> VolumeTemplate {
    VolumeTemplate {
        name: VOLUME_NAME_BOOT.to_owned(),
        source: VolumeBacking::HostPath {
            path: VOLUME_MOUNT_PATH_BOOT.to_owned(),
            type_: Some("Directory".to_owned()),
        },
    }
}

fn mount(name: &str, mount_path: &str, read_only: bool) -> VolumeMount {
    VolumeMount {
        name: name.to_owned(),
        mount_path: mount_path.to_owned(),
        read_only,
    }
}

pub fn mount_slurm_configs() -> VolumeMount {
    mount(VOLUME_NAME_SLURM_CONFIGS, VOLUME_MOUNT_PATH_SLURM_CONFIGS, true)
}

pub fn mount_munge_key() -> VolumeMount {
    mount(VOLUME_NAME_MUNGE_KEY, VOLUME_MOUNT_PATH_MUNGE_KEY, true)
}

pub fn mount_munge_socket() -> VolumeMount {
    mount(VOLUME_NAME_MUNGE_SOCKET, VOLUME_MOUNT_PATH_MUNGE_SOCKET, false)
}

pub fn mount_jail() -> VolumeMount {
    mount(&naming::jail_volume_name(), VOLUME_MOUNT_PATH_JAIL, false)
}

/// Mount the spool volume of `component` at the spool directory of `daemon`.
pub fn mount_spool(component: ComponentType, daemon: &str) -> VolumeMount {
    mount(
        &naming::spool_volume_name(component),
        &format!("{VOLUME_MOUNT_PATH_SPOOL}/{daemon}"),
        false,
    )
}

pub fn mount_nvidia() -> VolumeMount {
    mount(VOLUME_NAME_NVIDIA, VOLUME_MOUNT_PATH_NVIDIA, false)
}

pub fn mount_boot() -> VolumeMount {
    mount(VOLUME_NAME_BOOT, VOLUME_MOUNT_PATH_BOOT, true)
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::cluster::{
        spec::{ClaimTemplateSpec, VolumeSourceKind},
        Error,
    };

    fn sources() -> Vec<VolumeSource> {
        vec![VolumeSource {
            name: "shared-jail".to_owned(),
            source: VolumeSourceKind::PersistentVolumeClaim {
                claim_name: "jail-pvc".to_owned(),
                read_only: false,
            },
        }]
    }

    #[test]
    fn known_source_is_inline() {
        let resolution = resolve(
            "jail".to_owned(),
            &NodeVolume::VolumeSourceName("shared-jail".to_owned()),
            &sources(),
        )
        .unwrap();
        assert_eq!(
            resolution,
            VolumeResolution::Inline(VolumeTemplate {
                name: "jail".to_owned(),
                source: VolumeBacking::Declared(VolumeSourceKind::PersistentVolumeClaim {
                    claim_name: "jail-pvc".to_owned(),
                    read_only: false,
                }),
            })
        );
    }

    #[test]
    fn unknown_source_fails() {
        let err = resolve(
            "jail".to_owned(),
            &NodeVolume::VolumeSourceName("missing".to_owned()),
            &sources(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownVolumeSource("missing".to_owned()));
    }

    #[test]
    fn duplicate_source_fails() {
        let mut sources = sources();
        sources.push(VolumeSource {
            name: "shared-jail".to_owned(),
            source: VolumeSourceKind::EmptyDir {
                medium: None,
                size_limit: None,
            },
        });
        let err = resolve(
            "jail".to_owned(),
            &NodeVolume::VolumeSourceName("shared-jail".to_owned()),
            &sources,
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateVolumeSource("shared-jail".to_owned()));
    }

    #[test]
    fn claim_template_keeps_name_and_spec() {
        let resolution = resolve(
            "worker-spool".to_owned(),
            &NodeVolume::VolumeClaimTemplateSpec(ClaimTemplateSpec {
                size: "100Gi".to_owned(),
                storage_class_name: Some("fast".to_owned()),
                ..Default::default()
            }),
            &[],
        )
        .unwrap();
        assert_eq!(
            resolution,
            VolumeResolution::ClaimTemplate(ClaimTemplate {
                name: "worker-spool".to_owned(),
                size: "100Gi".to_owned(),
                storage_class_name: Some("fast".to_owned()),
                access_modes: vec!["ReadWriteOnce".to_owned()],
            })
        );
    }

    #[test]
    fn inline_only_rejects_claims() {
        let err = resolve_inline(
            "jail".to_owned(),
            &NodeVolume::VolumeClaimTemplateSpec(Default::default()),
            &sources(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::ClaimTemplateUnsupported);
    }

    #[test]
    fn each_logical_volume_resolves_once() {
        let resolved = ResolvedVolumes::resolve(
            ComponentType::Worker,
            &NodeVolumes {
                spool: NodeVolume::VolumeClaimTemplateSpec(Default::default()),
                jail: NodeVolume::VolumeSourceName("shared-jail".to_owned()),
            },
            &sources(),
        )
        .unwrap();
        let mut names: Vec<_> = resolved
            .inline
            .iter()
            .map(|v| v.name.as_str())
            .chain(resolved.claim_templates.iter().map(|c| c.name.as_str()))
            .collect();
        names.sort();
        assert_eq!(names, vec!["jail", "worker-spool"]);
    }

    #[test]
    fn resolution_error_names_the_field() {
        let err = ResolvedVolumes::resolve(
            ComponentType::Controller,
            &NodeVolumes {
                spool: NodeVolume::VolumeSourceName("missing".to_owned()),
                jail: NodeVolume::VolumeSourceName("shared-jail".to_owned()),
            },
            &sources(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                component: ComponentType::Controller,
                field: "volumes.spool",
                ..
            }
        ));
        expect![[r#"controller volumes.spool: unknown volume source "missing""#]]
            .assert_eq(&err.to_string());
    }

    #[test]
    fn munge_key_is_owner_read_only() {
        let volume = munge_key(&SecretKey {
            name: "munge".to_owned(),
            key: "key".to_owned(),
        });
        let VolumeBacking::Secret { items, .. } = volume.source else {
            panic!("munge key should be a secret volume");
        };
        assert_eq!(items[0].path, "munge.key");
        assert_eq!(items[0].mode, Some(0o400));
    }

    #[test]
    fn mounts_reference_volumes() {
        assert_eq!(mount_slurm_configs().name, slurm_configs("c").name);
        assert_eq!(mount_munge_socket().name, munge_socket().name);
        assert_eq!(mount_nvidia().name, nvidia().name);
        assert_eq!(mount_boot().name, boot().name);
        assert_eq!(
            mount_spool(ComponentType::Worker, "slurmd").mount_path,
            "/var/spool/slurmd"
        );
    }
}
