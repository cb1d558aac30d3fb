// A list of constants used in various K8s resources.
//
// Only values that relate several resources to each other live here (i.e. a volume name
// referenced by both a volume and its mounts). Values used once stay inline.

use std::fmt;

/// Role of a component of the Slurm cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    /// slurmctld nodes
    Controller,
    /// slurmd nodes
    Worker,
    /// NCCL benchmark job
    Benchmark,
}

impl ComponentType {
    /// Stable name of the component used in resource names and labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Controller => "controller",
            ComponentType::Worker => "worker",
            ComponentType::Benchmark => "benchmark",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CONTROLLER_NAME: &str = "slurm-operator";

pub const SLURMCTLD_NAME: &str = "slurmctld";
pub const SLURMD_NAME: &str = "slurmd";

pub const CONTAINER_NAME_SLURMCTLD: &str = SLURMCTLD_NAME;
pub const CONTAINER_NAME_SLURMD: &str = SLURMD_NAME;
pub const CONTAINER_NAME_MUNGE: &str = "munge";
pub const CONTAINER_NAME_TOOLKIT_VALIDATION: &str = "toolkit-validation";
pub const CONTAINER_NAME_NCCL_BENCHMARK: &str = "nccl-benchmark";

pub const SLURMCTLD_PORT: i32 = 6817;
pub const SLURMD_PORT: i32 = 6818;

pub const VOLUME_NAME_SLURM_CONFIGS: &str = "slurm-configs";
pub const VOLUME_NAME_MUNGE_KEY: &str = "munge-key";
pub const VOLUME_NAME_MUNGE_SOCKET: &str = "munge-socket";
pub const VOLUME_NAME_JAIL: &str = "jail";
pub const VOLUME_NAME_SPOOL: &str = "spool";
pub const VOLUME_NAME_NVIDIA: &str = "nvidia";
pub const VOLUME_NAME_BOOT: &str = "boot";

pub const VOLUME_MOUNT_PATH_SLURM_CONFIGS: &str = "/mnt/slurm-configs";
pub const VOLUME_MOUNT_PATH_MUNGE_KEY: &str = "/mnt/munge-key";
pub const VOLUME_MOUNT_PATH_MUNGE_SOCKET: &str = "/run/munge";
pub const VOLUME_MOUNT_PATH_JAIL: &str = "/mnt/jail";
pub const VOLUME_MOUNT_PATH_SPOOL: &str = "/var/spool";
pub const VOLUME_MOUNT_PATH_NVIDIA: &str = "/run/nvidia";
pub const VOLUME_MOUNT_PATH_BOOT: &str = "/boot";

pub const SECRET_MUNGE_KEY_FILE_NAME: &str = "munge.key";
pub const SECRET_MUNGE_KEY_FILE_MODE: i32 = 0o400;

pub const ANNOTATION_VERSIONS: &str = "slurm.nebius.ai/versions";
pub const ANNOTATION_APPARMOR_KEY: &str = "container.apparmor.security.beta.kubernetes.io";
pub const ANNOTATION_APPARMOR_VALUE_UNCONFINED: &str = "unconfined";

pub const CAPABILITY_SYS_ADMIN: &str = "SYS_ADMIN";

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";
pub const RESOURCE_NVIDIA_GPU: &str = "nvidia.com/gpu";
