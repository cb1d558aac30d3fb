use std::collections::BTreeMap;

use crate::cluster::{
    consts::{RESOURCE_CPU, RESOURCE_EPHEMERAL_STORAGE, RESOURCE_MEMORY, RESOURCE_NVIDIA_GPU},
    spec::ResourceLimitsSpec,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLimitsConfig {
    /// Cpu resource limit
    pub cpu: String,
    /// Memory resource limit
    pub memory: String,
    // Ephemeral storage resource limit
    pub ephemeral_storage: String,
    /// Number of GPUs, no limit is set when absent
    pub gpu: Option<i32>,
}

impl ResourceLimitsConfig {
    pub fn from_spec(spec: Option<ResourceLimitsSpec>, defaults: Self) -> Self {
        if let Some(spec) = spec {
            Self {
                cpu: spec.cpu.unwrap_or(defaults.cpu),
                memory: spec.memory.unwrap_or(defaults.memory),
                ephemeral_storage: spec.ephemeral_storage.unwrap_or(defaults.ephemeral_storage),
                gpu: defaults.gpu,
            }
        } else {
            defaults
        }
    }

    /// Request this many GPUs.
    pub fn with_gpu(self, gpu: i32) -> Self {
        Self {
            gpu: Some(gpu),
            ..self
        }
    }
}

impl From<ResourceLimitsConfig> for BTreeMap<String, String> {
    fn from(value: ResourceLimitsConfig) -> Self {
        let mut map = BTreeMap::from_iter([
            (RESOURCE_CPU.to_owned(), value.cpu),
            (RESOURCE_EPHEMERAL_STORAGE.to_owned(), value.ephemeral_storage),
            (RESOURCE_MEMORY.to_owned(), value.memory),
        ]);
        if let Some(gpu) = value.gpu {
            map.insert(RESOURCE_NVIDIA_GPU.to_owned(), gpu.to_string());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ResourceLimitsConfig {
        ResourceLimitsConfig {
            cpu: "1".to_owned(),
            memory: "1Gi".to_owned(),
            ephemeral_storage: "10Gi".to_owned(),
            gpu: None,
        }
    }

    #[test]
    fn spec_overrides_defaults() {
        let config = ResourceLimitsConfig::from_spec(
            Some(ResourceLimitsSpec {
                memory: Some("4Gi".to_owned()),
                ..Default::default()
            }),
            defaults(),
        );
        assert_eq!(config.memory, "4Gi");
        assert_eq!(config.cpu, "1");
    }

    #[test]
    fn gpu_limit_only_when_requested() {
        let limits: BTreeMap<String, String> = defaults().into();
        assert!(!limits.contains_key(RESOURCE_NVIDIA_GPU));

        let limits: BTreeMap<String, String> = defaults().with_gpu(8).into();
        assert_eq!(limits.get(RESOURCE_NVIDIA_GPU).map(String::as_str), Some("8"));
        assert_eq!(limits.len(), 4);
    }
}
