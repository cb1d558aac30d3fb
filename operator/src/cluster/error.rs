use crate::cluster::consts::ComponentType;

/// Errors produced while rendering a cluster.
///
/// None of them go away by retrying, the cluster spec has to change first.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{component} {field}: {source}")]
    Configuration {
        component: ComponentType,
        field: &'static str,
        #[source]
        source: ConfigurationError,
    },
    #[error("generating versions annotation placeholders: {source}")]
    Generation {
        #[from]
        source: rand::Error,
    },
}

/// The cluster spec references something it does not declare.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown volume source {0:?}")]
    UnknownVolumeSource(String),
    #[error("volume source {0:?} is declared more than once")]
    DuplicateVolumeSource(String),
    #[error("unknown k8s node filter {0:?}")]
    UnknownNodeFilter(String),
    #[error("k8s node filter {0:?} is declared more than once")]
    DuplicateNodeFilter(String),
    #[error("volume must reference a volume source, claim templates are not supported here")]
    ClaimTemplateUnsupported,
}

impl ConfigurationError {
    /// Attach the component and spec field that triggered the error.
    pub fn at(self, component: ComponentType, field: &'static str) -> Error {
        Error::Configuration {
            component,
            field,
            source: self,
        }
    }
}

/// A SlurmCluster manifest could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("parsing manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("decoding SlurmCluster: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
