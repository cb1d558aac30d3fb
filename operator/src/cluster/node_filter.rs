use crate::cluster::{error::ConfigurationError, model::Placement, spec::K8sNodeFilter};

/// Find the node filter `name` and turn it into a pod placement.
///
/// The name has to be declared exactly once.
pub fn placement(filters: &[K8sNodeFilter], name: &str) -> Result<Placement, ConfigurationError> {
    let mut matching = filters.iter().filter(|filter| filter.name == name);
    let filter = matching
        .next()
        .ok_or_else(|| ConfigurationError::UnknownNodeFilter(name.to_owned()))?;
    if matching.next().is_some() {
        return Err(ConfigurationError::DuplicateNodeFilter(name.to_owned()));
    }
    Ok(Placement::from(filter))
}

impl From<&K8sNodeFilter> for Placement {
    fn from(value: &K8sNodeFilter) -> Self {
        Self {
            node_selector: value.node_selector.clone(),
            tolerations: value.tolerations.clone(),
        }
    }
}
