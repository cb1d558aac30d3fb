use std::collections::BTreeMap;

use crate::cluster::{consts::CONTROLLER_NAME, ComponentType};

/// Create labels that can be used as a unique selector for a component of a cluster.
pub fn selector_labels(component: ComponentType, cluster: &str) -> BTreeMap<String, String> {
    BTreeMap::from_iter(vec![
        ("app.kubernetes.io/name".to_owned(), "slurmcluster".to_owned()),
        ("app.kubernetes.io/instance".to_owned(), cluster.to_owned()),
        (
            "app.kubernetes.io/component".to_owned(),
            component.as_str().to_owned(),
        ),
    ])
}

/// Labels that indicate the resource is managed by the operator.
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from_iter(vec![(
        "app.kubernetes.io/managed-by".to_owned(),
        CONTROLLER_NAME.to_owned(),
    )])
}

/// Full label set of a component: its selector labels plus the managed labels.
pub fn component_labels(component: ComponentType, cluster: &str) -> BTreeMap<String, String> {
    let mut labels = selector_labels(component, cluster);
    labels.append(&mut managed_labels());
    labels
}
