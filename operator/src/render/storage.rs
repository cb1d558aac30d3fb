use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec, ResourceRequirements},
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta},
};

use crate::cluster::model::ClaimTemplate;

impl From<&ClaimTemplate> for PersistentVolumeClaimSpec {
    fn from(value: &ClaimTemplate) -> Self {
        Self {
            access_modes: Some(value.access_modes.clone()),
            resources: Some(ResourceRequirements {
                requests: Some(BTreeMap::from_iter(vec![(
                    "storage".to_owned(),
                    Quantity(value.size.clone()),
                )])),
                ..Default::default()
            }),
            storage_class_name: value.storage_class_name.clone(),
            ..Default::default()
        }
    }
}

/// Render a claim template, the claim of each replica is named after it.
pub fn claim_template(value: &ClaimTemplate, namespace: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(value.name.clone()),
            namespace: Some(namespace.to_owned()),
            ..Default::default()
        },
        spec: Some(value.into()),
        ..Default::default()
    }
}
