//! Version annotations that trigger rolling restarts.
//!
//! The values generated here are placeholders. Whoever applies the rendered objects
//! replaces them with a hash of the final content.
use std::collections::BTreeMap;

use rand::RngCore;

use crate::cluster::{consts::ANNOTATION_VERSIONS, error::Result};

const PLACEHOLDER_LEN: usize = 8;

/// Placeholders for the workload object and its pod template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPlaceholders {
    pub workload: String,
    pub pod: String,
}

impl VersionPlaceholders {
    /// Annotations carrying the workload version.
    pub fn workload_annotations(&self) -> BTreeMap<String, String> {
        BTreeMap::from_iter([(ANNOTATION_VERSIONS.to_owned(), self.workload.clone())])
    }
    /// Annotations carrying the pod version.
    pub fn pod_annotations(&self) -> BTreeMap<String, String> {
        BTreeMap::from_iter([(ANNOTATION_VERSIONS.to_owned(), self.pod.clone())])
    }
}

/// Generate two independent placeholders.
///
/// Fails only if the random source fails.
pub fn generate_placeholders(rng: &mut impl RngCore) -> Result<VersionPlaceholders> {
    Ok(VersionPlaceholders {
        workload: random_token(rng)?,
        pod: random_token(rng)?,
    })
}

fn random_token(rng: &mut impl RngCore) -> Result<String> {
    let mut bytes = [0u8; PLACEHOLDER_LEN];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}
