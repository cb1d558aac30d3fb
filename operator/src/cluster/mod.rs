//! SlurmCluster is a k8s custom resource that describes a Slurm cluster.
//!
//! Rendering a cluster is a pure function of its spec, its identity and a random source
//! for the version placeholders. Nothing is read from or written to the k8s API.

// Export all spec types
mod spec;
pub use spec::*;

pub mod benchmark;
pub mod consts;
pub mod container;
pub mod controller;
pub mod model;
pub mod naming;
pub mod node_filter;
pub mod resource_limits;
pub mod versions;
pub mod volume;
pub mod worker;

mod error;
mod workload;

#[cfg(test)]
pub mod stub;

pub use consts::ComponentType;
pub use error::{ConfigurationError, Error, ManifestError, Result};

use rand::RngCore;
use tracing::debug;

use crate::cluster::model::{ClusterManifests, NodeManifests};

/// Name and namespace of a rendered cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub name: String,
    pub namespace: String,
}

impl ClusterIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Render every component of the cluster.
///
/// Components are rendered in a fixed order so the same spec and random source state
/// always produce the same manifests.
pub fn synthesize(
    identity: &ClusterIdentity,
    spec: &SlurmClusterSpec,
    rng: &mut impl RngCore,
) -> Result<ClusterManifests> {
    debug!(cluster = %identity.name, namespace = %identity.namespace, "synthesizing cluster");
    let manifests = ClusterManifests {
        controller: NodeManifests {
            service: controller::service_template(identity, spec),
            workload: controller::workload_template(identity, spec, rng)?,
        },
        worker: NodeManifests {
            service: worker::service_template(identity, spec),
            workload: worker::workload_template(identity, spec, rng)?,
        },
        benchmark: benchmark::job_template(identity, spec, rng)?,
    };
    debug!(
        cluster = %identity.name,
        benchmark = manifests.benchmark.is_some(),
        "synthesized cluster"
    );
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use rand::rngs::mock::StepRng;
    use tracing_test::traced_test;

    use super::*;
    use crate::cluster::consts::ANNOTATION_VERSIONS;

    #[test]
    #[traced_test]
    fn synthesizes_every_component() {
        let manifests = synthesize(
            &ClusterIdentity::test(),
            &SlurmClusterSpec::test(),
            &mut StepRng::new(29, 7),
        )
        .unwrap();
        assert_eq!(manifests.controller.workload.name, "slurm1-controller");
        assert_eq!(manifests.worker.workload.name, "slurm1-worker");
        assert_eq!(
            manifests.benchmark.as_ref().map(|job| job.name.as_str()),
            Some("slurm1-benchmark")
        );
        assert!(logs_contain("synthesized cluster"));
    }

    #[test]
    fn components_draw_distinct_versions() {
        let manifests = synthesize(
            &ClusterIdentity::test(),
            &SlurmClusterSpec::test(),
            &mut StepRng::new(29, 7),
        )
        .unwrap();
        let versions: Vec<_> = [
            &manifests.controller.workload.annotations,
            &manifests.controller.workload.pod.annotations,
            &manifests.worker.workload.annotations,
            &manifests.worker.workload.pod.annotations,
        ]
        .into_iter()
        .filter_map(|annotations| annotations.get(ANNOTATION_VERSIONS))
        .collect();
        expect![[r#"
            [
                "1d00000000000000",
                "2400000000000000",
                "2b00000000000000",
                "3200000000000000",
            ]
        "#]]
        .assert_debug_eq(&versions);
    }

    #[test]
    fn first_error_stops_synthesis() {
        let spec = SlurmClusterSpec::test().with_controller_node_filter("missing");
        let err = synthesize(&ClusterIdentity::test(), &spec, &mut StepRng::new(29, 7))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration {
                component: ComponentType::Controller,
                ..
            }
        ));
    }
}
