//! Names of the resources rendered for a cluster.
//!
//! Every name is a pure function of the component and the cluster name so repeated
//! renders address the same objects.
use crate::cluster::consts::{ComponentType, VOLUME_NAME_JAIL, VOLUME_NAME_SPOOL};

/// Name of the service fronting a component.
pub fn service_name(component: ComponentType, cluster: &str) -> String {
    format!("{cluster}-{component}-svc")
}

/// Name of the workload (stateful set or cron job) of a component.
pub fn workload_name(component: ComponentType, cluster: &str) -> String {
    format!("{cluster}-{component}")
}

/// Name of the spool volume of a component.
pub fn spool_volume_name(component: ComponentType) -> String {
    format!("{component}-{VOLUME_NAME_SPOOL}")
}

/// Name of the jail volume. The jail is shared by all components so its name is fixed.
pub fn jail_volume_name() -> String {
    VOLUME_NAME_JAIL.to_owned()
}

/// Name of the config map holding slurm.conf and friends.
pub fn slurm_configs_name(cluster: &str) -> String {
    format!("{cluster}-slurm-configs")
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn names() {
        expect!["slurm1-controller-svc"]
            .assert_eq(&service_name(ComponentType::Controller, "slurm1"));
        expect!["slurm1-worker"].assert_eq(&workload_name(ComponentType::Worker, "slurm1"));
        expect!["worker-spool"].assert_eq(&spool_volume_name(ComponentType::Worker));
        expect!["jail"].assert_eq(&jail_volume_name());
        expect!["slurm1-slurm-configs"].assert_eq(&slurm_configs_name("slurm1"));
    }

    #[test]
    fn names_differ_per_component() {
        let controller = workload_name(ComponentType::Controller, "slurm1");
        let worker = workload_name(ComponentType::Worker, "slurm1");
        assert_ne!(controller, worker);
        assert_ne!(
            spool_volume_name(ComponentType::Controller),
            spool_volume_name(ComponentType::Worker)
        );
    }

    #[test]
    fn names_are_stable() {
        for component in [
            ComponentType::Controller,
            ComponentType::Worker,
            ComponentType::Benchmark,
        ] {
            assert_eq!(service_name(component, "c"), service_name(component, "c"));
            assert_eq!(workload_name(component, "c"), workload_name(component, "c"));
        }
    }
}
