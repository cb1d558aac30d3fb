//! Translates rendered cluster values into k8s objects.
use k8s_openapi::{
    api::{
        apps::v1::{
            RollingUpdateStatefulSetStrategy, StatefulSet, StatefulSetSpec,
            StatefulSetUpdateStrategy,
        },
        batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec},
        core::v1::{Service, ServicePort, ServiceSpec},
    },
    apimachinery::pkg::{
        apis::meta::v1::{LabelSelector, ObjectMeta},
        util::intstr::IntOrString,
    },
};
use serde::Serialize;

use crate::cluster::model::{
    BenchmarkJobTemplate, ClusterManifests, NodeManifests, ServiceTemplate, UpdatePolicy,
    WorkloadTemplate,
};

mod pod;
mod storage;

pub use pod::{container, pod_template, volume};
pub use storage::claim_template;

/// A k8s object rendered for a cluster.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Object {
    Service(Service),
    StatefulSet(StatefulSet),
    CronJob(CronJob),
}

impl Object {
    /// Name of the object.
    pub fn name(&self) -> Option<&str> {
        match self {
            Object::Service(service) => service.metadata.name.as_deref(),
            Object::StatefulSet(stateful_set) => stateful_set.metadata.name.as_deref(),
            Object::CronJob(cron_job) => cron_job.metadata.name.as_deref(),
        }
    }
}

/// Render every object of a cluster.
///
/// Services precede the workloads they govern.
pub fn cluster(manifests: &ClusterManifests) -> Vec<Object> {
    let mut objects = Vec::new();
    for node in [&manifests.controller, &manifests.worker] {
        let NodeManifests { service: svc, workload } = node;
        objects.push(Object::Service(service(svc)));
        objects.push(Object::StatefulSet(stateful_set(workload)));
    }
    if let Some(benchmark) = &manifests.benchmark {
        objects.push(Object::CronJob(cron_job(benchmark)));
    }
    objects
}

/// Render a workload as a stateful set.
pub fn stateful_set(workload: &WorkloadTemplate) -> StatefulSet {
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(workload.name.clone()),
            namespace: Some(workload.namespace.clone()),
            labels: Some(workload.labels.clone()),
            annotations: Some(workload.annotations.clone()),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(workload.replicas),
            selector: LabelSelector {
                match_labels: Some(workload.selector.clone()),
                ..Default::default()
            },
            service_name: workload.service_name.clone(),
            update_strategy: Some(update_strategy(&workload.update_policy)),
            template: pod::pod_template(&workload.pod),
            volume_claim_templates: (!workload.claim_templates.is_empty()).then(|| {
                workload
                    .claim_templates
                    .iter()
                    .map(|claim| storage::claim_template(claim, &workload.namespace))
                    .collect()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn update_strategy(policy: &UpdatePolicy) -> StatefulSetUpdateStrategy {
    match policy {
        UpdatePolicy::RollingUpdate {
            max_unavailable_percent,
        } => StatefulSetUpdateStrategy {
            type_: Some("RollingUpdate".to_owned()),
            rolling_update: Some(RollingUpdateStatefulSetStrategy {
                max_unavailable: Some(IntOrString::String(format!(
                    "{max_unavailable_percent}%"
                ))),
                ..Default::default()
            }),
        },
    }
}

/// Render a service.
pub fn service(value: &ServiceTemplate) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(value.name.clone()),
            namespace: Some(value.namespace.clone()),
            labels: Some(value.labels.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(
                value
                    .ports
                    .iter()
                    .map(|port| ServicePort {
                        name: Some(port.name.clone()),
                        port: port.port,
                        protocol: Some(port.protocol.clone()),
                        target_port: Some(IntOrString::Int(port.port)),
                        ..Default::default()
                    })
                    .collect(),
            ),
            selector: Some(value.selector.clone()),
            type_: Some("ClusterIP".to_owned()),
            cluster_ip: value.headless.then(|| "None".to_owned()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Render a benchmark job as a cron job.
///
/// Runs never overlap and a failed run is not retried, the next scheduled run is.
pub fn cron_job(value: &BenchmarkJobTemplate) -> CronJob {
    CronJob {
        metadata: ObjectMeta {
            name: Some(value.name.clone()),
            namespace: Some(value.namespace.clone()),
            labels: Some(value.labels.clone()),
            annotations: Some(value.annotations.clone()),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule: value.schedule.clone(),
            concurrency_policy: Some("Forbid".to_owned()),
            successful_jobs_history_limit: Some(value.successful_jobs_history_limit),
            failed_jobs_history_limit: Some(value.failed_jobs_history_limit),
            job_template: JobTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(value.labels.clone()),
                    ..Default::default()
                }),
                spec: Some(JobSpec {
                    active_deadline_seconds: Some(value.active_deadline_seconds),
                    backoff_limit: Some(0),
                    template: pod::pod_template(&value.pod),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::cluster::{synthesize, ClusterIdentity, SlurmClusterSpec};

    fn manifests() -> ClusterManifests {
        synthesize(
            &ClusterIdentity::test(),
            &SlurmClusterSpec::test(),
            &mut StepRng::new(29, 7),
        )
        .unwrap()
    }

    #[test]
    fn cluster_objects_in_order() {
        let objects = cluster(&manifests());
        let names: Vec<_> = objects.iter().filter_map(Object::name).collect();
        assert_eq!(
            names,
            vec![
                "slurm1-controller-svc",
                "slurm1-controller",
                "slurm1-worker-svc",
                "slurm1-worker",
                "slurm1-benchmark",
            ]
        );
    }

    #[test]
    fn worker_stateful_set() {
        let sts = stateful_set(&manifests().worker.workload);
        let spec = sts.spec.unwrap();
        assert_eq!(spec.replicas, Some(2));
        assert_eq!(spec.service_name, "slurm1-worker-svc");
        assert_eq!(
            spec.update_strategy
                .and_then(|strategy| strategy.rolling_update)
                .and_then(|rolling| rolling.max_unavailable),
            Some(IntOrString::String("20%".to_owned()))
        );
        let claims: Vec<_> = spec
            .volume_claim_templates
            .unwrap()
            .into_iter()
            .filter_map(|claim| claim.metadata.name)
            .collect();
        assert_eq!(claims, vec!["worker-spool"]);
        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.init_containers.map(|c| c.len()), Some(1));
        assert_eq!(
            pod.tolerations.unwrap()[0].key.as_deref(),
            Some("nvidia.com/gpu")
        );
    }

    #[test]
    fn worker_service_yaml() {
        let svc = service(&manifests().worker.service);
        expect![[r#"
            apiVersion: v1
            kind: Service
            metadata:
              labels:
                app.kubernetes.io/component: worker
                app.kubernetes.io/instance: slurm1
                app.kubernetes.io/managed-by: slurm-operator
                app.kubernetes.io/name: slurmcluster
              name: slurm1-worker-svc
              namespace: slurm
            spec:
              clusterIP: None
              ports:
              - name: slurmd
                port: 6818
                protocol: TCP
                targetPort: 6818
              selector:
                app.kubernetes.io/component: worker
                app.kubernetes.io/instance: slurm1
                app.kubernetes.io/name: slurmcluster
              type: ClusterIP
        "#]]
        .assert_eq(&serde_yaml::to_string(&svc).unwrap());
    }

    #[test]
    fn benchmark_cron_job() {
        let job = cron_job(&manifests().benchmark.unwrap());
        let spec = job.spec.unwrap();
        assert_eq!(spec.schedule, "0 */3 * * *");
        assert_eq!(spec.concurrency_policy.as_deref(), Some("Forbid"));
        let job_spec = spec.job_template.spec.unwrap();
        assert_eq!(job_spec.backoff_limit, Some(0));
        assert_eq!(job_spec.active_deadline_seconds, Some(1800));
        assert_eq!(
            job_spec.template.spec.unwrap().restart_policy.as_deref(),
            Some("Never")
        );
    }

    #[test]
    fn objects_serialize_with_kind() {
        let objects = cluster(&manifests());
        let kinds: Vec<_> = objects
            .iter()
            .map(|object| {
                serde_json::to_value(object).unwrap()["kind"]
                    .as_str()
                    .unwrap()
                    .to_owned()
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["Service", "StatefulSet", "Service", "StatefulSet", "CronJob"]
        );
    }
}
