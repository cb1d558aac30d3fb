//! Periodic NCCL benchmark of the worker nodes.
use rand::RngCore;
use tracing::debug;

use crate::{
    cluster::{
        consts::{ComponentType, CONTAINER_NAME_NCCL_BENCHMARK},
        container::{self, ContainerConfig, ContainerPolicy},
        error::Result,
        model::{BenchmarkJobTemplate, ContainerTemplate, PodTemplate},
        naming, node_filter, versions, volume, ClusterIdentity, NcclBenchmarkSpec, SlurmClusterSpec,
    },
    labels::component_labels,
};

const COMPONENT: ComponentType = ComponentType::Benchmark;

/// Benchmark settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    pub enabled: bool,
    pub schedule: String,
    pub active_deadline_seconds: i64,
    pub successful_jobs_history_limit: i32,
    pub failed_jobs_history_limit: i32,
    pub image: String,
    pub image_pull_policy: String,
    pub nccl: NcclConfig,
    pub drain_slurm_node_on_failure: bool,
}

/// Arguments of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct NcclConfig {
    pub min_bytes: String,
    pub max_bytes: String,
    pub step_factor: String,
    pub timeout: String,
    pub threshold_more_than: String,
    pub use_infiniband: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: "0 */3 * * *".to_owned(),
            active_deadline_seconds: 1800,
            successful_jobs_history_limit: 3,
            failed_jobs_history_limit: 3,
            image: String::new(),
            image_pull_policy: ContainerConfig::defaults(0).image_pull_policy,
            nccl: NcclConfig::default(),
            drain_slurm_node_on_failure: true,
        }
    }
}

impl Default for NcclConfig {
    fn default() -> Self {
        Self {
            min_bytes: "512Mb".to_owned(),
            max_bytes: "8Gb".to_owned(),
            step_factor: "2".to_owned(),
            timeout: "20:00".to_owned(),
            threshold_more_than: "420".to_owned(),
            use_infiniband: false,
        }
    }
}

impl From<&NcclBenchmarkSpec> for BenchmarkConfig {
    fn from(value: &NcclBenchmarkSpec) -> Self {
        let default = Self::default();
        let settings = value.nccl_settings.clone().unwrap_or_default();
        Self {
            enabled: value.enabled.unwrap_or(default.enabled),
            schedule: value.schedule.to_owned().unwrap_or(default.schedule),
            active_deadline_seconds: value
                .active_deadline_seconds
                .unwrap_or(default.active_deadline_seconds),
            successful_jobs_history_limit: value
                .successful_jobs_history_limit
                .unwrap_or(default.successful_jobs_history_limit),
            failed_jobs_history_limit: value
                .failed_jobs_history_limit
                .unwrap_or(default.failed_jobs_history_limit),
            image: value.image.to_owned(),
            image_pull_policy: value
                .image_pull_policy
                .to_owned()
                .unwrap_or(default.image_pull_policy),
            nccl: NcclConfig {
                min_bytes: settings.min_bytes.unwrap_or(default.nccl.min_bytes),
                max_bytes: settings.max_bytes.unwrap_or(default.nccl.max_bytes),
                step_factor: settings.step_factor.unwrap_or(default.nccl.step_factor),
                timeout: settings.timeout.unwrap_or(default.nccl.timeout),
                threshold_more_than: settings
                    .threshold_more_than
                    .unwrap_or(default.nccl.threshold_more_than),
                use_infiniband: settings
                    .use_infiniband
                    .unwrap_or(default.nccl.use_infiniband),
            },
            drain_slurm_node_on_failure: value
                .failure_actions
                .as_ref()
                .and_then(|actions| actions.set_slurm_node_drain_state)
                .unwrap_or(default.drain_slurm_node_on_failure),
        }
    }
}

/// Cron job running the benchmark, `None` when no benchmark is configured.
///
/// The job mounts the jail of the workers, which therefore has to come from a declared
/// volume source.
pub fn job_template(
    identity: &ClusterIdentity,
    spec: &SlurmClusterSpec,
    rng: &mut impl RngCore,
) -> Result<Option<BenchmarkJobTemplate>> {
    let Some(benchmark) = &spec.nccl_benchmark else {
        return Ok(None);
    };
    let config = BenchmarkConfig::from(benchmark);
    if !config.enabled {
        debug!(cluster = %identity.name, "nccl benchmark disabled");
        return Ok(None);
    }

    let worker = &spec.slurm_nodes.worker;
    let filter_name = benchmark
        .k8s_node_filter_name
        .as_deref()
        .unwrap_or(&worker.node.k8s_node_filter_name);
    let placement = node_filter::placement(&spec.k8s_node_filters, filter_name)
        .map_err(|err| err.at(COMPONENT, "k8sNodeFilterName"))?;
    let jail = volume::resolve_inline(
        naming::jail_volume_name(),
        &worker.volumes.jail,
        &spec.volume_sources,
    )
    .map_err(|err| err.at(COMPONENT, "volumes.jail"))?;
    let versions = versions::generate_placeholders(rng)?;

    let labels = component_labels(COMPONENT, &identity.name);
    let job = BenchmarkJobTemplate {
        name: naming::workload_name(COMPONENT, &identity.name),
        namespace: identity.namespace.to_owned(),
        labels: labels.clone(),
        annotations: versions.workload_annotations(),
        schedule: config.schedule.to_owned(),
        active_deadline_seconds: config.active_deadline_seconds,
        successful_jobs_history_limit: config.successful_jobs_history_limit,
        failed_jobs_history_limit: config.failed_jobs_history_limit,
        pod: PodTemplate {
            labels,
            annotations: versions.pod_annotations(),
            placement,
            init_containers: Vec::new(),
            containers: vec![nccl_benchmark(&config)],
            volumes: vec![
                volume::slurm_configs(&identity.name),
                jail,
                volume::munge_key(&spec.secrets.munge_key),
            ],
            restart_policy: Some("Never".to_owned()),
        },
    };
    debug!(name = %job.name, schedule = %job.schedule, "assembled benchmark job");
    Ok(Some(job))
}

fn nccl_benchmark(config: &BenchmarkConfig) -> ContainerTemplate {
    let env = vec![
        container::literal_env("NCCL_MIN_BYTES", &config.nccl.min_bytes),
        container::literal_env("NCCL_MAX_BYTES", &config.nccl.max_bytes),
        container::literal_env("NCCL_STEP_FACTOR", &config.nccl.step_factor),
        container::literal_env("NCCL_BENCH_TIMOUT", &config.nccl.timeout),
        container::literal_env("THRESHOLD_MORE_THAN", &config.nccl.threshold_more_than),
        container::literal_env(
            "DRAIN_SLURM_STATE",
            config.drain_slurm_node_on_failure.to_string(),
        ),
        container::literal_env("USE_INFINIBAND", config.nccl.use_infiniband.to_string()),
    ];
    let container_config = ContainerConfig {
        image: config.image.to_owned(),
        image_pull_policy: config.image_pull_policy.to_owned(),
        ..ContainerConfig::defaults(0)
    };
    ContainerTemplate {
        // The benchmark uses the whole node.
        limits: Default::default(),
        ..container::build(
            CONTAINER_NAME_NCCL_BENCHMARK,
            &container_config,
            ContainerPolicy::job(
                vec![
                    volume::mount_slurm_configs(),
                    volume::mount_jail(),
                    volume::mount_munge_key(),
                ],
                env,
            ),
        )
    }
}
