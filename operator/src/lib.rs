//! Renders Slurm cluster custom resources into the k8s objects that run the cluster.

/// Cluster module for describing and rendering Slurm clusters.
pub mod cluster;
/// Labels module for managing resource labels.
pub mod labels;
/// Render module translating rendered clusters into k8s objects.
pub mod render;
