use kube::CustomResourceExt;

use slurm_operator::cluster::SlurmCluster;

fn main() {
    print!("{}", serde_yaml::to_string(&SlurmCluster::crd()).unwrap());
}
