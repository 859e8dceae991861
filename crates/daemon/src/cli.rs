// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line flags: one cluster triple per comma-separated position, plus
//! a handful of settings shared across every tracked cluster.

use anyhow::{bail, Result};
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "strata-daemon", about = "Multi-cluster YARN job observability service")]
pub struct Cli {
    /// Comma-separated cluster labels, positionally paired with the other
    /// per-cluster flags below.
    #[arg(long, default_value = "default")]
    pub cluster_name: String,

    #[arg(long, default_value = "http://localhost:8088")]
    pub resource_manager_url: String,

    #[arg(long, default_value = "http://localhost:19888")]
    pub history_server_url: String,

    /// Defaults to the resource manager URL for any cluster that omits it.
    #[arg(long, default_value = "")]
    pub proxy_server_url: String,

    #[arg(long, default_value = "localhost:9000")]
    pub namenode_address: String,

    #[arg(long, default_value = "/tmp/staging/history/done")]
    pub yarn_history_dir: String,

    /// HDFS path where YARN stores aggregated container logs (the
    /// `yarn.nodemanager.remote-app-log-dir` property). Only used for a
    /// startup accessibility probe; jobs' logs are never fetched from here.
    #[arg(long, default_value = "/tmp/logs")]
    pub yarn_logs_dir: String,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "2s")]
    pub http_timeout: Duration,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub poll_interval: Duration,

    /// Listed for parity with the upstream tool; no pprof-equivalent crate
    /// is wired up here, so setting this only logs a warning.
    #[arg(long, default_value_t = false)]
    pub pprof: bool,

    #[arg(long, default_value = "")]
    pub s3_bucket: String,

    #[arg(long, default_value = "")]
    pub s3_region: String,

    #[arg(long, default_value = "jobs")]
    pub s3_jobs_prefix: String,

    #[arg(long, default_value = "flows")]
    pub s3_flow_prefix: String,

    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen_address: String,
}

/// One cluster's worth of configuration after splitting and validating the
/// parallel comma-separated flag lists.
#[derive(Debug, Clone)]
pub struct ClusterArgs {
    pub cluster_name: String,
    pub resource_manager_url: String,
    pub history_server_url: String,
    pub proxy_server_url: String,
    pub namenode_address: String,
}

impl Cli {
    /// Split every comma-separated flag and zip them into per-cluster
    /// argument sets. Fatal if the lists don't all have the same length.
    pub fn clusters(&self) -> Result<Vec<ClusterArgs>> {
        let names = split(&self.cluster_name);
        let rms = split(&self.resource_manager_url);
        let hss = split(&self.history_server_url);
        let proxies = split(&self.proxy_server_url);
        let namenodes = split(&self.namenode_address);

        let lengths = [names.len(), rms.len(), hss.len(), proxies.len(), namenodes.len()];
        if lengths.iter().any(|&n| n != lengths[0]) {
            bail!(
                "cluster flag lists must all have the same length: \
                 cluster-name={}, resource-manager-url={}, history-server-url={}, \
                 proxy-server-url={}, namenode-address={}",
                lengths[0],
                lengths[1],
                lengths[2],
                lengths[3],
                lengths[4],
            );
        }

        Ok((0..lengths[0])
            .map(|i| {
                let rm = rms[i].clone();
                let proxy = if proxies[i].is_empty() { rm.clone() } else { proxies[i].clone() };
                ClusterArgs {
                    cluster_name: names[i].clone(),
                    resource_manager_url: rm,
                    history_server_url: hss[i].clone(),
                    proxy_server_url: proxy,
                    namenode_address: namenodes[i].clone(),
                }
            })
            .collect())
    }
}

fn split(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli::parse_from(["strata-daemon"])
    }

    #[test]
    fn single_cluster_by_default() {
        let clusters = base_cli().clusters().unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_name, "default");
        assert_eq!(clusters[0].proxy_server_url, "http://localhost:8088");
    }

    #[test]
    fn splits_comma_separated_lists_positionally() {
        let mut cli = base_cli();
        cli.cluster_name = "a,b".to_string();
        cli.resource_manager_url = "http://rm-a:8088,http://rm-b:8088".to_string();
        cli.history_server_url = "http://hs-a:19888,http://hs-b:19888".to_string();
        cli.namenode_address = "nn-a:9000,nn-b:9000".to_string();

        let clusters = cli.clusters().unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].cluster_name, "b");
        assert_eq!(clusters[1].resource_manager_url, "http://rm-b:8088");
    }

    #[test]
    fn mismatched_list_lengths_are_fatal() {
        let mut cli = base_cli();
        cli.cluster_name = "a,b".to_string();
        assert!(cli.clusters().is_err());
    }
}
