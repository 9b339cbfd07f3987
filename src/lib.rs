//! ccx-cluster-filter - allow-list and block-list filtering of cluster records
//!
//! Before cluster reports are diffed and turned into notifications, the
//! list of clusters is narrowed down according to the processing
//! configuration. Two independent modes exist:
//!
//! - **Allow mode** keeps only clusters named in the allow-list
//! - **Block mode** drops clusters named in the block-list
//!
//! With both enabled a cluster has to be allowed and not blocked. With
//! neither enabled the input is returned untouched.
//!
//! # Key Features
//!
//! - **Order preservation**: survivors keep their input order, duplicates included
//! - **Fast filtering**: lists are indexed into hash sets once per call
//! - **No copies when unfiltered**: the input is borrowed back if nothing is removed
//!
//! # Examples
//!
//! ```no_run
//! use ccx_cluster_filter::{filter_cluster_list, parse_cluster_entries, ProcessingConfiguration};
//! use std::fs::File;
//!
//! let clusters = parse_cluster_entries(File::open("clusters.json").unwrap()).unwrap();
//! let config = ProcessingConfiguration::load("config.toml").unwrap();
//!
//! let (filtered, removed) = filter_cluster_list(&clusters, &config);
//! println!("{} clusters kept, {} removed", filtered.len(), removed);
//! ```

pub mod cluster;
pub mod config;
pub mod filter;
pub mod output;

pub use cluster::{
    parse_cluster_entries, AccountNumber, ClusterEntry, ClusterError, ClusterName, ClusterRecord,
    KafkaOffset, OrgId,
};
pub use config::{read_cluster_list, ConfigError, ProcessingConfiguration};
pub use filter::{filter_cluster_list, ClusterFilter, FilterMode};
pub use output::{write_clusters, Checksum, ChecksumWriter, DigestAlgorithm};
