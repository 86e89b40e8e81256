//! Tracked-user statistics for a public coding judge: periodic stats
//! aggregation, local/cloud tracked-list reconciliation, and a
//! single-writer refresh runtime.
//!
//! # Examples
//!
//! Pure core usage, windowed dedup and list merging:
//! ```
//! use leetwatch::{
//!     aggregate::{RecencyWindow, dedup_latest},
//!     stats::Submission,
//!     sync::merge_tracked,
//! };
//!
//! let subs = vec![
//!     Submission { title: "Two Sum".into(), timestamp: 1_000, title_slug: "two-sum".into() },
//!     Submission { title: "Two Sum".into(), timestamp: 990, title_slug: "two-sum".into() },
//! ];
//! let unique = dedup_latest(&subs, RecencyWindow::since(0, 2_000));
//! assert_eq!(unique.len(), 1);
//! assert_eq!(unique[0].timestamp, 1_000);
//!
//! let merged = merge_tracked(
//!     &["alice".to_string(), "bob".to_string()],
//!     &["bob".to_string(), "carol".to_string()],
//! );
//! assert_eq!(merged, ["alice", "bob", "carol"]);
//! ```
//!
//! Runtime usage against the public judge endpoint:
//! ```no_run
//! use leetwatch::{
//!     remote::graphql::GraphqlJudgeClient,
//!     runtime::handle::{RuntimeConfig, spawn_watcher},
//!     store::{TrackedStore, memory::MemoryKv},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = TrackedStore::new(MemoryKv::new());
//! let handle = spawn_watcher(store, GraphqlJudgeClient::leetcode(), RuntimeConfig::default());
//! handle.add_user("alice").await.expect("add");
//! let snapshot = handle.snapshot().await.expect("snapshot");
//! assert_eq!(snapshot.entries.len(), 1);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Stats aggregation: windowing, dedup, snapshot assembly.
pub mod aggregate;
/// Cloud document-store collaborator and social layer.
pub mod cloud;
/// Remote judge query client.
pub mod remote;
/// Refresh orchestrator runtime and event stream.
pub mod runtime;
/// Domain records: stats snapshots and judge payloads.
pub mod stats;
/// Observable local key-value persistence.
pub mod store;
/// Local/cloud tracked-set reconciliation.
pub mod sync;
/// Shared primitive types and enums.
pub mod types;
