// SPDX-License-Identifier: Apache-2.0

//! Cluster sink: managed object writes and pruning.

pub mod sink;

pub use sink::ClusterSink;
