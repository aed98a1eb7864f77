//! Host resource sampling and strategy selection.
//!
//! Sampling (a side effect) lives behind [`ResourceSampler`]; the branching
//! policy is the pure [`decide_strategy`].

use crate::config::StrategyOverride;
use crate::types::Strategy;
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use sysinfo::System;

/// A point-in-time view of host capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceSample {
    pub available_memory_mb: f64,
    pub cpu_percent: f32,
    pub in_container: bool,
}

/// Minimum free memory and maximum CPU load for the heavy path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_memory_mb: f64,
    pub max_cpu_percent: f32,
}

impl Thresholds {
    pub const HOST: Thresholds = Thresholds {
        min_memory_mb: 300.0,
        max_cpu_percent: 80.0,
    };
    pub const CONTAINER: Thresholds = Thresholds {
        min_memory_mb: 500.0,
        max_cpu_percent: 60.0,
    };

    pub fn for_sample(sample: &ResourceSample) -> Thresholds {
        if sample.in_container {
            Thresholds::CONTAINER
        } else {
            Thresholds::HOST
        }
    }
}

/// Pick a strategy. Overrides first, then thresholds; no sample means Light.
pub fn decide_strategy(sample: Option<&ResourceSample>, overrides: StrategyOverride) -> Strategy {
    if let Some(forced) = overrides.forced() {
        return forced;
    }
    let Some(sample) = sample else {
        return Strategy::Light;
    };
    let limits = Thresholds::for_sample(sample);
    if sample.available_memory_mb > limits.min_memory_mb
        && sample.cpu_percent < limits.max_cpu_percent
    {
        Strategy::Heavy
    } else {
        Strategy::Light
    }
}

/// Source of host resource readings.
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<ResourceSample>;
}

/// Reads memory and CPU through `sysinfo`.
pub struct SystemSampler;

#[async_trait]
impl ResourceSampler for SystemSampler {
    async fn sample(&self) -> Result<ResourceSample> {
        let mut sys = System::new();
        sys.refresh_memory();
        // CPU usage is a delta between two refreshes.
        sys.refresh_cpu_usage();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();

        if sys.total_memory() == 0 {
            bail!("memory statistics unavailable");
        }
        let cpu_percent = sys.global_cpu_usage();
        if !cpu_percent.is_finite() {
            bail!("cpu statistics unavailable");
        }

        Ok(ResourceSample {
            available_memory_mb: sys.available_memory() as f64 / (1024.0 * 1024.0),
            cpu_percent,
            in_container: in_container(),
        })
    }
}

/// Docker and Podman leave marker files at the filesystem root.
pub fn in_container() -> bool {
    Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists()
}
