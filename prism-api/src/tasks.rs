//! Fetch tasks submitted to the batch executor by the metrics routes.
//!
//! A request fans out one [`PodMetricsTask`] per pod; each of those fans out
//! a nested batch of four [`UsageQueryTask`]s against the metrics backend.
//! Every task is bound at construction time to the sink slot it alone writes
//! during merge.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use prism::concurrency::{FetchTask, Merge, run};
use prism::error::PrismResult;
use prism::prometheus::{Matrix, MetricsQuerier, RangeQueryOptions, queries};
use prism::prometheus::timeline::align_samples;

use crate::routes::workloads::{CpuMeasurement, PodMetrics};

pub const CPU_UNIT_CORE: &str = "Core";
pub const CPU_UNIT_MILLICORE: &str = "m";

/// Resolved query parameters shared by every task in a request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedParams {
    pub start_ts: i64,
    pub end_ts: i64,
    pub step_secs: i64,
    /// Rate window for counter queries, in seconds.
    pub window_secs: i64,
}

/// Per-pod sink filled by the nested usage-query batch.
///
/// Each [`MetricQuery`] variant writes exactly one field, so the four
/// queries of a pod never contend on the same slot.
#[derive(Debug, Default)]
pub struct PodUsage {
    /// CPU samples in millicores, aligned to the query grid.
    pub cpu_samples: Vec<(i64, f64)>,
    /// Current CPU usage in cores, unrounded.
    pub cpu_current: Option<f64>,
    /// Memory samples in bytes, aligned to the query grid.
    pub mem_samples: Vec<(i64, f64)>,
    /// Current memory usage in bytes.
    pub mem_current: Option<f64>,
}

/// The four usage queries issued per pod.
#[derive(Debug, Clone, Copy)]
pub enum MetricQuery {
    CpuRange,
    MemoryRange,
    CpuCurrent,
    MemoryCurrent,
}

impl MetricQuery {
    fn name(&self) -> &'static str {
        match self {
            MetricQuery::CpuRange => "cpu-range",
            MetricQuery::MemoryRange => "memory-range",
            MetricQuery::CpuCurrent => "cpu-current",
            MetricQuery::MemoryCurrent => "memory-current",
        }
    }
}

/// One query against the metrics backend for one pod.
pub struct UsageQueryTask {
    pub namespace: String,
    pub pod: String,
    pub query: MetricQuery,
    pub querier: Arc<dyn MetricsQuerier>,
    pub params: ResolvedParams,
}

fn aligned_first_series(matrix: &Matrix, options: RangeQueryOptions) -> Vec<(i64, f64)> {
    matrix
        .first()
        .map(|series| {
            align_samples(
                &series.samples,
                options.start_ts,
                options.end_ts,
                options.step_secs,
            )
        })
        .unwrap_or_default()
        .into_iter()
        .map(|sample| (sample.timestamp, sample.value))
        .collect()
}

#[async_trait]
impl FetchTask<PodUsage> for UsageQueryTask {
    fn key(&self) -> String {
        format!("{}/{}", self.pod, self.query.name())
    }

    async fn acquire(self: Box<Self>) -> PrismResult<Merge<PodUsage>> {
        let options = RangeQueryOptions {
            start_ts: self.params.start_ts,
            end_ts: self.params.end_ts,
            step_secs: self.params.step_secs,
        };

        match self.query {
            MetricQuery::CpuRange => {
                let query =
                    queries::pod_cpu_usage(&self.namespace, &self.pod, self.params.window_secs);
                let matrix = self.querier.range_query(&query, options).await?;
                let samples: Vec<(i64, f64)> = aligned_first_series(&matrix, options)
                    .into_iter()
                    // CPU samples are rendered in millicores.
                    .map(|(ts, cores)| (ts, round2(cores * 1000.0)))
                    .collect();

                Ok(Box::new(move |usage: &mut PodUsage| {
                    usage.cpu_samples = samples;
                    Ok(())
                }))
            }
            MetricQuery::MemoryRange => {
                let query = queries::pod_memory_usage(&self.namespace, &self.pod);
                let matrix = self.querier.range_query(&query, options).await?;
                let samples: Vec<(i64, f64)> = aligned_first_series(&matrix, options)
                    .into_iter()
                    .map(|(ts, bytes)| (ts, round2(bytes)))
                    .collect();

                Ok(Box::new(move |usage: &mut PodUsage| {
                    usage.mem_samples = samples;
                    Ok(())
                }))
            }
            MetricQuery::CpuCurrent => {
                let query =
                    queries::pod_cpu_usage(&self.namespace, &self.pod, self.params.window_secs);
                let vector = self
                    .querier
                    .instant_query(&query, Utc::now().timestamp())
                    .await?;
                let current = vector.first().map(|instant| instant.sample.value);

                Ok(Box::new(move |usage: &mut PodUsage| {
                    usage.cpu_current = current;
                    Ok(())
                }))
            }
            MetricQuery::MemoryCurrent => {
                let query = queries::pod_memory_usage(&self.namespace, &self.pod);
                let vector = self
                    .querier
                    .instant_query(&query, Utc::now().timestamp())
                    .await?;
                let current = vector.first().map(|instant| round2(instant.sample.value));

                Ok(Box::new(move |usage: &mut PodUsage| {
                    usage.mem_current = current;
                    Ok(())
                }))
            }
        }
    }
}

/// Builds the nested batch of usage queries for one pod.
pub fn build_usage_tasks(
    namespace: &str,
    pod: &str,
    querier: Arc<dyn MetricsQuerier>,
    params: ResolvedParams,
) -> Vec<Box<dyn FetchTask<PodUsage>>> {
    [
        MetricQuery::CpuRange,
        MetricQuery::MemoryRange,
        MetricQuery::CpuCurrent,
        MetricQuery::MemoryCurrent,
    ]
    .into_iter()
    .map(|query| {
        Box::new(UsageQueryTask {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            query,
            querier: querier.clone(),
            params,
        }) as Box<dyn FetchTask<PodUsage>>
    })
    .collect()
}

/// Gathers one pod's usage and merges it into its response slot.
///
/// The acquire phase runs a nested batch over the pod's four usage queries.
/// The nested batch holds its own deadline rather than debiting the outer
/// batch's remaining budget.
pub struct PodMetricsTask {
    pub namespace: String,
    pub pod: String,
    /// Index of this pod's entry in the response array. No other task in
    /// the batch may write it.
    pub slot: usize,
    pub querier: Arc<dyn MetricsQuerier>,
    pub params: ResolvedParams,
    pub query_timeout: Duration,
}

#[async_trait]
impl FetchTask<Vec<PodMetrics>> for PodMetricsTask {
    fn key(&self) -> String {
        self.pod.clone()
    }

    async fn acquire(self: Box<Self>) -> PrismResult<Merge<Vec<PodMetrics>>> {
        let mut usage = PodUsage::default();
        let tasks = build_usage_tasks(&self.namespace, &self.pod, self.querier.clone(), self.params);
        run(self.query_timeout, tasks, &mut usage).await?;

        let slot = self.slot;
        Ok(Box::new(move |sink: &mut Vec<PodMetrics>| {
            apply_usage(&mut sink[slot], usage);
            Ok(())
        }))
    }
}

/// Writes gathered usage into a pod's response entry.
pub fn apply_usage(entry: &mut PodMetrics, usage: PodUsage) {
    entry.cpu_usage.samples = usage.cpu_samples;
    entry.cpu_usage.current = cpu_measurement(usage.cpu_current.unwrap_or_default());
    entry.mem_usage.samples = usage.mem_samples;
    entry.mem_usage.current = usage.mem_current.unwrap_or_default();
}

/// Rounds half up to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Renders a CPU reading with a human-oriented unit: whole cores when at
/// least one core is used, millicores otherwise.
pub fn cpu_measurement(cores: f64) -> CpuMeasurement {
    if cores == 0.0 {
        return CpuMeasurement {
            value: 0.0,
            unit: CPU_UNIT_CORE.to_string(),
        };
    }

    if cores >= 1.0 {
        CpuMeasurement {
            value: round2(cores),
            unit: CPU_UNIT_CORE.to_string(),
        }
    } else {
        CpuMeasurement {
            value: round2(cores * 1000.0),
            unit: CPU_UNIT_MILLICORE.to_string(),
        }
    }
}
