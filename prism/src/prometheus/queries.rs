//! PromQL builders for the pod-level usage queries served by the API.
//!
//! Container-level cadvisor series are summed per pod, excluding the pause
//! container and container-less (pod-level) series.

/// CPU usage of a pod in cores, averaged over `window_secs`.
pub fn pod_cpu_usage(namespace: &str, pod: &str, window_secs: i64) -> String {
    format!(
        "sum(rate(container_cpu_usage_seconds_total{{namespace=\"{namespace}\",pod=\"{pod}\",container!=\"\",container!=\"POD\"}}[{window_secs}s]))"
    )
}

/// Working-set memory of a pod in bytes.
pub fn pod_memory_usage(namespace: &str, pod: &str) -> String {
    format!(
        "sum(container_memory_working_set_bytes{{namespace=\"{namespace}\",pod=\"{pod}\",container!=\"\",container!=\"POD\"}})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_query_targets_the_pod() {
        let query = pod_cpu_usage("mesh", "web-0", 180);
        assert_eq!(
            query,
            "sum(rate(container_cpu_usage_seconds_total{namespace=\"mesh\",pod=\"web-0\",container!=\"\",container!=\"POD\"}[180s]))"
        );
    }

    #[test]
    fn memory_query_targets_the_pod() {
        let query = pod_memory_usage("mesh", "web-0");
        assert!(query.contains("container_memory_working_set_bytes"));
        assert!(query.contains("pod=\"web-0\""));
    }
}
