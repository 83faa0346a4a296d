//! Dumper 指标收集模块
//!
//! 记录 Prometheus 指标，并在内存中聚合统计采样。

use std::collections::BTreeMap;

use metrics::{counter, gauge};

use crate::stats::StatSample;

/// 记录节点收到的数据包
pub fn record_packet_received(node: &str) {
    counter!("pkt_dumper_packets_received_total", "node" => node.to_string()).increment(1);
}

/// 记录 dump 结果
pub fn record_packet_dumped(node: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "pkt_dumper_packets_dumped_total",
        "node" => node.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录命名模板渲染失败
pub fn record_render_failure(node: &str) {
    counter!("pkt_dumper_render_failures_total", "node" => node.to_string()).increment(1);
}

/// 记录队列停止后被丢弃的数据包
pub fn record_packet_discarded(node: &str, count: u64) {
    if count > 0 {
        counter!("pkt_dumper_packets_discarded_total", "node" => node.to_string())
            .increment(count);
    }
}

/// 发布一次统计采样
pub fn record_stat_sample(sample: &StatSample) {
    gauge!(
        "pkt_dumper_stat",
        "stat" => sample.metadata.name.clone(),
        "unit" => sample.metadata.unit.clone()
    )
    .set(sample.value);
}

/// 统计采样聚合器
///
/// 按统计项名称累计每次采样，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    stats: BTreeMap<String, (String, RunningStats)>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计一批采样
    pub fn update(&mut self, samples: &[StatSample]) {
        for sample in samples {
            self.stats
                .entry(sample.metadata.name.clone())
                .or_insert_with(|| (sample.metadata.unit.clone(), RunningStats::default()))
                .1
                .push(sample.value);
        }
    }

    /// 指定统计项的聚合结果
    pub fn get(&self, name: &str) -> Option<StatsSummary> {
        self.stats
            .get(name)
            .map(|(unit, stats)| StatsSummary::from_running(unit, stats))
    }

    /// 所有统计项的聚合结果 (按名称排序)
    pub fn summary(&self) -> Vec<(String, StatsSummary)> {
        self.stats
            .iter()
            .map(|(name, (unit, stats))| (name.clone(), StatsSummary::from_running(unit, stats)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub unit: String,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl StatsSummary {
    fn from_running(unit: &str, stats: &RunningStats) -> Self {
        Self {
            unit: unit.to_string(),
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.2}{unit}, max={:.2}{unit}, mean={:.2}{unit}, std={:.2} (n={})",
            self.min,
            self.max,
            self.mean,
            self.std_dev,
            self.count,
            unit = self.unit
        )
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatMetadata;

    fn sample(name: &str, value: f64) -> StatSample {
        StatSample {
            metadata: StatMetadata::new(name, name, "%"),
            value,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_groups_by_name() {
        let mut aggregator = StatsAggregator::new();
        aggregator.update(&[sample("a.work_ratio", 10.0), sample("a.rate", 4.0)]);
        aggregator.update(&[sample("a.work_ratio", 30.0)]);

        let ratio = aggregator.get("a.work_ratio").unwrap();
        assert_eq!(ratio.count, 2);
        assert!((ratio.mean - 20.0).abs() < 1e-10);
        assert_eq!(aggregator.summary().len(), 2);
        assert!(aggregator.get("missing").is_none());
    }

    #[test]
    fn test_summary_display() {
        let summary = StatsSummary {
            unit: "%".into(),
            count: 4,
            min: 1.0,
            max: 9.0,
            mean: 5.0,
            std_dev: 2.0,
        };
        let output = summary.to_string();
        assert!(output.contains("mean=5.00%"), "got: {output}");
        assert_eq!(StatsSummary::default().to_string(), "N/A");
    }
}
