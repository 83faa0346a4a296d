//! 节点统计
//!
//! 节点在构造时向 [`Stater`] 注册统计项；节点只负责计数与计时，
//! 采样、聚合与展示由外部 (如 [`crate::StatsReporter`]) 完成。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// 统计项描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatMetadata {
    /// 唯一名称 (e.g., "pkt_dumper_1.work_ratio")
    pub name: String,
    /// 展示标签
    pub label: String,
    /// 描述
    pub description: String,
    /// 单位
    pub unit: String,
}

impl StatMetadata {
    pub fn new(name: impl Into<String>, label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
            unit: unit.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// 可采样的统计项
pub trait Stat: Send + Sync {
    /// 返回自上次采样以来的值，并开始新的采样窗口
    fn sample(&self) -> f64;
}

/// 速率统计 (事件/秒)
#[derive(Debug)]
pub struct IncrementStat {
    count: AtomicU64,
    window_start: Mutex<Instant>,
}

impl IncrementStat {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// 增加计数
    pub fn add(&self, delta: u64) {
        self.count.fetch_add(delta, Ordering::Relaxed);
    }

    fn sample_at(&self, now: Instant) -> f64 {
        let mut window_start = self.window_start.lock();
        let elapsed = now.saturating_duration_since(*window_start);
        *window_start = now;
        let count = self.count.swap(0, Ordering::Relaxed);

        if elapsed.is_zero() {
            return 0.0;
        }
        count as f64 / elapsed.as_secs_f64()
    }
}

impl Default for IncrementStat {
    fn default() -> Self {
        Self::new()
    }
}

impl Stat for IncrementStat {
    fn sample(&self) -> f64 {
        self.sample_at(Instant::now())
    }
}

/// 工作时间占比统计 (百分比)
///
/// `begin()` / `done()` 括起一段工作；采样时返回窗口内处于工作段的时间比例。
/// 采样时仍未结束的工作段按截至采样时刻计入，剩余部分计入下一个窗口。
#[derive(Debug)]
pub struct DurationRatioStat {
    inner: Mutex<RatioWindow>,
}

#[derive(Debug)]
struct RatioWindow {
    window_start: Instant,
    busy: Duration,
    open_since: Option<Instant>,
}

impl DurationRatioStat {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RatioWindow {
                window_start: Instant::now(),
                busy: Duration::ZERO,
                open_since: None,
            }),
        }
    }

    /// 开始一段工作
    pub fn begin(&self) {
        self.begin_at(Instant::now());
    }

    /// 结束当前工作段
    pub fn done(&self) {
        self.done_at(Instant::now());
    }

    fn begin_at(&self, now: Instant) {
        let mut inner = self.inner.lock();
        if inner.open_since.is_none() {
            inner.open_since = Some(now);
        }
    }

    fn done_at(&self, now: Instant) {
        let mut inner = self.inner.lock();
        if let Some(since) = inner.open_since.take() {
            // A bracket may have opened before the current window began.
            let from = since.max(inner.window_start);
            inner.busy += now.saturating_duration_since(from);
        }
    }

    fn sample_at(&self, now: Instant) -> f64 {
        let mut inner = self.inner.lock();
        let mut busy = inner.busy;
        if let Some(since) = inner.open_since {
            busy += now.saturating_duration_since(since.max(inner.window_start));
        }
        let elapsed = now.saturating_duration_since(inner.window_start);

        inner.window_start = now;
        inner.busy = Duration::ZERO;

        if elapsed.is_zero() {
            return 0.0;
        }
        (busy.as_secs_f64() / elapsed.as_secs_f64() * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for DurationRatioStat {
    fn default() -> Self {
        Self::new()
    }
}

impl Stat for DurationRatioStat {
    fn sample(&self) -> f64 {
        self.sample_at(Instant::now())
    }
}

/// 瞬时值统计，由闭包读取当前值
pub struct GaugeStat {
    read: Box<dyn Fn() -> f64 + Send + Sync>,
}

impl GaugeStat {
    pub fn new(read: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self {
            read: Box::new(read),
        }
    }
}

impl Stat for GaugeStat {
    fn sample(&self) -> f64 {
        (self.read)()
    }
}

impl std::fmt::Debug for GaugeStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeStat").finish_non_exhaustive()
    }
}

/// 一次采样结果
#[derive(Debug, Clone)]
pub struct StatSample {
    pub metadata: StatMetadata,
    pub value: f64,
}

/// 统计注册表
///
/// 线程安全；节点构造时注册，上报任务周期采样。
#[derive(Default)]
pub struct Stater {
    stats: Mutex<Vec<(StatMetadata, Arc<dyn Stat>)>>,
}

impl Stater {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册统计项
    pub fn add_stat(&self, metadata: StatMetadata, stat: Arc<dyn Stat>) {
        tracing::debug!(stat = %metadata.name, unit = %metadata.unit, "stat registered");
        self.stats.lock().push((metadata, stat));
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.stats.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 已注册的统计项描述
    pub fn metadata(&self) -> Vec<StatMetadata> {
        self.stats.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// 采样所有统计项
    pub fn sample_all(&self) -> Vec<StatSample> {
        self.stats
            .lock()
            .iter()
            .map(|(metadata, stat)| StatSample {
                metadata: metadata.clone(),
                value: stat.sample(),
            })
            .collect()
    }
}

impl std::fmt::Debug for Stater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stater").field("stats", &self.len()).finish()
    }
}
