//! DumperConfig - Config Loader 输出
//!
//! 描述一个 dumper 节点：命名模板、静态变量、dump 策略、统计上报。

use serde::{Deserialize, Serialize};

use crate::NamingData;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 dumper 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumperConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 节点设置
    pub node: NodeConfig,

    /// Dump 策略
    #[serde(default)]
    pub dump: DumpConfig,

    /// 统计上报
    #[serde(default)]
    pub stats: StatsConfig,
}

/// 节点配置：命名模板与静态变量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// 目标命名模板 (e.g., "/out/pkt-{{count}}-{{streamIndex}}.raw")
    pub pattern: String,

    /// 用户静态变量，对节点生命周期保持不变
    #[serde(default)]
    pub data: NamingData,
}

/// Dump 策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpKind {
    /// 将载荷写入渲染出的文件路径
    #[default]
    File,
    /// 仅记录日志
    Log,
}

/// Dump 策略配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpConfig {
    /// 策略类型
    #[serde(default)]
    pub strategy: DumpKind,

    /// 是否自动创建缺失的父目录 (仅 file 策略)
    #[serde(default)]
    pub create_dirs: bool,
}

/// 统计上报配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// 是否启用周期采样
    #[serde(default = "default_stats_enabled")]
    pub enabled: bool,

    /// 采样周期 (毫秒)
    #[serde(default = "default_stats_interval_ms")]
    pub interval_ms: u64,
}

fn default_stats_enabled() -> bool {
    true
}

fn default_stats_interval_ms() -> u64 {
    1000
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: default_stats_enabled(),
            interval_ms: default_stats_interval_ms(),
        }
    }
}
