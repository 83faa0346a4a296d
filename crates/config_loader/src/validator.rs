//! 配置校验模块
//!
//! 校验规则：
//! - pattern 非空且可编译
//! - 静态变量不得占用每包变量名 (count / pts / streamIndex)
//! - 静态变量值不得为 null (渲染为空字符串)
//! - stats.interval_ms > 0

use contracts::{ContractError, DumperConfig};

/// 校验 DumperConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DumperConfig) -> Result<(), ContractError> {
    validate_pattern(config)?;
    validate_data_keys(config)?;
    validate_stats(config)?;
    Ok(())
}

/// 校验命名模板
fn validate_pattern(config: &DumperConfig) -> Result<(), ContractError> {
    let pattern = &config.node.pattern;
    if pattern.trim().is_empty() {
        return Err(ContractError::config_validation(
            "node.pattern",
            "pattern must not be empty",
        ));
    }

    naming::NamingTemplate::compile(pattern).map_err(|e| {
        ContractError::config_validation("node.pattern", e.to_string())
    })?;
    Ok(())
}

/// 校验静态变量名
fn validate_data_keys(config: &DumperConfig) -> Result<(), ContractError> {
    for (key, value) in &config.node.data {
        if naming::is_reserved(key) {
            return Err(ContractError::config_validation(
                format!("node.data.{key}"),
                format!("'{key}' is set per packet and cannot be a static variable"),
            ));
        }
        if value.is_null() {
            return Err(ContractError::config_validation(
                format!("node.data.{key}"),
                "static variable must not be null",
            ));
        }
    }
    Ok(())
}

/// 校验统计配置
fn validate_stats(config: &DumperConfig) -> Result<(), ContractError> {
    if config.stats.enabled && config.stats.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "stats.interval_ms",
            "interval_ms must be > 0 when stats are enabled",
        ));
    }
    Ok(())
}
