//! telemetry - 可观测性库

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读,开发环境
    Pretty,
    /// JSON 行,生产环境供日志采集
    Json,
}

/// 初始化 tracing
///
/// `RUST_LOG` 环境变量优先于配置文件中的 log_level。
pub fn init_tracing(log_level: &str) {
    init_with_format(log_level, LogFormat::Pretty);
}

/// 初始化 JSON 格式的 tracing
pub fn init_tracing_json(log_level: &str) {
    init_with_format(log_level, LogFormat::Json);
}

fn init_with_format(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// 初始化 Prometheus metrics
///
/// 返回的 handle 持有指标快照,调用方负责暴露或打印。
pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// 启动期健康检查汇总
///
/// 逐项登记检查结果,任何一项失败则整体不健康。
#[derive(Debug, Clone, Default)]
pub struct HealthStatus {
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check(&mut self, name: impl Into<String>, healthy: bool, message: Option<String>) {
        self.checks.push(HealthCheck {
            name: name.into(),
            healthy,
            message,
        });
    }

    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.healthy)
    }

    /// 失败项的名称,用于日志
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.healthy)
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_degrades_on_failed_check() {
        let mut status = HealthStatus::new();
        status.add_check("database", true, None);
        assert!(status.healthy());

        status.add_check("migrations", false, Some("pending".to_string()));
        assert!(!status.healthy());
        assert_eq!(status.failed_checks(), vec!["migrations"]);
    }

    #[test]
    fn test_empty_health_status_is_healthy() {
        assert!(HealthStatus::new().healthy());
    }
}
