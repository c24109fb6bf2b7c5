use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateConfig {
    /// Upper bound on how long one handler may take to resolve its
    /// continuation. `None` waits indefinitely.
    pub handler_timeout: Option<Duration>,
    /// Status the process exits with once both phases succeed.
    pub exit_code: i32,
}

impl GateConfig {
    /// Builds a config from a millisecond timeout, where 0 disables it.
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            handler_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.handler_timeout, None);
        assert_eq!(config.exit_code, 0);
    }

    #[test]
    fn test_zero_timeout_disables() {
        assert_eq!(GateConfig::with_timeout_ms(0).handler_timeout, None);
        assert_eq!(
            GateConfig::with_timeout_ms(1500).handler_timeout,
            Some(Duration::from_millis(1500))
        );
    }
}
