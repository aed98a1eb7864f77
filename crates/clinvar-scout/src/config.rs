//! Extractor configuration and environment resolution.

use crate::extraction::ExtractionLimits;
use crate::types::Strategy;
use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome user agent sent by both strategies.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

/// Explicit strategy overrides. `force_light` wins if both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyOverride {
    pub force_light: bool,
    pub force_heavy: bool,
}

impl StrategyOverride {
    /// `FORCE_LIGHTWEIGHT` and `FORCE_HEAVY`; `FORCE_PLAYWRIGHT` is an older
    /// name for the latter.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| lookup(name).is_some_and(|v| parse_flag(&v));
        Self {
            force_light: flag("FORCE_LIGHTWEIGHT"),
            force_heavy: flag("FORCE_HEAVY") || flag("FORCE_PLAYWRIGHT"),
        }
    }

    pub fn forced(&self) -> Option<Strategy> {
        if self.force_light {
            Some(Strategy::Light)
        } else if self.force_heavy {
            Some(Strategy::Heavy)
        } else {
            None
        }
    }
}

/// Launch options for the headless browser.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Explicit browser binary; discovered when `None`.
    pub chromium_path: Option<PathBuf>,
    pub launch_timeout: Duration,
    /// Bound on every individual CDP request.
    pub operation_timeout: Duration,
    pub window: (u32, u32),
    pub js_heap_mb: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chromium_path: None,
            launch_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(15),
            window: (800, 600),
            js_heap_mb: 128,
        }
    }
}

/// Everything the adaptive extractor needs to know.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub overrides: StrategyOverride,
    pub browser: BrowserOptions,
    /// Outer bound on navigation plus DOM load for the heavy path.
    pub render_timeout: Duration,
    pub fetch_timeout: Duration,
    pub heavy_limits: ExtractionLimits,
    pub light_limits: ExtractionLimits,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            overrides: StrategyOverride::default(),
            browser: BrowserOptions::default(),
            render_timeout: Duration::from_millis(20_000),
            fetch_timeout: Duration::from_millis(10_000),
            heavy_limits: ExtractionLimits::heavy(),
            light_limits: ExtractionLimits::unbounded(),
        }
    }
}

impl ExtractorConfig {
    /// Defaults overlaid with `FORCE_*` and `CLINVAR_SCOUT_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.overrides = StrategyOverride::from_lookup(|name| std::env::var(name).ok());

        if let Ok(path) = std::env::var("CLINVAR_SCOUT_CHROMIUM_PATH") {
            if !path.trim().is_empty() {
                config.browser.chromium_path = Some(PathBuf::from(path.trim()));
            }
        }
        if let Some(ms) = env_millis("CLINVAR_SCOUT_RENDER_TIMEOUT_MS") {
            config.render_timeout = ms;
        }
        if let Some(ms) = env_millis("CLINVAR_SCOUT_FETCH_TIMEOUT_MS") {
            config.fetch_timeout = ms;
        }
        config
    }

    pub fn limits_for(&self, strategy: Strategy) -> &ExtractionLimits {
        match strategy {
            Strategy::Heavy => &self.heavy_limits,
            Strategy::Light => &self.light_limits,
        }
    }
}

/// `true`, `1`, or `yes`, case-insensitive.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn env_millis(name: &str) -> Option<Duration> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            tracing::warn!("ignoring invalid {name}={raw:?}");
            None
        }
    }
}
