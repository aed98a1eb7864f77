//! Adaptive dispatch: choose a strategy, run it, fall back once.

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::extraction;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::monitor::{decide_strategy, ResourceSample, ResourceSampler, SystemSampler};
use crate::normalize::normalize;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::{NoopRenderer, PageRenderer};
use crate::types::{NormalizedRecord, RawRecord, Strategy};
use std::sync::Arc;
use std::time::Instant;

/// Runs the whole pipeline for one URL at a time; safe to share between
/// concurrent requests (no mutable state).
pub struct Extractor {
    config: ExtractorConfig,
    sampler: Arc<dyn ResourceSampler>,
    renderer: Arc<dyn PageRenderer>,
    fetcher: Arc<dyn PageFetcher>,
}

impl Extractor {
    /// Extractor backed by `sysinfo`, Chromium, and `reqwest`. With light
    /// mode forced no browser is ever configured.
    pub fn new(config: ExtractorConfig) -> Self {
        let renderer: Arc<dyn PageRenderer> =
            if config.overrides.forced() == Some(Strategy::Light) {
                Arc::new(NoopRenderer)
            } else {
                Arc::new(ChromiumRenderer::new(config.browser.clone()))
            };
        Self::with_parts(config, Arc::new(SystemSampler), renderer, Arc::new(HttpFetcher::new()))
    }

    pub fn with_parts(
        config: ExtractorConfig,
        sampler: Arc<dyn ResourceSampler>,
        renderer: Arc<dyn PageRenderer>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            config,
            sampler,
            renderer,
            fetcher,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn sample_resources(&self) -> anyhow::Result<ResourceSample> {
        self.sampler.sample().await
    }

    /// Strategy for the next request. Overrides skip sampling entirely.
    pub async fn choose_strategy(&self) -> Strategy {
        if let Some(forced) = self.config.overrides.forced() {
            tracing::info!("{forced} strategy forced by configuration");
            return forced;
        }
        let sample = match self.sampler.sample().await {
            Ok(sample) => {
                tracing::info!(
                    "resource check: memory {:.1}MB, cpu {:.1}%, container {}",
                    sample.available_memory_mb,
                    sample.cpu_percent,
                    sample.in_container
                );
                Some(sample)
            }
            Err(e) => {
                tracing::warn!("error checking resources: {e:#}; defaulting to light strategy");
                None
            }
        };
        let strategy = decide_strategy(sample.as_ref(), self.config.overrides);
        tracing::info!("using {strategy} strategy based on resources");
        strategy
    }

    /// Fetch and extract `url`, falling back from heavy to light once.
    pub async fn resolve(&self, url: &str) -> ExtractResult<RawRecord> {
        let strategy = self.choose_strategy().await;

        if strategy == Strategy::Heavy {
            match self.run(Strategy::Heavy, url).await {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    tracing::warn!("heavy extraction failed: {e}; falling back to light strategy")
                }
            }
        }

        self.run(Strategy::Light, url)
            .await
            .map_err(|e| ExtractError::exhausted(Strategy::Light, e))
    }

    /// The core operation: URL in, normalized record out.
    pub async fn extract(&self, url: &str) -> ExtractResult<NormalizedRecord> {
        let raw = self.resolve(url).await?;
        Ok(normalize(&raw))
    }

    async fn run(&self, strategy: Strategy, url: &str) -> ExtractResult<RawRecord> {
        let start = Instant::now();
        tracing::info!("starting {strategy} extraction for {url}");

        let snapshot = match strategy {
            Strategy::Heavy => self.renderer.render(url, self.config.render_timeout).await?,
            Strategy::Light => self.fetcher.fetch(url, self.config.fetch_timeout).await?,
        };
        let raw = extraction::extract(&snapshot.parse(), self.config.limits_for(strategy));

        tracing::info!(
            "{strategy} extraction completed in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
        Ok(raw)
    }
}
