//! Application lifecycle: load the dataset, run a dashboard pass, write the view.

use crate::error::CliResult;
use baitscope_config::{Config, ConfigCache, DataLayout};
use baitscope_pipeline::{
    policy_from_settings, ArticleLayout, CountLayout, CountRecord, CsvSource, Dashboard,
    DashboardRequest, DashboardView, DatasetCache, Measured, Palette, QueryCache, Record, RowLayout,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Loaded configuration plus the caches shared by every pass.
pub struct App {
    config: ConfigCache,
    articles: DatasetCache<Record>,
    counts: DatasetCache<CountRecord>,
    queries: Option<Arc<QueryCache>>,
}

impl App {
    /// Application over `config`, with caches sized by its cache settings.
    pub fn new(config: Config) -> Self {
        let settings = &config.cache;
        let queries = settings
            .enabled
            .then(|| Arc::new(QueryCache::from_settings(settings)));

        Self {
            articles: DatasetCache::new(settings.max_capacity).with_policy(policy_from_settings(settings)),
            counts: DatasetCache::new(settings.max_capacity).with_policy(policy_from_settings(settings)),
            queries,
            config: ConfigCache::new(config),
        }
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Swaps in a new configuration for later passes. Invalid configurations are rejected.
    pub fn update_config(&self, config: Config) -> CliResult<()> {
        let previous = self.config.get();
        self.config.update(config)?;
        if previous.data.path != self.config.get().data.path {
            self.articles.invalidate_path(&previous.data.path);
            self.counts.invalidate_path(&previous.data.path);
        }
        Ok(())
    }

    /// Dataset cache for the article layout.
    pub const fn articles(&self) -> &DatasetCache<Record> {
        &self.articles
    }

    /// Shared aggregation cache, `None` when caching is disabled.
    pub fn queries(&self) -> Option<&QueryCache> {
        self.queries.as_deref()
    }

    /// Runs one dashboard pass over the configured data file.
    #[instrument(skip(self))]
    pub fn run(&self) -> CliResult<DashboardView> {
        let config = self.config.get();
        let source = CsvSource::from_config(&config.data)?;

        match config.data.layout {
            DataLayout::Articles => self.run_layout::<ArticleLayout>(&config, &source, &self.articles),
            DataLayout::Counts => self.run_layout::<CountLayout>(&config, &source, &self.counts),
        }
    }

    fn run_layout<L>(
        &self,
        config: &Config,
        source: &CsvSource,
        datasets: &DatasetCache<L::Row>,
    ) -> CliResult<DashboardView>
    where
        L: RowLayout,
        L::Row: Measured + Clone + Send + Sync + 'static,
    {
        let dataset = datasets.load_csv::<L>(source, config.data.layout)?;

        let mut dashboard = Dashboard::new(dataset, Palette::from_config(&config.palette));
        if let Some(queries) = &self.queries {
            dashboard = dashboard.with_cache(Arc::clone(queries));
        }

        let view = dashboard.run(&DashboardRequest::from_config(config))?;
        info!("Built {} charts over {} articles", view.charts.len(), view.article_count);
        Ok(view)
    }
}

/// Writes `view` as JSON to `output`, or to stdout when no path is given.
pub fn write_view(view: &DashboardView, output: Option<&Path>, pretty: bool) -> CliResult<()> {
    let json = view.to_json(pretty)?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")?;
            info!("Wrote dashboard view to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
