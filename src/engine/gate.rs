//! One-time engine initialization shared by concurrent callers.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio::task::JoinError;
use tracing::info;

use super::HazardEvaluator;
use crate::config::Config;

/// Initialization barrier in front of the engine.
///
/// The first caller of [`EngineGate::engine`] loads and indexes every layer
/// on the blocking pool; callers arriving meanwhile wait for that same load
/// and only ever see the finished engine. After that, access is a plain
/// read with no lock held per query.
pub struct EngineGate {
    config: Config,
    cell: OnceCell<Arc<HazardEvaluator>>,
}

impl EngineGate {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Gate around an engine that is already built
    pub fn ready(config: Config, engine: HazardEvaluator) -> Self {
        Self {
            config,
            cell: OnceCell::new_with(Some(Arc::new(engine))),
        }
    }

    /// Get the engine, initializing it on first use.
    ///
    /// Fails only if the loading task panicked; a later call retries.
    pub async fn engine(&self) -> Result<Arc<HazardEvaluator>, JoinError> {
        self.cell
            .get_or_try_init(|| async {
                let config = self.config.clone();
                let engine =
                    tokio::task::spawn_blocking(move || HazardEvaluator::from_config(&config))
                        .await?;
                info!("Engine initialization complete");
                Ok::<_, JoinError>(Arc::new(engine))
            })
            .await
            .map(Arc::clone)
    }

    /// The engine if initialization already finished
    pub fn get(&self) -> Option<Arc<HazardEvaluator>> {
        self.cell.get().map(Arc::clone)
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataConfig;
    use crate::models::{CollectionKind, FeatureCollection};

    fn missing_data_config() -> Config {
        Config {
            data: DataConfig::in_dir("/nonexistent/vigia-data"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_engine() {
        let gate = Arc::new(EngineGate::new(missing_data_config()));
        assert!(!gate.is_ready());
        assert!(gate.get().is_none());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.engine().await.unwrap() })
            })
            .collect();

        let mut engines = Vec::new();
        for handle in handles {
            engines.push(handle.await.unwrap());
        }

        assert!(gate.is_ready());
        for engine in &engines {
            assert!(Arc::ptr_eq(engine, &engines[0]));
        }
        // Missing files degrade to empty layers
        assert!(engines[0].routes().is_empty());
    }

    #[tokio::test]
    async fn test_ready_gate() {
        let engine = HazardEvaluator::with_defaults(
            FeatureCollection::empty(CollectionKind::HazardZones),
            FeatureCollection::empty(CollectionKind::Routes),
            FeatureCollection::empty(CollectionKind::MeetingPoints),
        );
        let gate = EngineGate::ready(Config::default(), engine);

        assert!(gate.is_ready());
        let first = gate.get().unwrap();
        let second = gate.engine().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
