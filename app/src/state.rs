use crate::config::AppConfig;
use std::sync::Arc;
use streamsql::kafka::Kafka;

pub struct AppState {
    pub kafka: Arc<Kafka>,
    pub app_config: AppConfig,
}

impl AppState {
    pub fn new(app_config: AppConfig) -> Self {
        AppState {
            kafka: Arc::new(Kafka::new(&app_config.kafka)),
            app_config,
        }
    }
}
