use crate::config::settings::AppConfig;
use crate::modules::jobs::dispatcher::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: AppConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }
}
