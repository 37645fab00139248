use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::catalog::TopicCatalog;
use crate::services::PracticeService;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    practice: Arc<PracticeService>,
}

impl AppState {
    pub fn new(practice: Arc<PracticeService>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            practice,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    pub fn catalog(&self) -> &TopicCatalog {
        self.practice.catalog()
    }
}
