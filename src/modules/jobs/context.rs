use super::sink::UploadSink;
use crate::infrastructure::encoder::Encoder;
use crate::infrastructure::scratch::ScratchSpace;
use crate::infrastructure::storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration;

/// Upper bounds per step. `None` means wait for as long as it takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTimeouts {
    pub encode: Option<Duration>,
    pub upload: Option<Duration>,
}

/// Everything an executor needs, built once and handed to the dispatcher.
#[derive(Clone)]
pub struct JobContext {
    pub scratch: ScratchSpace,
    pub encoder: Arc<dyn Encoder>,
    pub sink: UploadSink,
    pub timeouts: StepTimeouts,
}

impl JobContext {
    pub fn new(
        scratch: ScratchSpace,
        encoder: Arc<dyn Encoder>,
        store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        Self {
            scratch,
            encoder,
            sink: UploadSink::new(store),
            timeouts: StepTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StepTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
