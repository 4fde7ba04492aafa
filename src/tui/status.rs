use parking_lot::RwLock;
use std::sync::Arc;

/// Shared text of the status footer.
///
/// Cheap to clone; hand a clone to worker threads that want to report
/// progress. The text is markup, see [`crate::tui::markup`].
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    text: Arc<RwLock<String>>,
}

impl StatusHandle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(RwLock::new(text.into())),
        }
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }

    pub fn get(&self) -> String {
        self.text.read().clone()
    }
}
