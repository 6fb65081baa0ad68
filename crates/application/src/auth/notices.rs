//! Pending user notices.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokenwarden_domain::Notice;

/// Queue of notices waiting to be shown.
///
/// The UI (or the CLI) drains it; logout clears it.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a notice.
    pub async fn push(&self, notice: Notice) {
        self.notices.lock().await.push(notice);
    }

    /// Removes and returns every pending notice, oldest first.
    pub async fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().await)
    }

    /// Copy of the pending notices.
    pub async fn pending(&self) -> Vec<Notice> {
        self.notices.lock().await.clone()
    }

    /// Drops every pending notice.
    pub async fn clear(&self) {
        self.notices.lock().await.clear();
    }

    /// Number of pending notices.
    pub async fn len(&self) -> usize {
        self.notices.lock().await.len()
    }

    /// True when nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.notices.lock().await.is_empty()
    }
}
