// ABOUTME: Page visibility and window focus signals shared by synchronizers
// ABOUTME: Synchronizers subscribe on start and drop their receivers on stop

use tokio::sync::{broadcast, watch};

const FOCUS_CHANNEL_CAPACITY: usize = 16;

/// Host-level activity signals: whether the page is visible, and focus events.
///
/// One instance is shared by every synchronizer of an application, the same way a
/// browser document is shared by every hook mounted on it.
#[derive(Debug)]
pub struct PageSignals {
    visibility: watch::Sender<bool>,
    focus: broadcast::Sender<()>,
}

impl Default for PageSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSignals {
    /// Signals for a page that starts out visible.
    pub fn new() -> Self {
        let (visibility, _) = watch::channel(true);
        let (focus, _) = broadcast::channel(FOCUS_CHANNEL_CAPACITY);
        Self { visibility, focus }
    }

    pub fn is_visible(&self) -> bool {
        *self.visibility.borrow()
    }

    /// Record a visibility change. Repeating the current value notifies nobody.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.send_if_modified(|current| {
            if *current == visible {
                false
            } else {
                *current = visible;
                true
            }
        });
    }

    /// Announce that the window regained focus.
    pub fn focus(&self) {
        // No listeners is fine
        let _ = self.focus.send(());
    }

    /// Number of synchronizers currently listening for focus events.
    pub fn listener_count(&self) -> usize {
        self.focus.receiver_count()
    }

    pub(crate) fn subscribe_visibility(&self) -> watch::Receiver<bool> {
        self.visibility.subscribe()
    }

    pub(crate) fn subscribe_focus(&self) -> broadcast::Receiver<()> {
        self.focus.subscribe()
    }
}
