// ChannelUiQueue - hands work from host signal threads to the UI thread
//
// Signal handlers run on output threads and must neither block nor touch UI
// state. They push boxed closures into a bounded channel; whoever owns the UI
// thread drains it, either by calling `run_pending()` from its own loop or by
// letting `spawn_ui_thread()` run a dedicated consumer thread.

use super::{UiQueue, UiTask};
use std::thread::JoinHandle;
use tokio::sync::mpsc;

/// Bounded to 100 tasks to prevent unbounded memory growth if the UI stalls
pub const UI_QUEUE_CAPACITY: usize = 100;

/// Sending half, cloneable and shareable across signal threads
#[derive(Clone)]
pub struct ChannelUiQueue {
    ui_task_tx: mpsc::Sender<UiTask>,
}

/// Receiving half, owned by the UI thread
pub struct UiTaskReceiver {
    ui_task_rx: mpsc::Receiver<UiTask>,
}

impl ChannelUiQueue {
    /// Create a queue and its receiving half
    pub fn new() -> (Self, UiTaskReceiver) {
        let (ui_task_tx, ui_task_rx) = mpsc::channel::<UiTask>(UI_QUEUE_CAPACITY);
        (Self { ui_task_tx }, UiTaskReceiver { ui_task_rx })
    }
}

impl UiQueue for ChannelUiQueue {
    fn queue(&self, task: UiTask) {
        match self.ui_task_tx.try_send(task) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("UI task queue full - dropping task to prevent backpressure");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to queue UI task - UI thread has stopped");
            }
        }
    }
}

impl UiTaskReceiver {
    /// Run every task queued so far on the calling thread.
    ///
    /// # Returns
    /// The number of tasks executed
    pub fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.ui_task_rx.try_recv() {
            task();
            executed += 1;
        }
        executed
    }

    /// Consume tasks on a dedicated thread until every sender is dropped.
    ///
    /// Must not be called from inside a tokio runtime thread.
    pub fn spawn_ui_thread(mut self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("record-rename-ui".to_string())
            .spawn(move || {
                tracing::debug!("UI task thread started");

                while let Some(task) = self.ui_task_rx.blocking_recv() {
                    task();
                }

                tracing::debug!("UI task thread stopped - all senders dropped");
            })
    }
}
