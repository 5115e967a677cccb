use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Collapses rapid values into the last one, emitted after a quiet period.
///
/// The timer lives in a task owned by this handle; dropping the handle aborts
/// it and any pending value is discarded.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, input_rx, output));
        (Self { input, task }, output_rx)
    }

    pub fn push(&self, value: T) {
        // Only fails once the task is gone, in which case nobody listens.
        let _ = self.input.send(value);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
) {
    while let Some(mut value) = input.recv().await {
        loop {
            match tokio::time::timeout(delay, input.recv()).await {
                Ok(Some(next)) => value = next,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        debug!("Input settled after {:?}", delay);
        if output.send(value).is_err() {
            return;
        }
    }
}
