use tokio::sync::broadcast::{self, error::RecvError};

/// Cancels an in-flight turn. Cloning shares the same turn.
#[derive(Debug, Clone)]
pub struct TurnCancelHandle {
    sender: broadcast::Sender<()>,
}

impl TurnCancelHandle {
    pub fn new() -> (Self, TurnCancelReceiver) {
        let (sender, receiver) = broadcast::channel(1);
        (Self { sender }, TurnCancelReceiver { receiver })
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(());
    }
}

#[derive(Debug)]
pub struct TurnCancelReceiver {
    receiver: broadcast::Receiver<()>,
}

impl TurnCancelReceiver {
    /// Resolves once `cancel` is called. If every handle is dropped without
    /// cancelling, never resolves.
    pub async fn cancelled(&mut self) {
        match self.receiver.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
