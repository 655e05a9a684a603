//! One-shot notification channel between a waiting participant and the
//! engine call that ends its wait.

use tokio::sync::oneshot;
use types::errors::EngineError;
use types::pairing::PairingResult;

/// Create a fresh channel for one wait
pub fn channel() -> (Notifier, Subscription) {
    let (tx, rx) = oneshot::channel();
    (Notifier(tx), Subscription(rx))
}

/// Sending half, owned by the pool entry while the participant waits
#[derive(Debug)]
pub struct Notifier(oneshot::Sender<PairingResult>);

impl Notifier {
    /// Deliver the result, consuming the notifier.
    ///
    /// Returns the result back if the waiting side has abandoned the wait.
    pub fn deliver(self, result: PairingResult) -> Result<(), PairingResult> {
        self.0.send(result)
    }
}

/// Receiving half, held by the suspended caller
#[derive(Debug)]
pub struct Subscription(oneshot::Receiver<PairingResult>);

impl Subscription {
    /// Wait for the result without polling
    pub async fn recv(&mut self) -> Result<PairingResult, EngineError> {
        (&mut self.0).await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Close the channel so no later delivery can succeed.
    ///
    /// Returns a result that was delivered before the close, if any.
    pub fn abandon(&mut self) -> Option<PairingResult> {
        self.0.close();
        self.0.try_recv().ok()
    }
}
