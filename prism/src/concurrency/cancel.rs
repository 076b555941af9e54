use tokio::sync::watch;

/// Sender half of a batch cancellation signal.
///
/// One sender exists per batch; every spawned acquire subscribes and races
/// its work against the signal. Cancellation fires at most once, when the
/// batch's outcome is decided with acquires still in flight.
#[derive(Debug, Clone)]
pub struct CancelTx(watch::Sender<()>);

impl CancelTx {
    pub fn cancel(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    pub fn subscribe(&self) -> CancelRx {
        self.0.subscribe()
    }
}

/// Receiver half of a batch cancellation signal. Resolves via `changed()`
/// once the batch is canceled.
pub type CancelRx = watch::Receiver<()>;

pub fn create_cancel_channel() -> (CancelTx, CancelRx) {
    let (tx, rx) = watch::channel(());
    (CancelTx(tx), rx)
}
