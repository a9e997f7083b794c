use tokio::sync::watch;

/// Run-wide stop flag. Raised at most once, never cleared.
#[derive(Debug)]
pub(crate) struct StopSignal {
    tx: watch::Sender<bool>,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Returns `true` only for the call that actually raised the flag.
    pub(crate) fn raise(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub(crate) fn listener(&self) -> StopListener {
        StopListener {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct StopListener {
    rx: watch::Receiver<bool>,
}

impl StopListener {
    pub(crate) fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised (or its owner is gone).
    pub(crate) async fn stopped(&mut self) {
        drop(self.rx.wait_for(|stopped| *stopped).await);
    }
}
