//! Process-wide shutdown fan-out: signal handlers send, the runner listens and
//! cancels the active run.
use tokio::sync::broadcast;

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;
