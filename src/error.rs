use thiserror::Error;

/// Terminal failures of the controller and its process.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable kubeconfig or in-cluster configuration was found.
    #[error("failed to create kubernetes client: {0}")]
    Client(#[source] kube_client::Error),
    /// The change feed ended although nobody asked the controller to stop.
    #[error("change feed closed before the controller was stopped")]
    FeedClosed,
    /// Installing a shutdown signal handler failed.
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
    /// The controller task panicked or was aborted.
    #[error("controller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
