use kube_client::Client;
use kube_job_watcher::{Controller, Error};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let client = Client::try_default().await.map_err(Error::Client)?;
    let controller = Controller::new(client);

    let cancel = CancellationToken::new();
    let mut task = tokio::spawn(controller.run(cancel.clone()));

    tokio::select! {
        result = &mut task => return result?,
        signal = shutdown_signal() => signal?,
    }

    log::info!("shutting down");
    cancel.cancel();
    task.await?
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<(), Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map_err(Error::Signal),
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<(), Error> {
    tokio::signal::ctrl_c().await.map_err(Error::Signal)
}
