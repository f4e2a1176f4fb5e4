use std::{fmt::Display, pin::pin};

use futures::{Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;

use crate::{handler::Handler, subscriber::Event, Error};

/// Drives `subscription` into `handler` until `cancel` fires.
///
/// Errors from the subscription are logged and skipped; the subscription is expected
/// to recover from them on its own. Returns [`Error::FeedClosed`] if the subscription
/// ends before cancellation.
pub async fn run<K, Err, Sub, H>(
    subscription: Sub,
    handler: &H,
    cancel: CancellationToken,
) -> Result<(), Error>
where
    Sub: Stream<Item = Result<Event<K>, Err>>,
    Err: Display,
    H: Handler<K>,
{
    let mut sub = pin!(subscription);
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::debug!("stop requested, leaving the change feed");
                return Ok(());
            }
            next = sub.try_next() => next,
        };

        match next {
            Ok(Some(event)) => dispatch(handler, &event),
            Ok(None) => return Err(Error::FeedClosed),
            Err(err) => log::warn!("change feed error, waiting for the watch to recover: {err}"),
        }
    }
}

fn dispatch<K, H: Handler<K>>(handler: &H, event: &Event<K>) {
    match event {
        Event::Added(obj) => handler.on_add(obj),
        Event::Updated { old, new } => handler.on_update(old, new),
        Event::Deleted {
            object,
            final_state_unknown,
        } => handler.on_delete(object, *final_state_unknown),
    }
}
