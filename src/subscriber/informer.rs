use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use futures::{stream, Stream, StreamExt, TryStreamExt};
use kube_client::Api;
use kube_core::Resource;
use kube_runtime::{
    reflector::{store::Writer, ObjectRef, Store},
    watcher, WatchStreamExt,
};
use serde::de::DeserializeOwned;

use super::{Event, Lister};

/// A change feed for objects of type `K` together with the cache it keeps current.
///
/// Nothing is requested from the apiserver until [`subscribe`](Self::subscribe)
/// is called and the returned stream is polled.
pub struct Informer<K>
where
    K: Resource + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    api: Api<K>,
    watcher_config: watcher::Config,
    feed: Feed<K>,
}

impl<K> Informer<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    K::DynamicType: Clone + Eq + Hash + Default,
{
    pub fn new(api: Api<K>, watcher_config: watcher::Config) -> Self {
        Self::with(api, watcher_config, <_>::default())
    }
}

impl<K> Informer<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    /// Creates an informer for objects of the type `dyntype`.
    pub fn with(api: Api<K>, watcher_config: watcher::Config, dyntype: K::DynamicType) -> Self {
        Self {
            api,
            watcher_config,
            feed: Feed::new(dyntype),
        }
    }

    /// A read handle to the cache.
    ///
    /// The cache stays empty until the subscription starts delivering events.
    pub fn lister(&self) -> Lister<K> {
        self.feed.lister()
    }

    /// Starts the list-watch and returns its notifications.
    ///
    /// Watch errors are passed through. The underlying watcher reconnects with backoff
    /// as long as the stream keeps being polled.
    pub fn subscribe(self) -> impl Stream<Item = Result<Event<K>, watcher::Error>> {
        let Self {
            api,
            watcher_config,
            mut feed,
        } = self;

        watcher(api, watcher_config)
            .default_backoff()
            .map_ok(move |event| stream::iter(feed.apply(event)).map(Ok::<_, watcher::Error>))
            .try_flatten()
    }
}

/// Translates raw watcher events into informer notifications, updating the cache on the way.
pub struct Feed<K>
where
    K: Resource + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    writer: Writer<K>,
    store: Store<K>,
    dyntype: K::DynamicType,
}

impl<K> Feed<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    pub fn new(dyntype: K::DynamicType) -> Self {
        let writer = Writer::new(dyntype.clone());
        let store = writer.as_reader();
        Self {
            writer,
            store,
            dyntype,
        }
    }

    pub fn lister(&self) -> Lister<K> {
        Lister::new(self.store.clone(), self.dyntype.clone())
    }

    /// Applies `event` to the cache and returns the notifications it implies.
    ///
    /// The cache is updated before the notifications are returned,
    /// so handlers looking objects up see at least this state.
    pub fn apply(&mut self, event: watcher::Event<K>) -> Vec<Event<K>> {
        let previous: Vec<Arc<K>> = match &event {
            watcher::Event::Applied(obj) => self.store.get(&self.key(obj)).into_iter().collect(),
            watcher::Event::Deleted(_) => Vec::new(),
            watcher::Event::Restarted(_) => self.store.state(),
        };
        self.writer.apply_watcher_event(&event);

        match event {
            watcher::Event::Applied(obj) => {
                let new = Arc::new(obj);
                vec![match previous.into_iter().next() {
                    Some(old) => Event::Updated { old, new },
                    None => Event::Added(new),
                }]
            }
            watcher::Event::Deleted(obj) => vec![Event::Deleted {
                object: Arc::new(obj),
                final_state_unknown: false,
            }],
            watcher::Event::Restarted(objs) => self.relist(previous, objs),
        }
    }

    fn relist(&self, previous: Vec<Arc<K>>, objs: Vec<K>) -> Vec<Event<K>> {
        let mut previous = previous
            .into_iter()
            .map(|obj| (self.key(&obj), obj))
            .collect::<HashMap<_, _>>();

        let mut events = objs
            .into_iter()
            .map(|obj| match previous.remove(&self.key(&obj)) {
                Some(old) => Event::Updated {
                    old,
                    new: Arc::new(obj),
                },
                None => Event::Added(Arc::new(obj)),
            })
            .collect::<Vec<_>>();

        log::debug!(
            "relisted {} objects, {} no longer present",
            events.len(),
            previous.len()
        );

        events.extend(previous.into_values().map(|object| Event::Deleted {
            object,
            final_state_unknown: true,
        }));
        events
    }

    fn key(&self, obj: &K) -> ObjectRef<K> {
        ObjectRef::from_obj_with(obj, self.dyntype.clone())
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::batch::v1::{Job, JobStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube_core::ResourceExt;

    use super::*;
    use crate::subscriber::QualifiedName;

    fn job(name: &str, succeeded: Option<i32>) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("ci".to_string()),
                ..ObjectMeta::default()
            },
            status: succeeded.map(|succeeded| JobStatus {
                succeeded: Some(succeeded),
                ..JobStatus::default()
            }),
            ..Job::default()
        }
    }

    fn summary(events: &[Event<Job>]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                Event::Added(job) => format!("add {}", job.name_any()),
                Event::Updated { new, .. } => format!("update {}", new.name_any()),
                Event::Deleted {
                    object,
                    final_state_unknown,
                } => format!("delete {} unknown={final_state_unknown}", object.name_any()),
            })
            .collect()
    }

    #[test]
    fn initial_list_adds_every_object() {
        let mut feed = Feed::<Job>::new(());
        let events = feed.apply(watcher::Event::Restarted(vec![
            job("a", None),
            job("b", None),
        ]));
        assert_eq!(summary(&events), ["add a", "add b"]);
        assert_eq!(feed.store.state().len(), 2);
    }

    #[test]
    fn applied_is_an_add_then_an_update() {
        let mut feed = Feed::<Job>::new(());

        let events = feed.apply(watcher::Event::Applied(job("a", None)));
        assert_eq!(summary(&events), ["add a"]);

        let events = feed.apply(watcher::Event::Applied(job("a", Some(1))));
        assert_eq!(summary(&events), ["update a"]);
        let Event::Updated { old, new } = &events[0] else {
            panic!("expected an update, got {events:?}");
        };
        assert_eq!(old.status, None);
        assert_eq!(new.status.as_ref().and_then(|s| s.succeeded), Some(1));
    }

    #[test]
    fn cache_is_updated_before_notification() {
        let mut feed = Feed::<Job>::new(());
        let lister = feed.lister();

        feed.apply(watcher::Event::Applied(job("a", None)));
        feed.apply(watcher::Event::Applied(job("a", Some(3))));

        let cached = lister
            .get(&QualifiedName::new(Some("ci"), "a"))
            .expect("job should be cached");
        assert_eq!(cached.status.as_ref().and_then(|s| s.succeeded), Some(3));
    }

    #[test]
    fn deleted_is_observed_directly() {
        let mut feed = Feed::<Job>::new(());
        feed.apply(watcher::Event::Applied(job("a", None)));

        let events = feed.apply(watcher::Event::Deleted(job("a", None)));
        assert_eq!(summary(&events), ["delete a unknown=false"]);
        assert!(feed.store.state().is_empty());
    }

    #[test]
    fn relist_infers_deletions_and_updates() {
        let mut feed = Feed::<Job>::new(());
        feed.apply(watcher::Event::Restarted(vec![job("a", None), job("b", None)]));

        let events = feed.apply(watcher::Event::Restarted(vec![
            job("b", Some(1)),
            job("c", None),
        ]));
        assert_eq!(
            summary(&events),
            ["update b", "add c", "delete a unknown=true"]
        );

        let lister = feed.lister();
        assert!(lister.get(&QualifiedName::new(Some("ci"), "a")).is_err());
        assert!(lister.get(&QualifiedName::new(Some("ci"), "c")).is_ok());
    }

    #[test]
    fn inferred_deletion_carries_last_known_state() {
        let mut feed = Feed::<Job>::new(());
        feed.apply(watcher::Event::Applied(job("a", Some(2))));

        let events = feed.apply(watcher::Event::Restarted(Vec::new()));
        let [Event::Deleted { object, .. }] = events.as_slice() else {
            panic!("expected a single deletion, got {events:?}");
        };
        assert_eq!(object.status.as_ref().and_then(|s| s.succeeded), Some(2));
    }
}
