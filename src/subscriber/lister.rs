use std::{hash::Hash, sync::Arc};

use kube_core::Resource;
use kube_runtime::reflector::{ObjectRef, Store};
use thiserror::Error;

use super::QualifiedName;

/// Point lookups against an informer cache.
pub struct Lister<K>
where
    K: Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    store: Store<K>,
    dyntype: K::DynamicType,
}

impl<K> Clone for Lister<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            dyntype: self.dyntype.clone(),
        }
    }
}

impl<K> Lister<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Clone + Eq + Hash,
{
    pub fn new(store: Store<K>, dyntype: K::DynamicType) -> Self {
        Self { store, dyntype }
    }

    /// Reads the cached object named `key`.
    ///
    /// The cache is only as fresh as the last event it received.
    pub fn get(&self, key: &QualifiedName) -> Result<Arc<K>, LookupError> {
        let mut obj_ref = ObjectRef::new_with(&key.name, self.dyntype.clone());
        if let Some(namespace) = &key.namespace {
            obj_ref = obj_ref.within(namespace);
        }

        self.store
            .get(&obj_ref)
            .ok_or_else(|| LookupError::NotFound {
                resource: resource_name::<K>(&self.dyntype),
                key: key.clone(),
            })
    }
}

/// `<plural>.<group>`, or just `<plural>` for the core group.
fn resource_name<K: Resource>(dyntype: &K::DynamicType) -> String {
    let plural = K::plural(dyntype);
    let group = K::group(dyntype);
    if group.is_empty() {
        plural.into_owned()
    } else {
        format!("{plural}.{group}")
    }
}

/// The error type returned by [`Lister::get`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{resource} \"{}\" not found", .key.name)]
    NotFound {
        resource: String,
        key: QualifiedName,
    },
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::batch::v1::Job;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube_runtime::{reflector::store::Writer, watcher};

    use super::*;

    fn job(namespace: &str, name: &str) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            ..Job::default()
        }
    }

    #[test]
    fn get_finds_namespaced_object() {
        let mut writer = Writer::<Job>::new(());
        writer.apply_watcher_event(&watcher::Event::Applied(job("ci", "build-42")));
        let lister = Lister::new(writer.as_reader(), ());

        let found = lister
            .get(&QualifiedName::new(Some("ci"), "build-42"))
            .expect("job should be found");
        assert_eq!(*found, job("ci", "build-42"));
    }

    #[test]
    fn get_does_not_cross_namespaces() {
        let mut writer = Writer::<Job>::new(());
        writer.apply_watcher_event(&watcher::Event::Applied(job("ci", "build-42")));
        let lister = Lister::new(writer.as_reader(), ());

        let err = lister
            .get(&QualifiedName::new(Some("prod"), "build-42"))
            .unwrap_err();
        assert_eq!(
            err,
            LookupError::NotFound {
                resource: "jobs.batch".to_string(),
                key: QualifiedName::new(Some("prod"), "build-42"),
            }
        );
    }

    #[test]
    fn not_found_message_matches_apiserver() {
        let lister = Lister::new(Writer::<Job>::new(()).as_reader(), ());
        let err = lister
            .get(&QualifiedName::new(Some("ci"), "build-42"))
            .unwrap_err();
        assert_eq!(err.to_string(), "jobs.batch \"build-42\" not found");
    }

    #[test]
    fn core_group_resources_omit_group() {
        let lister = Lister::new(Writer::<ConfigMap>::new(()).as_reader(), ());
        let err = lister
            .get(&QualifiedName::new(Some("ci"), "settings"))
            .unwrap_err();
        assert_eq!(err.to_string(), "configmaps \"settings\" not found");
    }
}
