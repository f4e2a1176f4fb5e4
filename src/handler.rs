//! Callbacks invoked for informer notifications.

/// Reacts to the notifications of a subscription.
///
/// Callbacks run one at a time, in the order the subscription delivers them,
/// on the task driving [`run`](crate::run).
pub trait Handler<K> {
    /// An object appeared, either in the initial listing or later.
    fn on_add(&self, obj: &K);

    /// A cached object changed.
    fn on_update(&self, old: &K, new: &K);

    /// An object left the cache.
    ///
    /// `final_state_unknown` is set when the deletion was inferred from a relist,
    /// in which case `obj` is the last state the cache saw.
    fn on_delete(&self, obj: &K, final_state_unknown: bool);
}

/// A [`Handler`] assembled from closures. Unset callbacks do nothing.
pub struct Funcs<Add, Update, Delete> {
    add: Add,
    update: Update,
    delete: Delete,
}

pub fn funcs() -> Funcs<Ignore, Ignore, Ignore> {
    Funcs {
        add: Ignore,
        update: Ignore,
        delete: Ignore,
    }
}

impl<Update, Delete> Funcs<Ignore, Update, Delete> {
    pub fn on_add<F>(self, f: F) -> Funcs<AssignedFn<F>, Update, Delete> {
        Funcs {
            add: AssignedFn(f),
            update: self.update,
            delete: self.delete,
        }
    }
}

impl<Add, Delete> Funcs<Add, Ignore, Delete> {
    pub fn on_update<F>(self, f: F) -> Funcs<Add, AssignedFn<F>, Delete> {
        Funcs {
            add: self.add,
            update: AssignedFn(f),
            delete: self.delete,
        }
    }
}

impl<Add, Update> Funcs<Add, Update, Ignore> {
    pub fn on_delete<F>(self, f: F) -> Funcs<Add, Update, AssignedFn<F>> {
        Funcs {
            add: self.add,
            update: self.update,
            delete: AssignedFn(f),
        }
    }
}

impl<K, Add, Update, Delete> Handler<K> for Funcs<Add, Update, Delete>
where
    Add: AddFn<K>,
    Update: UpdateFn<K>,
    Delete: DeleteFn<K>,
{
    fn on_add(&self, obj: &K) {
        self.add.call(obj);
    }

    fn on_update(&self, old: &K, new: &K) {
        self.update.call(old, new);
    }

    fn on_delete(&self, obj: &K, final_state_unknown: bool) {
        self.delete.call(obj, final_state_unknown);
    }
}

pub trait AddFn<K> {
    fn call(&self, obj: &K);
}

pub trait UpdateFn<K> {
    fn call(&self, old: &K, new: &K);
}

pub trait DeleteFn<K> {
    fn call(&self, obj: &K, final_state_unknown: bool);
}

/// The callback of a [`Funcs`] slot that was never assigned.
pub struct Ignore;

impl<K> AddFn<K> for Ignore {
    fn call(&self, _obj: &K) {}
}

impl<K> UpdateFn<K> for Ignore {
    fn call(&self, _old: &K, _new: &K) {}
}

impl<K> DeleteFn<K> for Ignore {
    fn call(&self, _obj: &K, _final_state_unknown: bool) {}
}

pub struct AssignedFn<F>(F);

impl<K, F: Fn(&K)> AddFn<K> for AssignedFn<F> {
    fn call(&self, obj: &K) {
        (self.0)(obj)
    }
}

impl<K, F: Fn(&K, &K)> UpdateFn<K> for AssignedFn<F> {
    fn call(&self, old: &K, new: &K) {
        (self.0)(old, new)
    }
}

impl<K, F: Fn(&K, bool)> DeleteFn<K> for AssignedFn<F> {
    fn call(&self, obj: &K, final_state_unknown: bool) {
        (self.0)(obj, final_state_unknown)
    }
}
