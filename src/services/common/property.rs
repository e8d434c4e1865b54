use std::fmt::Debug;

use futures::stream::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A shared, watchable value cell.
///
/// The synchronizer publishes into it (current session binding, latest
/// projection); command handlers and external readers take cheap snapshots
/// or stream every change. Readers never hold a reference into the writer's
/// state, only clones.
#[derive(Clone)]
pub struct Property<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    /// Set a new value and notify watchers if it differs from the current one.
    pub(crate) fn set(&self, new_value: T)
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current != new_value {
                *current = new_value;
                true
            } else {
                false
            }
        });
    }

    /// Replace the value and notify watchers unconditionally.
    pub(crate) fn replace(&self, new_value: T) {
        self.tx.send_replace(new_value);
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Read the current value in place without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.rx.borrow())
    }

    /// Watch for changes to this property.
    ///
    /// The stream immediately yields the current value, then yields
    /// whenever the value changes.
    pub fn watch(&self) -> impl Stream<Item = T> + Send + use<T> {
        WatchStream::new(self.rx.clone())
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.rx.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn set_skips_equal_values() {
        let property = Property::new(1);
        let mut rx = property.rx.clone();
        rx.mark_unchanged();

        property.set(1);
        assert!(!rx.has_changed().unwrap_or(true));

        property.set(2);
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(property.get(), 2);
    }

    #[tokio::test]
    async fn watch_yields_current_value_first() {
        let property = Property::new("idle".to_string());
        let mut stream = Box::pin(property.watch());

        assert_eq!(stream.next().await.as_deref(), Some("idle"));

        property.replace("playing".to_string());
        assert_eq!(stream.next().await.as_deref(), Some("playing"));
    }
}
