use std::sync::{mpsc, Arc, Mutex, RwLock, Weak};

use crate::{Error, Result};

type Slot<T> = Mutex<Option<T>>;

/// Holds only the newest unread publication; a newer one overwrites it.
pub struct LatestReceiver<T> {
    slot: Arc<Slot<T>>,
}

impl<T> LatestReceiver<T> {
    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().ok()?.take()
    }
}

/// Broadcast that always knows the current value.
///
/// `subscribe` receivers get the current value first, then every later
/// publication in order. `subscribe_latest` receivers only ever hold the
/// newest value they have not taken yet.
pub struct Publisher<T: Clone + Send + 'static> {
    current: Arc<RwLock<Option<T>>>,
    subscribers: Arc<Mutex<Vec<mpsc::Sender<T>>>>,
    latest: Arc<Mutex<Vec<Weak<Slot<T>>>>>,
}

impl<T: Clone + Send + 'static> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            subscribers: Arc::clone(&self.subscribers),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            latest: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> Publisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, value: T) -> Result<()> {
        // Holding the subscriber lock across the update keeps current and
        // delivered values in the same order for concurrent publishers.
        let mut subscribers = self.subscribers.lock().map_err(Error::as_guard_error)?;
        {
            *self.current.write().map_err(Error::as_guard_error)? = Some(value.clone());
        }
        subscribers.retain(|subscriber| subscriber.send(value.clone()).is_ok());

        let mut latest = self.latest.lock().map_err(Error::as_guard_error)?;
        latest.retain(|slot| match slot.upgrade() {
            Some(slot) => {
                if let Ok(mut unread) = slot.lock() {
                    *unread = Some(value.clone());
                }
                true
            }
            None => false,
        });
        Ok(())
    }

    pub fn current(&self) -> Option<T> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    pub fn subscribe(&self) -> Result<mpsc::Receiver<T>> {
        let (sender, receiver) = mpsc::channel();
        let mut subscribers = self.subscribers.lock().map_err(Error::as_guard_error)?;
        if let Some(current) = self.current() {
            // receiver is alive, this cannot fail
            let _ = sender.send(current);
        }
        subscribers.push(sender);
        Ok(receiver)
    }

    pub fn subscribe_latest(&self) -> Result<LatestReceiver<T>> {
        let slot = Arc::new(Mutex::new(None));
        // blocks publish until the slot is registered
        let _subscribers = self.subscribers.lock().map_err(Error::as_guard_error)?;
        let mut latest = self.latest.lock().map_err(Error::as_guard_error)?;
        if let Some(current) = self.current() {
            *slot.lock().map_err(Error::as_guard_error)? = Some(current);
        }
        latest.push(Arc::downgrade(&slot));
        Ok(LatestReceiver { slot })
    }
}
