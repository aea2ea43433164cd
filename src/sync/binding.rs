// ABOUTME: Rebinds a synchronizer whenever its dependency key changes
// ABOUTME: The old instance is stopped before the replacement is started

use anyhow::Result;

use super::signals::PageSignals;
use super::synchronizer::Synchronizer;

type Factory<K, T> = Box<dyn Fn(&K) -> Result<Synchronizer<T>> + Send + Sync>;

/// Holds at most one running synchronizer, built for the current key.
pub struct KeyedSynchronizer<K, T> {
    factory: Factory<K, T>,
    current: Option<(K, Synchronizer<T>)>,
}

impl<K, T> KeyedSynchronizer<K, T>
where
    K: PartialEq + std::fmt::Debug,
    T: Send + Sync + 'static,
{
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&K) -> Result<Synchronizer<T>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            current: None,
        }
    }

    /// Make `key` the active key. Returns true when a new instance was created.
    pub fn bind(&mut self, key: K, signals: &PageSignals) -> Result<bool> {
        if let Some((current, _)) = &self.current {
            if *current == key {
                return Ok(false);
            }
        }

        if let Some((old_key, old)) = self.current.take() {
            tracing::debug!("Dependency key changed from {:?} to {:?}", old_key, key);
            old.stop();
        }

        let sync = (self.factory)(&key)?;
        sync.start(signals);
        self.current = Some((key, sync));
        Ok(true)
    }

    /// Stop and drop the current instance, if any.
    pub fn unbind(&mut self) {
        if let Some((_, sync)) = self.current.take() {
            sync.stop();
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.current.as_ref().map(|(key, _)| key)
    }

    pub fn current(&self) -> Option<&Synchronizer<T>> {
        self.current.as_ref().map(|(_, sync)| sync)
    }
}
