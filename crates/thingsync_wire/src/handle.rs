//! Shared container handle for threaded hosts.

use std::sync::Arc;

use parking_lot::Mutex;
use thingsync_core::PropertyContainer;

use crate::decode::{decode, DecodeError};
use crate::encode::{encode, EncodeError, EncodeOptions};

/// A cloneable handle serializing all container access behind one lock.
///
/// The codec itself is single-threaded by design: encode and decode run
/// synchronously from a host polling loop. A host that runs the
/// transport and the application on different threads must still uphold
/// the "at most one in-flight decode mutates a property at a time"
/// invariant, and this handle does exactly that — encode, decode and
/// application mutation all take the same mutex.
#[derive(Clone)]
pub struct SyncHandle {
    container: Arc<Mutex<PropertyContainer>>,
}

impl SyncHandle {
    /// Wrap a container in a shared handle.
    pub fn new(container: PropertyContainer) -> Self {
        Self {
            container: Arc::new(Mutex::new(container)),
        }
    }

    /// Run `f` with exclusive access to the container.
    pub fn with<R>(&self, f: impl FnOnce(&mut PropertyContainer) -> R) -> R {
        f(&mut self.container.lock())
    }

    /// Encode due properties under the lock. See [`encode`].
    pub fn encode(
        &self,
        buf: &mut [u8],
        opts: EncodeOptions,
        now_ms: u64,
    ) -> Result<usize, EncodeError> {
        encode(&mut self.container.lock(), buf, opts, now_ms)
    }

    /// Decode and apply an inbound payload under the lock. See
    /// [`decode`].
    pub fn decode(&self, payload: &[u8], is_sync_message: bool) -> Result<(), DecodeError> {
        decode(&mut self.container.lock(), payload, is_sync_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thingsync_core::Permission;

    #[test]
    fn handle_serializes_mutation_and_codec_calls() {
        let mut container = PropertyContainer::new();
        container.add("counter", 0, Permission::ReadWrite);
        let handle = SyncHandle::new(container);

        let writer = handle.clone();
        let thread = std::thread::spawn(move || {
            writer.with(|c| c.get_mut("counter").unwrap().set(41));
        });
        thread.join().unwrap();

        let mut buf = [0u8; 64];
        let len = handle.encode(&mut buf, EncodeOptions::default(), 0).unwrap();
        assert!(len > 0);

        // [{0: "counter", 2: 42}]
        let payload = [
            0x81, 0xa2, 0x00, 0x67, b'c', b'o', b'u', b'n', b't', b'e', b'r', 0x02, 0x18, 0x2a,
        ];
        handle.decode(&payload, false).unwrap();
        assert_eq!(
            handle.with(|c| c.get("counter").unwrap().value().as_int()),
            Some(42)
        );
    }
}
