//! Buffer Registry
//!
//! Process-wide cache mapping `(context id, attribute uuid)` to the GPU
//! buffer mirroring that attribute under that context. GPU buffer handles
//! are only meaningful inside the context group that created them, so the
//! same logical attribute used by two unrelated contexts gets two
//! independent buffers; hence the context id in the key.
//!
//! Allocation is allocate-if-absent: the first use of an attribute under
//! a context allocates and uploads one buffer and wires the attribute's
//! update/delete events to it; every later call is a no-op returning the
//! cached handle. The attribute's update event re-uploads with the
//! attribute's own usage hint, and its delete event frees the GPU buffer
//! and evicts the registry entry.
//!
//! Callers mutate the registry only while holding the context lock, since the
//! registry issues GPU calls.

use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::gpu::{BufferHandle, BufferKind, GpuApi};
use crate::resources::attribute::BufferAttribute;

type BufferKey = (u64, Uuid);

pub struct BufferRegistry {
    gpu: Arc<dyn GpuApi>,
    buffers: Mutex<FxHashMap<BufferKey, BufferHandle>>,
}

impl BufferRegistry {
    #[must_use]
    pub fn new(gpu: Arc<dyn GpuApi>) -> Arc<Self> {
        Arc::new(Self {
            gpu,
            buffers: Mutex::new(FxHashMap::default()),
        })
    }

    /// Ensures a GPU buffer exists for `attribute` under `context_id` and
    /// returns its handle. Idempotent: exactly one buffer is ever
    /// allocated per key, no matter how often this is called.
    pub fn setup_buffer<T: Pod>(
        registry: &Arc<Self>,
        context_id: u64,
        attribute: &BufferAttribute<T>,
        kind: BufferKind,
    ) -> BufferHandle {
        let key = (context_id, attribute.uuid());
        let mut buffers = registry.buffers.lock();
        if let Some(&handle) = buffers.get(&key) {
            return handle;
        }

        let handle = registry.gpu.gen_buffer();
        registry.gpu.bind_buffer(kind, handle);
        registry.gpu.buffer_data(kind, attribute.bytes(), attribute.usage());

        let gpu = registry.gpu.clone();
        attribute.on_update(move |bytes, usage| {
            gpu.bind_buffer(kind, handle);
            gpu.buffer_data(kind, bytes, usage);
        });

        let gpu = registry.gpu.clone();
        let weak = Arc::downgrade(registry);
        attribute.on_delete(move || {
            gpu.delete_buffer(handle);
            if let Some(registry) = weak.upgrade() {
                registry.buffers.lock().remove(&key);
            }
        });

        buffers.insert(key, handle);
        handle
    }

    /// The cached handle for a key, if one has been set up.
    #[must_use]
    pub fn handle(&self, context_id: u64, attribute: Uuid) -> Option<BufferHandle> {
        self.buffers.lock().get(&(context_id, attribute)).copied()
    }

    /// Number of live (context, attribute) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }
}
