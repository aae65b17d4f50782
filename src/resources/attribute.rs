//! Vertex Attributes
//!
//! A [`BufferAttribute`] is the CPU copy of one vertex data stream
//! (positions, normals, indices) plus the metadata GPU upload needs: a
//! stable UUID, the per-vertex item size, and a static/dynamic usage
//! hint. Consumers that mirror the data into GPU memory subscribe to
//! update and delete events; the buffer registry uses exactly that to
//! keep its GPU buffers in sync without the attribute knowing anything
//! about contexts or drivers.

use bytemuck::Pod;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::gpu::BufferUsage;

/// Fired after the attribute's data changes; receives the new bytes and
/// the usage hint.
pub type UpdateCallback = Box<dyn FnMut(&[u8], BufferUsage) + Send>;
/// Fired once when the attribute is destroyed.
pub type DeleteCallback = Box<dyn FnOnce() + Send>;

pub struct BufferAttribute<T: Pod> {
    uuid: Uuid,
    data: Vec<T>,
    item_size: u32,
    dynamic: bool,
    version: u64,

    on_update: Mutex<Vec<UpdateCallback>>,
    on_delete: Mutex<Vec<DeleteCallback>>,
}

impl<T: Pod> BufferAttribute<T> {
    /// Creates a static attribute: `item_size` components per vertex.
    #[must_use]
    pub fn new(data: Vec<T>, item_size: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            data,
            item_size,
            dynamic: false,
            version: 0,
            on_update: Mutex::new(Vec::new()),
            on_delete: Mutex::new(Vec::new()),
        }
    }

    /// Creates an attribute whose data is expected to change often; GPU
    /// mirrors upload it with a dynamic usage hint.
    #[must_use]
    pub fn new_dynamic(data: Vec<T>, item_size: u32) -> Self {
        let mut attribute = Self::new(data, item_size);
        attribute.dynamic = true;
        attribute
    }

    /// Stable identity; what GPU mirrors key on.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Raw bytes of the current data, as uploaded.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Components per vertex.
    #[must_use]
    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    /// Number of vertices (items) in the stream.
    #[must_use]
    pub fn count(&self) -> u32 {
        if self.item_size == 0 {
            0
        } else {
            (self.data.len() as u32) / self.item_size
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// The upload hint derived from the dynamic flag.
    #[must_use]
    pub fn usage(&self) -> BufferUsage {
        if self.dynamic {
            BufferUsage::Dynamic
        } else {
            BufferUsage::Static
        }
    }

    /// Monotonic change counter; bumps on every [`Self::set_data`].
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replaces the data and notifies every update subscriber.
    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
        self.version = self.version.wrapping_add(1);

        let bytes: &[u8] = bytemuck::cast_slice(&self.data);
        let usage = self.usage();
        for callback in self.on_update.lock().iter_mut() {
            callback(bytes, usage);
        }
    }

    /// Subscribes to data changes. The callback does not fire for data
    /// already present at subscription time.
    pub fn on_update(&self, callback: impl FnMut(&[u8], BufferUsage) + Send + 'static) {
        self.on_update.lock().push(Box::new(callback));
    }

    /// Subscribes to destruction; fires exactly once, when the attribute
    /// is dropped.
    pub fn on_delete(&self, callback: impl FnOnce() + Send + 'static) {
        self.on_delete.lock().push(Box::new(callback));
    }
}

impl<T: Pod> Drop for BufferAttribute<T> {
    fn drop(&mut self) {
        for callback in self.on_delete.lock().drain(..) {
            callback();
        }
    }
}
