//! Offscreen Render Targets

use crate::gpu::{FramebufferHandle, GpuApi};

/// A framebuffer the renderer can draw into instead of the window.
pub struct RenderTarget {
    framebuffer: FramebufferHandle,
    width: u32,
    height: u32,
}

impl RenderTarget {
    #[must_use]
    pub fn new(gpu: &dyn GpuApi, width: u32, height: u32) -> Self {
        Self {
            framebuffer: gpu.create_framebuffer(),
            width,
            height,
        }
    }

    #[must_use]
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Releases the framebuffer. The target must not be bound afterwards.
    pub fn destroy(&mut self, gpu: &dyn GpuApi) {
        if self.framebuffer != 0 {
            gpu.delete_framebuffer(self.framebuffer);
            self.framebuffer = 0;
        }
    }
}
