use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::camera::Viewport;

/// Window-sized RGBA surface the view rasterizes into.
pub(crate) struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Presenter {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Rebuilds the surface at the new size. Minimized windows keep the old one.
    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<bool, Error> {
        if width == 0 || height == 0 {
            return Ok(false);
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(true)
    }

    pub(crate) fn frame_mut(&mut self) -> &mut [u8] {
        self.pixels.frame_mut()
    }

    pub(crate) fn present(&self) -> Result<(), Error> {
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }
}
