use orrery_common::SurfaceSize;

/// A drawing surface with a backing store (pixels rendered) and a layout size
/// (pixels displayed). Rendering at a stale backing size stretches the image.
pub trait DisplaySurface {
    fn backing_size(&self) -> SurfaceSize;
    fn layout_size(&self) -> SurfaceSize;
    fn resize_backing(&mut self, size: SurfaceSize);
}

/// Match the backing store to the layout size. Returns `true` if it changed.
///
/// Idempotent: a second call with an unchanged layout returns `false`.
pub fn check_resize(surface: &mut impl DisplaySurface) -> bool {
    let layout = surface.layout_size().at_least_one();
    let backing = surface.backing_size();
    if backing == layout {
        return false;
    }
    tracing::debug!(
        from_width = backing.width,
        from_height = backing.height,
        to_width = layout.width,
        to_height = layout.height,
        "resizing backing store"
    );
    surface.resize_backing(layout);
    true
}

/// In-memory surface for headless runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenSurface {
    pub backing: SurfaceSize,
    pub layout: SurfaceSize,
}

impl OffscreenSurface {
    /// A surface whose backing store already matches its layout.
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            backing: size,
            layout: size,
        }
    }

    /// Simulate the container being resized by the host.
    pub fn set_layout(&mut self, size: SurfaceSize) {
        self.layout = size;
    }
}

impl DisplaySurface for OffscreenSurface {
    fn backing_size(&self) -> SurfaceSize {
        self.backing
    }

    fn layout_size(&self) -> SurfaceSize {
        self.layout
    }

    fn resize_backing(&mut self, size: SurfaceSize) {
        self.backing = size;
    }
}
