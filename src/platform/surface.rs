use std::fmt;
use std::sync::Arc;

/// A host window a capture session can render into.
pub trait NativeWindow: Send + Sync + fmt::Debug {
    fn is_valid(&self) -> bool;
}

/// Reference-counted target surface.
///
/// Cloning acquires another reference to the underlying window; the window is
/// released when the last clone drops. Sessions hold a clone for as long as
/// they are active.
#[derive(Clone)]
pub struct Surface {
    window: Arc<dyn NativeWindow>,
}

impl Surface {
    pub fn new<W: NativeWindow + 'static>(window: W) -> Self {
        Self {
            window: Arc::new(window),
        }
    }

    pub fn from_arc(window: Arc<dyn NativeWindow>) -> Self {
        Self { window }
    }

    pub fn is_valid(&self) -> bool {
        self.window.is_valid()
    }

    pub fn window(&self) -> &dyn NativeWindow {
        self.window.as_ref()
    }

    /// Number of live references to the window, this one included.
    pub fn references(&self) -> usize {
        Arc::strong_count(&self.window)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("window", &self.window)
            .field("references", &self.references())
            .finish()
    }
}
