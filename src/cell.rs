use std::cell::RefCell;

use crate::config::CellOptions;
use crate::error::Result;

/// Something that can build and tear down embedded computation cells.
pub trait CellFactory {
    /// Opaque reference to one live cell.
    type Handle;

    fn create(&self, options: &CellOptions) -> Result<Self::Handle>;

    fn dispose(&self, handle: Self::Handle);
}

/// Holds at most one live cell handle.
pub struct CellSlot<F: CellFactory> {
    factory: F,
    current: RefCell<Option<F::Handle>>,
}

impl<F: CellFactory> CellSlot<F> {
    pub fn new(factory: F) -> Self {
        Self { factory, current: RefCell::new(None) }
    }

    pub fn is_live(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Release the live cell, if any. Returns whether one was released.
    pub fn dispose(&self) -> bool {
        let previous = self.current.borrow_mut().take();
        match previous {
            Some(handle) => {
                self.factory.dispose(handle);
                log::info!("computation cell disposed");
                true
            }
            None => false,
        }
    }

    /// Dispose the live cell, then create a new one in its place.
    ///
    /// If creation fails the slot is left empty.
    pub fn create(&self, options: &CellOptions) -> Result<()> {
        self.dispose();
        let handle = self.factory.create(options)?;
        *self.current.borrow_mut() = Some(handle);
        log::info!("computation cell created (autoeval: {})", options.autoeval);
        Ok(())
    }
}
