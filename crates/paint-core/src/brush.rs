//! Brush: reserved extension point for multi-stroke painting.
//!
//! Holds no GPU resources. Only the disposal contract is implemented.

#[derive(Debug, Default)]
pub struct Brush {
    released: bool,
}

impl Brush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the brush. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if !self.released {
            log::trace!("brush released");
        }
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
