//! Generic element-registration capability.
//!
//! Containers keep their child stores private and expose name-specific
//! operations (`add_*`, `remove_*`, `get_*`). They still implement this
//! generic capability, but every entry point fails with
//! [`UnsupportedOperation`](crate::engine::ContainerError::UnsupportedOperation)
//! naming the operation to use instead; the narrowing is deliberate.

use crate::error::Result;

pub trait ElementRegistry {
    type Element;

    fn register(&mut self, element: Self::Element) -> Result<()>;

    fn unregister(&mut self, ref_name: &str) -> Result<Self::Element>;

    fn get_registered(&self, ref_name: &str) -> Result<&Self::Element>;
}
