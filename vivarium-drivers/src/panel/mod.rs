//! Display panel drivers

pub mod st7796;
pub mod strip;

pub use st7796::{PanelError, St7796};
pub use strip::{StripError, StripTarget};
