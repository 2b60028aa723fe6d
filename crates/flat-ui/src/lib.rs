#![doc = r"Command surface of the Flat-RS UI layer: view managers, the UI implementation and the instance lifecycle."]

pub mod implementation;
pub mod instance;
pub mod layout;
pub mod managers;

pub use implementation::UiImplementation;
pub use instance::{InstanceError, UiInstance};
pub use layout::LayoutEngine;
pub use managers::{BasicViewManager, ViewManagerRegistry};
