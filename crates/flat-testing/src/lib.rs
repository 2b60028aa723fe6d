//! Testing utilities and harness for Flat-RS

pub mod fixture;
pub mod recording;
pub mod reference;

pub use fixture::{LayoutLog, TreeFixture};
pub use recording::{NativeView, RecordingViewHierarchy};
pub use reference::reference_manage_children;

pub mod prelude {
    pub use crate::fixture::*;
    pub use crate::recording::*;
    pub use crate::reference::*;
}
