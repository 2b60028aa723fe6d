use flat_core::{HierarchyListener, UiError, ViewOperationConsumer};
use flat_modules::{ModuleError, NativeModuleRegistry};

use crate::implementation::UiImplementation;
use crate::layout::LayoutEngine;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    #[error(transparent)]
    Ui(#[from] UiError),
    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// One running UI instance: the command surface plus the native modules that
/// live as long as it does. Lifecycle notifications and hierarchy passes are
/// serialized through `&mut self`, so a notification never lands in the
/// middle of a pass.
#[derive(Debug)]
pub struct UiInstance {
    ui: UiImplementation,
    modules: NativeModuleRegistry,
}

impl UiInstance {
    pub fn new(ui: UiImplementation, modules: NativeModuleRegistry) -> Self {
        Self { ui, modules }
    }

    pub fn ui(&self) -> &UiImplementation {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiImplementation {
        &mut self.ui
    }

    pub fn modules(&self) -> &NativeModuleRegistry {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut NativeModuleRegistry {
        &mut self.modules
    }

    pub fn initialize(&mut self) -> Result<(), InstanceError> {
        log::debug!("initializing instance with {} modules", self.modules.len());
        self.modules.notify_instance_initialized()?;
        Ok(())
    }

    /// Finishes one batch from the bridge: lays out, flushes the hierarchy
    /// pass, then tells interested modules. Modules hear about every batch,
    /// including one whose pass failed; the pass error is returned after.
    pub fn on_batch_complete(
        &mut self,
        engine: &mut dyn LayoutEngine,
        consumer: &mut dyn ViewOperationConsumer,
        listener: &mut dyn HierarchyListener,
    ) -> Result<usize, InstanceError> {
        let dispatched = self.ui.dispatch_view_updates(engine, consumer, listener);
        if let Err(err) = &dispatched {
            log::error!("hierarchy pass failed: {err}");
        }
        self.modules.on_batch_complete();
        dispatched.map_err(InstanceError::from)
    }

    pub fn destroy(&mut self) -> Result<(), InstanceError> {
        log::debug!("destroying instance");
        self.modules.notify_instance_destroy()?;
        Ok(())
    }
}
