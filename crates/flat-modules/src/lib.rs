#![doc = r"Native module registry and instance lifecycle notifications for Flat-RS."]

use std::any::{type_name, Any, TypeId};
use std::fmt;

use indexmap::IndexMap;

/// Error a module reports from one of its lifecycle hooks.
pub type ModuleFailure = Box<dyn std::error::Error + Send + Sync>;

/// A long-lived service object exposed to the scripting side.
///
/// Lifecycle hooks run on the UI context. `initialize` runs once after the
/// instance is up, `destroy` once before it goes away. Modules that return
/// true from `wants_batch_complete` also hear about every finished batch.
pub trait NativeModule: Any {
    fn name(&self) -> &str;

    fn initialize(&mut self) -> Result<(), ModuleFailure> {
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), ModuleFailure> {
        Ok(())
    }

    fn wants_batch_complete(&self) -> bool {
        false
    }

    fn on_batch_complete(&mut self) {}
}

impl dyn NativeModule {
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Initialize,
    Destroy,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePhase::Initialize => f.write_str("initialize"),
            LifecyclePhase::Destroy => f.write_str("destroy"),
        }
    }
}

/// Where the registry is in the instance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Registered,
    Initialized,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error("module {name} registered twice")]
    Duplicate { name: String },
    #[error("module {name} registered after the instance was initialized")]
    LateRegistration { name: String },
    #[error("module {type_name} is not registered")]
    NotRegistered { type_name: &'static str },
    #[error("{} module(s) failed to {phase}: {}", .failures.len(), describe(.failures))]
    Lifecycle {
        phase: LifecyclePhase,
        failures: Vec<(String, String)>,
    },
}

fn describe(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(module, reason)| format!("{module} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Modules keyed by concrete type, iterated in registration order.
pub struct NativeModuleRegistry {
    modules: IndexMap<TypeId, Box<dyn NativeModule>>,
    batch_listeners: Vec<TypeId>,
    state: RegistryState,
}

impl Default for NativeModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: IndexMap::new(),
            batch_listeners: Vec::new(),
            state: RegistryState::Registered,
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn register<M: NativeModule>(&mut self, module: M) -> Result<(), ModuleError> {
        let name = module.name().to_owned();
        if self.state != RegistryState::Registered {
            return Err(ModuleError::LateRegistration { name });
        }
        let key = TypeId::of::<M>();
        if self.modules.contains_key(&key) {
            return Err(ModuleError::Duplicate { name });
        }
        if module.wants_batch_complete() {
            self.batch_listeners.push(key);
        }
        log::debug!("registered native module {name}");
        self.modules.insert(key, Box::new(module));
        Ok(())
    }

    /// Runs `initialize` on every module in registration order. A failing
    /// module does not stop the others; failures are reported together.
    pub fn notify_instance_initialized(&mut self) -> Result<(), ModuleError> {
        if self.state != RegistryState::Registered {
            log::warn!("instance initialized twice, ignoring ({:?})", self.state);
            return Ok(());
        }
        self.state = RegistryState::Initialized;
        self.run_phase(LifecyclePhase::Initialize)
    }

    /// Runs `destroy` on every module in registration order, even after a
    /// failure. Destroying a registry that never initialized is allowed.
    pub fn notify_instance_destroy(&mut self) -> Result<(), ModuleError> {
        if self.state == RegistryState::Destroyed {
            log::warn!("instance destroyed twice, ignoring");
            return Ok(());
        }
        self.state = RegistryState::Destroyed;
        self.run_phase(LifecyclePhase::Destroy)
    }

    /// Notifies the modules that opted in, in registration order.
    pub fn on_batch_complete(&mut self) {
        if self.state != RegistryState::Initialized {
            log::trace!("batch complete outside of the live instance ({:?})", self.state);
            return;
        }
        for key in &self.batch_listeners {
            if let Some(module) = self.modules.get_mut(key) {
                module.on_batch_complete();
            }
        }
    }

    pub fn has_module<M: NativeModule>(&self) -> bool {
        self.modules.contains_key(&TypeId::of::<M>())
    }

    pub fn get_module<M: NativeModule>(&self) -> Result<&M, ModuleError> {
        self.modules
            .get(&TypeId::of::<M>())
            .and_then(|module| module.as_any().downcast_ref::<M>())
            .ok_or(ModuleError::NotRegistered {
                type_name: type_name::<M>(),
            })
    }

    pub fn get_module_mut<M: NativeModule>(&mut self) -> Result<&mut M, ModuleError> {
        self.modules
            .get_mut(&TypeId::of::<M>())
            .and_then(|module| module.as_any_mut().downcast_mut::<M>())
            .ok_or(ModuleError::NotRegistered {
                type_name: type_name::<M>(),
            })
    }

    pub fn modules(&self) -> impl Iterator<Item = &dyn NativeModule> + '_ {
        self.modules.values().map(|module| module.as_ref())
    }

    fn run_phase(&mut self, phase: LifecyclePhase) -> Result<(), ModuleError> {
        let mut failures = Vec::new();
        for module in self.modules.values_mut() {
            let result = match phase {
                LifecyclePhase::Initialize => module.initialize(),
                LifecyclePhase::Destroy => module.destroy(),
            };
            if let Err(err) = result {
                log::warn!("native module {} failed to {phase}: {err}", module.name());
                failures.push((module.name().to_owned(), err.to_string()));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModuleError::Lifecycle { phase, failures })
        }
    }
}

impl fmt::Debug for NativeModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModuleRegistry")
            .field("modules", &self.modules().map(|m| m.name()).collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}
