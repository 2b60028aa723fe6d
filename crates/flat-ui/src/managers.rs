use std::sync::Arc;

use flat_core::{ContractViolation, MountKind, UiResult, ViewManager};
use indexmap::IndexMap;

/// A view manager described entirely by its answers to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicViewManager {
    name: String,
    kind: MountKind,
    custom_layout: bool,
}

impl BasicViewManager {
    pub fn new(name: impl Into<String>, kind: MountKind) -> Self {
        Self {
            name: name.into(),
            kind,
            custom_layout: false,
        }
    }

    /// A manager that positions its own children, forcing each of them to
    /// mount to a view.
    pub fn with_custom_layout(mut self) -> Self {
        self.custom_layout = true;
        self
    }
}

impl ViewManager for BasicViewManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn shadow_kind(&self) -> MountKind {
        self.kind
    }

    fn needs_custom_layout_for_children(&self) -> bool {
        self.custom_layout
    }
}

/// View managers by class name. Built by the host and handed to the UI
/// implementation.
#[derive(Clone, Default)]
pub struct ViewManagerRegistry {
    managers: IndexMap<String, Arc<dyn ViewManager>>,
}

impl ViewManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock classes: plain containers, text and images draw into their
    /// mounting ancestor; raw text runs never get a view; inputs always do;
    /// pagers lay out their own pages.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for manager in [
            BasicViewManager::new("View", MountKind::LayoutOnly),
            BasicViewManager::new("Text", MountKind::LayoutOnly),
            BasicViewManager::new("Image", MountKind::LayoutOnly),
            BasicViewManager::new("RawText", MountKind::Virtual),
            BasicViewManager::new("VirtualText", MountKind::Virtual),
            BasicViewManager::new("TextInput", MountKind::ViewMounting),
            BasicViewManager::new("ScrollView", MountKind::ViewMounting),
            BasicViewManager::new("ViewPager", MountKind::ViewMounting).with_custom_layout(),
        ] {
            registry.register(manager);
        }
        registry
    }

    /// Registers `manager`, replacing any manager with the same name.
    pub fn register(&mut self, manager: impl ViewManager + 'static) {
        self.register_shared(Arc::new(manager));
    }

    pub fn register_shared(&mut self, manager: Arc<dyn ViewManager>) {
        let name = manager.name().to_owned();
        if self.managers.insert(name.clone(), manager).is_some() {
            log::warn!("view manager {name} replaced");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.managers.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> UiResult<Arc<dyn ViewManager>> {
        self.managers.get(name).cloned().ok_or_else(|| {
            ContractViolation::UnknownViewClass {
                name: name.to_owned(),
            }
            .into()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.managers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ViewManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
