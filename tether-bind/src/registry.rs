use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::{Binding, BindingKind};
use crate::template::Template;

type Hook = Rc<dyn Fn(&Binding)>;

/// Bindings of one render. Removal hooks run with no borrow held, so they
/// may update other bindings or mutate the list.
#[derive(Default)]
pub struct Registry {
    live: RefCell<Vec<Binding>>,
    removed: RefCell<Vec<Binding>>,
    hooks: RefCell<Vec<Hook>>,
}

impl Registry {
    pub fn new() -> Rc<Self> {
        Rc::new(Registry::default())
    }

    pub fn add(&self, binding: &Binding) {
        self.live.borrow_mut().push(binding.clone());
    }

    pub fn remove(&self, binding: &Binding) {
        self.live.borrow_mut().retain(|b| !b.ptr_eq(binding));
        self.removed.borrow_mut().push(binding.clone());
        let hooks = self.hooks.borrow().clone();
        for hook in hooks {
            hook(binding);
        }
    }

    /// Runs `hook` for every binding removed from now on.
    pub fn on_remove(&self, hook: impl Fn(&Binding) + 'static) {
        self.hooks.borrow_mut().push(Rc::new(hook));
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.live.borrow().clone()
    }

    /// Removed bindings in notification order.
    pub fn removed(&self) -> Vec<Binding> {
        self.removed.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.borrow().is_empty()
    }

    pub fn contains(&self, binding: &Binding) -> bool {
        self.live.borrow().iter().any(|b| b.ptr_eq(binding))
    }

    /// First live binding created for `template`. For a list this is the
    /// whole-list binding, never one of its items.
    pub fn binding_for(&self, template: &Rc<Template>) -> Option<Binding> {
        self.live
            .borrow()
            .iter()
            .find(|b| b.renders(template) && !matches!(b.kind(), BindingKind::Item(_)))
            .cloned()
    }

    /// Live bindings created for `template`, in creation order.
    pub fn bindings_for(&self, template: &Rc<Template>) -> Vec<Binding> {
        self.live
            .borrow()
            .iter()
            .filter(|b| b.renders(template))
            .cloned()
            .collect()
    }

    /// Updates every live binding in creation order.
    pub fn update_all(&self) {
        for binding in self.bindings() {
            if self.contains(&binding) {
                binding.update();
            }
        }
    }

    pub fn clear_removed(&self) {
        self.removed.borrow_mut().clear();
    }
}
