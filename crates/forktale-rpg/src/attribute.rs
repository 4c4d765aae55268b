//! Attributes with staged modifier hooks.
//!
//! An attribute is a base score plus three ordered hook stages. Reading the
//! value folds the base through every early hook, then every compute hook,
//! then every late hook, in registration order within each stage. Hooks are
//! detachable by handle so a temporary effect can be removed without
//! disturbing the others.

use std::collections::HashMap;
use std::fmt;

/// A modifier applied to an attribute value.
pub type Modifier = Box<dyn Fn(i64) -> i64>;

/// Owned handle to a registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// When in the evaluation pipeline a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookStage {
    /// Flat adjustments to the base score.
    Early,
    /// Transformations of the adjusted score.
    Compute,
    /// Final adjustments after everything else.
    Late,
}

/// A single attribute score with modifier hooks.
pub struct Attribute {
    base: i64,
    hooks: Vec<(HookId, HookStage, Modifier)>,
    next_hook: u64,
}

impl Attribute {
    /// Create an attribute with a base score and no hooks.
    pub fn new(base: i64) -> Self {
        Self {
            base,
            hooks: Vec::new(),
            next_hook: 0,
        }
    }

    /// The unmodified base score.
    pub fn base(&self) -> i64 {
        self.base
    }

    /// Replace the base score.
    pub fn set_base(&mut self, base: i64) {
        self.base = base;
    }

    /// Register a hook; the handle detaches it later.
    pub fn add_hook(
        &mut self,
        stage: HookStage,
        modifier: impl Fn(i64) -> i64 + 'static,
    ) -> HookId {
        let id = HookId(self.next_hook);
        self.next_hook += 1;
        self.hooks.push((id, stage, Box::new(modifier)));
        id
    }

    /// Detach a hook. Returns false when the handle is stale.
    pub fn remove_hook(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _, _)| *hook_id != id);
        self.hooks.len() != before
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// The effective value: base folded through early, compute, then late
    /// hooks, registration order within each stage.
    pub fn value(&self) -> i64 {
        let mut value = self.base;
        for stage in [HookStage::Early, HookStage::Compute, HookStage::Late] {
            for (_, hook_stage, modifier) in &self.hooks {
                if *hook_stage == stage {
                    value = modifier(value);
                }
            }
        }
        value
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("base", &self.base)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// A named collection of attributes.
#[derive(Debug, Default)]
pub struct AttributeSet {
    attributes: HashMap<String, Attribute>,
}

impl AttributeSet {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace an attribute.
    pub fn set(&mut self, name: impl Into<String>, base: i64) {
        self.attributes.insert(name.into(), Attribute::new(base));
    }

    /// Borrow an attribute.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Borrow an attribute mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    /// The effective value of an attribute, or 0 when it does not exist.
    pub fn value_of(&self, name: &str) -> i64 {
        self.attributes.get(name).map_or(0, Attribute::value)
    }

    /// True when the attribute exists.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// True when no attributes exist.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_value_without_hooks() {
        assert_eq!(Attribute::new(12).value(), 12);
    }

    #[test]
    fn stages_run_in_order() {
        let mut attr = Attribute::new(10);
        attr.add_hook(HookStage::Late, |v| v - 1);
        attr.add_hook(HookStage::Early, |v| v + 2);
        attr.add_hook(HookStage::Compute, |v| v * 2);

        // ((10 + 2) * 2) - 1, regardless of registration order
        assert_eq!(attr.value(), 23);
    }

    #[test]
    fn hooks_within_a_stage_keep_registration_order() {
        let mut attr = Attribute::new(0);
        attr.add_hook(HookStage::Compute, |v| v + 3);
        attr.add_hook(HookStage::Compute, |v| v * 10);

        // (0 + 3) * 10, not 0 * 10 + 3
        assert_eq!(attr.value(), 30);
    }

    #[test]
    fn removed_hook_stops_applying() {
        let mut attr = Attribute::new(10);
        let id = attr.add_hook(HookStage::Early, |v| v + 5);
        assert_eq!(attr.value(), 15);

        assert!(attr.remove_hook(id));
        assert_eq!(attr.value(), 10);
        assert!(!attr.remove_hook(id));
    }

    #[test]
    fn attribute_set_lookup() {
        let mut set = AttributeSet::new();
        set.set("health", 20);
        set.set("initiative", 3);

        assert_eq!(set.value_of("health"), 20);
        assert_eq!(set.value_of("missing"), 0);
        assert!(set.contains("initiative"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn hooks_through_the_set() {
        let mut set = AttributeSet::new();
        set.set("health", 20);
        set.get_mut("health")
            .unwrap()
            .add_hook(HookStage::Early, |v| v + 4);
        assert_eq!(set.value_of("health"), 24);
    }
}
