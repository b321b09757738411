//! Handler registry and per-operation handler resolution.

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::debug;

use crate::{
    config::Settings,
    handlers::{
        activity::ActivityScoringPolicy,
        band_mode::BandModeDiversity,
        default_operation::DefaultOperation,
        entity::EntityAward,
        subdivision::{SubdivisionAward, SubdivisionSlot},
    },
    operation::Operation,
    qso::Reference,
};

use super::traits::Handler;

/// Key and bound reference type of the fallback handler.
pub const DEFAULT_OPERATION_KEY: &str = "defaultOperation";
/// Entity (country) award handler key.
pub const ENTITY_KEY: &str = "entities";
/// Primary-country subdivision award handler key.
pub const PRIMARY_SUBDIVISION_KEY: &str = "primarySubdivisions";
/// Secondary-country subdivision award handler key.
pub const SECONDARY_SUBDIVISION_KEY: &str = "secondarySubdivisions";
/// Band/mode diversity handler key.
pub const BAND_MODE_KEY: &str = "bandsAndModes";

/// Always-appended handlers, in resolution order.
pub const ALWAYS_ON_KEYS: [&str; 4] = [
    ENTITY_KEY,
    PRIMARY_SUBDIVISION_KEY,
    SECONDARY_SUBDIVISION_KEY,
    BAND_MODE_KEY,
];

/// Hook key selecting the handler for operation references of `ref_type`.
pub fn ref_hook(ref_type: &str) -> String {
    format!("ref:{ref_type}")
}

/// Hook key selecting a handler by its own key.
pub fn handler_hook(key: &str) -> String {
    format!("handler:{key}")
}

/// Grouping used by [`Registry::find_hooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookCategory {
    /// Program bound through operation references.
    Reference,
    /// Declarative activity program (may offer general hunting).
    Activity,
    /// Built-in cross-cutting award.
    Award,
}

/// Capability filter for [`Registry::find_hooks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any handler.
    Any,
    /// Implements QSO scoring.
    Scoring,
    /// Implements summarization.
    Summarizing,
}

struct Hook {
    key: String,
    category: HookCategory,
    priority: i32,
    handler: Arc<dyn Handler>,
}

/// Priority-ordered hook table, built once and read during resolution.
#[derive(Default)]
pub struct Registry {
    hooks: Vec<Hook>,
}

/// A handler bound to the reference that selected it.
#[derive(Clone)]
pub struct ResolvedHandler {
    /// Scoring program.
    pub handler: Arc<dyn Handler>,
    /// Bound reference. Empty for always-on and hunting handlers.
    pub reference: Reference,
}

impl ResolvedHandler {
    /// Key this handler's scores are stored under.
    pub fn score_key(&self) -> &str {
        if self.reference.ref_type.is_empty() {
            self.handler.key()
        } else {
            &self.reference.ref_type
        }
    }
}

impl std::fmt::Debug for ResolvedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedHandler")
            .field("handler", &self.handler.key())
            .field("reference", &self.reference)
            .finish()
    }
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the default handler and the four always-on awards.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_award(Arc::new(DefaultOperation));
        registry.register_award(Arc::new(EntityAward));
        registry.register_award(Arc::new(SubdivisionAward::new(SubdivisionSlot::Primary)));
        registry.register_award(Arc::new(SubdivisionAward::new(SubdivisionSlot::Secondary)));
        registry.register_award(Arc::new(BandModeDiversity));
        registry
    }

    /// Adds `handler` under `key`. Higher priority wins; ties keep the
    /// earlier registration first.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        category: HookCategory,
        priority: i32,
        handler: Arc<dyn Handler>,
    ) {
        let hook = Hook {
            key: key.into(),
            category,
            priority,
            handler,
        };
        let at = self
            .hooks
            .iter()
            .position(|h| h.priority < hook.priority)
            .unwrap_or(self.hooks.len());
        self.hooks.insert(at, hook);
    }

    /// Registers a built-in award under its handler key.
    pub fn register_award(&mut self, handler: Arc<dyn Handler>) {
        let key = handler_hook(handler.key());
        self.register(key, HookCategory::Award, 0, handler);
    }

    /// Registers an activity policy for its activation and hunting types.
    pub fn register_activity(&mut self, policy: ActivityScoringPolicy) {
        let descriptor = policy.descriptor().clone();
        let handler: Arc<dyn Handler> = Arc::new(policy);
        self.register(
            ref_hook(&descriptor.activation_type),
            HookCategory::Activity,
            0,
            Arc::clone(&handler),
        );
        if let Some(hunting) = &descriptor.hunting_type {
            self.register(ref_hook(hunting), HookCategory::Reference, 0, Arc::clone(&handler));
        }
        self.register(handler_hook(&descriptor.key), HookCategory::Reference, 0, handler);
    }

    /// Highest-priority handler registered under `key`.
    pub fn find_best_hook(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.hooks
            .iter()
            .find(|h| h.key == key)
            .map(|h| Arc::clone(&h.handler))
    }

    /// Distinct handlers in `category` with `capability`, priority-ordered.
    pub fn find_hooks(
        &self,
        category: HookCategory,
        capability: Capability,
    ) -> Vec<Arc<dyn Handler>> {
        let mut seen = HashSet::new();
        self.hooks
            .iter()
            .filter(|h| h.category == category)
            .filter(|h| match capability {
                Capability::Any => true,
                Capability::Scoring => h.handler.scorer().is_some(),
                Capability::Summarizing => h.handler.summarizer().is_some(),
            })
            .filter(|h| seen.insert(h.handler.key().to_string()))
            .map(|h| Arc::clone(&h.handler))
            .collect()
    }

    /// Ordered `{handler, ref}` pairs that will score a log under
    /// `operation`.
    pub fn resolve_handlers(
        &self,
        operation: &Operation,
        settings: &Settings,
    ) -> Vec<ResolvedHandler> {
        let mut out: Vec<ResolvedHandler> = Vec::new();
        let mut used: HashSet<String> = HashSet::new();
        let mut score_keys: HashSet<String> = HashSet::new();

        let mut push =
            |out: &mut Vec<ResolvedHandler>, handler: Arc<dyn Handler>, reference: Reference| {
                if handler.scorer().is_none() {
                    return false;
                }
                let resolved = ResolvedHandler { handler, reference };
                if !score_keys.insert(resolved.score_key().to_string()) {
                    return false;
                }
                out.push(resolved);
                true
            };

        for reference in operation.refs.iter().filter(|r| !r.is_blank()) {
            if let Some(handler) = self.find_best_hook(&ref_hook(&reference.ref_type)) {
                let key = handler.key().to_string();
                if used.contains(&key) {
                    continue;
                }
                if push(&mut out, handler, reference.clone()) {
                    used.insert(key);
                }
            }
        }

        if out.is_empty() {
            let handler = self
                .find_best_hook(&handler_hook(DEFAULT_OPERATION_KEY))
                .unwrap_or_else(|| Arc::new(DefaultOperation) as Arc<dyn Handler>);
            used.insert(handler.key().to_string());
            push(&mut out, handler, Reference::of_type(DEFAULT_OPERATION_KEY));
        }

        for handler in self.find_hooks(HookCategory::Activity, Capability::Scoring) {
            if used.contains(handler.key())
                || handler.general_hunting_type(operation, settings).is_none()
            {
                continue;
            }
            let key = handler.key().to_string();
            if push(&mut out, handler, Reference::default()) {
                used.insert(key);
            }
        }

        for key in ALWAYS_ON_KEYS {
            if used.contains(key) {
                continue;
            }
            if let Some(handler) = self.find_best_hook(&handler_hook(key)) {
                if push(&mut out, handler, Reference::default()) {
                    used.insert(key.to_string());
                }
            }
        }

        debug!(
            handlers = ?out.iter().map(ResolvedHandler::score_key).collect::<Vec<_>>(),
            "resolved scoring handlers"
        );
        out
    }
}

/// Free-function form of [`Registry::resolve_handlers`].
pub fn resolve_handlers(
    registry: &Registry,
    operation: &Operation,
    settings: &Settings,
) -> Vec<ResolvedHandler> {
    registry.resolve_handlers(operation, settings)
}
