//! Loader-side contract: a host hands over the text of a script block tagged
//! with a content type and gets back the source it should execute.

use std::collections::BTreeMap;

use gotojs_contracts::GOTO_CONTENT_TYPE;

/// Pure source-to-source callback.
pub trait SourceHook: Send + Sync {
    fn transform(&self, src: &str) -> String;
}

impl<F> SourceHook for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn transform(&self, src: &str) -> String {
        self(src)
    }
}

/// The goto rewrite with its permissive defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct GotoHook;

impl SourceHook for GotoHook {
    fn transform(&self, src: &str) -> String {
        crate::transform::transform(src)
    }
}

/// Hooks keyed by normalized content type.
#[derive(Default)]
pub struct HookRegistry {
    hooks: BTreeMap<String, Box<dyn SourceHook>>,
}

/// Lowercased media type with any `;` parameters dropped.
fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goto() -> Self {
        let mut reg = Self::new();
        reg.register(GOTO_CONTENT_TYPE, GotoHook);
        reg
    }

    /// Returns the hook previously registered for the same content type.
    pub fn register(
        &mut self,
        content_type: &str,
        hook: impl SourceHook + 'static,
    ) -> Option<Box<dyn SourceHook>> {
        self.hooks.insert(normalize(content_type), Box::new(hook))
    }

    pub fn handles(&self, content_type: &str) -> bool {
        self.hooks.contains_key(&normalize(content_type))
    }

    /// `None` when no hook claims `content_type`; the block is not ours.
    pub fn dispatch(&self, content_type: &str, src: &str) -> Option<String> {
        self.hooks
            .get(&normalize(content_type))
            .map(|hook| hook.transform(src))
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("content_types", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
