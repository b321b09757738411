use hashbrown::HashMap;

/// Pre-fetched decoration data.
pub trait LookupSource: Send + Sync {
    /// Display name for a program reference.
    fn reference_name(&self, _ref_type: &str, _reference: &str) -> Option<String> {
        None
    }

    /// Entity prefix for a callsign.
    fn entity_for_call(&self, _call: &str) -> Option<String> {
        None
    }
}

/// Source that knows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLookup;

impl LookupSource for NoLookup {}

/// In-memory tables, typically filled from a cached reference database.
#[derive(Debug, Default, Clone)]
pub struct StaticLookup {
    names: HashMap<(String, String), String>,
    prefixes: Vec<(String, String)>,
}

impl StaticLookup {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference name.
    pub fn with_name(
        mut self,
        ref_type: impl Into<String>,
        reference: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.names
            .insert((ref_type.into(), reference.into()), name.into());
        self
    }

    /// Maps callsigns starting with `call_prefix` to `entity`.
    pub fn with_prefix(
        mut self,
        call_prefix: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        self.prefixes.push((call_prefix.into(), entity.into()));
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }
}

impl LookupSource for StaticLookup {
    fn reference_name(&self, ref_type: &str, reference: &str) -> Option<String> {
        self.names
            .get(&(ref_type.to_string(), reference.to_string()))
            .cloned()
    }

    fn entity_for_call(&self, call: &str) -> Option<String> {
        let call = call.to_ascii_uppercase();
        self.prefixes
            .iter()
            .find(|(prefix, _)| call.starts_with(prefix.as_str()))
            .map(|(_, entity)| entity.clone())
    }
}
