//! Compiler configuration.

/// Configuration for the resolving grammar compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarConfig {
    /// Map writer enum symbols unknown to the reader onto the reader's
    /// default symbol, when the reader declares one (default: true).
    pub enum_defaults: bool,
    /// Let a reader field match a writer field named by one of the reader
    /// field's aliases (default: true).
    pub field_aliases: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            enum_defaults: true,
            field_aliases: true,
        }
    }
}

impl GrammarConfig {
    /// Create a new GrammarConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable reader enum default resolution.
    pub fn with_enum_defaults(mut self, enabled: bool) -> Self {
        self.enum_defaults = enabled;
        self
    }

    /// Enable or disable alias-based field matching.
    pub fn with_field_aliases(mut self, enabled: bool) -> Self {
        self.field_aliases = enabled;
        self
    }
}
