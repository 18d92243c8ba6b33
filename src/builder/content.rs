use super::bridge_builder::BridgeBuilder;

impl BridgeBuilder {
    /// Sets the user for chat queries and personalization.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.state.config.content.user_id = Some(user_id.into());
        self
    }

    /// Sets the locale that is displayed untranslated.
    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.state.config.content.default_locale = locale.into();
        self
    }

    /// Enables or disables fetching the personalized layer.
    pub fn personalization(mut self, enabled: bool) -> Self {
        self.state.config.content.personalization_enabled = enabled;
        self
    }
}
