use std::fmt;

/// Which candidate version of a chapter is being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Original,
    Translated,
    Personalized,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Original => "original",
            LayerKind::Translated => "translated",
            LayerKind::Personalized => "personalized",
        };
        write!(f, "{name}")
    }
}

/// The layers known for one chapter visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayers {
    pub original: String,
    pub translated: Option<String>,
    pub personalized: Option<String>,
}

impl ContentLayers {
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translated: None,
            personalized: None,
        }
    }

    /// Picks the layer to display: personalized, then translated (only for a
    /// non-default locale), then original.
    pub fn effective(&self, locale_is_default: bool) -> (LayerKind, &str) {
        if let Some(text) = &self.personalized {
            return (LayerKind::Personalized, text);
        }
        match &self.translated {
            Some(text) if !locale_is_default => (LayerKind::Translated, text),
            _ => (LayerKind::Original, &self.original),
        }
    }
}

/// Snapshot of what the page shell should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveContent {
    pub chapter_id: String,
    pub locale: String,
    pub epoch: u64,
    pub source: LayerKind,
    pub text: String,
}
