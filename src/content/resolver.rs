//! Race-safe resolution of the chapter content to display.
//!
//! Every navigation or locale change stamps a new epoch for the chapter.
//! Layer fetches capture the epoch they were issued under and are dropped on
//! completion unless that epoch is still current and still on screen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::ContentBackend;
use crate::config::ContentConfig;

use super::layers::{ContentLayers, EffectiveContent, LayerKind};

/// One navigation or locale-change event, stamped with its epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContentRequest {
    pub chapter_id: String,
    pub locale: String,
    pub original_content: String,
    pub request_epoch: u64,
}

/// What happened to one layer fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFetch {
    /// Not needed for this request
    Skipped,
    Applied,
    /// Arrived after the request was superseded
    Discarded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveReport {
    pub translated: LayerFetch,
    pub personalized: LayerFetch,
}

#[derive(Debug)]
struct View {
    request: ChapterContentRequest,
    layers: ContentLayers,
}

#[derive(Debug, Default)]
struct ResolverState {
    epochs: HashMap<String, u64>,
    view: Option<View>,
}

impl ResolverState {
    /// The view, if `request` is both the chapter's current epoch and the
    /// request on screen.
    fn view_for(&mut self, request: &ChapterContentRequest) -> Option<&mut View> {
        if self.epochs.get(&request.chapter_id) != Some(&request.request_epoch) {
            return None;
        }
        self.view.as_mut().filter(|view| {
            view.request.chapter_id == request.chapter_id
                && view.request.request_epoch == request.request_epoch
        })
    }
}

/// Determines the single effective content for the chapter on screen.
pub struct ContentResolver {
    backend: Arc<dyn ContentBackend>,
    cfg: ContentConfig,
    state: Mutex<ResolverState>,
    revision: watch::Sender<u64>,
}

impl ContentResolver {
    pub fn new(backend: Arc<dyn ContentBackend>, cfg: ContentConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            cfg,
            state: Mutex::new(ResolverState::default()),
            revision,
        }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.cfg
    }

    /// Receiver that ticks whenever the displayed content changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Records a navigation: bumps the chapter's epoch and shows the original
    /// content until layers arrive.
    pub fn navigate(
        &self,
        chapter_id: impl Into<String>,
        locale: impl Into<String>,
        original_content: impl Into<String>,
    ) -> ChapterContentRequest {
        let chapter_id = chapter_id.into();
        let original_content = original_content.into();
        let mut state = self.lock();
        let epoch = state.epochs.entry(chapter_id.clone()).or_insert(0);
        *epoch += 1;
        let request = ChapterContentRequest {
            chapter_id,
            locale: locale.into(),
            original_content: original_content.clone(),
            request_epoch: *epoch,
        };
        state.view = Some(View {
            request: request.clone(),
            layers: ContentLayers::new(original_content),
        });
        drop(state);
        log::debug!(
            "navigated to {} ({}) at epoch {}",
            request.chapter_id,
            request.locale,
            request.request_epoch
        );
        self.bump();
        request
    }

    /// Fetches the layers `request` needs and applies the ones that are
    /// still current on arrival.
    ///
    /// Personalization starts alongside translation and builds on the
    /// translated text only if it has already arrived by then.
    pub async fn resolve(&self, request: &ChapterContentRequest) -> ResolveReport {
        let translate = async {
            if self.is_default_locale(&request.locale) {
                return LayerFetch::Skipped;
            }
            match self
                .backend
                .translate(&request.chapter_id, &request.locale)
                .await
            {
                Ok(text) => self.apply(request, LayerKind::Translated, text),
                Err(err) => {
                    log::warn!(
                        "translation of {} to {} failed: {err}",
                        request.chapter_id,
                        request.locale
                    );
                    LayerFetch::Failed
                }
            }
        };

        let personalize = async {
            let Some(user_id) = self.cfg.personalization_user() else {
                return LayerFetch::Skipped;
            };
            let base = self
                .current_translation(request)
                .unwrap_or_else(|| request.original_content.clone());
            match self
                .backend
                .personalize(user_id, &request.chapter_id, &base)
                .await
            {
                Ok(text) => self.apply(request, LayerKind::Personalized, text),
                Err(err) => {
                    log::warn!("personalization of {} failed: {err}", request.chapter_id);
                    LayerFetch::Failed
                }
            }
        };

        let (translated, personalized) = futures::join!(translate, personalize);
        ResolveReport {
            translated,
            personalized,
        }
    }

    /// [`navigate`](Self::navigate) followed by [`resolve`](Self::resolve).
    pub async fn show(
        &self,
        chapter_id: impl Into<String>,
        locale: impl Into<String>,
        original_content: impl Into<String>,
    ) -> ResolveReport {
        let request = self.navigate(chapter_id, locale, original_content);
        self.resolve(&request).await
    }

    /// Navigates now and resolves on a background task, for UI event
    /// handlers that must not wait.
    pub fn spawn_show(
        self: &Arc<Self>,
        chapter_id: impl Into<String>,
        locale: impl Into<String>,
        original_content: impl Into<String>,
    ) -> JoinHandle<ResolveReport> {
        let request = self.navigate(chapter_id, locale, original_content);
        let resolver = Arc::clone(self);
        tokio::spawn(async move { resolver.resolve(&request).await })
    }

    /// Whether `request` is still the one on screen.
    pub fn is_current(&self, request: &ChapterContentRequest) -> bool {
        self.lock().view_for(request).is_some()
    }

    /// What should be rendered right now, if any chapter was navigated to.
    pub fn effective(&self) -> Option<EffectiveContent> {
        let state = self.lock();
        let view = state.view.as_ref()?;
        let (source, text) = view
            .layers
            .effective(self.is_default_locale(&view.request.locale));
        Some(EffectiveContent {
            chapter_id: view.request.chapter_id.clone(),
            locale: view.request.locale.clone(),
            epoch: view.request.request_epoch,
            source,
            text: text.to_string(),
        })
    }

    /// Layers received so far for the chapter on screen.
    pub fn layers(&self) -> Option<ContentLayers> {
        self.lock().view.as_ref().map(|view| view.layers.clone())
    }

    fn current_translation(&self, request: &ChapterContentRequest) -> Option<String> {
        self.lock()
            .view_for(request)
            .and_then(|view| view.layers.translated.clone())
    }

    fn apply(&self, request: &ChapterContentRequest, kind: LayerKind, text: String) -> LayerFetch {
        let mut state = self.lock();
        let Some(view) = state.view_for(request) else {
            log::warn!(
                "discarding stale {kind} layer for {} (epoch {})",
                request.chapter_id,
                request.request_epoch
            );
            return LayerFetch::Discarded;
        };
        match kind {
            LayerKind::Translated => view.layers.translated = Some(text),
            LayerKind::Personalized => view.layers.personalized = Some(text),
            LayerKind::Original => view.layers.original = text,
        }
        drop(state);
        log::debug!(
            "applied {kind} layer for {} (epoch {})",
            request.chapter_id,
            request.request_epoch
        );
        self.bump();
        LayerFetch::Applied
    }

    fn is_default_locale(&self, locale: &str) -> bool {
        locale == self.cfg.default_locale
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
