/// Chapter id for a docs path: its last non-empty segment.
///
/// `/docs/intro-to-physical-ai/` yields `intro-to-physical-ai`; the root path
/// has no chapter.
pub fn chapter_id_from_path(path: &str) -> Option<&str> {
    path.split('/').filter(|s| !s.is_empty()).next_back()
}

/// Rewrites `path` for `target_locale`.
///
/// A leading segment naming one of `locales` is replaced; otherwise the
/// locale is inserted in front.
pub fn localized_path(path: &str, target_locale: &str, locales: &[&str]) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first().is_some_and(|first| locales.contains(first)) {
        segments[0] = target_locale;
    } else {
        segments.insert(0, target_locale);
    }
    let mut localized = format!("/{}", segments.join("/"));
    if path.ends_with('/') && !localized.ends_with('/') {
        localized.push('/');
    }
    localized
}
