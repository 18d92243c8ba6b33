mod layers;
mod resolver;
mod routing;

pub use layers::{ContentLayers, EffectiveContent, LayerKind};
pub use resolver::{ChapterContentRequest, ContentResolver, LayerFetch, ResolveReport};
pub use routing::{chapter_id_from_path, localized_path};
