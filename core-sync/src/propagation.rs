//! Apply-to-all: copies one video's shared fields onto its variants on every
//! other channel.
//!
//! Variants are rows sharing the same `local_id`. An existing variant keeps
//! its remote id, view count, media and thumbnail paths; a missing one is
//! inserted with no remote id and zero views. Channels whose language code has
//! no `languages` row are skipped.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use core_library::models::Video;
use core_library::{
    map_video_fields, ChannelRepository, LanguageRepository, MappingContext, RemoteStats,
    VideoRepository, VideoSource,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Text fields sent through a [`VideoTranslator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatableText {
    pub title: String,
    pub description: String,
    pub tags: String,
}

/// Rewrites a video's text for another language.
#[async_trait]
pub trait VideoTranslator: Send + Sync {
    async fn translate(&self, text: &TranslatableText, target_language: &str)
        -> Result<TranslatableText>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationReport {
    pub updated: Vec<i64>,
    pub inserted: Vec<i64>,
    /// Channels skipped because their language is unknown.
    pub skipped_channels: Vec<i64>,
}

pub struct ApplyToAll {
    videos: VideoRepository,
    channels: ChannelRepository,
    languages: LanguageRepository,
    translator: Option<Arc<dyn VideoTranslator>>,
}

impl ApplyToAll {
    pub fn new(
        videos: VideoRepository,
        channels: ChannelRepository,
        languages: LanguageRepository,
    ) -> Self {
        Self {
            videos,
            channels,
            languages,
            translator: None,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn VideoTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    #[instrument(skip(self))]
    pub async fn apply(&self, source_id: i64) -> Result<PropagationReport> {
        let mut source = self.videos.get(source_id).await?;
        let source_channel = source.channel_id.ok_or_else(|| {
            SyncError::InvalidInput(format!("video {} is not assigned to a channel", source_id))
        })?;

        let local_id = match source.local_id.clone().filter(|id| !id.trim().is_empty()) {
            Some(local_id) => local_id,
            None => {
                let local_id = source.id.to_string();
                self.videos.set_local_id(source.id, &local_id).await?;
                source.local_id = Some(local_id.clone());
                local_id
            }
        };

        let mut report = PropagationReport::default();
        for channel in self.channels.list().await? {
            if channel.id == source_channel {
                continue;
            }
            let Some(language) = self.languages.find_by_code(&channel.language).await? else {
                debug!(channel_id = channel.id, language = %channel.language, "Skipping channel");
                report.skipped_channels.push(channel.id);
                continue;
            };

            let variant_source = match &self.translator {
                Some(translator) => translate_video(translator.as_ref(), &source, &language.code).await,
                None => source.clone(),
            };
            let ctx = MappingContext {
                channel_id: channel.id,
                language_id: Some(language.id),
            };
            let mut fields = map_video_fields(VideoSource::Local(&variant_source), &ctx);

            match self.videos.find_variant(&local_id, channel.id).await? {
                Some(existing) => {
                    self.videos.update_fields(existing.id, fields).await?;
                    report.updated.push(existing.id);
                }
                None => {
                    fields.remote = Some(RemoteStats {
                        views: Some(0),
                        thumbnail_remote: None,
                    });
                    let id = self.videos.insert_fields(fields).await?;
                    report.inserted.push(id);
                }
            }
        }

        info!(
            updated = report.updated.len(),
            inserted = report.inserted.len(),
            skipped = report.skipped_channels.len(),
            "Applied video to all channels"
        );
        Ok(report)
    }
}

/// Copy of `video` with its title, description and tags translated.
///
/// A translation failure leaves the text as it was.
pub async fn translate_video(
    translator: &dyn VideoTranslator,
    video: &Video,
    target_language: &str,
) -> Video {
    let text = TranslatableText {
        title: video.title.clone().unwrap_or_default(),
        description: video.description.clone().unwrap_or_default(),
        tags: video.tags.clone().unwrap_or_default(),
    };

    match translator.translate(&text, target_language).await {
        Ok(translated) => Video {
            title: Some(translated.title),
            description: Some(translated.description),
            tags: Some(translated.tags),
            ..video.clone()
        },
        Err(e) => {
            warn!(video_id = video.id, target_language, error = %e, "Translation failed");
            video.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use core_library::repositories::NewVideo;

    struct Upper;

    #[async_trait]
    impl VideoTranslator for Upper {
        async fn translate(
            &self,
            text: &TranslatableText,
            target_language: &str,
        ) -> Result<TranslatableText> {
            Ok(TranslatableText {
                title: format!("[{}] {}", target_language, text.title),
                description: text.description.to_uppercase(),
                tags: text.tags.clone(),
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl VideoTranslator for Broken {
        async fn translate(&self, _: &TranslatableText, _: &str) -> Result<TranslatableText> {
            Err(SyncError::RemoteApi {
                message: "translation service down".to_string(),
            })
        }
    }

    async fn setup() -> (Arc<dyn bridge_traits::store::RecordStore>, Vec<i64>, i64) {
        let store = test_store().await;
        let account = seed_account(&store).await;
        let en = seed_channel(&store, account, "EN", "en").await;
        let es = seed_channel(&store, account, "ES", "es").await;
        let xx = seed_channel(&store, account, "XX", "klingon").await;

        let videos = VideoRepository::new(store.clone());
        let mut new = NewVideo::for_channel(en, Some(17));
        new.title = "Alps".to_string();
        new.local_id = Some("12".to_string());
        let source = videos.insert(&new).await.unwrap();

        (store, vec![en, es, xx], source)
    }

    fn propagation(store: &Arc<dyn bridge_traits::store::RecordStore>) -> ApplyToAll {
        ApplyToAll::new(
            VideoRepository::new(store.clone()),
            ChannelRepository::new(store.clone()),
            LanguageRepository::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn test_inserts_missing_variants_and_skips_unknown_language() {
        let (store, channels, source) = setup().await;

        let report = propagation(&store).apply(source).await.unwrap();

        assert_eq!(report.inserted.len(), 1);
        assert_eq!(report.skipped_channels, vec![channels[2]]);
        let copy = VideoRepository::new(store.clone())
            .get(report.inserted[0])
            .await
            .unwrap();
        assert_eq!(copy.channel_id, Some(channels[1]));
        assert_eq!(copy.title.as_deref(), Some("Alps"));
        assert_eq!(copy.default_language, Some(19));
        assert_eq!(copy.views, Some(0));
        assert_eq!(copy.remote_id(), None);
    }

    #[tokio::test]
    async fn test_existing_variant_keeps_per_channel_fields() {
        let (store, channels, source) = setup().await;
        let videos = VideoRepository::new(store.clone());
        let mut existing = NewVideo::for_channel(channels[1], Some(19));
        existing.local_id = Some("12".to_string());
        existing.local_path = Some("/m/12-ES.mp4".to_string());
        let variant = videos.insert(&existing).await.unwrap();
        videos.set_remote_id(variant, "yt-es").await.unwrap();

        let report = propagation(&store).apply(source).await.unwrap();

        assert_eq!(report.updated, vec![variant]);
        assert!(report.inserted.is_empty());
        let copy = videos.get(variant).await.unwrap();
        assert_eq!(copy.title.as_deref(), Some("Alps"));
        assert_eq!(copy.remote_id(), Some("yt-es"));
        assert_eq!(copy.local_path.as_deref(), Some("/m/12-ES.mp4"));
    }

    #[tokio::test]
    async fn test_translator_rewrites_text() {
        let (store, _, source) = setup().await;

        let report = propagation(&store)
            .with_translator(Arc::new(Upper))
            .apply(source)
            .await
            .unwrap();

        let copy = VideoRepository::new(store.clone())
            .get(report.inserted[0])
            .await
            .unwrap();
        assert_eq!(copy.title.as_deref(), Some("[es] Alps"));
    }

    #[tokio::test]
    async fn test_failed_translation_keeps_source_text() {
        let (store, _, source) = setup().await;
        let video = VideoRepository::new(store.clone()).get(source).await.unwrap();

        let translated = translate_video(&Broken, &video, "es").await;

        assert_eq!(translated, video);
    }
}
