//! Episode upload and podcast feed publication.
//!
//! The feed document is rebuilt from a full listing of audio objects on
//! every publish (newest first), serialized as RSS 2.0 with iTunes channel
//! extensions, and written to a fixed filename in the show's folder:
//! created if absent, updated in place otherwise. When a Gist mirror is
//! configured the same document is pushed there as well.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rss::extension::itunes::{
    ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder, ITunesOwnerBuilder,
};
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, ItemBuilder};
use tracing::{info, warn};

use crate::adapters::{EpisodeStore, FeedMirror, StoredObject};
use crate::config::ShowConfig;
use crate::core::retry::{run_with_retry, RetryPolicy};

const FEED_MIME: &str = "application/rss+xml";

/// Publishes episodes and the aggregate feed for a show.
pub struct Publisher {
    store: Arc<dyn EpisodeStore>,
    /// Feed mirrors keyed by show id. Shows without a configured mirror
    /// simply publish to the store alone.
    mirrors: HashMap<String, Arc<dyn FeedMirror>>,
    retry: RetryPolicy,
}

impl Publisher {
    pub fn new(
        store: Arc<dyn EpisodeStore>,
        mirrors: HashMap<String, Arc<dyn FeedMirror>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            mirrors,
            retry,
        }
    }

    /// Upload a stitched episode and make it publicly readable.
    ///
    /// The upload itself is retried; a remote object is only useful once it
    /// is both present and readable, so a permission failure surfaces as an
    /// upload failure to the caller.
    pub async fn upload_episode(
        &self,
        file: &Path,
        folder_id: &str,
        name: &str,
    ) -> Result<String> {
        let id = run_with_retry(&self.retry, "upload_episode", || {
            self.store.upload(file, folder_id, name)
        })
        .await?;

        self.store.set_public(&id).await?;

        info!(name, id, "uploaded episode");
        Ok(id)
    }

    /// Rebuild and republish the show's aggregate feed document.
    pub async fn republish_feed(&self, show: &ShowConfig) -> Result<()> {
        let folder_id = &show.drive.folder_id;
        let rss_filename = &show.podcast.rss_filename;

        info!(feed = %rss_filename, "regenerating podcast feed");

        let objects = self.store.list_audio(folder_id).await?;
        let content = build_feed_xml(&objects, show, &|id| self.store.public_url(id));

        match self.store.find_by_name(folder_id, rss_filename).await? {
            Some(existing_id) => {
                self.store
                    .update_bytes(&existing_id, content.as_bytes(), FEED_MIME)
                    .await
                    .context("Failed to update feed document")?;
            }
            None => {
                let id = self
                    .store
                    .upload_bytes(content.as_bytes(), folder_id, rss_filename, FEED_MIME)
                    .await
                    .context("Failed to create feed document")?;
                self.store.set_public(&id).await?;
            }
        }

        info!(feed = %rss_filename, episodes = objects.len(), "feed republished");

        // The mirror is a convenience copy; its failure never fails the
        // publish, the store already has the fresh document.
        if let Some(mirror) = self.mirrors.get(&show.id) {
            match mirror.push(rss_filename, &content).await {
                Ok(()) => info!(feed = %rss_filename, "feed mirrored"),
                Err(err) => {
                    warn!(feed = %rss_filename, error = %err, "feed mirror push failed")
                }
            }
        }

        Ok(())
    }
}

/// Serialize stored audio objects into a podcast RSS 2.0 document.
///
/// The rss crate's writer escapes reserved characters exactly once, so
/// titles with `&`, `<` and friends survive a parse round-trip unchanged.
pub fn build_feed_xml(
    objects: &[StoredObject],
    show: &ShowConfig,
    link_for: &dyn Fn(&str) -> String,
) -> String {
    let podcast = &show.podcast;

    let owner = ITunesOwnerBuilder::default()
        .name(Some("Feedcast".to_string()))
        .email(Some(podcast.email.clone()))
        .build();

    let itunes_channel = ITunesChannelExtensionBuilder::default()
        .author(Some("Feedcast".to_string()))
        .summary(Some(podcast.description.clone()))
        .explicit(Some("no".to_string()))
        .block(Some("Yes".to_string()))
        .owner(Some(owner))
        .build();

    let items: Vec<rss::Item> = objects
        .iter()
        .map(|object| {
            let enclosure = EnclosureBuilder::default()
                .url(link_for(&object.id))
                .length(object.size.unwrap_or(0).to_string())
                .mime_type("audio/mpeg".to_string())
                .build();

            let guid = GuidBuilder::default()
                .value(object.id.clone())
                .permalink(false)
                .build();

            let itunes_item = ITunesItemExtensionBuilder::default()
                .summary(Some(object.name.clone()))
                .build();

            ItemBuilder::default()
                .title(Some(object.name.clone()))
                .description(Some(object.name.clone()))
                .enclosure(Some(enclosure))
                .guid(Some(guid))
                .pub_date(object.created_time.map(|t| t.to_rfc2822()))
                .itunes_ext(Some(itunes_item))
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(podcast.title.clone())
        .description(podcast.description.clone())
        .link(format!(
            "https://drive.google.com/drive/folders/{}",
            show.drive.folder_id
        ))
        .language(Some("en-us".to_string()))
        .itunes_ext(Some(itunes_channel))
        .items(items)
        .build();

    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", channel)
}
