//! Message announcing the article list to the embedding host page.

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::content::lazy_load_images;

pub const PAYLOAD_EVENT_ID: &str = "deskpro-apps.message";
pub const PAYLOAD_APP_EVENT_ID: &str = "newsData";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentFeedPayload {
    pub event_id: String,
    pub app_name: String,
    pub app_event_id: String,
    pub news: Vec<Article>,
}

impl ParentFeedPayload {
    /// Build the payload, or `None` when there is nothing to announce.
    ///
    /// The host renders every description at once, so images are marked for
    /// lazy loading.
    pub fn build(app_name: impl Into<String>, news: &[Article]) -> Option<Self> {
        if news.is_empty() {
            return None;
        }
        Some(Self {
            event_id: PAYLOAD_EVENT_ID.to_string(),
            app_name: app_name.into(),
            app_event_id: PAYLOAD_APP_EVENT_ID.to_string(),
            news: news
                .iter()
                .map(|article| Article {
                    description: lazy_load_images(&article.description),
                    ..article.clone()
                })
                .collect(),
        })
    }
}
