use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_db::Record;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::listing::{Listable, SortKey};
use crate::utils::text::word_count;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct BlogPost {
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    pub slug: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub likes: u64,
    pub views: u64,
    pub comments: u64,
    pub read_time_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minutes at 200 words per minute, never below one.
pub fn read_time_minutes(content: &str) -> u32 {
    (word_count(content) / WORDS_PER_MINUTE).max(1) as u32
}

impl BlogPost {
    pub fn set_published(&mut self, published: bool) {
        if published && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
        self.published = published;
    }
}

impl Record for BlogPost {
    const COLLECTION: &'static str = "blogs";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Listable for BlogPost {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.excerpt.as_str(),
            self.author.as_str(),
            self.category.as_str(),
        ];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn status_facet(&self) -> Option<&str> {
        Some(if self.published { "published" } else { "draft" })
    }

    fn category_facet(&self) -> Option<&str> {
        Some(self.category.as_str())
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "title" => Some(SortKey::text(&self.title)),
            "author" => Some(SortKey::text(&self.author)),
            "likes" => Some(SortKey::Number(self.likes as f64)),
            "views" => Some(SortKey::Number(self.views as f64)),
            "published_at" => Some(SortKey::Time(self.published_at.unwrap_or(self.created_at))),
            "created_at" => Some(SortKey::Time(self.created_at)),
            "updated_at" => Some(SortKey::Time(self.updated_at)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Counters {
    pub likes: u64,
    pub views: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_time_rounds_down_with_a_floor_of_one() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(199)), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(450)), 2);
    }

    #[test]
    fn first_publish_stamps_published_at() {
        let mut post = BlogPost::default();
        post.set_published(true);
        let stamped = post.published_at;
        assert!(stamped.is_some());

        post.set_published(false);
        post.set_published(true);
        assert_eq!(post.published_at, stamped);
    }
}
