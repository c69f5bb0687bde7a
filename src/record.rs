// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Follow list data structures.
//!
//! A [`FollowRecord`] is the normalized, persisted form of a followed entity.
//! It is projected out of a richer [`FollowSource`] at mutation time.
//!
//! # Example
//!
//! ```
//! use follow_sync::{FollowRecord, FollowSource};
//!
//! let source = FollowSource::new("u-42", "Ada", "Mathematician")
//!     .with_image_url("https://img.example/ada.png");
//!
//! let record = FollowRecord::from_source(&source, 1_700_000_000_000);
//! assert_eq!(record.id, "u-42");
//! assert_eq!(record.url, "https://img.example/ada.png");
//! assert_eq!(record.time, 1_700_000_000_000);
//! ```

use serde::{Deserialize, Serialize};

/// A followed entity as stored locally and carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowRecord {
    /// Stable identity key
    pub id: String,
    pub name: String,
    /// Free text, may be empty
    pub bio: String,
    /// Avatar URL derived from the source's image
    pub url: String,
    /// Local mutation timestamp (epoch millis)
    pub time: i64,
}

impl FollowRecord {
    /// Project a source object into a record stamped with `time`.
    #[must_use]
    pub fn from_source(source: &FollowSource, time: i64) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            bio: source.bio.clone(),
            url: source.image.url.clone(),
            time,
        }
    }
}

/// Image attached to a [`FollowSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    #[serde(default)]
    pub url: String,
}

/// The richer object a caller follows (e.g. a user profile from an API).
///
/// Only `id`, `name`, `bio` and `image.url` survive into a [`FollowRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowSource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image: SourceImage,
}

impl FollowSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bio: bio.into(),
            image: SourceImage::default(),
        }
    }

    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image.url = url.into();
        self
    }
}

/// The whole collection as carried on the wire: a collection timestamp
/// (the sender's Clock Marker) plus every record, in no particular order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowSnapshot {
    pub time: i64,
    pub users: Vec<FollowRecord>,
}

impl FollowSnapshot {
    pub fn new(time: i64, users: Vec<FollowRecord>) -> Self {
        Self { time, users }
    }

    /// Number of records carried
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
