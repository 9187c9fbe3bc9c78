//! Media tags and merge semantics.

use serde::{Deserialize, Serialize};

/// Value-type media metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    /// Track title.
    pub title: Option<String>,
    /// Artist.
    pub artist: Option<String>,
    /// Album.
    pub album: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Track number.
    pub track: Option<u32>,
    /// Cover art, opaque (URL or raw bytes encoded by the caller).
    pub cover: Option<String>,
    /// Id of the browser that produced these tags.
    pub browser_id: Option<String>,
    /// Browser-scoped media id.
    pub media_id: Option<String>,
}

/// Bitfield of fields to skip when merging one `Tags` into another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MergeSkip {
    /// Skip `title`.
    pub title: bool,
    /// Skip `artist`.
    pub artist: bool,
    /// Skip `album`.
    pub album: bool,
    /// Skip `genre`.
    pub genre: bool,
    /// Skip `track`.
    pub track: bool,
    /// Skip `cover` — set to preserve an initial cover across updates.
    pub cover: bool,
    /// Skip `browser_id`.
    pub browser_id: bool,
    /// Skip `media_id`.
    pub media_id: bool,
}

impl Tags {
    /// Merge `incoming` fields into `self`, honoring `skip`. A field present
    /// in `incoming` and not skipped overwrites `self`'s value; `None`
    /// fields in `incoming` never clear an existing value.
    pub fn merge(&mut self, incoming: &Tags, skip: MergeSkip) {
        macro_rules! merge_field {
            ($field:ident) => {
                if !skip.$field {
                    if let Some(value) = incoming.$field.clone() {
                        self.$field = Some(value);
                    }
                }
            };
        }
        merge_field!(title);
        merge_field!(artist);
        merge_field!(album);
        merge_field!(genre);
        merge_field!(track);
        merge_field!(cover);
        merge_field!(browser_id);
        merge_field!(media_id);
    }
}
