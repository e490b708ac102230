use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Id of the reserved administrative channel, created by the initial migration.
pub const ADMIN_CHANNEL_ID: i64 = 0;
/// Code of the reserved administrative channel.
pub const ADMIN_CHANNEL_CODE: &str = "admin";

/// A named distribution target ("store") that content can be scoped to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// How a record spec refers to a channel: by code or by numeric id.
///
/// Numeric strings such as `"1"` are ids, not codes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChannelRef {
    Id(i64),
    Code(String),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "#{}", id),
            ChannelRef::Code(code) => f.write_str(code),
        }
    }
}

impl From<&str> for ChannelRef {
    fn from(code: &str) -> Self {
        match code.trim().parse::<i64>() {
            Ok(id) => ChannelRef::Id(id),
            Err(_) => ChannelRef::Code(code.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ChannelRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(i64),
            Code(String),
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Id(id) => ChannelRef::Id(id),
            Raw::Code(code) => ChannelRef::from(code.as_str()),
        })
    }
}

impl From<i64> for ChannelRef {
    fn from(id: i64) -> Self {
        ChannelRef::Id(id)
    }
}

/// A static content block. `id` is `None` until the block is first saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub id: Option<i64>,
    pub identifier: String,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub channels: Vec<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Block {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            title: String::new(),
            content: String::new(),
            is_active: true,
            channels: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// True when the block is assigned to at least one of `channels`.
    pub fn serves_any(&self, channels: &[i64]) -> bool {
        self.channels.iter().any(|c| channels.contains(c))
    }
}

/// A CMS page. Pages are unique by identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub id: Option<i64>,
    pub identifier: String,
    pub title: String,
    pub content: String,
    pub content_heading: Option<String>,
    pub root_template: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub is_active: bool,
    pub channels: Vec<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            title: String::new(),
            content: String::new(),
            content_heading: None,
            root_template: None,
            meta_keywords: None,
            meta_description: None,
            is_active: true,
            channels: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Result of loading one block spec.
///
/// Create mode always yields exactly one new block; update mode yields every
/// existing block that was touched, possibly none.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockOutcome {
    Created(Block),
    Updated(Vec<Block>),
}

impl BlockOutcome {
    pub fn blocks(&self) -> Vec<&Block> {
        match self {
            BlockOutcome::Created(block) => vec![block],
            BlockOutcome::Updated(blocks) => blocks.iter().collect(),
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, BlockOutcome::Created(_))
    }
}

/// Everything produced by loading a document.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CmsReport {
    pub pages: Vec<Page>,
    pub blocks: Vec<BlockOutcome>,
}

impl CmsReport {
    /// Number of block records written (created or updated).
    pub fn blocks_written(&self) -> usize {
        self.blocks.iter().map(|o| o.blocks().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ref_accepts_codes_and_ids() {
        let refs: Vec<ChannelRef> = serde_json::from_str(r#"["admin", 3, "default"]"#).unwrap();
        assert_eq!(
            refs,
            vec![
                ChannelRef::Code("admin".into()),
                ChannelRef::Id(3),
                ChannelRef::Code("default".into()),
            ]
        );
    }

    #[test]
    fn numeric_strings_are_ids() {
        let refs: Vec<ChannelRef> = serde_json::from_str(r#"["1", " 2 ", "fr", "1a"]"#).unwrap();
        assert_eq!(
            refs,
            vec![
                ChannelRef::Id(1),
                ChannelRef::Id(2),
                ChannelRef::Code("fr".into()),
                ChannelRef::Code("1a".into()),
            ]
        );
        assert_eq!(ChannelRef::from("0"), ChannelRef::Id(0));
    }

    #[test]
    fn serves_any_checks_overlap() {
        let mut block = Block::new("footer");
        block.channels = vec![1, 2];
        assert!(block.serves_any(&[2, 5]));
        assert!(!block.serves_any(&[3]));
        assert!(!block.serves_any(&[]));
    }

    #[test]
    fn created_outcome_serializes_as_single_record() {
        let outcome = BlockOutcome::Created(Block::new("b1"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["identifier"], "b1");

        let outcome = BlockOutcome::Updated(vec![]);
        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value.as_array().unwrap().is_empty());
    }
}
