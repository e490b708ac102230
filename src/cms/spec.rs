//! Typed record specs, as they appear in a CMS document.
use serde::{Deserialize, Deserializer};

use crate::error::CmsError;
use crate::model::{Block, ChannelRef, Page};

/// One block to create, or to merge into existing blocks when `update` is set.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BlockSpec {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_file: Option<String>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub stores: Option<Vec<ChannelRef>>,
    #[serde(default, deserialize_with = "de_flag")]
    pub update: bool,
}

/// One page, upserted by identifier.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PageSpec {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_file: Option<String>,
    #[serde(default)]
    pub content_heading: Option<String>,
    #[serde(default)]
    pub root_template: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub stores: Option<Vec<ChannelRef>>,
}

/// A whole document: `{"blocks": [...], "pages": [...]}`, both optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CmsDocument {
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
    #[serde(default)]
    pub pages: Vec<PageSpec>,
}

/// The `content_file` reference, if one is set and non-empty.
pub(crate) fn content_file(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|f| !f.is_empty())
}

fn require_identifier(kind: &'static str, identifier: &str) -> Result<(), CmsError> {
    if identifier.trim().is_empty() {
        return Err(CmsError::MissingField {
            kind,
            identifier: identifier.to_string(),
            field: "identifier",
        });
    }
    Ok(())
}

fn require_content(
    kind: &'static str,
    identifier: &str,
    content: Option<String>,
) -> Result<String, CmsError> {
    content.ok_or_else(|| CmsError::MissingField {
        kind,
        identifier: identifier.to_string(),
        field: "content",
    })
}

impl BlockSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CmsError> {
        require_identifier("block", &self.identifier)
    }

    /// A fresh, unsaved block built from this spec.
    pub(crate) fn to_new_block(&self, channels: Vec<i64>) -> Result<Block, CmsError> {
        let mut block = Block::new(self.identifier.clone());
        block.content = require_content("block", &self.identifier, self.content.clone())?;
        block.title = self.title.clone().unwrap_or_default();
        block.is_active = self.is_active.unwrap_or(true);
        block.channels = channels;
        Ok(block)
    }

    /// Overwrite block fields with the ones this `BlockSpec` sets. Channels are
    /// left alone.
    pub(crate) fn merge_into(&self, block: &mut Block) {
        if let Some(title) = &self.title {
            block.title = title.clone();
        }
        if let Some(content) = &self.content {
            block.content = content.clone();
        }
        if let Some(is_active) = self.is_active {
            block.is_active = is_active;
        }
    }
}

impl PageSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CmsError> {
        require_identifier("page", &self.identifier)
    }

    /// Overwrite page fields with the ones this `PageSpec` sets.
    pub(crate) fn merge_into(&self, page: &mut Page) -> Result<(), CmsError> {
        match &self.content {
            Some(content) => page.content = content.clone(),
            None if page.id.is_none() => {
                return Err(CmsError::MissingField {
                    kind: "page",
                    identifier: self.identifier.clone(),
                    field: "content",
                });
            }
            None => {}
        }
        if let Some(title) = &self.title {
            page.title = title.clone();
        }
        if let Some(is_active) = self.is_active {
            page.is_active = is_active;
        }
        let optional = [
            (&self.content_heading, &mut page.content_heading),
            (&self.root_template, &mut page.root_template),
            (&self.meta_keywords, &mut page.meta_keywords),
            (&self.meta_description, &mut page.meta_description),
        ];
        for (value, slot) in optional {
            if value.is_some() {
                *slot = value.clone();
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RawFlag {
    fn truthy(self) -> bool {
        match self {
            RawFlag::Bool(b) => b,
            RawFlag::Int(i) => i != 0,
            RawFlag::Text(s) => {
                !matches!(s.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
            }
        }
    }
}

/// Accepts `true`/`false`, `0`/`1`, and their string forms. `null` is false.
fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<RawFlag>::deserialize(d)?
        .map(RawFlag::truthy)
        .unwrap_or(false))
}

fn de_opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Option::<RawFlag>::deserialize(d)?.map(RawFlag::truthy))
}
