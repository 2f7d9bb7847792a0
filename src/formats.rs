use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One crawled page. Paths are relative to the `wp` snapshot directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub path: String,
    pub url: String,
    pub retrieved_at: String,
    pub html_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_path: Option<String>,
    pub header_path: String,
    pub footer_path: String,
    pub title: String,
    pub description: String,
    pub body_class: String,
    pub head_tags: Vec<HeadTag>,
}

/// A `<head>` element kept by the crawler, in source document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum HeadTag {
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    Style {
        css: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media: Option<String>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    Script {
        attributes: IndexMap<String, AttrValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

/// Attribute value; bare attributes such as `async` are stored as `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            AttrValue::Flag(_) => None,
        }
    }
}

/// Compiled page consumed by the web layer. Field names are a fixed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub path: String,
    pub title: String,
    pub description: String,
    pub body_class: String,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub html: String,
    pub css: Vec<String>,
    pub structured_data: Vec<String>,
    pub hubspot_forms: Vec<HubspotForm>,
    pub hubspot_meetings: Vec<HubspotMeeting>,
    pub scripts: Vec<ScriptRecord>,
}

/// Pages keyed by normalized path, in crawl order.
pub type PagesDocument = IndexMap<String, PageDocument>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubspotForm {
    pub portal_id: String,
    pub form_id: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubspotMeeting {
    pub selector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Per-tab preview images of a look. All five keys are always written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Previews {
    pub desktop: Vec<String>,
    pub mobile: Vec<String>,
    pub print: Vec<String>,
    pub promotional: Vec<String>,
    pub social: Vec<String>,
}

impl Previews {
    pub fn is_empty(&self) -> bool {
        self.desktop.is_empty()
            && self.mobile.is_empty()
            && self.print.is_empty()
            && self.promotional.is_empty()
            && self.social.is_empty()
    }

    pub fn slot_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        match key {
            "desktop" => Some(&mut self.desktop),
            "mobile" => Some(&mut self.mobile),
            "print" => Some(&mut self.print),
            "promotional" => Some(&mut self.promotional),
            "social" => Some(&mut self.social),
            _ => None,
        }
    }
}
