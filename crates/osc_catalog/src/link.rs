use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const MEDIA_JSON: &str = "application/json";
pub const MEDIA_XML: &str = "application/xml";
pub const MEDIA_HTML: &str = "text/html";

/// Link relation. Unknown relations read from disk are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rel {
    SelfRef,
    Root,
    Parent,
    Child,
    Item,
    Related,
    Via,
    Alternate,
    Other(String),
}

impl Rel {
    pub fn as_str(&self) -> &str {
        match self {
            Rel::SelfRef => "self",
            Rel::Root => "root",
            Rel::Parent => "parent",
            Rel::Child => "child",
            Rel::Item => "item",
            Rel::Related => "related",
            Rel::Via => "via",
            Rel::Alternate => "alternate",
            Rel::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "self" => Rel::SelfRef,
            "root" => Rel::Root,
            "parent" => Rel::Parent,
            "child" => Rel::Child,
            "item" => Rel::Item,
            "related" => Rel::Related,
            "via" => Rel::Via,
            "alternate" => Rel::Alternate,
            other => Rel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Rel::parse(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: Rel,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Optional link metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAttrs {
    pub title: Option<String>,
    pub media_type: Option<String>,
}

impl LinkAttrs {
    pub fn titled(title: impl Into<String>) -> Self {
        LinkAttrs {
            title: Some(title.into()),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// Media type guessed from an href's extension.
pub fn media_type_for(href: &str) -> Option<&'static str> {
    let ext = href.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(MEDIA_JSON),
        "xml" => Some(MEDIA_XML),
        "html" | "htm" => Some(MEDIA_HTML),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rels_round_trip_verbatim() {
        let link: Link =
            serde_json::from_str(r#"{"rel":"license","href":"https://example.org/l"}"#).unwrap();
        assert_eq!(link.rel, Rel::Other("license".to_string()));
        let text = serde_json::to_string(&link).unwrap();
        assert_eq!(text, r#"{"rel":"license","href":"https://example.org/l"}"#);
    }

    #[test]
    fn link_media_type_uses_type_key() {
        let link = Link {
            rel: Rel::Child,
            href: "./a/catalog.json".to_string(),
            media_type: Some(MEDIA_JSON.to_string()),
            title: None,
        };
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["type"], MEDIA_JSON);
        assert_eq!(value["rel"], "child");
    }

    #[test]
    fn media_types_from_extension() {
        assert_eq!(media_type_for("./iso.xml"), Some(MEDIA_XML));
        assert_eq!(media_type_for("images/Ocean.PNG"), Some("image/png"));
        assert_eq!(media_type_for("https://example.org/"), None);
    }
}
