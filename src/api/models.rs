use serde::{Deserialize, Deserializer, Serialize};

/// Detail-fetch representation: `full` populates the parsed payload tree,
/// `raw` populates only the encoded RFC 822 blob.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MessageFormat {
    Full,
    Raw,
}

impl MessageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageFormat::Full => "full",
            MessageFormat::Raw => "raw",
        }
    }
}

/// One entry of a listing page. Replaced by a hydrated [`Message`] as soon as
/// the detail fetches complete.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// One page of the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListPage {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub result_size_estimate: i64,
}

/// A Gmail message as returned by the detail endpoint. Which fields are
/// populated depends on the requested [`MessageFormat`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    // The API encodes epoch-millisecond timestamps as decimal strings.
    #[serde(default, deserialize_with = "i64_from_string")]
    pub internal_date: i64,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub size_estimate: i64,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    #[serde(default)]
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePartBody {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: i64,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

fn i64_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(value) => value.parse().map_err(serde::de::Error::custom),
        StringOrInt::Int(value) => Ok(value),
    }
}
