use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Serialize, Serializer};

use crate::api::models::{Message, MessageHeader, MessagePart};
use crate::error::{AppError, AppResult};

/// Gmail emits padded base64url for body payloads and the raw blob, but
/// clients should accept either padding style.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One of the four output shapes, each carrying only its own fields. The
/// shape decides which message fields survive and whether a raw-blob decode
/// failure is fatal.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Projection {
    Raw(RawArea),
    Easy(EasyArea),
    Small(SmallArea),
    All(AllArea),
}

impl Projection {
    pub fn to_json(&self) -> AppResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_txt(&self) -> Vec<u8> {
        let text = match self {
            Projection::Raw(area) => area.text(),
            Projection::Easy(area) => area.text(),
            Projection::Small(area) => area.text(),
            Projection::All(area) => area.text(),
        };
        text.into_bytes()
    }
}

/// Projects a hydrated message into the named shape. `raw` and `all` fail
/// when the raw blob does not decode; `easy` and `small` never fail.
pub fn project(message: &Message, area: &str) -> AppResult<Projection> {
    match area {
        "raw" => Ok(Projection::Raw(project_raw(message)?)),
        "easy" => Ok(Projection::Easy(project_easy(message))),
        "small" => Ok(Projection::Small(project_small(message))),
        "all" => Ok(Projection::All(project_all(message)?)),
        other => Err(AppError::UnsupportedArea(other.to_string())),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArea {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(serialize_with = "millis_as_string", skip_serializing_if = "is_zero")]
    pub internal_date: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub size_estimate: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EasyArea {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(serialize_with = "millis_as_string", skip_serializing_if = "is_zero")]
    pub internal_date: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub size_estimate: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<MessageHeader>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plain_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallArea {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(serialize_with = "millis_as_string", skip_serializing_if = "is_zero")]
    pub internal_date: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub size_estimate: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plain_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllArea {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(serialize_with = "millis_as_string", skip_serializing_if = "is_zero")]
    pub internal_date: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub size_estimate: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub snippet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<MessageHeader>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub plain_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

pub fn project_raw(message: &Message) -> AppResult<RawArea> {
    Ok(RawArea {
        id: message.id.clone(),
        internal_date: message.internal_date,
        label_ids: message.label_ids.clone(),
        size_estimate: message.size_estimate,
        snippet: message.snippet.clone(),
        thread_id: message.thread_id.clone(),
        raw: decode_raw(message)?,
    })
}

pub fn project_easy(message: &Message) -> EasyArea {
    EasyArea {
        id: message.id.clone(),
        internal_date: message.internal_date,
        label_ids: message.label_ids.clone(),
        size_estimate: message.size_estimate,
        snippet: message.snippet.clone(),
        thread_id: message.thread_id.clone(),
        headers: header_list(message),
        plain_text: plain_text(message.payload.as_ref()),
    }
}

pub fn project_small(message: &Message) -> SmallArea {
    let headers = header_list(message);
    SmallArea {
        id: message.id.clone(),
        internal_date: message.internal_date,
        label_ids: message.label_ids.clone(),
        size_estimate: message.size_estimate,
        snippet: message.snippet.clone(),
        thread_id: message.thread_id.clone(),
        message_id: named_header(&headers, "Message-ID"),
        date: named_header(&headers, "Date"),
        from: named_header(&headers, "From"),
        to: named_header(&headers, "To"),
        subject: named_header(&headers, "Subject"),
        plain_text: plain_text(message.payload.as_ref()),
    }
}

pub fn project_all(message: &Message) -> AppResult<AllArea> {
    Ok(AllArea {
        id: message.id.clone(),
        internal_date: message.internal_date,
        label_ids: message.label_ids.clone(),
        size_estimate: message.size_estimate,
        snippet: message.snippet.clone(),
        thread_id: message.thread_id.clone(),
        headers: header_list(message),
        plain_text: plain_text(message.payload.as_ref()),
        raw: decode_raw(message)?,
    })
}

/// Decoded payload of the first `text/plain` part in depth-first pre-order,
/// or the empty string when no such part exists or its payload fails to
/// decode. Decode failures here are always swallowed, unlike the raw blob.
pub fn plain_text(payload: Option<&MessagePart>) -> String {
    let Some(part) = payload.and_then(first_text_plain) else {
        return String::new();
    };
    let Some(data) = part.body.as_ref().and_then(|body| body.data.as_deref()) else {
        return String::new();
    };
    decode_base64url(data).unwrap_or_default()
}

fn first_text_plain(part: &MessagePart) -> Option<&MessagePart> {
    if part.mime_type == "text/plain" {
        return Some(part);
    }
    part.parts.iter().find_map(first_text_plain)
}

fn decode_raw(message: &Message) -> Result<String, base64::DecodeError> {
    decode_base64url(message.raw.as_deref().unwrap_or_default())
}

fn decode_base64url(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = URL_SAFE_LENIENT.decode(data)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn header_list(message: &Message) -> Vec<MessageHeader> {
    message
        .payload
        .as_ref()
        .map(|payload| payload.headers.clone())
        .unwrap_or_default()
}

/// Exact case-sensitive name match; the first occurrence wins when a header
/// name repeats, and an absent header yields the empty string.
fn named_header(headers: &[MessageHeader], name: &str) -> String {
    headers
        .iter()
        .find(|header| header.name == name)
        .map(|header| header.value.clone())
        .unwrap_or_default()
}

impl RawArea {
    fn text(&self) -> String {
        let mut out = String::new();
        push_scalar_lines(
            &mut out,
            &self.id,
            self.internal_date,
            &self.label_ids,
            self.size_estimate,
            &self.snippet,
            &self.thread_id,
        );
        push_raw_section(&mut out, &self.raw);
        out
    }
}

impl EasyArea {
    fn text(&self) -> String {
        let mut out = String::new();
        push_scalar_lines(
            &mut out,
            &self.id,
            self.internal_date,
            &self.label_ids,
            self.size_estimate,
            &self.snippet,
            &self.thread_id,
        );
        push_header_section(&mut out, &self.headers);
        push_plain_text_section(&mut out, &self.plain_text);
        out
    }
}

impl SmallArea {
    fn text(&self) -> String {
        let mut out = String::new();
        push_scalar_lines(
            &mut out,
            &self.id,
            self.internal_date,
            &self.label_ids,
            self.size_estimate,
            &self.snippet,
            &self.thread_id,
        );
        out.push_str("--- Headers ---\r\n");
        for (name, value) in [
            ("Message-ID", &self.message_id),
            ("Date", &self.date),
            ("From", &self.from),
            ("To", &self.to),
            ("Subject", &self.subject),
        ] {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        push_plain_text_section(&mut out, &self.plain_text);
        out
    }
}

impl AllArea {
    fn text(&self) -> String {
        let mut out = String::new();
        push_scalar_lines(
            &mut out,
            &self.id,
            self.internal_date,
            &self.label_ids,
            self.size_estimate,
            &self.snippet,
            &self.thread_id,
        );
        push_header_section(&mut out, &self.headers);
        push_plain_text_section(&mut out, &self.plain_text);
        push_raw_section(&mut out, &self.raw);
        out
    }
}

fn push_scalar_lines(
    out: &mut String,
    id: &str,
    internal_date: i64,
    label_ids: &[String],
    size_estimate: i64,
    snippet: &str,
    thread_id: &str,
) {
    out.push_str(&format!("ID: {id}\r\n"));
    out.push_str(&format!("Internal Date: {internal_date}\r\n"));
    out.push_str(&format!("Label IDs: {}\r\n", label_ids.join(", ")));
    out.push_str(&format!("Size Estimate: {size_estimate}\r\n"));
    out.push_str(&format!("Snippet: {snippet}\r\n"));
    out.push_str(&format!("Thread ID: {thread_id}\r\n"));
}

fn push_header_section(out: &mut String, headers: &[MessageHeader]) {
    out.push_str("--- Headers ---\r\n");
    for header in headers {
        out.push_str(&format!("{}: {}\r\n", header.name, header.value));
    }
}

fn push_plain_text_section(out: &mut String, plain_text: &str) {
    out.push_str(&format!("--- Plain Text ---\r\n{plain_text}\r\n"));
}

fn push_raw_section(out: &mut String, raw: &str) {
    out.push_str(&format!("--- Raw Body ---\r\n{raw}\r\n"));
}

fn millis_as_string<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    use super::*;
    use crate::api::models::MessagePartBody;

    fn part(mime_type: &str, text: Option<&str>) -> MessagePart {
        MessagePart {
            mime_type: mime_type.to_string(),
            body: text.map(|text| MessagePartBody {
                data: Some(URL_SAFE.encode(text)),
                size: text.len() as i64,
            }),
            ..MessagePart::default()
        }
    }

    fn sample_message() -> Message {
        Message {
            id: "12345".to_string(),
            thread_id: "67890".to_string(),
            internal_date: 1_620_000_000_000,
            label_ids: vec!["INBOX".to_string(), "IMPORTANT".to_string()],
            size_estimate: 2048,
            snippet: "This is a snippet".to_string(),
            payload: Some(MessagePart {
                mime_type: "multipart/alternative".to_string(),
                headers: vec![
                    MessageHeader {
                        name: "From".to_string(),
                        value: "test@example.com".to_string(),
                    },
                    MessageHeader {
                        name: "To".to_string(),
                        value: "recipient@example.com".to_string(),
                    },
                ],
                body: None,
                parts: vec![part("text/plain", Some("Hello, this is a test email!"))],
            }),
            raw: Some(URL_SAFE.encode("Raw email content")),
        }
    }

    #[test]
    fn projects_all_area() {
        let area = project_all(&sample_message()).expect("projection should succeed");

        assert_eq!(area.id, "12345");
        assert_eq!(area.internal_date, 1_620_000_000_000);
        assert_eq!(area.label_ids, ["INBOX", "IMPORTANT"]);
        assert_eq!(area.size_estimate, 2048);
        assert_eq!(area.snippet, "This is a snippet");
        assert_eq!(area.thread_id, "67890");
        assert_eq!(area.headers[0].value, "test@example.com");
        assert_eq!(area.headers[1].value, "recipient@example.com");
        assert_eq!(area.plain_text, "Hello, this is a test email!");
        assert_eq!(area.raw, "Raw email content");
    }

    #[test]
    fn raw_area_fails_on_undecodable_blob() {
        let message = Message {
            raw: Some("not valid base64 !!!".to_string()),
            ..sample_message()
        };

        assert!(project_raw(&message).is_err());
        assert!(project_all(&message).is_err());
    }

    #[test]
    fn easy_area_swallows_plain_text_decode_failure() {
        let mut message = sample_message();
        message.payload = Some(MessagePart {
            mime_type: "text/plain".to_string(),
            body: Some(MessagePartBody {
                data: Some("not valid base64 !!!".to_string()),
                size: 0,
            }),
            ..MessagePart::default()
        });

        let area = project_easy(&message);
        assert_eq!(area.plain_text, "");
    }

    #[test]
    fn plain_text_takes_first_part_in_preorder() {
        let tree = MessagePart {
            mime_type: "multipart/alternative".to_string(),
            parts: vec![
                part("text/html", Some("<p>This is the HTML body</p>")),
                part("text/plain", Some("This is the plain text body")),
                part("text/plain", Some("a later plain part")),
            ],
            ..MessagePart::default()
        };

        assert_eq!(plain_text(Some(&tree)), "This is the plain text body");
        // Derivation is pure; re-running yields the same value.
        assert_eq!(plain_text(Some(&tree)), "This is the plain text body");
    }

    #[test]
    fn plain_text_is_empty_when_no_part_matches() {
        let tree = MessagePart {
            mime_type: "multipart/mixed".to_string(),
            parts: vec![part("text/html", Some("<b>hi</b>"))],
            ..MessagePart::default()
        };

        assert_eq!(plain_text(Some(&tree)), "");
        assert_eq!(plain_text(None), "");
    }

    #[test]
    fn small_area_extracts_named_headers_first_match_wins() {
        let mut message = sample_message();
        message.payload.as_mut().expect("payload").headers = vec![
            MessageHeader {
                name: "Message-ID".to_string(),
                value: "<message123@example.com>".to_string(),
            },
            MessageHeader {
                name: "Date".to_string(),
                value: "Mon, 3 May 2021 10:00:00 +0000".to_string(),
            },
            MessageHeader {
                name: "From".to_string(),
                value: "sender@example.com".to_string(),
            },
            MessageHeader {
                name: "From".to_string(),
                value: "shadowed@example.com".to_string(),
            },
            MessageHeader {
                name: "Subject".to_string(),
                value: "Test Email".to_string(),
            },
        ];

        let area = project_small(&message);
        assert_eq!(area.message_id, "<message123@example.com>");
        assert_eq!(area.date, "Mon, 3 May 2021 10:00:00 +0000");
        assert_eq!(area.from, "sender@example.com");
        assert_eq!(area.to, "");
        assert_eq!(area.subject, "Test Email");
        assert_eq!(area.plain_text, "Hello, this is a test email!");
    }

    #[test]
    fn small_area_header_match_is_case_sensitive() {
        let mut message = sample_message();
        message.payload.as_mut().expect("payload").headers = vec![MessageHeader {
            name: "subject".to_string(),
            value: "lower case name".to_string(),
        }];

        assert_eq!(project_small(&message).subject, "");
    }

    #[test]
    fn all_area_json_layout() {
        let projection = project(&sample_message(), "all").expect("projection should succeed");
        let json = projection.to_json().expect("serialization should succeed");
        let value: serde_json::Value =
            serde_json::from_slice(&json).expect("output should be valid json");

        assert_eq!(value["id"], "12345");
        // Epoch milliseconds serialize as a decimal string.
        assert_eq!(value["internalDate"], "1620000000000");
        assert_eq!(value["sizeEstimate"], 2048);
        assert_eq!(value["labelIds"][1], "IMPORTANT");
        assert_eq!(value["headers"][0]["name"], "From");
        assert_eq!(value["plainText"], "Hello, this is a test email!");
        assert_eq!(value["raw"], "Raw email content");
    }

    #[test]
    fn json_omits_empty_fields() {
        let projection = project(&Message::default(), "easy").expect("projection should succeed");
        let json = projection.to_json().expect("serialization should succeed");

        assert_eq!(std::str::from_utf8(&json).expect("utf8"), "{}");
    }

    #[test]
    fn all_area_text_layout() {
        let projection = project(&sample_message(), "all").expect("projection should succeed");
        let text = String::from_utf8(projection.to_txt()).expect("utf8");

        let expected = "ID: 12345\r\n\
            Internal Date: 1620000000000\r\n\
            Label IDs: INBOX, IMPORTANT\r\n\
            Size Estimate: 2048\r\n\
            Snippet: This is a snippet\r\n\
            Thread ID: 67890\r\n\
            --- Headers ---\r\n\
            From: test@example.com\r\n\
            To: recipient@example.com\r\n\
            --- Plain Text ---\r\n\
            Hello, this is a test email!\r\n\
            --- Raw Body ---\r\n\
            Raw email content\r\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn small_area_text_layout() {
        let projection = project(&sample_message(), "small").expect("projection should succeed");
        let text = String::from_utf8(projection.to_txt()).expect("utf8");

        assert!(text.starts_with("ID: 12345\r\n"));
        assert!(text.contains("--- Headers ---\r\nMessage-ID: \r\n"));
        assert!(text.contains("From: test@example.com\r\n"));
        assert!(text.ends_with("--- Plain Text ---\r\nHello, this is a test email!\r\n"));
    }

    #[test]
    fn unknown_area_is_rejected() {
        let err = project(&sample_message(), "medium").expect_err("unknown area should fail");
        assert!(matches!(err, AppError::UnsupportedArea(area) if area == "medium"));
    }

    #[test]
    fn unpadded_base64url_is_accepted() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let message = Message {
            raw: Some(URL_SAFE_NO_PAD.encode("Raw email content")),
            ..sample_message()
        };

        let area = project_raw(&message).expect("unpadded blob should decode");
        assert_eq!(area.raw, "Raw email content");
    }
}
