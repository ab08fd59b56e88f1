use std::time::Duration;

use tracing::debug;

use crate::api::MailApi;
use crate::api::models::{Message, MessageFormat};
use crate::error::AppResult;

/// Freshly issued page tokens are not always immediately valid on the
/// server side, so every follow-up page request waits this long. Removing
/// the delay produces intermittent invalid-token failures, not just rate
/// limiting.
const PAGE_DELAY: Duration = Duration::from_millis(100);

/// The accumulated listing: hydrated messages in listing order plus the sum
/// of the per-page server-reported size estimates.
#[derive(Debug, Default)]
pub struct ResultSet {
    pub messages: Vec<Message>,
    /// Additive total of the estimates echoed by each page. An estimate, not
    /// a count; never recomputed from `messages.len()`.
    pub result_size_estimate: i64,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, messages: Vec<Message>, size_estimate: i64) {
        self.messages.extend(messages);
        self.result_size_estimate += size_estimate;
    }
}

/// Retrieves every message matching `query` from the `user` mailbox and
/// fully hydrates each one. Any paging or hydration failure aborts the
/// whole retrieval; there is no retry and no partial result.
pub async fn retrieve<S: MailApi>(
    service: &S,
    user: &str,
    query: &str,
    access_token: &str,
) -> AppResult<ResultSet> {
    let mut results = ResultSet::new();
    let mut page_token = String::new();
    let mut first_page = true;

    // The first request is issued even when the filter matches nothing, so an
    // empty mailbox reports zero results instead of skipping the call.
    while first_page || !page_token.is_empty() {
        let page = service
            .list_messages(user, query, &page_token, access_token)
            .await?;
        debug!(
            refs = page.messages.len(),
            estimate = page.result_size_estimate,
            "fetched listing page"
        );

        let stubs = page
            .messages
            .into_iter()
            .map(|reference| Message {
                id: reference.id,
                thread_id: reference.thread_id,
                ..Message::default()
            })
            .collect();
        results.add_page(stubs, page.result_size_estimate);

        page_token = page.next_page_token;
        first_page = false;

        if !page_token.is_empty() {
            tokio::time::sleep(PAGE_DELAY).await;
        }
    }

    for message in &mut results.messages {
        *message = hydrate(service, user, &message.id, access_token).await?;
    }

    Ok(results)
}

/// Two-phase detail fetch: the structured record (headers and MIME tree)
/// as the base, with only the raw blob taken from the raw-format fetch.
/// A message is complete only when both fetches succeed.
async fn hydrate<S: MailApi>(
    service: &S,
    user: &str,
    id: &str,
    access_token: &str,
) -> AppResult<Message> {
    let mut full = service
        .get_message(user, id, MessageFormat::Full, access_token)
        .await?;
    let raw = service
        .get_message(user, id, MessageFormat::Raw, access_token)
        .await?;
    full.raw = raw.raw;
    debug!(id, "hydrated message");
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_result_set_is_empty() {
        let results = ResultSet::new();
        assert!(results.messages.is_empty());
        assert_eq!(results.result_size_estimate, 0);
    }

    #[test]
    fn add_page_appends_in_order_and_sums_estimates() {
        let mut results = ResultSet::new();
        results.add_page(
            vec![
                Message {
                    id: "123".to_string(),
                    ..Message::default()
                },
                Message {
                    id: "456".to_string(),
                    ..Message::default()
                },
            ],
            2,
        );
        results.add_page(
            vec![Message {
                id: "789".to_string(),
                ..Message::default()
            }],
            5,
        );

        assert_eq!(results.messages.len(), 3);
        assert_eq!(results.messages[0].id, "123");
        assert_eq!(results.messages[1].id, "456");
        assert_eq!(results.messages[2].id, "789");
        // The estimate is whatever the server reported, not the length.
        assert_eq!(results.result_size_estimate, 7);
    }
}
