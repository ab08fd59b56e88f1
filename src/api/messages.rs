use super::models::MessageFormat;

pub fn message_endpoint(user: &str, id: &str) -> String {
    format!("/gmail/v1/users/{user}/messages/{id}")
}

pub fn list_endpoint(user: &str) -> String {
    format!("/gmail/v1/users/{user}/messages")
}

pub fn get_query(format: MessageFormat) -> Vec<(String, String)> {
    vec![("format".to_string(), format.as_str().to_string())]
}

pub fn list_query(query: &str, page_token: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if !query.is_empty() {
        params.push(("q".to_string(), query.to_string()));
    }
    if !page_token.is_empty() {
        params.push(("pageToken".to_string(), page_token.to_string()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_message_endpoints() {
        assert_eq!(message_endpoint("me", "abc"), "/gmail/v1/users/me/messages/abc");
        assert_eq!(list_endpoint("me"), "/gmail/v1/users/me/messages");
    }

    #[test]
    fn empty_query_and_token_yield_no_params() {
        assert!(list_query("", "").is_empty());
    }

    #[test]
    fn list_query_includes_page_token() {
        let params = list_query("label:work", "token-1");
        assert_eq!(
            params,
            vec![
                ("q".to_string(), "label:work".to_string()),
                ("pageToken".to_string(), "token-1".to_string()),
            ]
        );
    }
}
