/// Selection conditions translated into the Gmail search-query grammar.
/// See <https://support.google.com/mail/answer/7190>.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub message_id: Option<String>,
    pub label: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
}

impl Filter {
    /// Joins the present criteria with `AND`. An all-empty filter yields the
    /// empty string, which the listing endpoint treats as "match everything".
    pub fn query(&self) -> String {
        let criteria = [
            operator("rfc822msgid:", self.message_id.as_deref()),
            operator("label:", self.label.as_deref()),
            operator("from:", self.from.as_deref()),
            operator("to:", self.to.as_deref()),
            operator("subject:", self.subject.as_deref()),
        ];

        criteria
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn operator(prefix: &str, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|value| !value.is_empty())?;
    Some(format!("{prefix}{value}"))
}
