//! Audit metadata attached to mutating requests.

pub const CREATED_BY_HEADER: &str = "X-Killbill-CreatedBy";
pub const REASON_HEADER: &str = "X-Killbill-Reason";
pub const COMMENT_HEADER: &str = "X-Killbill-Comment";

/// The (user, reason, comment) triple recorded by the server's audit log.
/// Passed through verbatim; only the values that are present are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditInfo {
    pub user: Option<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

impl AuditInfo {
    pub fn by(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        [
            (CREATED_BY_HEADER, &self.user),
            (REASON_HEADER, &self.reason),
            (COMMENT_HEADER, &self.comment),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), v.clone())))
        .collect()
    }
}
