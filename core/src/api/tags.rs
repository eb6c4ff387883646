use crate::api::{degrade, BillingApi};
use crate::audit::AuditInfo;
use crate::capability::Taggable;
use crate::error::{ApiError, UsageError};
use crate::mapper::map_many;
use crate::transport::Transport;
use crate::types::Tag;

/// Tag operations on one resource.
#[derive(Debug)]
pub struct Tags<'a, T: Transport, R: Taggable> {
    api: &'a BillingApi<T>,
    resource: &'a R,
}

impl<'a, T: Transport, R: Taggable> Tags<'a, T, R> {
    pub(crate) fn new(api: &'a BillingApi<T>, resource: &'a R) -> Self {
        Self { api, resource }
    }

    pub fn try_get(&self, included_deleted: bool, headers: &[(String, String)]) -> Result<Vec<Tag>, ApiError> {
        let base = self.resource.base_path()?;
        let client = self.api.client();
        let response = self.api.send(&client.build_get_tags(&base, included_deleted, headers))?;
        client.parse_tags(&response)
    }

    pub fn get(&self, included_deleted: bool, headers: &[(String, String)]) -> Result<Option<Vec<Tag>>, UsageError> {
        degrade("tags.get", self.try_get(included_deleted, headers))
    }

    /// Attach tag definitions to the resource.
    pub fn try_add<S: AsRef<str>>(
        &self,
        tag_definition_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Vec<Tag>, ApiError> {
        let base = self.resource.base_path()?;
        let request = self.api.client().build_add_tags(&base, tag_definition_ids, audit, headers);
        let response = self.api.send(&request)?;
        self.api.map_created(&response, headers, map_many)
    }

    pub fn add<S: AsRef<str>>(
        &self,
        tag_definition_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Option<Vec<Tag>>, UsageError> {
        degrade("tags.add", self.try_add(tag_definition_ids, audit, headers))
    }

    pub fn delete<S: AsRef<str>>(
        &self,
        tag_definition_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<(), ApiError> {
        let base = self.resource.base_path()?;
        let client = self.api.client();
        let request = client.build_delete_tags(&base, tag_definition_ids, audit, headers);
        let response = self.api.send(&request)?;
        client.parse_delete(&response)
    }
}
