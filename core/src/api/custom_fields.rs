use crate::api::{degrade, BillingApi};
use crate::audit::AuditInfo;
use crate::capability::CustomFieldCapable;
use crate::error::{ApiError, UsageError};
use crate::mapper::map_many;
use crate::transport::Transport;
use crate::types::CustomField;

/// Custom field operations on one resource.
#[derive(Debug)]
pub struct CustomFields<'a, T: Transport, R: CustomFieldCapable> {
    api: &'a BillingApi<T>,
    resource: &'a R,
}

impl<'a, T: Transport, R: CustomFieldCapable> CustomFields<'a, T, R> {
    pub(crate) fn new(api: &'a BillingApi<T>, resource: &'a R) -> Self {
        Self { api, resource }
    }

    pub fn try_get(&self, headers: &[(String, String)]) -> Result<Vec<CustomField>, ApiError> {
        let base = self.resource.base_path()?;
        let client = self.api.client();
        let response = self.api.send(&client.build_get_custom_fields(&base, headers))?;
        client.parse_custom_fields(&response)
    }

    pub fn get(&self, headers: &[(String, String)]) -> Result<Option<Vec<CustomField>>, UsageError> {
        degrade("custom_fields.get", self.try_get(headers))
    }

    pub fn try_add(
        &self,
        fields: &[CustomField],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Vec<CustomField>, ApiError> {
        let base = self.resource.base_path()?;
        let fields: Vec<CustomField> = fields
            .iter()
            .cloned()
            .map(|mut field| {
                field.object_type.get_or_insert_with(|| R::OBJECT_TYPE.to_string());
                field
            })
            .collect();
        let request = self.api.client().build_add_custom_fields(&base, &fields, audit, headers)?;
        let response = self.api.send(&request)?;
        self.api.map_created(&response, headers, map_many)
    }

    pub fn add(
        &self,
        fields: &[CustomField],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<Option<Vec<CustomField>>, UsageError> {
        degrade("custom_fields.add", self.try_add(fields, audit, headers))
    }

    pub fn delete<S: AsRef<str>>(
        &self,
        custom_field_ids: &[S],
        audit: &AuditInfo,
        headers: &[(String, String)],
    ) -> Result<(), ApiError> {
        let base = self.resource.base_path()?;
        let client = self.api.client();
        let request = client.build_delete_custom_fields(&base, custom_field_ids, audit, headers);
        let response = self.api.send(&request)?;
        client.parse_delete(&response)
    }
}
