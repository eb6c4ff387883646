//! Capabilities a resource can opt into.
//!
//! A resource exposes its own base path; the custom field and tag operation
//! sets in `api` are written once against that accessor and become available
//! to every type that implements the marker trait.

use crate::client::invoice_path;
use crate::error::UsageError;
use crate::types::Invoice;

/// A server-side object addressable by a base path.
pub trait ObjectResource {
    /// Object type name the server uses for custom fields and tags.
    const OBJECT_TYPE: &'static str;

    /// Path of this object relative to the API base URL.
    fn base_path(&self) -> Result<String, UsageError>;
}

/// The resource accepts custom fields under `{base}/customFields`.
pub trait CustomFieldCapable: ObjectResource {}

/// The resource accepts tags under `{base}/tags`.
pub trait Taggable: ObjectResource {}

impl ObjectResource for Invoice {
    const OBJECT_TYPE: &'static str = "INVOICE";

    fn base_path(&self) -> Result<String, UsageError> {
        self.invoice_id
            .as_deref()
            .map(invoice_path)
            .ok_or(UsageError::MissingField("invoiceId"))
    }
}

impl CustomFieldCapable for Invoice {}
impl Taggable for Invoice {}
