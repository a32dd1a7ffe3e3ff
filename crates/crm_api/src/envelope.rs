use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorCode, GatewayError};

/// Uniform response shape returned by every backend endpoint.
///
/// `data` is meaningful iff `success`; `error` otherwise. `meta` is only
/// populated by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
    /// HTTP status the envelope arrived with. Filled in by the gateway.
    #[serde(skip)]
    pub http_status: u16,
}

/// Structured error carried by a failed envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Pagination metadata attached by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    /// Endpoint-specific extras.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: ListMeta,
}

impl<T> Envelope<T> {
    /// Returns `data` for a successful envelope.
    ///
    /// A `success=false` envelope becomes a [`GatewayError`] carrying the
    /// backend code (or `UNKNOWN_ERROR`) and the HTTP status it arrived with.
    pub fn into_result(self) -> Result<T, GatewayError> {
        let status = self.http_status;
        match self.into_optional()? {
            Some(data) => Ok(data),
            None => Err(GatewayError::new(
                "response envelope carried no data",
                ErrorCode::Unknown,
                status,
            )),
        }
    }

    /// Like [`Envelope::into_result`] but tolerates an absent `data` field,
    /// for endpoints that only acknowledge.
    pub fn into_optional(self) -> Result<Option<T>, GatewayError> {
        if self.success {
            return Ok(self.data);
        }

        Err(GatewayError::from_envelope_error(self.http_status, self.error))
    }
}

impl<T> Envelope<Vec<T>> {
    /// Splits a list envelope into items and pagination metadata.
    pub fn into_page(mut self) -> Result<Page<T>, GatewayError> {
        let meta = self.meta.take().unwrap_or_default();
        let items = self.into_optional()?.unwrap_or_default();
        Ok(Page { items, meta })
    }
}
