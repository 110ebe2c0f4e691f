//! Store settings, delivery pricing and SMS gateways

use super::request::ApiRequest;
use super::resource::Resource;
use super::{AdminClient, ClientError};
use crate::types::{DeliverySettings, GeneralSettings, SmsConfig};
use serde_json::Value as JsonValue;
use tracing::debug;

impl AdminClient {
    pub async fn general_settings(&self) -> Result<GeneralSettings, ClientError> {
        self.execute(&ApiRequest::get("/settings")).await
    }

    /// Replace the whole settings document
    pub async fn replace_general_settings(
        &self,
        settings: &GeneralSettings,
    ) -> Result<GeneralSettings, ClientError> {
        let request = ApiRequest::put("/settings").json(settings)?;
        self.execute(&request).await
    }

    /// Update one section of the settings document
    ///
    /// Fetches the current document, swaps in `value` for `section` and writes
    /// the whole document back. Two concurrent updates of different sections
    /// race; the later write wins.
    pub async fn update_settings_section(
        &self,
        section: &str,
        value: JsonValue,
    ) -> Result<GeneralSettings, ClientError> {
        let mut settings = self.general_settings().await?;
        settings.set_section(section, value);
        debug!(section, "writing settings section");
        self.replace_general_settings(&settings).await
    }

    pub async fn delivery_settings(&self) -> Result<DeliverySettings, ClientError> {
        self.execute(&ApiRequest::get("/delivery-settings")).await
    }

    pub async fn update_delivery_settings(
        &self,
        settings: &DeliverySettings,
    ) -> Result<DeliverySettings, ClientError> {
        let request = ApiRequest::put("/delivery-settings").json(settings)?;
        self.execute(&request).await
    }

    pub fn sms_configs(&self) -> Resource<'_, SmsConfig> {
        Resource::new(self, "/sms-configs")
    }
}
