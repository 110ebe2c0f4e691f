//! Back-office users and storefront customers

use super::request::{ApiRequest, path_segment};
use super::resource::{ListQuery, Page, Resource, parse_page};
use super::{AdminClient, ClientError};
use crate::types::{Customer, Order, User};
use serde_json::json;

impl AdminClient {
    pub fn users(&self) -> Resource<'_, User> {
        Resource::new(self, "/users")
    }

    /// Enable or disable a user account
    pub async fn set_user_enabled(&self, user_id: &str, enabled: bool) -> Result<User, ClientError> {
        let request = ApiRequest::patch(format!("/users/{}/status", path_segment(user_id)))
            .json(&json!({ "enabled": enabled }))?;
        self.execute(&request).await
    }

    pub fn customers(&self) -> Resource<'_, Customer> {
        Resource::new(self, "/customers")
    }

    /// Order history of one customer
    pub async fn customer_orders(
        &self,
        customer_id: &str,
        query: &ListQuery,
    ) -> Result<Page<Order>, ClientError> {
        let path = format!("/customers/{}/orders", path_segment(customer_id));
        let request = query.apply(ApiRequest::get(path));
        let body = self.execute_bytes(&request).await?;
        parse_page(&body)
    }
}
