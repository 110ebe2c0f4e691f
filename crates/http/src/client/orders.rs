//! Orders, delivery vehicles and invoices

use super::request::{ApiRequest, Upload, path_segment};
use super::resource::Resource;
use super::{AdminClient, ClientError};
use crate::types::{Invoice, Order, OrderStatus, Vehicle};
use bytes::Bytes;
use serde_json::json;

impl AdminClient {
    pub fn orders(&self) -> Resource<'_, Order> {
        Resource::new(self, "/orders")
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let request = ApiRequest::patch(format!("/orders/{}/status", path_segment(order_id)))
            .json(&json!({ "status": status }))?;
        self.execute(&request).await
    }

    /// Assign a delivery vehicle to an order
    pub async fn assign_vehicle(&self, order_id: &str, vehicle_id: &str) -> Result<Order, ClientError> {
        let request = ApiRequest::put(format!("/orders/{}/vehicle", path_segment(order_id)))
            .json(&json!({ "vehicleId": vehicle_id }))?;
        self.execute(&request).await
    }

    pub fn vehicles(&self) -> Resource<'_, Vehicle> {
        Resource::new(self, "/vehicles")
    }

    /// Upload a registration or insurance document for a vehicle
    pub async fn upload_vehicle_document(
        &self,
        vehicle_id: &str,
        document: Upload,
    ) -> Result<Vehicle, ClientError> {
        let request = ApiRequest::post(format!("/vehicles/{}/documents", path_segment(vehicle_id)))
            .file_field("document", document);
        self.execute(&request).await
    }

    pub fn invoices(&self) -> Resource<'_, Invoice> {
        Resource::new(self, "/invoices")
    }

    pub async fn generate_invoice(&self, order_id: &str) -> Result<Invoice, ClientError> {
        let request = ApiRequest::post("/invoices").json(&json!({ "orderId": order_id }))?;
        self.execute(&request).await
    }

    /// Download the rendered invoice document (PDF)
    pub async fn download_invoice(&self, invoice_id: &str) -> Result<Bytes, ClientError> {
        let path = format!("/invoices/{}/download", path_segment(invoice_id));
        self.execute_bytes(&ApiRequest::get(path)).await
    }
}
