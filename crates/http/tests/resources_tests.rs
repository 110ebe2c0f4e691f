//! Resource service tests against a mocked admin API

use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use storedesk_http::client::{AdminClient, ClientError, ListQuery, LogoKind, TokenPair, Upload};
use storedesk_http::types::{NotificationRequest, OrderStatus};
use wiremock::matchers::{
    body_json, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("storedesk_http=debug")
        .with_test_writer()
        .try_init();
}

fn client_for(server: &MockServer) -> AdminClient {
    init_test_tracing();
    let client = AdminClient::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .api_token("app-token")
        .build()
        .unwrap();
    client
        .credentials()
        .store_tokens(&TokenPair {
            access_token: "access-0".into(),
            refresh_token: "refresh-0".into(),
        })
        .unwrap();
    client
}

#[tokio::test]
async fn test_list_accepts_bare_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "p1", "name": "Rice 5kg", "price": "12.50" },
            { "_id": "p2", "name": "Olive oil", "price": 8.99, "brand": "Sol" }
        ])))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .products()
        .list(&ListQuery::new())
        .await
        .unwrap();

    assert_eq!(page.total, Some(2));
    assert_eq!(page.items[0].id, "p1");
    assert_eq!(page.items[0].price, Some(Decimal::from_str("12.50").unwrap()));
    assert_eq!(page.items[1].extra["brand"], "Sol");
}

#[tokio::test]
async fn test_list_accepts_envelope_and_sends_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "o1", "status": "pending", "total": "30.00" }],
            "total": 11,
            "page": 2,
            "limit": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListQuery::new().page(2).limit(10).filter("status", "pending");
    let page = client_for(&server).orders().list(&query).await.unwrap();

    assert_eq!(page.total, Some(11));
    assert_eq!(page.page, Some(2));
    assert_eq!(page.items[0].status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_missing_record_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/customers/c404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("customer not found"))
        .mount(&server)
        .await;

    let error = client_for(&server).customers().get("c404").await.unwrap_err();
    assert!(matches!(error, ClientError::NotFound(message) if message == "customer not found"));
}

#[tokio::test]
async fn test_create_update_delete_category() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/categories"))
        .and(body_json(json!({ "name": "Pantry" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "c1", "name": "Pantry" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/categories/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "name": "Dry goods" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/categories/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let categories = client.categories();

    let created = categories.create(&json!({ "name": "Pantry" })).await.unwrap();
    assert_eq!(created.id, "c1");
    let updated = categories
        .update("c1", &json!({ "name": "Dry goods" }))
        .await
        .unwrap();
    assert_eq!(updated.name, "Dry goods");
    categories.delete("c1").await.unwrap();
}

#[tokio::test]
async fn test_reorder_categories_sends_positions() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/categories/reorder"))
        .and(body_json(json!({
            "order": [
                { "id": "c3", "position": 0 },
                { "id": "c1", "position": 1 },
                { "id": "c2", "position": 2 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .reorder_categories(&["c3", "c1", "c2"])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_product_image_upload_is_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/products/p1/images"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("filename=\"rice.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1", "name": "Rice 5kg", "images": ["/media/rice.png"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let image = Upload::new("rice.png", b"png-bytes".to_vec()).with_content_type("image/png");
    let product = client_for(&server)
        .upload_product_image("p1", image)
        .await
        .unwrap();

    assert_eq!(product.images, vec!["/media/rice.png".to_string()]);
}

#[tokio::test]
async fn test_upload_is_rebuilt_after_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/logos"))
        .and(header("x-access-token", "Bearer access-0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logos"))
        .and(header("x-access-token", "Bearer access-1"))
        .and(body_string_contains("favicon"))
        .and(body_string_contains("filename=\"icon.ico\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "l1", "kind": "favicon", "url": "/media/icon.ico"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1", "refreshToken": "refresh-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let logo = client_for(&server)
        .upload_logo(LogoKind::Favicon, Upload::new("icon.ico", vec![0u8, 1, 2]))
        .await
        .unwrap();

    assert_eq!(logo.url, "/media/icon.ico");
    assert_eq!(logo.id, "l1");
}

#[tokio::test]
async fn test_list_and_delete_logos() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/logos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "l1", "id": "l1", "kind": "header", "url": "/media/header.png" },
            { "_id": "l2", "kind": "favicon", "url": "/media/icon.ico" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/logos/l2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let logos = client.logos().list(&ListQuery::new()).await.unwrap();
    assert_eq!(logos.len(), 2);
    assert_eq!(logos.items[0].kind.as_deref(), Some("header"));

    client.logos().delete(&logos.items[1].id).await.unwrap();
}

#[tokio::test]
async fn test_records_echoing_both_id_keys_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders/665f1c2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "665f1c2e", "id": "665f1c2e", "status": "delivered", "total": "42.00"
        })))
        .mount(&server)
        .await;

    let order = client_for(&server).orders().get("665f1c2e").await.unwrap();
    assert_eq!(order.id, "665f1c2e");
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.extra.is_empty());
}

#[tokio::test]
async fn test_ids_are_escaped_in_paths() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a/b", "name": "Odd id" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products/a/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "wrong", "name": "Nested route" })))
        .expect(0)
        .mount(&server)
        .await;

    let product = client_for(&server).products().get("a/b").await.unwrap();
    assert_eq!(product.id, "a/b");
}

#[tokio::test]
async fn test_update_order_status_and_assign_vehicle() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/orders/o1/status"))
        .and(body_json(json!({ "status": "shipped" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "o1", "status": "shipped" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/orders/o1/vehicle"))
        .and(body_json(json!({ "vehicleId": "v7" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "o1", "status": "shipped", "vehicleId": "v7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let order = client
        .update_order_status("o1", OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);

    let order = client.assign_vehicle("o1", "v7").await.unwrap();
    assert_eq!(order.vehicle_id.as_deref(), Some("v7"));
}

#[tokio::test]
async fn test_invoice_generation_and_download() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/invoices"))
        .and(body_json(json!({ "orderId": "o1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "i1", "invoiceNumber": "INV-0001", "orderId": "o1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/invoices/i1/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invoice = client.generate_invoice("o1").await.unwrap();
    assert_eq!(invoice.invoice_number.as_deref(), Some("INV-0001"));

    let pdf = client.download_invoice(&invoice.id).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_disable_user_and_send_notification() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/users/u1/status"))
        .and(body_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "u1", "active": false })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notifications/send"))
        .and(body_json(json!({ "title": "Sale", "body": "20% off today" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "n1", "title": "Sale", "body": "20% off today"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let user = client.set_user_enabled("u1", false).await.unwrap();
    assert_eq!(user.enabled, Some(false));

    let notification = client
        .send_notification(&NotificationRequest {
            title: "Sale".into(),
            body: "20% off today".into(),
            audience: None,
        })
        .await
        .unwrap();
    assert_eq!(notification.id, "n1");
}

#[tokio::test]
async fn test_settings_section_update_keeps_other_sections() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "general": { "storeName": "Corner Shop" },
            "color": { "primary": "#000000" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings"))
        .and(body_json(json!({
            "general": { "storeName": "Corner Shop" },
            "color": { "primary": "#ff6600" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "general": { "storeName": "Corner Shop" },
            "color": { "primary": "#ff6600" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = client_for(&server)
        .update_settings_section("color", json!({ "primary": "#ff6600" }))
        .await
        .unwrap();

    assert_eq!(settings.section("color"), Some(&json!({ "primary": "#ff6600" })));
    assert_eq!(
        settings.section("general"),
        Some(&json!({ "storeName": "Corner Shop" }))
    );
}

#[tokio::test]
async fn test_delivery_settings_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/delivery-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baseFee": "2.00", "perKmFee": "0.35"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/delivery-settings"))
        .and(body_json(json!({
            "baseFee": "2.00", "perKmFee": "0.35", "freeDeliveryThreshold": "50"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baseFee": "2.00", "perKmFee": "0.35", "freeDeliveryThreshold": "50"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut delivery = client.delivery_settings().await.unwrap();
    delivery.free_delivery_threshold = Some(Decimal::from(50));

    let saved = client.update_delivery_settings(&delivery).await.unwrap();
    assert_eq!(saved.free_delivery_threshold, Some(Decimal::from(50)));
}
