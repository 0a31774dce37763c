mod support;

use axum::http::{Method, StatusCode};
use qalab_shop::cart_storage::{CartStorage, FileCartStorage};
use qalab_shop::domain::{Cart, ContactDetails, PaymentDetails};
use support::{Auth, TestApp};

#[tokio::test]
async fn test_stored_cart_checks_out() {
    let app = TestApp::new().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = FileCartStorage::new(dir.path());

    let mut cart = Cart::new();
    cart.add(app.products[1].clone(), 1);
    cart.add(app.products[1].clone(), 1);
    cart.add(app.products[2].clone(), 1);
    storage.save(&cart).unwrap();

    let cart = FileCartStorage::new(dir.path()).load().unwrap();
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 3);

    let shipping = ContactDetails {
        first_name: Some("Grace".into()),
        last_name: Some("Hopper".into()),
        email: Some("grace@example.com".into()),
        ..Default::default()
    };
    let payment = PaymentDetails { card_number: Some("5555 4444 3333 1111".into()), cvv: Some("999".into()), ..Default::default() };
    let body = serde_json::to_value(cart.to_checkout(shipping, payment)).unwrap();
    assert!(body["payment"].get("cvv").is_none());

    let token = app.token(&app.user);
    let placed = app.send(Method::POST, "/api/orders", Auth::Bearer(&token), Some(body)).await;
    assert_eq!(placed.status, StatusCode::OK);
    assert_eq!(placed.body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(placed.body["data"]["customerInfo"]["name"], "Grace Hopper");

    let expected: f64 = cart.totals().total.to_string().parse().unwrap();
    let charged = placed.body["data"]["totalAmount"].as_f64().unwrap();
    assert!((charged - expected).abs() < 0.005, "{charged} != {expected}");

    storage.save(&Cart::new()).unwrap();
    assert!(storage.load().unwrap().is_empty());
}

#[test]
fn test_corrupt_cart_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileCartStorage::new(dir.path());
    std::fs::write(storage.path(), "{not json").unwrap();
    assert!(storage.load().unwrap().is_empty());
}
