// tests/order_status_tests.rs
mod common;
use common::*;
use decorvista::{
  Actor, CheckoutRequest, CommerceError, ConsultationRequest, ConsultationStatus, DirectItem, NotificationKind,
  OrderStatus, OrderView, Product, Recipient, Role, SlotStatus, UserId,
};
use serial_test::serial;

async fn buy(shop: &Shop, buyer: UserId, product: &Product, quantity: u32) -> OrderView {
  shop
    .orders
    .create_order(
      buyer,
      CheckoutRequest::direct(
        vec![DirectItem {
          product_id: product.id,
          quantity,
          price_at_cents: None,
        }],
        address(),
      ),
    )
    .await
    .unwrap()
}

#[tokio::test]
#[serial]
async fn test_cancelling_confirmed_order_restores_inventory() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("productC", 2_000, 6).await;
  let order = buy(&shop, buyer, &lamp, 2).await;
  assert_eq!(shop.inventory(&lamp).await, 4);

  shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Confirmed)
    .await
    .unwrap();
  let cancelled = shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Cancelled)
    .await
    .unwrap();

  assert_eq!(cancelled.status, OrderStatus::Cancelled);
  assert_eq!(shop.inventory(&lamp).await, 6);
}

#[tokio::test]
#[serial]
async fn test_cancelling_twice_credits_inventory_once() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let order = buy(&shop, buyer, &lamp, 3).await;

  let owner = Actor::homeowner(buyer);
  shop.orders.update_status(owner, order.id, OrderStatus::Cancelled).await.unwrap();
  shop.publisher.clear();
  let again = shop.orders.update_status(owner, order.id, OrderStatus::Cancelled).await.unwrap();

  assert_eq!(again.status, OrderStatus::Cancelled);
  assert_eq!(shop.inventory(&lamp).await, 5);
  assert!(shop.publisher.sent().is_empty());
}

#[tokio::test]
#[serial]
async fn test_cancelled_is_terminal() {
  setup_tracing();
  let shop = Shop::new();
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let order = buy(&shop, UserId::new(), &lamp, 1).await;
  shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Cancelled)
    .await
    .unwrap();

  let err = shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Processing)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    CommerceError::InvalidTransition {
      from: OrderStatus::Cancelled,
      to: OrderStatus::Processing
    }
  ));
  assert_eq!(shop.inventory(&lamp).await, 5);
}

#[tokio::test]
#[serial]
async fn test_cancelling_releases_slot_and_cancels_consultation() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let time = slot("2024-06-01", "09:00", "10:00");
  let (designer, _) = shop.designer_with_slot("Mira", time).await;
  let order = shop
    .orders
    .create_order(
      buyer,
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![ConsultationRequest {
        designer_id: designer.id,
        slot: time,
        price_cents: 6_000,
      }]),
    )
    .await
    .unwrap();

  shop
    .orders
    .update_status(Actor::homeowner(buyer), order.id, OrderStatus::Cancelled)
    .await
    .unwrap();

  assert_eq!(shop.slot_state(&designer, time).await.status, SlotStatus::Available);
  let consultations = shop.orders.consultations_for_user(buyer).await.unwrap();
  assert_eq!(consultations[0].status, ConsultationStatus::Cancelled);

  // The freed slot can be booked by someone else.
  shop
    .orders
    .create_order(
      UserId::new(),
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![ConsultationRequest {
        designer_id: designer.id,
        slot: time,
        price_cents: 6_000,
      }]),
    )
    .await
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_consultation_status_follows_order() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let time = slot("2024-08-20", "16:00", "17:00");
  let (designer, _) = shop.designer_with_slot("Kai", time).await;
  let order = shop
    .orders
    .create_order(
      buyer,
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![ConsultationRequest {
        designer_id: designer.id,
        slot: time,
        price_cents: 3_000,
      }]),
    )
    .await
    .unwrap();

  shop.orders.update_status(shop.admin, order.id, OrderStatus::Shipped).await.unwrap();
  let seen_by_designer = shop
    .orders
    .consultations_for_designer(Actor::new(designer.user_id, Role::Designer), designer.id)
    .await
    .unwrap();
  assert_eq!(seen_by_designer[0].status, ConsultationStatus::Confirmed);

  shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Delivered)
    .await
    .unwrap();
  let seen_by_buyer = shop.orders.consultations_for_user(buyer).await.unwrap();
  assert_eq!(seen_by_buyer[0].status, ConsultationStatus::Completed);
}

#[tokio::test]
#[serial]
async fn test_owner_may_only_cancel_before_shipping() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let owner = Actor::homeowner(buyer);
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let order = buy(&shop, buyer, &lamp, 1).await;

  let err = shop
    .orders
    .update_status(owner, order.id, OrderStatus::Confirmed)
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::Forbidden(_)));

  shop.orders.update_status(shop.admin, order.id, OrderStatus::Shipped).await.unwrap();
  let err = shop
    .orders
    .update_status(owner, order.id, OrderStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::InvalidTransition { .. }));
  assert_eq!(shop.inventory(&lamp).await, 4);
}

#[tokio::test]
#[serial]
async fn test_strangers_cannot_touch_or_see_an_order() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let stranger = Actor::homeowner(UserId::new());
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let order = buy(&shop, buyer, &lamp, 1).await;

  let err = shop
    .orders
    .update_status(stranger, order.id, OrderStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::Forbidden(_)));
  assert!(matches!(
    shop.orders.order(stranger, order.id).await.unwrap_err(),
    CommerceError::Forbidden(_)
  ));
  assert_eq!(shop.orders.order(Actor::homeowner(buyer), order.id).await.unwrap().id, order.id);
  assert_eq!(shop.orders.order(shop.admin, order.id).await.unwrap().id, order.id);
  assert_eq!(shop.inventory(&lamp).await, 4);
}

#[tokio::test]
#[serial]
async fn test_unknown_order_is_not_found() {
  setup_tracing();
  let shop = Shop::new();
  let missing = decorvista::OrderId::new();
  let err = shop
    .orders
    .update_status(shop.admin, missing, OrderStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::OrderNotFound(id) if id == missing));
}

#[tokio::test]
#[serial]
async fn test_status_change_notifies_owner_and_admin() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let order = buy(&shop, buyer, &lamp, 1).await;
  shop.publisher.clear();

  shop
    .orders
    .update_status(shop.admin, order.id, OrderStatus::Processing)
    .await
    .unwrap();

  let changes = shop.publisher.of_kind(NotificationKind::OrderStatusChanged);
  assert_eq!(changes.len(), 2);
  assert!(changes.iter().any(|n| n.recipient == Recipient::User(buyer)));
  assert!(changes.iter().any(|n| n.recipient == Recipient::Admin));
  assert_eq!(changes[0].payload["status"], "processing");
}

#[tokio::test]
#[serial]
async fn test_orders_are_listed_newest_first() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Lamp", 2_000, 5).await;
  let first = buy(&shop, buyer, &lamp, 1).await;
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = buy(&shop, buyer, &lamp, 1).await;

  let listed = shop.orders.orders_for(buyer).await.unwrap();
  let ids: Vec<_> = listed.iter().map(|o| o.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
  assert!(shop.orders.orders_for(UserId::new()).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_cancels_credit_inventory_once() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let chair = shop.product("Rattan Chair", 8_000, 10).await;
  let order = buy(&shop, buyer, &chair, 2).await;
  assert_eq!(shop.inventory(&chair).await, 8);

  let mut handles = Vec::new();
  for _ in 0..8 {
    let orders = shop.orders.clone();
    let admin = shop.admin;
    let order_id = order.id;
    handles.push(tokio::spawn(async move {
      orders.update_status(admin, order_id, OrderStatus::Cancelled).await
    }));
  }
  for handle in handles {
    let view = handle.await.unwrap().unwrap();
    assert_eq!(view.status, OrderStatus::Cancelled);
  }

  assert_eq!(shop.inventory(&chair).await, 10);
  assert_eq!(shop.publisher.of_kind(NotificationKind::OrderStatusChanged).len(), 2);
}
