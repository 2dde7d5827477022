// tests/checkout_tests.rs
mod common;
use common::*;
use decorvista::{
  CheckoutRequest, CommerceError, ConsultationRequest, ConsultationStatus, DesignerId, DirectItem, LineItemView,
  NotificationKind, OrderStatus, PaymentMethod, Recipient, SlotStatus, UserId,
};
use serial_test::serial;

fn direct(product_id: decorvista::ProductId, quantity: u32) -> DirectItem {
  DirectItem {
    product_id,
    quantity,
    price_at_cents: None,
  }
}

#[tokio::test]
#[serial]
async fn test_cart_checkout_prices_reserves_and_clears_cart() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Brass Lamp", 2_000, 5).await;
  shop.carts.add_item(buyer, lamp.id, 2).await.unwrap();

  let order = shop
    .orders
    .create_order(buyer, CheckoutRequest::from_cart(address()))
    .await
    .unwrap();

  assert_eq!(order.subtotal_cents, 4_000);
  assert_eq!(order.shipping_cents, 1_000);
  assert_eq!(order.total_cents, 5_000);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
  assert_eq!(shop.inventory(&lamp).await, 3);
  assert!(shop.carts.cart(buyer).await.unwrap().items.is_empty());

  match &order.items[..] {
    [LineItemView::Product {
      product_id,
      title,
      quantity,
      price_cents,
    }] => {
      assert_eq!(*product_id, lamp.id);
      assert_eq!(title.as_deref(), Some("Brass Lamp"));
      assert_eq!(*quantity, 2);
      assert_eq!(*price_cents, 2_000);
    }
    other => panic!("Expected a single product line, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_direct_buy_over_inventory_fails_and_changes_nothing() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let vase = shop.product("productB", 3_500, 1).await;

  let result = shop
    .orders
    .create_order(buyer, CheckoutRequest::direct(vec![direct(vase.id, 3)], address()))
    .await;

  let err = result.unwrap_err();
  assert_eq!(err.to_string(), "Insufficient inventory for productB. Available: 1, Requested: 3");
  assert!(err.is_client_error());
  assert_eq!(shop.inventory(&vase).await, 1);
  assert!(shop.orders.orders_for(buyer).await.unwrap().is_empty());
  assert!(shop.publisher.sent().is_empty());
}

#[tokio::test]
#[serial]
async fn test_booking_a_booked_slot_fails_without_reserving_other_lines() {
  setup_tracing();
  let shop = Shop::new();
  let first = UserId::new();
  let second = UserId::new();
  let time = slot("2024-06-01", "09:00", "10:00");
  let (designer, _) = shop.designer_with_slot("designerX", time).await;
  let chair = shop.product("Chair", 8_000, 4).await;

  let booking = ConsultationRequest {
    designer_id: designer.id,
    slot: time,
    price_cents: 5_000,
  };
  shop
    .orders
    .create_order(first, CheckoutRequest::direct(vec![], address()).with_consultations(vec![booking.clone()]))
    .await
    .unwrap();
  assert_eq!(shop.slot_state(&designer, time).await.status, SlotStatus::Booked);

  let err = shop
    .orders
    .create_order(
      second,
      CheckoutRequest::direct(vec![direct(chair.id, 2)], address()).with_consultations(vec![booking]),
    )
    .await
    .unwrap_err();

  assert!(matches!(err, CommerceError::SlotUnavailable { .. }));
  assert_eq!(err.to_string(), "Selected time slot is no longer available");
  assert_eq!(shop.inventory(&chair).await, 4);
  assert!(shop.orders.orders_for(second).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_empty_cart_without_consultations_is_rejected() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();

  let err = shop
    .orders
    .create_order(buyer, CheckoutRequest::from_cart(address()))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::EmptyCheckout));
  assert_eq!(err.to_string(), "Cart is empty and no consultations selected");

  // An empty direct list falls back to the (empty) cart.
  let err = shop
    .orders
    .create_order(buyer, CheckoutRequest::direct(vec![], address()))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::EmptyCheckout));
}

#[tokio::test]
#[serial]
async fn test_failure_on_second_line_rolls_back_first_line() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let plenty = shop.product("Cushion", 1_500, 10).await;
  let scarce = shop.product("Mirror", 9_000, 1).await;
  shop.carts.add_item(buyer, plenty.id, 3).await.unwrap();
  shop.carts.add_item(buyer, scarce.id, 1).await.unwrap();

  // Someone else buys the last mirror after it went into the cart.
  shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(scarce.id, 1)], address()))
    .await
    .unwrap();

  let err = shop
    .orders
    .create_order(buyer, CheckoutRequest::from_cart(address()))
    .await
    .unwrap_err();
  match err {
    CommerceError::InsufficientInventory {
      product_id,
      available,
      requested,
      ..
    } => {
      assert_eq!(product_id, scarce.id);
      assert_eq!(available, 0);
      assert_eq!(requested, 1);
    }
    other => panic!("Expected InsufficientInventory, got {:?}", other),
  }
  assert_eq!(shop.inventory(&plenty).await, 10);
  assert_eq!(shop.carts.cart(buyer).await.unwrap().items.len(), 2);
  assert!(shop.orders.orders_for(buyer).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_unknown_product_is_not_found() {
  setup_tracing();
  let shop = Shop::new();
  let missing = decorvista::ProductId::new();
  let err = shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(missing, 1)], address()))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::ProductNotFound(id) if id == missing));
}

#[tokio::test]
#[serial]
async fn test_invalid_requests_are_rejected_before_touching_stock() {
  setup_tracing();
  let shop = Shop::new();
  let rug = shop.product("Rug", 20_000, 2).await;

  let mut missing_phone = address();
  missing_phone.phone = "  ".to_string();
  let err = shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(rug.id, 1)], missing_phone))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::Validation(ref msg) if msg.contains("phone")));

  let err = shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(rug.id, 0)], address()))
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::Validation(_)));

  let backwards = ConsultationRequest {
    designer_id: decorvista::DesignerId::new(),
    slot: slot("2024-06-01", "11:00", "10:00"),
    price_cents: 1_000,
  };
  let err = shop
    .orders
    .create_order(
      UserId::new(),
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![backwards]),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::Validation(_)));
  assert_eq!(shop.inventory(&rug).await, 2);
}

#[tokio::test]
#[serial]
async fn test_shipping_is_free_only_above_threshold() {
  setup_tracing();
  let shop = Shop::new();
  let exact = shop.product("Exactly a hundred", 10_000, 5).await;
  let above = shop.product("Just above", 10_001, 5).await;

  let at_threshold = shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(exact.id, 1)], address()))
    .await
    .unwrap();
  assert_eq!(at_threshold.shipping_cents, 1_000);
  assert_eq!(at_threshold.total_cents, 11_000);

  let over = shop
    .orders
    .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(above.id, 1)], address()))
    .await
    .unwrap();
  assert_eq!(over.shipping_cents, 0);
  assert_eq!(over.total_cents, over.subtotal_cents);
}

#[tokio::test]
#[serial]
async fn test_direct_price_overrides_catalog_price() {
  setup_tracing();
  let shop = Shop::new();
  let stool = shop.product("Stool", 4_000, 3).await;
  let order = shop
    .orders
    .create_order(
      UserId::new(),
      CheckoutRequest::direct(
        vec![DirectItem {
          product_id: stool.id,
          quantity: 2,
          price_at_cents: Some(3_500),
        }],
        address(),
      ),
    )
    .await
    .unwrap();
  assert_eq!(order.subtotal_cents, 7_000);
}

#[tokio::test]
#[serial]
async fn test_direct_buy_leaves_cart_alone() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Lamp", 2_500, 5).await;
  let shelf = shop.product("Shelf", 6_000, 5).await;
  shop.carts.add_item(buyer, lamp.id, 1).await.unwrap();

  shop
    .orders
    .create_order(buyer, CheckoutRequest::direct(vec![direct(shelf.id, 1)], address()))
    .await
    .unwrap();

  let cart = shop.carts.cart(buyer).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].product_id, lamp.id);
}

#[tokio::test]
#[serial]
async fn test_consultation_checkout_books_slot_and_writes_consultation() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let time = slot("2024-07-15", "14:00", "15:30");
  let (designer, booked_slot) = shop.designer_with_slot("Mira Chen", time).await;

  let order = shop
    .orders
    .create_order(
      buyer,
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![ConsultationRequest {
        designer_id: designer.id,
        slot: time,
        price_cents: 12_000,
      }]),
    )
    .await
    .unwrap();

  assert_eq!(order.subtotal_cents, 12_000);
  assert_eq!(order.shipping_cents, 0);
  match &order.items[..] {
    [LineItemView::Consultation {
      designer_name, slot_id, ..
    }] => {
      assert_eq!(designer_name.as_deref(), Some("Mira Chen"));
      assert_eq!(*slot_id, booked_slot.id);
    }
    other => panic!("Expected a single consultation line, got {:?}", other),
  }
  assert_eq!(shop.slot_state(&designer, time).await.status, SlotStatus::Booked);
  assert!(shop.catalog.available_slots(designer.id).await.unwrap().is_empty());

  let consultations = shop.orders.consultations_for_user(buyer).await.unwrap();
  assert_eq!(consultations.len(), 1);
  assert_eq!(consultations[0].order_id, order.id);
  assert_eq!(consultations[0].slot_id, booked_slot.id);
  assert_eq!(consultations[0].status, ConsultationStatus::Pending);
}

#[tokio::test]
#[serial]
async fn test_notifications_reach_buyer_admin_and_designer() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let time = slot("2024-06-03", "10:00", "11:00");
  let (designer, _) = shop.designer_with_slot("Olu Ade", time).await;
  let lamp = shop.product("Lamp", 2_000, 2).await;

  let order = shop
    .orders
    .create_order(
      buyer,
      CheckoutRequest::direct(vec![direct(lamp.id, 1)], address()).with_consultations(vec![ConsultationRequest {
        designer_id: designer.id,
        slot: time,
        price_cents: 4_000,
      }]),
    )
    .await
    .unwrap();

  let placed = shop.publisher.of_kind(NotificationKind::OrderPlaced);
  assert_eq!(placed.len(), 1);
  assert_eq!(placed[0].recipient, Recipient::User(buyer));
  assert_eq!(placed[0].payload["order_id"], serde_json::json!(order.id));

  let admin = shop.publisher.to(Recipient::Admin);
  assert_eq!(admin.len(), 1);
  assert_eq!(admin[0].kind, NotificationKind::NewOrder);

  let booked = shop.publisher.to(Recipient::User(designer.user_id));
  assert_eq!(booked.len(), 1);
  assert_eq!(booked[0].kind, NotificationKind::ConsultationBooked);
}

#[tokio::test]
#[serial]
async fn test_failing_publisher_does_not_fail_the_order() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let lamp = shop.product("Lamp", 2_000, 2).await;
  let orders = shop.with_failing_notifications();

  let order = orders
    .create_order(buyer, CheckoutRequest::direct(vec![direct(lamp.id, 1)], address()))
    .await
    .unwrap();

  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(shop.inventory(&lamp).await, 1);
  assert_eq!(orders.orders_for(buyer).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_checkouts_never_oversell() {
  setup_tracing();
  let shop = Shop::new();
  let vase = shop.product("Last Vases", 3_000, 5).await;

  let mut handles = Vec::new();
  for _ in 0..12 {
    let orders = shop.orders.clone();
    let product_id = vase.id;
    handles.push(tokio::spawn(async move {
      orders
        .create_order(UserId::new(), CheckoutRequest::direct(vec![direct(product_id, 1)], address()))
        .await
    }));
  }

  let mut sold = 0;
  let mut refused = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => sold += 1,
      Err(CommerceError::InsufficientInventory { .. }) => refused += 1,
      Err(other) => panic!("Unexpected error: {:?}", other),
    }
  }
  assert_eq!(sold, 5);
  assert_eq!(refused, 7);
  assert_eq!(shop.inventory(&vase).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_bookings_of_one_slot_succeed_once() {
  setup_tracing();
  let shop = Shop::new();
  let time = slot("2024-06-01", "09:00", "10:00");
  let (designer, _) = shop.designer_with_slot("Sam Ito", time).await;

  let mut handles = Vec::new();
  for _ in 0..2 {
    let orders = shop.orders.clone();
    let booking = ConsultationRequest {
      designer_id: designer.id,
      slot: time,
      price_cents: 5_000,
    };
    handles.push(tokio::spawn(async move {
      orders
        .create_order(
          UserId::new(),
          CheckoutRequest::direct(vec![], address()).with_consultations(vec![booking]),
        )
        .await
    }));
  }

  let mut outcomes = Vec::new();
  for handle in handles {
    outcomes.push(handle.await.unwrap());
  }
  assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
  assert!(outcomes
    .iter()
    .any(|r| matches!(r, Err(CommerceError::SlotUnavailable { .. }))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_concurrent_checkouts_of_one_cart_place_one_order() {
  setup_tracing();
  let shop = Shop::new();
  let buyer = UserId::new();
  let throw = shop.product("Wool Throw", 4_000, 100).await;
  shop.carts.add_item(buyer, throw.id, 1).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..8 {
    let orders = shop.orders.clone();
    handles.push(tokio::spawn(async move {
      orders.create_order(buyer, CheckoutRequest::from_cart(address())).await
    }));
  }

  let mut placed = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => placed += 1,
      Err(CommerceError::EmptyCheckout) => {}
      Err(other) => panic!("Unexpected error: {:?}", other),
    }
  }
  assert_eq!(placed, 1);
  assert_eq!(shop.orders.orders_for(buyer).await.unwrap().len(), 1);
  assert_eq!(shop.inventory(&throw).await, 99);
  assert!(shop.carts.cart(buyer).await.unwrap().items.is_empty());
}

#[tokio::test]
#[serial]
async fn test_booking_with_unknown_designer_is_not_found() {
  setup_tracing();
  let shop = Shop::new();
  let booking = ConsultationRequest {
    designer_id: DesignerId::new(),
    slot: slot("2024-06-01", "09:00", "10:00"),
    price_cents: 5_000,
  };
  let err = shop
    .orders
    .create_order(
      UserId::new(),
      CheckoutRequest::direct(vec![], address()).with_consultations(vec![booking]),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, CommerceError::DesignerNotFound(_)));
}
