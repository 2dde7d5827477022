use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use decorvista::{
  Actor, BroadcastPublisher, CartService, CatalogService, CheckoutRequest, ConsultationRequest, DirectItem,
  MemoryStore, OrderService, Product, ShippingAddress, SlotTime, TimeOfDay, UserId,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

struct BenchShop {
  catalog: CatalogService,
  carts: CartService,
  orders: OrderService,
  admin: Actor,
}

fn shop() -> BenchShop {
  let store = Arc::new(MemoryStore::new());
  // No subscribers: publishing is a cheap no-op.
  let publisher = Arc::new(BroadcastPublisher::new(16));
  BenchShop {
    catalog: CatalogService::new(store.clone()),
    carts: CartService::new(store.clone()),
    orders: OrderService::new(store, publisher),
    admin: Actor::admin(UserId::new()),
  }
}

fn address() -> ShippingAddress {
  ShippingAddress {
    name: "Bench Buyer".to_string(),
    phone: "555-0000".to_string(),
    street: "1 Main St".to_string(),
    city: "Springfield".to_string(),
    state: "IL".to_string(),
    zip: "62701".to_string(),
    country: "US".to_string(),
  }
}

async fn stocked_products(shop: &BenchShop, count: usize) -> Vec<Product> {
  let mut products = Vec::with_capacity(count);
  for i in 0..count {
    products.push(
      shop
        .catalog
        .create_product(shop.admin, format!("Product {}", i), 1_500, u32::MAX / 2)
        .await
        .unwrap(),
    );
  }
  products
}

fn bench_direct_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("DirectCheckout");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 5, 20].iter() {
    let shop = shop();
    let products = rt.block_on(stocked_products(&shop, *lines));
    let items: Vec<DirectItem> = products
      .iter()
      .map(|p| DirectItem {
        product_id: p.id,
        quantity: 1,
        price_at_cents: None,
      })
      .collect();

    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), &items, |b, items| {
      b.to_async(&rt).iter(|| async {
        shop
          .orders
          .create_order(UserId::new(), CheckoutRequest::direct(items.clone(), address()))
          .await
          .unwrap()
      })
    });
  }
  group.finish();
}

fn bench_cart_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("CartCheckout");
  let rt = Runtime::new().unwrap();
  let shop = shop();
  let products = rt.block_on(stocked_products(&shop, 5));

  group.bench_function("fill_and_checkout_5_lines", |b| {
    b.to_async(&rt).iter(|| async {
      let buyer = UserId::new();
      for product in &products {
        shop.carts.add_item(buyer, product.id, 2).await.unwrap();
      }
      shop
        .orders
        .create_order(buyer, CheckoutRequest::from_cart(address()))
        .await
        .unwrap()
    })
  });
  group.finish();
}

fn bench_consultation_booking(c: &mut Criterion) {
  let mut group = c.benchmark_group("ConsultationBooking");
  let rt = Runtime::new().unwrap();
  let shop = shop();
  let designer = rt
    .block_on(shop.catalog.create_designer(shop.admin, UserId::new(), "Bench Designer".to_string()))
    .unwrap();
  let date = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
  let mut next_day = 0u64;

  group.bench_function("book_fresh_slot", |b| {
    b.to_async(&rt).iter(|| {
      next_day += 1;
      let slot = SlotTime::new(
        date + chrono::Days::new(next_day),
        TimeOfDay::new(9, 0).unwrap(),
        TimeOfDay::new(10, 0).unwrap(),
      );
      let shop = &shop;
      let designer_id = designer.id;
      async move {
        shop.catalog.add_slot(shop.admin, designer_id, slot).await.unwrap();
        shop
          .orders
          .create_order(
            UserId::new(),
            CheckoutRequest::direct(vec![], address()).with_consultations(vec![ConsultationRequest {
              designer_id,
              slot,
              price_cents: 5_000,
            }]),
          )
          .await
          .unwrap()
      }
    })
  });
  group.finish();
}

criterion_group!(
  benches,
  bench_direct_checkout,
  bench_cart_checkout,
  bench_consultation_booking
);
criterion_main!(benches);
