// src/models/mod.rs

//! Records persisted by a `Datastore`.

pub mod cart;
pub mod consultation;
pub mod designer;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem};
pub use consultation::{Consultation, ConsultationStatus};
pub use designer::{AvailabilitySlot, Designer, SlotStatus, SlotTime, TimeOfDay};
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, ShippingAddress};
pub use product::Product;
