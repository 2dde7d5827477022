// src/ids.rs

//! Typed identifiers. Each one wraps a v4 UUID so a `ProductId` can never be
//! passed where a `DesignerId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub Uuid);

    impl $name {
      /// Generates a fresh random identifier.
      pub fn new() -> Self {
        Self(Uuid::new_v4())
      }

      pub fn as_uuid(&self) -> Uuid {
        self.0
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }

    impl From<Uuid> for $name {
      fn from(id: Uuid) -> Self {
        Self(id)
      }
    }

    impl FromStr for $name {
      type Err = uuid::Error;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
      }
    }
  };
}

uuid_id!(
  /// An authenticated account: homeowner, designer or admin.
  UserId
);
uuid_id!(
  /// A catalog product.
  ProductId
);
uuid_id!(
  /// A designer profile (distinct from the designer's `UserId`).
  DesignerId
);
uuid_id!(
  /// A single availability slot embedded in a designer profile.
  SlotId
);
uuid_id!(OrderId);
uuid_id!(ConsultationId);
