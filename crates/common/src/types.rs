use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Each identifier is a distinct type so a courier id can never be passed
/// where an order id is expected.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the nil identifier (all zero bits).
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns true for the nil identifier.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a courier.
    CourierId
);

uuid_id!(
    /// Unique identifier for an order.
    ///
    /// Order ids are supplied by the caller (the basket that produced the
    /// order), not generated by this service.
    OrderId
);

uuid_id!(
    /// Unique identifier for a courier's storage place.
    StoragePlaceId
);

uuid_id!(
    /// Unique identifier for a domain event. Shared with its outbox message.
    EventId
);
