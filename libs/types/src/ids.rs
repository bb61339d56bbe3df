//! Unique identifier types for auction-house entities
//!
//! All IDs use UUID v7 so that records created later sort later, which keeps
//! listings and bid histories cheap to order chronologically.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a registered participant (collector)
    ///
    /// Ordered, so that several participant locks can always be taken in the
    /// same sequence.
    ParticipantId
);

uuid_id!(
    /// Identifier of a collectible item in the catalog
    ItemId
);

uuid_id!(
    /// Identifier of a sealed-bid auction
    AuctionId
);

uuid_id!(
    /// Identifier of a single bid
    BidId
);
