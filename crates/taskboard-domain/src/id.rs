use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! storage_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Identity of a record that has not been written to storage yet.
            pub const UNSET: Self = Self(0);

            pub fn is_persisted(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

storage_id!(
    /// Storage-assigned identity of a card.
    CardId
);

storage_id!(
    /// Storage-assigned identity of a list.
    ListId
);
