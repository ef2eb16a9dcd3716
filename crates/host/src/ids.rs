//! Identifier types handed out by the host

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil identifier, used as an "unset" sentinel
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the nil identifier
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
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
    };
}

host_id!(
    /// Identifier of a page template
    TemplateId
);
host_id!(
    /// Identifier of a control placed on a template
    ControlId
);
host_id!(
    /// Identifier of an image in the media library
    ImageId
);
host_id!(
    /// Identifier of an image album
    AlbumId
);
host_id!(
    /// Identifier of a template category
    CategoryId
);
