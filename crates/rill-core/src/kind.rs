//! Closed event vocabularies.
//!
//! Name-keyed dispatch fails at runtime when a name is missing. An enum
//! declared with [`event_kinds!`](crate::event_kinds) moves that failure to
//! the record boundary: once a record is decoded into the enum, updates and
//! mappers `match` on it exhaustively.
//!
//! ```
//! use rill_core::{event_kinds, EventKind};
//!
//! event_kinds! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum Counter {
//!         Inc(i64) => "inc",
//!         Reset(()) => "reset",
//!     }
//! }
//!
//! let record = Counter::Inc(2).into_record().unwrap();
//! assert_eq!(record.event_type().name(), "inc");
//! assert_eq!(Counter::from_record(&record).unwrap(), Counter::Inc(2));
//! ```

use crate::config::DuplicatePolicy;
use crate::error::Result;
use crate::event::{EventRecord, EventType};
use crate::registry::EventTypes;

/// A closed set of event kinds, each tagged with a stable name.
pub trait EventKind: Sized {
    /// Tags of every variant, in declaration order.
    const NAMES: &'static [&'static str];

    fn event_type(&self) -> EventType;

    fn from_record(record: &EventRecord) -> Result<Self>;

    fn into_record(self) -> Result<EventRecord>;

    /// Whether `record` carries one of this vocabulary's tags.
    fn accepts(record: &EventRecord) -> bool {
        Self::NAMES.contains(&record.event_type().name())
    }

    /// Registry of this vocabulary's tags. Fails if two variants share a tag.
    fn event_types() -> Result<EventTypes> {
        EventTypes::with_policy(
            Self::NAMES.iter().copied().map(EventType::from_static),
            DuplicatePolicy::Reject,
        )
    }
}

/// Declares an enum implementing [`EventKind`].
///
/// Every variant carries exactly one payload type that implements serde's
/// `Serialize` and `Deserialize`; use `()` for variants without a payload.
#[macro_export]
macro_rules! event_kinds {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident ( $payload:ty ) => $tag:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($payload),
            )+
        }

        impl $crate::EventKind for $name {
            const NAMES: &'static [&'static str] = &[$($tag),+];

            fn event_type(&self) -> $crate::EventType {
                match self {
                    $( Self::$variant(_) => $crate::EventType::from_static($tag), )+
                }
            }

            fn from_record(record: &$crate::EventRecord) -> $crate::Result<Self> {
                match record.event_type().name() {
                    $(
                        $tag => $crate::__private::serde_json::from_value::<$payload>(
                            record.payload().clone(),
                        )
                        .map(Self::$variant)
                        .map_err(|source| $crate::RillError::Payload {
                            event_type: $tag.to_string(),
                            source,
                        }),
                    )+
                    other => Err($crate::RillError::UnknownEventType {
                        name: other.to_string(),
                    }),
                }
            }

            fn into_record(self) -> $crate::Result<$crate::EventRecord> {
                match self {
                    $(
                        Self::$variant(payload) => {
                            let payload = $crate::__private::serde_json::to_value(payload)
                                .map_err(|source| $crate::RillError::Payload {
                                    event_type: $tag.to_string(),
                                    source,
                                })?;
                            Ok($crate::EventRecord::new(
                                $crate::EventType::from_static($tag),
                                payload,
                            ))
                        }
                    )+
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RillError;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Edit {
        field: String,
        value: String,
    }

    crate::event_kinds! {
        #[derive(Debug, Clone, PartialEq)]
        enum Form {
            Edited(Edit) => "edited",
            Submitted(()) => "submitted",
            Scrolled(f64) => "scrolled",
        }
    }

    #[test]
    fn names_follow_declaration_order() {
        assert_eq!(Form::NAMES, &["edited", "submitted", "scrolled"]);
        assert_eq!(
            Form::event_types().unwrap().names(),
            vec!["edited", "submitted", "scrolled"]
        );
    }

    #[test]
    fn struct_payload_round_trips_through_record() {
        let edit = Form::Edited(Edit {
            field: "name".into(),
            value: "rill".into(),
        });
        let record = edit.clone().into_record().unwrap();
        assert_eq!(record.payload(), &json!({"field": "name", "value": "rill"}));
        assert_eq!(Form::from_record(&record).unwrap(), edit);
    }

    #[test]
    fn unit_payload_is_null() {
        let record = Form::Submitted(()).into_record().unwrap();
        assert_eq!(record.payload(), &json!(null));
        assert_eq!(Form::Submitted(()).event_type(), "submitted");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let record = EventType::from("dragged").record(1);
        assert!(!Form::accepts(&record));
        assert!(matches!(
            Form::from_record(&record),
            Err(RillError::UnknownEventType { ref name }) if name == "dragged"
        ));
    }

    #[test]
    fn mistyped_payload_is_a_payload_error() {
        let record = EventType::from("scrolled").record("far");
        assert!(Form::accepts(&record));
        let err = Form::from_record(&record).unwrap_err();
        assert!(matches!(
            err,
            RillError::Payload { ref event_type, .. } if event_type == "scrolled"
        ));
    }

    crate::event_kinds! {
        enum Clashing {
            A(()) => "same",
            B(()) => "same",
        }
    }

    #[test]
    fn clashing_tags_fail_registry() {
        assert!(matches!(
            Clashing::event_types(),
            Err(RillError::DuplicateEventType { .. })
        ));
        // The first arm shadows the second when decoding.
        let decoded = Clashing::from_record(&EventType::from("same").signal()).unwrap();
        assert!(matches!(decoded, Clashing::A(())));
        let _ = Clashing::B(());
    }
}
