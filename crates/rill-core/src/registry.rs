//! Event type registry.
//!
//! `create_event_types(["inc", "dec"])` is the entry point: it yields an
//! ordered set of [`EventType`] constructors looked up by name. What happens
//! when a name is declared twice is decided by [`DuplicatePolicy`].

use crate::config::{DuplicatePolicy, RillConfig};
use crate::error::{Result, RillError};
use crate::event::EventType;

/// Ordered, duplicate-free set of event types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTypes {
    types: Vec<EventType>,
}

/// Creates event types with the default (rejecting) duplicate policy.
pub fn create_event_types<I, N>(names: I) -> Result<EventTypes>
where
    I: IntoIterator<Item = N>,
    N: Into<EventType>,
{
    EventTypes::with_policy(names, DuplicatePolicy::default())
}

impl EventTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy<I, N>(names: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<EventType>,
    {
        let mut types = Self::new();
        for name in names {
            types.insert(name.into(), policy)?;
        }
        Ok(types)
    }

    /// Creates event types under the `[registry] duplicates` policy.
    pub fn from_config<I, N>(names: I, config: &RillConfig) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<EventType>,
    {
        Self::with_policy(names, config.registry.duplicates)
    }

    /// Adds one event type, applying `policy` when the name already exists.
    pub fn insert(
        &mut self,
        event_type: EventType,
        policy: DuplicatePolicy,
    ) -> Result<&EventType> {
        let index = match self.position(event_type.name()) {
            None => {
                self.types.push(event_type);
                self.types.len() - 1
            }
            Some(existing) => match policy {
                DuplicatePolicy::Reject => {
                    return Err(RillError::DuplicateEventType {
                        name: event_type.name().to_string(),
                    });
                }
                DuplicatePolicy::FirstWins => {
                    tracing::trace!(event_type = %event_type, "duplicate event type ignored");
                    existing
                }
                DuplicatePolicy::LastWins => {
                    tracing::trace!(event_type = %event_type, "duplicate event type moved to end");
                    self.types.remove(existing);
                    self.types.push(event_type);
                    self.types.len() - 1
                }
            },
        };
        Ok(&self.types[index])
    }

    pub fn get(&self, name: &str) -> Option<&EventType> {
        self.types.iter().find(|ty| ty.name() == name)
    }

    /// Like [`EventTypes::get`], failing with `UnknownEventType` when absent.
    pub fn require(&self, name: &str) -> Result<&EventType> {
        self.get(name).ok_or_else(|| RillError::UnknownEventType {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventType> {
        self.types.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(EventType::name).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|ty| ty.name() == name)
    }
}

impl<'a> IntoIterator for &'a EventTypes {
    type Item = &'a EventType;
    type IntoIter = std::slice::Iter<'a, EventType>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn creates_one_constructor_per_name() {
        let types = create_event_types(["inc", "dec", "reset"]).unwrap();
        assert_eq!(types.names(), vec!["inc", "dec", "reset"]);

        let inc = types.get("inc").unwrap();
        let record = inc.record(json!(null));
        assert_eq!(record.event_type(), "inc");
        assert_eq!(inc.to_string(), "inc");
    }

    #[test]
    fn unknown_lookup_is_none_or_error() {
        let types = create_event_types(["inc"]).unwrap();
        assert!(types.get("dec").is_none());
        assert!(matches!(
            types.require("dec"),
            Err(RillError::UnknownEventType { ref name }) if name == "dec"
        ));
    }

    #[test]
    fn default_policy_rejects_duplicates() {
        let err = create_event_types(["inc", "dec", "inc"]).unwrap_err();
        assert!(matches!(err, RillError::DuplicateEventType { ref name } if name == "inc"));
    }

    #[test_case(DuplicatePolicy::FirstWins, &["a", "b", "c"] ; "first wins keeps first position")]
    #[test_case(DuplicatePolicy::LastWins, &["b", "c", "a"] ; "last wins moves to last position")]
    fn permissive_policies_order(policy: DuplicatePolicy, expected: &[&str]) {
        let types = EventTypes::with_policy(["a", "b", "a", "c", "a"], policy).unwrap();
        assert_eq!(types.names(), expected);
        assert_eq!(types.len(), 3);
    }

    #[test_case(DuplicatePolicy::FirstWins ; "first wins")]
    #[test_case(DuplicatePolicy::LastWins ; "last wins")]
    fn duplicate_names_are_indistinguishable(policy: DuplicatePolicy) {
        let types = EventTypes::with_policy(["click", "click"], policy).unwrap();
        let ty = types.get("click").unwrap();
        assert_eq!(ty, &EventType::from("click"));
    }

    #[test]
    fn registry_config_selects_the_policy() {
        let names = ["a", "b", "a"];
        let rejecting = RillConfig::default();
        assert!(matches!(
            EventTypes::from_config(names, &rejecting),
            Err(RillError::DuplicateEventType { ref name }) if name == "a"
        ));

        let config = RillConfig::from_toml_str("[registry]\nduplicates = \"last_wins\"\n").unwrap();
        let types = EventTypes::from_config(names, &config).unwrap();
        assert_eq!(types.names(), vec!["b", "a"]);
    }

    #[test]
    fn accepts_owned_names() {
        let names: Vec<String> = (0..3).map(|i| format!("evt{i}")).collect();
        let types = create_event_types(names).unwrap();
        assert!(types.contains("evt2"));
        assert_eq!((&types).into_iter().count(), 3);
    }

    #[test]
    fn empty_registry() {
        let types = create_event_types(Vec::<&'static str>::new()).unwrap();
        assert!(types.is_empty());
    }
}
