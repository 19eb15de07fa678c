//! Action table - the full set of commands the node understands

use anyhow::{bail, Result};
use smarthome_shared::{Actuator, Positional, Sensor};
use std::collections::HashMap;

/// A zero-argument device action bound to a command name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    /// Switch an appliance relay on or off
    Switch { actuator: Actuator, on: bool },
    /// Move a positional actuator and wait for it to settle
    Position { target: Positional, open: bool },
    /// Sample a sensor
    Read(Sensor),
}

/// Wire names and actions of the standard command set
const STANDARD_COMMANDS: [(&str, DeviceAction); 12] = [
    ("bat_den", DeviceAction::Switch { actuator: Actuator::Light, on: true }),
    ("tat_den", DeviceAction::Switch { actuator: Actuator::Light, on: false }),
    ("bat_quat", DeviceAction::Switch { actuator: Actuator::Fan, on: true }),
    ("tat_quat", DeviceAction::Switch { actuator: Actuator::Fan, on: false }),
    ("bat_tv", DeviceAction::Switch { actuator: Actuator::Tv, on: true }),
    ("tat_tv", DeviceAction::Switch { actuator: Actuator::Tv, on: false }),
    ("bat_dieu_hoa", DeviceAction::Switch { actuator: Actuator::AirConditioner, on: true }),
    ("tat_dieu_hoa", DeviceAction::Switch { actuator: Actuator::AirConditioner, on: false }),
    ("mo_rem", DeviceAction::Position { target: Positional::Curtain, open: true }),
    ("dong_rem", DeviceAction::Position { target: Positional::Curtain, open: false }),
    ("nhiet_do", DeviceAction::Read(Sensor::Temperature)),
    ("do_am", DeviceAction::Read(Sensor::Humidity)),
];

/// Immutable, ordered mapping from command name to action
#[derive(Debug, Clone)]
pub struct ActionTable {
    entries: Vec<(String, DeviceAction)>,
    index: HashMap<String, usize>,
}

impl ActionTable {
    pub fn builder() -> ActionTableBuilder {
        ActionTableBuilder::default()
    }

    /// Build the standard command set
    pub fn standard() -> Result<Self> {
        let mut builder = Self::builder();
        for (name, action) in STANDARD_COMMANDS {
            builder.register(name, action)?;
        }
        Ok(builder.build())
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, name: &str) -> Option<&DeviceAction> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Command names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects registrations; the first registration of a name wins and
/// later ones are rejected.
#[derive(Debug, Default)]
pub struct ActionTableBuilder {
    entries: Vec<(String, DeviceAction)>,
    index: HashMap<String, usize>,
}

impl ActionTableBuilder {
    pub fn register(&mut self, name: impl Into<String>, action: DeviceAction) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            bail!("Command name must not be empty");
        }
        if self.index.contains_key(&name) {
            bail!("Duplicate command: {}", name);
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, action));
        Ok(())
    }

    pub fn build(self) -> ActionTable {
        ActionTable {
            entries: self.entries,
            index: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = ActionTable::standard().expect("standard table");
        assert_eq!(table.len(), 12);
        assert_eq!(
            table.lookup("mo_rem"),
            Some(&DeviceAction::Position {
                target: Positional::Curtain,
                open: true
            })
        );
        assert_eq!(table.lookup("nhiet_do"), Some(&DeviceAction::Read(Sensor::Temperature)));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let table = ActionTable::standard().unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names.first(), Some(&"bat_den"));
        assert_eq!(names.last(), Some(&"do_am"));
    }

    #[test]
    fn test_every_appliance_has_an_on_off_pair() {
        let table = ActionTable::standard().unwrap();
        for actuator in Actuator::ALL {
            for on in [true, false] {
                let bound = table
                    .names()
                    .filter(|name| {
                        table.lookup(name) == Some(&DeviceAction::Switch { actuator, on })
                    })
                    .count();
                assert_eq!(bound, 1, "{} on={}", actuator, on);
            }
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = ActionTable::standard().unwrap();
        assert!(table.lookup("BAT_DEN").is_none());
        assert!(table.lookup("bat_den ").is_none());
        assert!(table.lookup(" bat_den").is_none());
        assert!(table.lookup("bat_").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut builder = ActionTable::builder();
        let first = DeviceAction::Switch {
            actuator: Actuator::Light,
            on: true,
        };
        let second = DeviceAction::Read(Sensor::Humidity);

        builder.register("bat_den", first).unwrap();
        assert!(builder.register("bat_den", second).is_err());

        let table = builder.build();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("bat_den"), Some(&first));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut builder = ActionTable::builder();
        assert!(builder
            .register("", DeviceAction::Read(Sensor::Temperature))
            .is_err());
        assert!(builder.build().is_empty());
    }
}
