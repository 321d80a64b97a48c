//! Nodes, relationships and the property/label contract they share.

use crate::error::PropertyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Property key -> value.
pub type Properties = HashMap<String, Value>;

/// Property and label operations shared by nodes and relationships.
///
/// Implementors only expose their storage; every check lives in the
/// provided methods so both element kinds fail the same way.
pub trait PropertyContainer {
    fn property_map(&self) -> &Properties;

    fn property_map_mut(&mut self) -> &mut Properties;

    fn label_set(&self) -> &HashSet<String>;

    fn label_set_mut(&mut self) -> &mut HashSet<String>;

    /// Insert a new property. Fails if the key is already present.
    fn add_property(&mut self, key: impl Into<String>, value: Value) -> Result<(), PropertyError>
    where
        Self: Sized,
    {
        let key = key.into();
        if self.property_map().contains_key(&key) {
            return Err(PropertyError::DuplicateKey(key));
        }
        self.property_map_mut().insert(key, value);
        Ok(())
    }

    /// Insert several properties at once; nothing is inserted unless every key is new.
    fn add_properties<I, K>(&mut self, properties: I) -> Result<(), PropertyError>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let batch: Vec<(String, Value)> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        {
            let mut seen = HashSet::with_capacity(batch.len());
            for (key, _) in &batch {
                if self.property_map().contains_key(key) || !seen.insert(key.as_str()) {
                    return Err(PropertyError::DuplicateKey(key.clone()));
                }
            }
        }
        self.property_map_mut().extend(batch);
        Ok(())
    }

    /// Overwrite an existing property. Fails if the key is absent.
    fn change_property(&mut self, key: &str, value: Value) -> Result<(), PropertyError> {
        match self.property_map_mut().get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PropertyError::MissingKey(key.to_string())),
        }
    }

    /// Insert or overwrite, returning the previous value.
    fn set_property(&mut self, key: impl Into<String>, value: Value) -> Option<Value>
    where
        Self: Sized,
    {
        self.property_map_mut().insert(key.into(), value)
    }

    /// Delete a property, returning its value. Fails if the key is absent.
    fn remove_property(&mut self, key: &str) -> Result<Value, PropertyError> {
        self.property_map_mut()
            .remove(key)
            .ok_or_else(|| PropertyError::MissingKey(key.to_string()))
    }

    fn property(&self, key: &str) -> Option<&Value> {
        self.property_map().get(key)
    }

    fn has_property(&self, key: &str) -> bool {
        self.property_map().contains_key(key)
    }

    /// Property keys, in no particular order.
    fn properties(&self) -> Vec<&str> {
        self.property_map().keys().map(String::as_str).collect()
    }

    fn add_label(&mut self, label: impl Into<String>) -> Result<(), PropertyError>
    where
        Self: Sized,
    {
        let label = label.into();
        if self.label_set().contains(&label) {
            return Err(PropertyError::DuplicateLabel(label));
        }
        self.label_set_mut().insert(label);
        Ok(())
    }

    fn remove_label(&mut self, label: &str) -> Result<(), PropertyError> {
        if self.label_set_mut().remove(label) {
            Ok(())
        } else {
            Err(PropertyError::MissingLabel(label.to_string()))
        }
    }

    fn has_label(&self, label: &str) -> bool {
        self.label_set().contains(label)
    }

    fn labels(&self) -> Vec<&str> {
        self.label_set().iter().map(String::as_str).collect()
    }
}

/// A named vertex with properties and labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<N> {
    name: N,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    labels: HashSet<String>,
}

impl<N> Node<N> {
    pub fn new(name: N) -> Self {
        Self {
            name,
            properties: Properties::new(),
            labels: HashSet::new(),
        }
    }

    pub fn name(&self) -> &N {
        &self.name
    }
}

impl<N> PropertyContainer for Node<N> {
    fn property_map(&self) -> &Properties {
        &self.properties
    }

    fn property_map_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    fn label_set(&self) -> &HashSet<String> {
        &self.labels
    }

    fn label_set_mut(&mut self) -> &mut HashSet<String> {
        &mut self.labels
    }
}

impl<N: fmt::Display> fmt::Display for Node<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, "node", &self.name, &self.properties, &self.labels)
    }
}

/// A directed edge instance. `name` is its type, shared by many instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    name: String,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    labels: HashSet<String>,
}

impl Relationship {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            labels: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PropertyContainer for Relationship {
    fn property_map(&self) -> &Properties {
        &self.properties
    }

    fn property_map_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    fn label_set(&self) -> &HashSet<String> {
        &self.labels
    }

    fn label_set_mut(&mut self) -> &mut HashSet<String> {
        &mut self.labels
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, "relationship", &self.name, &self.properties, &self.labels)
    }
}

// Keys and labels are sorted so the dump is stable across runs.
fn render(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    name: &dyn fmt::Display,
    properties: &Properties,
    labels: &HashSet<String>,
) -> fmt::Result {
    writeln!(f, "{} {}", kind, name)?;
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();
    for key in keys {
        writeln!(f, "  {}: {}", key, properties[key])?;
    }
    let mut sorted: Vec<&str> = labels.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    write!(f, "  labels: {}", sorted.join(", "))
}
