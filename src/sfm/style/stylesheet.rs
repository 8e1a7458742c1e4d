//! The in-memory stylesheet: marker name to [`Marker`] record
//!
//! Records are shared with the elements they describe through [`Arc`], so
//! every element can point at its record without copying it.
//!
//! Inserting a record that declares an end marker also registers a
//! synthetic record under the end marker's name, so that `\qt*` can be
//! looked up like any other marker.

use super::marker::Marker;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    markers: BTreeMap<String, Arc<Marker>>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record, registering its end marker record too
    pub fn insert(&mut self, name: impl Into<String>, marker: Marker) -> Option<Arc<Marker>> {
        let name = name.into();
        let previous = self.remove(&name);
        if let Some(endmarker) = &marker.endmarker {
            self.markers
                .insert(endmarker.clone(), Arc::new(Marker::end_marker_for(&name)));
        }
        self.markers.insert(name, Arc::new(marker));
        previous
    }

    /// Remove a record together with the end marker record it contributed
    pub fn remove(&mut self, name: &str) -> Option<Arc<Marker>> {
        let removed = self.markers.remove(name)?;
        if let Some(endmarker) = &removed.endmarker {
            let synthetic = self
                .markers
                .get(endmarker)
                .is_some_and(|m| m.is_end_marker() && m.owner() == Some(name));
            if synthetic {
                self.markers.remove(endmarker);
            }
        }
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Marker>> {
        self.markers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.markers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Marker>)> {
        self.markers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Recognise `names` with [`Marker::default_meta`] unless already defined
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_with(&Marker::default_meta(), names);
    }

    /// Recognise `names` with a copy of `meta` unless already defined
    pub fn extend_with<I, S>(&mut self, meta: &Marker, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.contains(&name) {
                self.insert(name, meta.clone());
            }
        }
    }

    /// Layer every record of `other` over this stylesheet
    pub fn update(&mut self, other: &Stylesheet) {
        for (name, marker) in other.iter() {
            let synthetic =
                marker.is_end_marker() && marker.owner().is_some_and(|owner| other.contains(owner));
            if synthetic {
                continue;
            }
            self.insert(name, (**marker).clone());
        }
    }
}

impl<S: Into<String>> FromIterator<(S, Marker)> for Stylesheet {
    fn from_iter<I: IntoIterator<Item = (S, Marker)>>(iter: I) -> Self {
        let mut sheet = Stylesheet::new();
        for (name, marker) in iter {
            sheet.insert(name, marker);
        }
        sheet
    }
}

impl Serialize for Stylesheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.markers.len()))?;
        for (name, marker) in &self.markers {
            map.serialize_entry(name, marker.as_ref())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfm::style::{StyleType, TextType};

    fn qt() -> Marker {
        Marker::default()
            .with_text_type(TextType::Other)
            .with_occurs_under(["p"])
            .with_endmarker("qt*")
            .with_style_type(StyleType::Character)
    }

    #[test]
    fn test_insert_registers_end_marker() {
        let sheet: Stylesheet = [("qt", qt())].into_iter().collect();
        let em = sheet.get("qt*").expect("synthetic end marker record");
        assert!(em.is_end_marker());
        assert_eq!(em.owner(), Some("qt"));
        assert!(em.endmarker.is_none());
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_remove_drops_end_marker() {
        let mut sheet: Stylesheet = [("qt", qt())].into_iter().collect();
        assert!(sheet.remove("qt").is_some());
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_extend_keeps_existing_records() {
        let mut sheet: Stylesheet = [("qt", qt())].into_iter().collect();
        sheet.extend(["id", "qt"]);
        assert_eq!(sheet.get("id").map(|m| m.as_ref()), Some(&Marker::default_meta()));
        assert_eq!(sheet.get("qt").map(|m| m.as_ref()), Some(&qt()));
    }

    #[test]
    fn test_update_layers_records() {
        let mut base: Stylesheet = [("qt", qt())].into_iter().collect();
        let overlay: Stylesheet = [("qt", qt().with_endmarker("q*"))].into_iter().collect();
        base.update(&overlay);
        assert_eq!(base.get("qt").and_then(|m| m.endmarker.clone()).as_deref(), Some("q*"));
        assert!(base.get("q*").is_some());
        assert!(base.get("qt*").is_none());
    }

    #[test]
    fn test_serializes_as_map() {
        let sheet: Stylesheet = [("id", Marker::default_meta())].into_iter().collect();
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["id"]["text_type"], "default");
        assert_eq!(json["id"]["occurs_under"], serde_json::json!([null]));
    }
}
