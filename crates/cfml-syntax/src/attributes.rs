//! Attribute maps attached to declarations and tag-style statements.
//! 声明和标签式语句的属性表。

use crate::{Expression, Identifier};

/// One `name=value` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Identifier,
    pub value: Expression,
}

/// Ordered attribute map with case-insensitive keys.
/// 键不区分大小写的有序属性表。
///
/// Insertion order is kept for rendering. Re-inserting a key replaces the
/// value in place and keeps the first spelling of the key. Equality ignores
/// order and key case.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: Vec<Attribute>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|a| a.name.matches(name))
    }

    /// Insert or replace; returns the previous value for the key.
    pub fn insert(&mut self, name: Identifier, value: Expression) -> Option<Expression> {
        match self.position(&name.name) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].value, value)),
            None => {
                self.entries.push(Attribute { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.position(name).map(|idx| &self.entries[idx].value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Expression> {
        let idx = self.position(name)?;
        Some(&mut self.entries[idx].value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Expression> {
        let idx = self.position(name)?;
        Some(self.entries.remove(idx).value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Expression> {
        self.entries.iter().map(|a| &a.value)
    }

    /// Attributes whose names are not in `valid`, in insertion order.
    pub fn unknown<'a>(&'a self, valid: &'a [&'a str]) -> impl Iterator<Item = &'a Attribute> {
        self.entries
            .iter()
            .filter(move |a| !valid.iter().any(|v| a.name.matches(v)))
    }

    /// Attributes in `valid`'s order, followed by the unknown ones in
    /// insertion order.
    pub fn ordered<'a>(&'a self, valid: &'a [&'a str]) -> Vec<&'a Attribute> {
        let mut out: Vec<&Attribute> = valid
            .iter()
            .filter_map(|v| self.position(v).map(|idx| &self.entries[idx]))
            .collect();
        out.extend(self.unknown(valid));
        out
    }
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|a| other.get(&a.name.name) == Some(&a.value))
    }
}

impl FromIterator<(Identifier, Expression)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (Identifier, Expression)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valid;

    fn id(name: &str) -> Identifier {
        Identifier::synthetic(name)
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut map = AttributeMap::new();
        map.insert(id("Name"), Expression::string("foo"));
        assert_eq!(map.get("NAME").and_then(|e| e.as_string()), Some("foo"));
        assert!(map.contains("name"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = AttributeMap::new();
        map.insert(id("a"), Expression::string("1"));
        map.insert(id("b"), Expression::string("2"));
        let old = map.insert(id("A"), Expression::string("3"));
        assert_eq!(old, Some(Expression::string("1")));
        let names: Vec<&str> = map.iter().map(|a| a.name.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Expression::string("3")));
    }

    #[test]
    fn test_equality_ignores_order_and_case() {
        let left: AttributeMap = [
            (id("name"), Expression::string("foo")),
            (id("type"), Expression::string("string")),
        ]
        .into_iter()
        .collect();
        let right: AttributeMap = [
            (id("TYPE"), Expression::string("string")),
            (id("NAME"), Expression::string("foo")),
        ]
        .into_iter()
        .collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_ordered_puts_known_first() {
        let map: AttributeMap = [
            (id("custom"), Expression::string("x")),
            (id("type"), Expression::string("string")),
            (id("name"), Expression::string("foo")),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = map
            .ordered(valid::PROPERTY)
            .into_iter()
            .map(|a| a.name.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "type", "custom"]);
    }
}
