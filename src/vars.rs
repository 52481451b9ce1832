//! The `vars` argument to `execute`/`executemany`/`mogrify`: either a
//! positional sequence (for `%s` templates) or a keyed mapping (for
//! `%(name)s` templates), or nothing at all (§3 `QueryTemplate`, §6).

use std::collections::HashMap;

use crate::value::Value;

pub enum Vars {
    None,
    Positional(Vec<Value>),
    Named(HashMap<String, Value>),
}

impl Vars {
    pub fn is_none(&self) -> bool {
        matches!(self, Vars::None)
    }

    pub(crate) fn get_positional(&self, index: usize) -> Option<&Value> {
        match self {
            Vars::Positional(values) => values.get(index),
            _ => None,
        }
    }

    pub(crate) fn get_named(&self, key: &str) -> Option<&Value> {
        match self {
            Vars::Named(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<Vec<Value>> for Vars {
    fn from(values: Vec<Value>) -> Self {
        Vars::Positional(values)
    }
}

impl From<HashMap<String, Value>> for Vars {
    fn from(values: HashMap<String, Value>) -> Self {
        Vars::Named(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_out_of_range_is_none() {
        let vars = Vars::Positional(vec![Value::Int4(1)]);
        assert!(vars.get_positional(0).is_some());
        assert!(vars.get_positional(1).is_none());
    }

    #[test]
    fn named_missing_key_is_none() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::Int4(1));
        let vars = Vars::Named(map);
        assert!(vars.get_named("a").is_some());
        assert!(vars.get_named("b").is_none());
    }
}
