//! Helpers over the raw exchange tree.
//!
//! The raw tree is a `serde_json::Value` shaped the way the codec produces it:
//! every child element sits in a list (even singletons), `@`-prefixed keys are
//! attributes of the current element, and a `Value` list carries the scalar
//! payload of an attribute tag. Nothing here fails on a missing section, an
//! absent key simply reads as "not there".

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{MamlError, Result};
use crate::identity::{IdHasher, IdRegistry};

pub type Node = Value;

pub const ID: &str = "@ID";
pub const NAME: &str = "@Name";

const EMPTY: &[Node] = &[];

/// Textual form of a scalar, `None` for null and containers.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn attr<'a>(node: &'a Node, name: &str) -> Option<&'a str> {
    node.get(name)?.as_str()
}

pub fn attr_text(node: &Node, name: &str) -> Option<String> {
    node.get(name).and_then(text)
}

pub fn set_attr(node: &mut Node, name: &str, value: impl Into<Value>) {
    if let Value::Object(map) = node {
        map.insert(name.to_owned(), value.into());
    }
}

pub fn name(node: &Node) -> Option<&str> {
    attr(node, NAME)
}

pub fn id(node: &Node) -> Option<&str> {
    attr(node, ID)
}

pub fn children<'a>(node: &'a Node, tag: &str) -> &'a [Node] {
    match node.get(tag) {
        Some(Value::Array(list)) => list,
        _ => EMPTY,
    }
}

pub fn children_mut<'a>(node: &'a mut Node, tag: &str) -> Option<&'a mut Vec<Node>> {
    match node.get_mut(tag) {
        Some(Value::Array(list)) => Some(list),
        _ => None,
    }
}

/// Child list under `tag`, created empty when the section is missing.
pub fn children_entry<'a>(node: &'a mut Node, tag: &str) -> Result<&'a mut Vec<Node>> {
    let map = node
        .as_object_mut()
        .ok_or_else(|| MamlError::Malformed(format!("cannot add <{tag}> to a scalar node")))?;
    let entry = map
        .entry(tag.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    match entry {
        Value::Array(list) => Ok(list),
        _ => Err(MamlError::Malformed(format!("<{tag}> is not a list"))),
    }
}

pub fn find_named<'a>(list: &'a [Node], name: &str) -> Option<&'a Node> {
    list.iter().find(|n| self::name(n) == Some(name))
}

pub fn find_named_mut<'a>(list: &'a mut [Node], name: &str) -> Option<&'a mut Node> {
    list.iter_mut().find(|n| self::name(n) == Some(name))
}

/// First entry of the `Value` list.
pub fn value(node: &Node) -> Option<String> {
    children(node, "Value").first().and_then(text)
}

pub fn set_value(node: &mut Node, value: &str) {
    set_attr(node, "Value", Value::Array(vec![Value::String(value.to_owned())]));
}

/// Every occurrence of `key` below `node`, paired with the map holding it.
pub fn find_key<'a>(node: &'a Node, key: &str) -> Vec<(&'a Value, &'a Node)> {
    let mut found = Vec::new();
    collect_key(node, key, &mut found);
    found
}

fn collect_key<'a>(node: &'a Node, key: &str, found: &mut Vec<(&'a Value, &'a Node)>) {
    match node {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push((v, node));
                }
                collect_key(v, key, found);
            }
        }
        Value::Array(list) => {
            for item in list {
                collect_key(item, key, found);
            }
        }
        _ => (),
    }
}

/// Maps every identifier below `node` to the node declaring it.
///
/// Two different nodes claiming the same identifier signal a corrupt
/// document. Structurally identical duplicates are let through, which is how
/// copied fragments have always been treated.
pub fn unique_ids<'a>(node: &'a Node, key: &str) -> Result<HashMap<String, &'a Node, IdHasher>> {
    let mut result: HashMap<String, &Node, IdHasher> = HashMap::default();
    for (value, holder) in find_key(node, key) {
        let Some(id) = text(value) else { continue };
        match result.get(&id) {
            Some(previous) if *previous != holder => {
                return Err(MamlError::IdentifierCollision { id });
            }
            Some(_) => (),
            None => {
                result.insert(id, holder);
            }
        }
    }
    Ok(result)
}

fn is_null_id(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s.eq_ignore_ascii_case("none"),
        _ => false,
    }
}

/// Replaces every null `@ID` below `node` with a fresh identifier.
pub fn fix_null_ids(node: &mut Node, ids: &mut IdRegistry) -> usize {
    let mut fixed = 0;
    match node {
        Value::Object(map) => {
            if map.get(ID).is_some_and(is_null_id) {
                map.insert(ID.to_owned(), Value::String(ids.generate()));
                fixed += 1;
            }
            for (_, child) in map.iter_mut() {
                fixed += fix_null_ids(child, ids);
            }
        }
        Value::Array(list) => {
            for item in list {
                fixed += fix_null_ids(item, ids);
            }
        }
        _ => (),
    }
    fixed
}

/// Retains every non-null `@ID` below `node`.
pub fn retain_ids(node: &Node, ids: &mut IdRegistry) {
    for (value, _) in find_key(node, ID) {
        if !is_null_id(value) {
            if let Some(id) = text(value) {
                ids.retain(&id);
            }
        }
    }
}
