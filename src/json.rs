//! JSON rendition of the result tree.
//!
//! Every node is an object tagged by `kind`:
//!
//! ```txt
//! {"kind": "group", "attrs": {"count": 3}, "children": {...}}
//! {"kind": "dataset", "dtype": "float64", "shape": [2, 4], "data": [[...], [...]]}
//! ```
//!
//! `shape` and `dtype` are optional. Without `shape` the nesting of `data`
//! gives the shape; with it `data` may be flat. Text elements may be given
//! as strings or as arrays of byte values.

use crate::container::{AttrValue, Container, Dataset, Dtype, Entry, Group, Values};
use crate::error::{Error, Result};

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawNode {
    Group {
        #[serde(default)]
        attrs: BTreeMap<String, RawAttr>,
        #[serde(default)]
        children: BTreeMap<String, RawNode>,
    },
    Dataset {
        #[serde(default)]
        shape: Option<Vec<usize>>,
        #[serde(default)]
        dtype: Option<String>,
        data: Value,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttr {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<f64>),
}

impl From<RawAttr> for AttrValue {
    fn from(raw: RawAttr) -> Self {
        match raw {
            RawAttr::Bool(b) => AttrValue::Int(b as i64),
            RawAttr::Int(i) => AttrValue::Int(i),
            RawAttr::Float(f) => AttrValue::Float(f),
            RawAttr::Text(s) => AttrValue::Text(s),
            RawAttr::Array(a) => AttrValue::Array(a),
        }
    }
}

/// Reads the whole tree from a JSON file.
pub fn load(path: &Path) -> Result<Container> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(path, &text)
}

/// Parses a JSON tree. `path` only names the source in errors.
pub fn parse(path: &Path, text: &str) -> Result<Container> {
    let format_err = |message: String| Error::Format {
        path: path.to_path_buf(),
        message,
    };
    let raw: RawNode = serde_json::from_str(text).map_err(|e| format_err(e.to_string()))?;
    match build(raw, "").map_err(format_err)? {
        Entry::Group(root) => Ok(Container::new(path, root)),
        Entry::Dataset(_) => Err(format_err("root node must be a group".to_string())),
    }
}

fn build(raw: RawNode, at: &str) -> std::result::Result<Entry, String> {
    match raw {
        RawNode::Group { attrs, children } => {
            let mut group = Group::new();
            for (name, value) in attrs {
                group.set_attr(name, value.into());
            }
            for (name, child) in children {
                if name.is_empty() || name.contains('/') {
                    return Err(format!("invalid member name '{}' in '{}'", name, at));
                }
                let child_path = if at.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", at, name)
                };
                group.insert(name, build(child, &child_path)?);
            }
            Ok(Entry::Group(group))
        }
        RawNode::Dataset { shape, dtype, data } => {
            let dataset = build_dataset(shape, dtype, &data).map_err(|e| format!("{}: {}", at, e))?;
            Ok(Entry::Dataset(dataset))
        }
    }
}

enum Leaf<'a> {
    Num(&'a serde_json::Number),
    Bool(bool),
    Text(String),
}

fn build_dataset(
    shape: Option<Vec<usize>>,
    dtype: Option<String>,
    data: &Value,
) -> std::result::Result<Dataset, String> {
    let dtype = dtype.map(|s| s.parse::<Dtype>()).transpose()?;
    let text = match dtype {
        Some(d) => d == Dtype::Str,
        None => contains_string(data),
    };

    let mut flat = Flat::default();
    flat.visit(data, text, 0)?;
    let Flat { dims, leaves, .. } = flat;

    let shape = match shape {
        Some(shape) => shape,
        None => dims,
    };
    let dtype = dtype.unwrap_or_else(|| infer_dtype(text, &leaves));

    let values = match dtype {
        Dtype::Str => Values::Text(
            leaves
                .into_iter()
                .map(|leaf| match leaf {
                    Leaf::Text(s) => Ok(s),
                    _ => Err("text dataset holds a non-text element".to_string()),
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
        Dtype::Float(_) => Values::Float(
            leaves
                .iter()
                .map(|leaf| match leaf {
                    Leaf::Num(n) => n.as_f64().ok_or_else(|| format!("bad number {}", n)),
                    Leaf::Bool(b) => Ok(*b as i64 as f64),
                    Leaf::Text(_) => Err("numeric dataset holds text".to_string()),
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
        Dtype::Int(_) | Dtype::UInt(_) | Dtype::Bool => Values::Int(
            leaves
                .iter()
                .map(|leaf| match leaf {
                    Leaf::Num(n) => n.as_i64().ok_or_else(|| format!("{} is not an integer", n)),
                    Leaf::Bool(b) => Ok(*b as i64),
                    Leaf::Text(_) => Err("numeric dataset holds text".to_string()),
                })
                .collect::<std::result::Result<_, _>>()?,
        ),
    };
    Dataset::new(shape, dtype, values)
}

fn contains_string(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(a) => a.iter().any(contains_string),
        _ => false,
    }
}

/// A non-empty array of integers in `0..=255` standing for one text element.
fn byte_string(value: &Value) -> Option<String> {
    let items = value.as_array().filter(|a| !a.is_empty())?;
    let bytes = items
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Default)]
struct Flat<'a> {
    dims: Vec<usize>,
    leaves: Vec<Leaf<'a>>,
    leaf_depth: Option<usize>,
}

impl<'a> Flat<'a> {
    fn push(&mut self, leaf: Leaf<'a>, depth: usize) -> std::result::Result<(), String> {
        match self.leaf_depth {
            Some(d) if d != depth => {
                return Err(format!("ragged data: element at depth {}, expected {}", depth, d))
            }
            Some(_) => {}
            None => self.leaf_depth = Some(depth),
        }
        self.leaves.push(leaf);
        Ok(())
    }

    fn visit(&mut self, value: &'a Value, text: bool, depth: usize) -> std::result::Result<(), String> {
        if text {
            if let Some(s) = byte_string(value) {
                return self.push(Leaf::Text(s), depth);
            }
        }
        match value {
            Value::Array(items) => {
                match self.dims.get(depth) {
                    Some(&n) if n != items.len() => {
                        return Err(format!(
                            "ragged data: {} elements at depth {}, expected {}",
                            items.len(),
                            depth,
                            n
                        ))
                    }
                    Some(_) => {}
                    None => self.dims.push(items.len()),
                }
                for item in items {
                    self.visit(item, text, depth + 1)?;
                }
                Ok(())
            }
            Value::Number(n) if text => Err(format!("text dataset holds number {}", n)),
            Value::Number(n) => self.push(Leaf::Num(n), depth),
            Value::Bool(b) => self.push(Leaf::Bool(*b), depth),
            Value::String(s) => self.push(Leaf::Text(s.clone()), depth),
            Value::Null | Value::Object(_) => Err("unsupported element".to_string()),
        }
    }
}

fn infer_dtype(text: bool, leaves: &[Leaf<'_>]) -> Dtype {
    if text {
        Dtype::Str
    } else if !leaves.is_empty() && leaves.iter().all(|l| matches!(l, Leaf::Bool(_))) {
        Dtype::Bool
    } else if leaves.iter().all(|l| match l {
        Leaf::Num(n) => n.is_i64() || n.is_u64(),
        _ => true,
    }) {
        Dtype::Int(64)
    } else {
        Dtype::Float(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Node;
    use anyhow::{format_err, Result};

    fn dataset(c: &Container, path: &str) -> Result<Dataset> {
        match c.node(path) {
            Some(Node::Dataset(d)) => Ok(d.clone()),
            _ => Err(format_err!("'{}' must be a dataset", path)),
        }
    }

    #[test]
    fn test_parse_tree() -> Result<()> {
        let c = parse(
            Path::new("t.json"),
            r#"{
                "kind": "group",
                "children": {
                    "contingencies": {
                        "kind": "group",
                        "attrs": {"count": 2, "base": 100.0, "tag": "n-1", "ok": true},
                        "children": {
                            "types": {"kind": "dataset", "data": [0, 1]},
                            "names": {"kind": "dataset", "dtype": "str", "data": ["L1", [71, 50]]}
                        }
                    },
                    "load": {"kind": "dataset", "data": [[10, 5.5], [20, 8]]},
                    "flat": {"kind": "dataset", "shape": [2, 2], "dtype": "float32", "data": [1, 2, 3, 4]}
                }
            }"#,
        )?;

        let group = c.group("contingencies")?;
        assert_eq!(group.attr("count"), Some(&AttrValue::Int(2)));
        assert_eq!(group.attr("base"), Some(&AttrValue::Float(100.0)));
        assert_eq!(group.attr("tag"), Some(&AttrValue::Text("n-1".into())));
        assert_eq!(group.attr("ok"), Some(&AttrValue::Int(1)));

        let types = dataset(&c, "contingencies/types")?;
        assert_eq!(types.dtype(), Dtype::Int(64));
        assert_eq!(types.shape(), &[2]);

        let names = dataset(&c, "contingencies/names")?;
        assert_eq!(names.labels(), vec!["L1", "G2"]);

        let load = dataset(&c, "load")?;
        assert_eq!(load.dtype(), Dtype::Float(64));
        assert_eq!(load.shape(), &[2, 2]);
        assert_eq!(load.values(), &Values::Float(vec![10.0, 5.5, 20.0, 8.0]));

        let flat = dataset(&c, "flat")?;
        assert_eq!(flat.dtype(), Dtype::Float(32));
        assert_eq!(flat.shape(), &[2, 2]);
        Ok(())
    }

    #[test]
    fn test_text_matrix() -> Result<()> {
        let c = parse(
            Path::new("t.json"),
            r#"{"kind": "group", "children": {
                "ids": {"kind": "dataset", "dtype": "str", "data": [["a", "b"], [[99], "d"]]}
            }}"#,
        )?;
        let ids = dataset(&c, "ids")?;
        assert_eq!(ids.shape(), &[2, 2]);
        assert_eq!(ids.labels(), vec!["a", "b", "c", "d"]);
        Ok(())
    }

    #[test]
    fn test_reject_malformed() {
        let bad = [
            r#"{"kind": "dataset", "data": [1]}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "dataset", "data": [[1, 2], [3]]}}}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "dataset", "data": [1, [2]]}}}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "dataset", "shape": [3], "data": [1, 2]}}}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "dataset", "dtype": "int64", "data": [1.5]}}}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "dataset", "dtype": "complex", "data": [1]}}}"#,
            r#"{"kind": "group", "children": {"x": {"kind": "thing"}}}"#,
            r#"not json"#,
            r#"{"kind": "group", "children": {"a/b": {"kind": "dataset", "data": [1]}}}"#,
            r#"{"kind": "group", "children": {"g": {"kind": "group", "children": {"": {"kind": "dataset", "data": [1]}}}}}"#,
        ];
        for text in bad {
            match parse(Path::new("bad.json"), text) {
                Err(Error::Format { .. }) => {}
                other => panic!("{} must fail to decode, got {:?}", text, other.map(|_| ())),
            }
        }
    }
}
