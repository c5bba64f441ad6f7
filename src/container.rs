use crate::error::SchemaError;
use crate::table::{Table, TableBuilder};

use num_traits::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Element type tag of a dataset, as reported by the backing file.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum Dtype {
    /// Signed integer with the given bit width.
    Int(u8),
    /// Unsigned integer with the given bit width.
    UInt(u8),
    /// IEEE float with the given bit width.
    Float(u8),
    Bool,
    /// Text, whatever the on-disk string encoding.
    Str,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Int(bits) => write!(f, "int{}", bits),
            Dtype::UInt(bits) => write!(f, "uint{}", bits),
            Dtype::Float(bits) => write!(f, "float{}", bits),
            Dtype::Bool => write!(f, "bool"),
            Dtype::Str => write!(f, "str"),
        }
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = |digits: &str, allowed: &[u8]| -> Result<u8, String> {
            digits
                .parse::<u8>()
                .ok()
                .filter(|b| allowed.contains(b))
                .ok_or_else(|| format!("unsupported dtype '{}'", s))
        };
        if s == "bool" {
            Ok(Dtype::Bool)
        } else if s == "str" {
            Ok(Dtype::Str)
        } else if let Some(b) = s.strip_prefix("uint") {
            Ok(Dtype::UInt(bits(b, &[8, 16, 32, 64])?))
        } else if let Some(b) = s.strip_prefix("int") {
            Ok(Dtype::Int(bits(b, &[8, 16, 32, 64])?))
        } else if let Some(b) = s.strip_prefix("float") {
            Ok(Dtype::Float(bits(b, &[32, 64])?))
        } else {
            Err(format!("unsupported dtype '{}'", s))
        }
    }
}

/// Flat row-major element storage of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values widened to `f64`; `None` for text.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Values::Float(v) => Some(v.clone()),
            Values::Int(v) => Some(v.iter().map(|&i| i as f64).collect()),
            Values::Text(_) => None,
        }
    }
}

/// Value of a named attribute on a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<f64>),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Array(a) if a.len() == 1 => Some(a[0]),
            _ => None,
        }
    }

    /// Integer value, accepting integral floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => self
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(|f| f.to_i64()),
        }
    }
}

/// Typed multi-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    shape: Vec<usize>,
    dtype: Dtype,
    values: Values,
}

impl Dataset {
    /// Checks that `shape` covers exactly the given values and that the
    /// storage variant fits the dtype.
    pub fn new(shape: Vec<usize>, dtype: Dtype, values: Values) -> Result<Self, String> {
        let expect: usize = shape.iter().product();
        if values.len() != expect {
            return Err(format!(
                "{} values do not fill shape {:?}",
                values.len(),
                shape
            ));
        }
        let fits = matches!(
            (&values, dtype),
            (Values::Float(_), Dtype::Float(_))
                | (Values::Int(_), Dtype::Int(_) | Dtype::UInt(_) | Dtype::Bool)
                | (Values::Text(_), Dtype::Str)
        );
        if !fits {
            return Err(format!("values cannot be stored as {}", dtype));
        }
        Ok(Self {
            shape,
            dtype,
            values,
        })
    }

    pub fn float(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, String> {
        Self::new(shape, Dtype::Float(64), Values::Float(values))
    }

    pub fn int(shape: Vec<usize>, values: Vec<i64>) -> Result<Self, String> {
        Self::new(shape, Dtype::Int(64), Values::Int(values))
    }

    pub fn text(values: Vec<String>) -> Result<Self, String> {
        Self::new(vec![values.len()], Dtype::Str, Values::Text(values))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric dataset of rank 1 or 2 as a table. A vector becomes a
    /// single-column table.
    pub fn to_table(&self) -> Option<Table> {
        let (rows, cols) = match self.shape.as_slice() {
            [n] => (*n, 1),
            [r, c] => (*r, *c),
            _ => return None,
        };
        TableBuilder::default()
            .rows(rows)
            .cols(cols)
            .values(self.values.to_f64()?)
            .build()
            .ok()
    }

    /// Every element rendered as text. Text passes through verbatim.
    pub fn labels(&self) -> Vec<String> {
        match &self.values {
            Values::Text(v) => v.clone(),
            Values::Int(v) => v.iter().map(|i| i.to_string()).collect(),
            Values::Float(v) => v.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Integer codes, accepting integral floats. `None` if any element
    /// is text or fractional.
    pub fn codes(&self) -> Option<Vec<i64>> {
        match &self.values {
            Values::Int(v) => Some(v.clone()),
            Values::Float(v) => v
                .iter()
                .map(|f| if f.fract() == 0.0 { f.to_i64() } else { None })
                .collect(),
            Values::Text(_) => None,
        }
    }
}

/// Group node: named attributes plus named children, both kept in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: BTreeMap<String, AttrValue>,
    children: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Group(Group),
    Dataset(Dataset),
}

/// Borrowed view of a resolved node.
#[derive(Debug, Copy, Clone)]
pub enum Node<'a> {
    Group(&'a Group),
    Dataset(&'a Dataset),
}

impl<'a> From<&'a Entry> for Node<'a> {
    fn from(entry: &'a Entry) -> Self {
        match entry {
            Entry::Group(g) => Node::Group(g),
            Entry::Dataset(d) => Node::Dataset(d),
        }
    }
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn children(&self) -> &BTreeMap<String, Entry> {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children.get(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: AttrValue) {
        self.attrs.insert(name.into(), value);
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) {
        self.children.insert(name.into(), entry);
    }

    /// Inserts `entry` at a slash-delimited `path`, creating intermediate
    /// groups. Fails if a dataset sits on the way.
    pub fn insert_at(&mut self, path: &str, entry: Entry) -> Result<(), String> {
        let segs = segments(path).ok_or_else(|| format!("invalid path '{}'", path))?;
        let (last, parents) = segs
            .split_last()
            .ok_or_else(|| "cannot replace the root group".to_string())?;
        let mut group = self;
        for seg in parents {
            let next = group
                .children
                .entry(seg.to_string())
                .or_insert_with(|| Entry::Group(Group::new()));
            group = match next {
                Entry::Group(g) => g,
                Entry::Dataset(_) => return Err(format!("'{}' in '{}' is a dataset", seg, path)),
            };
        }
        group.insert(*last, entry);
        Ok(())
    }

    /// Group at `path`, created if missing.
    pub fn group_at_mut(&mut self, path: &str) -> Result<&mut Group, String> {
        let segs = segments(path).ok_or_else(|| format!("invalid path '{}'", path))?;
        let mut group = self;
        for seg in segs {
            let next = group
                .children
                .entry(seg.to_string())
                .or_insert_with(|| Entry::Group(Group::new()));
            group = match next {
                Entry::Group(g) => g,
                Entry::Dataset(_) => return Err(format!("'{}' in '{}' is a dataset", seg, path)),
            };
        }
        Ok(group)
    }
}

/// Splits a path into its segments. A single leading `/` is ignored and
/// the empty path addresses the root. Empty segments are invalid.
pub(crate) fn segments(path: &str) -> Option<Vec<&str>> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Some(Vec::new());
    }
    let segs: Vec<&str> = path.split('/').collect();
    if segs.iter().any(|s| s.is_empty()) {
        None
    } else {
        Some(segs)
    }
}

/// An opened result file: the whole tree, read once and detached from the
/// file handle.
#[derive(Debug, Clone)]
pub struct Container {
    source: PathBuf,
    root: Group,
}

impl Container {
    pub fn new(source: impl AsRef<Path>, root: Group) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            root,
        }
    }

    /// Path of the file the tree was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Exact lookup of `path`.
    pub fn node(&self, path: &str) -> Option<Node<'_>> {
        let segs = segments(path)?;
        let mut node = Node::Group(&self.root);
        for seg in segs {
            node = match node {
                Node::Group(g) => g.child(seg)?.into(),
                Node::Dataset(_) => return None,
            };
        }
        Some(node)
    }

    pub fn dataset(&self, path: &str) -> Result<&Dataset, SchemaError> {
        match self.node(path) {
            Some(Node::Dataset(d)) => Ok(d),
            Some(Node::Group(_)) => Err(SchemaError::NotADataset(path.to_string())),
            None => Err(SchemaError::MissingPath(path.to_string())),
        }
    }

    pub fn group(&self, path: &str) -> Result<&Group, SchemaError> {
        match self.node(path) {
            Some(Node::Group(g)) => Ok(g),
            Some(Node::Dataset(_)) => Err(SchemaError::NotAGroup(path.to_string())),
            None => Err(SchemaError::MissingPath(path.to_string())),
        }
    }

    pub fn attr(&self, path: &str, name: &str) -> Result<&AttrValue, SchemaError> {
        self.group(path)?
            .attr(name)
            .ok_or_else(|| SchemaError::MissingAttr {
                path: path.to_string(),
                name: name.to_string(),
            })
    }

    /// Numeric table at `path` with at least `min_cols` columns.
    pub fn table(&self, path: &str, min_cols: usize) -> Result<Table, SchemaError> {
        let dataset = self.dataset(path)?;
        let table = dataset.to_table().ok_or_else(|| SchemaError::BadShape {
            path: path.to_string(),
            message: format!(
                "must be a numeric 1-D or 2-D array, found {} with shape {:?}",
                dataset.dtype(),
                dataset.shape()
            ),
        })?;
        if table.cols() < min_cols {
            return Err(SchemaError::BadShape {
                path: path.to_string(),
                message: format!(
                    "has {} columns, expected at least {}",
                    table.cols(),
                    min_cols
                ),
            });
        }
        Ok(table)
    }
}
