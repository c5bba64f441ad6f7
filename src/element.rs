use crate::container::{AttrValue, Container, Dtype, Node, Values};
use crate::error::{Error, Result};
use crate::format::{format_attr, format_shape, format_values};
use crate::walk::walk;

use std::collections::BTreeMap;
use std::fmt;

/// A single resolved path.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Dataset {
        shape: &'a [usize],
        dtype: Dtype,
        values: &'a Values,
    },
    Group {
        attrs: &'a BTreeMap<String, AttrValue>,
        children: Vec<&'a str>,
    },
}

/// Resolves `path` by exact match. On failure the error lists every
/// path the container does have.
pub fn resolve<'a>(container: &'a Container, path: &str) -> Result<Resolved<'a>> {
    match container.node(path) {
        Some(Node::Dataset(d)) => Ok(Resolved::Dataset {
            shape: d.shape(),
            dtype: d.dtype(),
            values: d.values(),
        }),
        Some(Node::Group(g)) => Ok(Resolved::Group {
            attrs: g.attrs(),
            children: g.children().keys().map(String::as_str).collect(),
        }),
        None => {
            log::debug!("'{}' not found in {}", path, container.source().display());
            Err(Error::NotFound {
                path: path.to_string(),
                available: walk(container).map(|v| v.path).collect(),
            })
        }
    }
}

/// Renders a resolved element with its path.
pub struct ElementView<'a> {
    pub path: &'a str,
    pub node: &'a Resolved<'a>,
}

impl fmt::Display for ElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path: {}", self.path)?;
        match self.node {
            Resolved::Dataset {
                shape,
                dtype,
                values,
            } => {
                writeln!(f, "Type: Dataset")?;
                writeln!(f, "Shape: {}", format_shape(shape))?;
                writeln!(f, "Dtype: {}", dtype)?;
                writeln!(f)?;
                writeln!(f, "Data:")?;
                writeln!(f, "{}", format_values(shape, values))
            }
            Resolved::Group { attrs, children } => {
                writeln!(f, "Type: Group")?;
                writeln!(f, "Attributes:")?;
                for (key, value) in attrs.iter() {
                    writeln!(f, "  {} = {}", key, format_attr(value))?;
                }
                writeln!(f, "Children:")?;
                for name in children {
                    writeln!(f, "  {}", name)?;
                }
                Ok(())
            }
        }
    }
}

/// Recovery listing shown when a path does not resolve.
pub struct AvailablePaths<'a>(pub &'a [String]);

impl fmt::Display for AvailablePaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available paths:")?;
        for path in self.0 {
            writeln!(f, "  {}", path)?;
        }
        Ok(())
    }
}
