use crate::container::{AttrValue, Container, Dtype, Entry};
use crate::format::{format_attr, format_shape};

use std::collections::{btree_map, BTreeMap};
use std::fmt;

/// What a visited node carries: shape and type for a dataset, attributes
/// for a group.
#[derive(Debug, Copy, Clone)]
pub enum Detail<'a> {
    Dataset { shape: &'a [usize], dtype: Dtype },
    Group { attrs: &'a BTreeMap<String, AttrValue> },
}

#[derive(Debug, Clone)]
pub struct Visit<'a> {
    pub path: String,
    pub detail: Detail<'a>,
}

impl<'a> Visit<'a> {
    /// Number of path separators, i.e. nesting below the top level.
    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

/// Lazy depth-first traversal. Parents come before their children and
/// siblings in name order. The root group itself is not visited.
pub struct Walk<'a> {
    stack: Vec<(String, btree_map::Iter<'a, String, Entry>)>,
}

/// Enumerates every group and dataset of `container` exactly once.
pub fn walk(container: &Container) -> Walk<'_> {
    Walk {
        stack: vec![(String::new(), container.root().children().iter())],
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Visit<'a>> {
        loop {
            let (prefix, children) = self.stack.last_mut()?;
            let (name, entry) = match children.next() {
                Some(child) => child,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            let detail = match entry {
                Entry::Group(g) => {
                    self.stack.push((path.clone(), g.children().iter()));
                    Detail::Group { attrs: g.attrs() }
                }
                Entry::Dataset(d) => Detail::Dataset {
                    shape: d.shape(),
                    dtype: d.dtype(),
                },
            };
            return Some(Visit { path, detail });
        }
    }
}

/// Renders the full structure of a container, one line per node with
/// two spaces of indent per path separator.
pub struct StructureListing<'a> {
    container: &'a Container,
}

impl<'a> StructureListing<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }
}

impl fmt::Display for StructureListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let banner = "=".repeat(60);
        writeln!(f, "{}", banner)?;
        writeln!(f, "HDF5 Structure: {}", self.container.source().display())?;
        writeln!(f, "{}", banner)?;

        for visit in walk(self.container) {
            let indent = "  ".repeat(visit.depth());
            match visit.detail {
                Detail::Dataset { shape, dtype } => {
                    writeln!(f, "{}{}: {} {}", indent, visit.path, format_shape(shape), dtype)?
                }
                Detail::Group { attrs } => {
                    writeln!(f, "{}{}/", indent, visit.path)?;
                    for (key, value) in attrs {
                        writeln!(f, "{}  @{} = {}", indent, key, format_attr(value))?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::resolve;
    use crate::tests::fixture::ScenarioBuilder;
    use anyhow::{format_err, Result};

    #[test]
    fn test_walk_order() -> Result<()> {
        let c = ScenarioBuilder::small().contingencies(1).build()?;
        let paths: Vec<String> = walk(&c).map(|v| v.path).collect();

        let pos = |p: &str| {
            paths
                .iter()
                .position(|x| x == p)
                .ok_or_else(|| format_err!("'{}' not visited", p))
        };
        assert!(pos("base_solution")? < pos("base_solution/opf")?);
        assert!(pos("base_solution/opf")? < pos("base_solution/opf/nodes/bus")?);
        assert!(pos("base_solution/opf/nodes/bus")? < pos("base_solution/opf/nodes/generator")?);
        assert!(pos("base_solution/opf/nodes/load")? < pos("contingencies")?);
        assert!(pos("contingencies/types")? < pos("grid")?);

        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), paths.len());
        Ok(())
    }

    #[test]
    fn test_walk_is_repeatable() -> Result<()> {
        let c = ScenarioBuilder::small().contingencies(2).build()?;
        let first: Vec<String> = walk(&c).map(|v| v.path).collect();
        let second: Vec<String> = walk(&c).map(|v| v.path).collect();
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_every_walked_path_resolves() -> Result<()> {
        let c = ScenarioBuilder::small().contingencies(3).failing(2).build()?;
        for visit in walk(&c) {
            if resolve(&c, &visit.path).is_err() {
                return Err(format_err!("walked path '{}' does not resolve", visit.path));
            }
        }
        Ok(())
    }

    #[test]
    fn test_structure_listing() -> Result<()> {
        let c = ScenarioBuilder::small().contingencies(1).build()?;
        let text = StructureListing::new(&c).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines.contains(&"grid/"));
        assert!(lines.contains(&"    grid/nodes/load: (2, 4) float64"));
        assert!(lines.contains(&"contingencies/"));
        assert!(lines.contains(&"  @count = 1"));
        assert!(lines.contains(&"  post_contingency/contingency_000001/"));
        assert!(lines.contains(&"    @opf_converged = 1"));
        assert!(lines.contains(&"  contingencies/types: (1,) int64"));
        Ok(())
    }
}
