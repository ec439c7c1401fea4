//! Namespace tree construction.
//!
//! Dotted plugin ids are folded into a tree whose inner nodes are groups
//! (one per shared prefix) and whose leaves are the plugins themselves.
//! Children keep the order in which their first id was seen.

use std::fmt;

use rustc_hash::FxHashMap;

/// A plugin id paired with the class implementing it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PluginEntry {
    pub id: String,
    pub implementation_class: String,
}

impl PluginEntry {
    pub fn new(id: impl Into<String>, implementation_class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            implementation_class: implementation_class.into(),
        }
    }
}

/// Reasons a catalogue cannot be turned into a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("malformed plugin id `{id}`: {reason}")]
    MalformedId { id: String, reason: &'static str },

    #[error("plugin id `{plugin_id}` is also a prefix of other plugin ids (group `{group_id}`)")]
    PrefixCollision { plugin_id: String, group_id: String },
}

/// A node of the namespace tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginTree {
    PluginGroup {
        /// Segments from the root down to this group.
        path: Vec<String>,
        plugins: PluginTrees,
    },
    PluginSpec {
        id: String,
        implementation_class: String,
    },
}

impl PluginTree {
    /// Build the forest for `entries`, keyed by the first id segment.
    ///
    /// Every id is validated before any node is built. A repeated id keeps
    /// its first position and takes the implementation class of the last
    /// occurrence.
    pub fn of<'a, I>(entries: I) -> Result<PluginTrees, TreeError>
    where
        I: IntoIterator<Item = &'a PluginEntry>,
        I::IntoIter: Clone,
    {
        let entries = entries.into_iter();
        for entry in entries.clone() {
            validate_plugin_id(&entry.id)?;
        }

        let mut root = PluginTrees::default();
        for entry in entries {
            root.insert(entry)?;
        }
        Ok(root)
    }
}

/// Ordered map from a segment to the subtree under it.
#[derive(Clone, Debug, Default)]
pub struct PluginTrees {
    entries: Vec<(String, PluginTree)>,
    index: FxHashMap<String, usize>,
}

impl PluginTrees {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, segment: &str) -> Option<&PluginTree> {
        self.index.get(segment).map(|&i| &self.entries[i].1)
    }

    /// Children in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, PluginTree)> {
        self.entries.iter()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(segment, _)| segment.as_str())
    }

    fn insert(&mut self, entry: &PluginEntry) -> Result<(), TreeError> {
        let segments: Vec<&str> = entry.id.split('.').collect();
        let Some((leaf, prefix)) = segments.split_last() else {
            return Ok(());
        };

        let mut current = self;
        for depth in 0..prefix.len() {
            current = current.group_entry(&segments[..=depth])?;
        }
        current.put_spec(leaf, entry)
    }

    /// Walk into the group at the last segment of `path`, creating it if needed.
    fn group_entry(&mut self, path: &[&str]) -> Result<&mut PluginTrees, TreeError> {
        let segment = path[path.len() - 1];
        let index = match self.index.get(segment) {
            Some(&index) => index,
            None => self.push(
                segment,
                PluginTree::PluginGroup {
                    path: path.iter().map(|s| (*s).to_owned()).collect(),
                    plugins: PluginTrees::default(),
                },
            ),
        };

        match &mut self.entries[index].1 {
            PluginTree::PluginGroup { plugins, .. } => Ok(plugins),
            PluginTree::PluginSpec { id, .. } => Err(TreeError::PrefixCollision {
                plugin_id: id.clone(),
                group_id: path.join("."),
            }),
        }
    }

    fn put_spec(&mut self, segment: &str, entry: &PluginEntry) -> Result<(), TreeError> {
        let Some(&index) = self.index.get(segment) else {
            self.push(
                segment,
                PluginTree::PluginSpec {
                    id: entry.id.clone(),
                    implementation_class: entry.implementation_class.clone(),
                },
            );
            return Ok(());
        };

        match &mut self.entries[index].1 {
            PluginTree::PluginSpec {
                implementation_class,
                ..
            } => {
                implementation_class.clone_from(&entry.implementation_class);
                Ok(())
            }
            PluginTree::PluginGroup { path, .. } => Err(TreeError::PrefixCollision {
                plugin_id: entry.id.clone(),
                group_id: path.join("."),
            }),
        }
    }

    fn push(&mut self, segment: &str, tree: PluginTree) -> usize {
        let index = self.entries.len();
        self.entries.push((segment.to_owned(), tree));
        self.index.insert(segment.to_owned(), index);
        index
    }
}

impl PartialEq for PluginTrees {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for PluginTrees {}

impl<'a> IntoIterator for &'a PluginTrees {
    type Item = &'a (String, PluginTree);
    type IntoIter = std::slice::Iter<'a, (String, PluginTree)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PluginTrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_level(
            f: &mut fmt::Formatter<'_>,
            trees: &PluginTrees,
            indent: usize,
        ) -> fmt::Result {
            for (segment, tree) in trees {
                match tree {
                    PluginTree::PluginGroup { plugins, .. } => {
                        writeln!(f, "{:indent$}{segment}/", "")?;
                        write_level(f, plugins, indent + 2)?;
                    }
                    PluginTree::PluginSpec {
                        implementation_class,
                        ..
                    } => writeln!(f, "{:indent$}{segment} -> {implementation_class}", "")?,
                }
            }
            Ok(())
        }
        write_level(f, self, 0)
    }
}

/// Characters that cannot appear in a JVM name or a backticked Kotlin name.
const ILLEGAL_ID_CHARS: &[char] = &['/', ';', '[', '<', '>', '`', '\n', '\r'];

fn validate_plugin_id(id: &str) -> Result<(), TreeError> {
    let malformed = |reason| TreeError::MalformedId {
        id: id.to_owned(),
        reason,
    };

    if id.is_empty() {
        return Err(malformed("id is empty"));
    }
    if id.starts_with('.') || id.ends_with('.') {
        return Err(malformed("id starts or ends with `.`"));
    }
    for segment in id.split('.') {
        if segment.is_empty() {
            return Err(malformed("id contains an empty segment"));
        }
        if segment.contains(ILLEGAL_ID_CHARS) {
            return Err(malformed(
                "segment contains one of `/`, `;`, `[`, `<`, `>`, a backtick or a line break",
            ));
        }
    }
    Ok(())
}
