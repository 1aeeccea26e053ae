use std::cmp::Ordering;
use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::CatalogError;
use crate::naming::nice_name;
use crate::record::{EntryPoint, ModuleRecord};
use crate::registry::ModuleRegistry;

/// Display-ready copy of one entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceEntry {
    pub display_name: String,
    pub raw_name: String,
    pub owning_module: String,
    pub category: String,
    pub description: Option<String>,
    pub module_path: PathBuf,
}

impl InterfaceEntry {
    /// Entry points without a declared category are grouped under their
    /// module's nice name.
    pub fn new(record: &ModuleRecord, entry_point: &EntryPoint) -> Self {
        Self {
            display_name: nice_name(&entry_point.name),
            raw_name: entry_point.name.clone(),
            owning_module: record.name().to_string(),
            category: entry_point
                .category
                .clone()
                .unwrap_or_else(|| nice_name(record.name())),
            description: entry_point.description.clone(),
            module_path: record.path().to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub entries: Vec<InterfaceEntry>,
}

/// Sorted, filterable index over every entry point in a registry.
///
/// Groups are ordered by category and entries by display name, both ignoring
/// case. Display names are unique across the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    groups: Vec<CategoryGroup>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh catalog from the registry's current entry points.
    pub fn build(registry: &ModuleRegistry) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for name in registry.names() {
            let Some(record) = registry.lookup(&name) else {
                continue;
            };
            for entry_point in record.entry_points() {
                catalog.register(InterfaceEntry::new(record, entry_point))?;
            }
        }
        Ok(catalog)
    }

    pub fn register(&mut self, entry: InterfaceEntry) -> Result<(), CatalogError> {
        if let Some(existing) = self.get(&entry.display_name) {
            return Err(CatalogError::DuplicateInterfaceName {
                display_name: entry.display_name,
                first: existing.owning_module.clone(),
                second: entry.owning_module,
            });
        }

        let group_index = match self
            .groups
            .binary_search_by(|group| compare_names(&group.name, &entry.category))
        {
            Ok(index) => index,
            Err(index) => {
                self.groups.insert(
                    index,
                    CategoryGroup {
                        name: entry.category.clone(),
                        entries: Vec::new(),
                    },
                );
                index
            }
        };
        let entries = &mut self.groups[group_index].entries;
        let position = entries
            .binary_search_by(|existing| compare_names(&existing.display_name, &entry.display_name))
            .unwrap_or_else(|index| index);
        entries.insert(position, entry);
        Ok(())
    }

    pub fn unregister(&mut self, display_name: &str) -> Result<InterfaceEntry, CatalogError> {
        for group_index in 0..self.groups.len() {
            let entries = &mut self.groups[group_index].entries;
            if let Some(position) = entries.iter().position(|e| e.display_name == display_name) {
                let entry = entries.remove(position);
                if entries.is_empty() {
                    self.groups.remove(group_index);
                }
                return Ok(entry);
            }
        }
        Err(CatalogError::UnknownInterface(display_name.to_string()))
    }

    pub fn get(&self, display_name: &str) -> Option<&InterfaceEntry> {
        self.iter().find(|entry| entry.display_name == display_name)
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// All entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.groups.iter().flat_map(|group| group.entries.iter())
    }

    pub fn entries_for_module<'a>(
        &'a self,
        module: &'a str,
    ) -> impl Iterator<Item = &'a InterfaceEntry> + 'a {
        self.iter().filter(move |entry| entry.owning_module == module)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Case-insensitive [`filter_with`](Catalog::filter_with).
    pub fn filter(&self, pattern: &str) -> Result<Filter<'_>, CatalogError> {
        self.filter_with(pattern, true)
    }

    /// Entries whose display name contains a match for the regular
    /// expression `pattern`. Raw symbol names are never matched.
    pub fn filter_with(
        &self,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Filter<'_>, CatalogError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Filter {
            catalog: self,
            pattern,
        })
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A filtered view over a [`Catalog`]. Iterating does not consume it.
#[derive(Debug, Clone)]
pub struct Filter<'a> {
    catalog: &'a Catalog,
    pattern: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredGroup<'a> {
    pub name: &'a str,
    pub entries: Vec<&'a InterfaceEntry>,
}

impl<'a> Filter<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a InterfaceEntry> + '_ {
        let catalog: &'a Catalog = self.catalog;
        catalog
            .iter()
            .filter(move |entry| self.pattern.is_match(&entry.display_name))
    }

    /// Matching entries with their category grouping; empty groups are skipped.
    pub fn groups(&self) -> impl Iterator<Item = FilteredGroup<'a>> + '_ {
        let catalog: &'a Catalog = self.catalog;
        catalog.groups.iter().filter_map(move |group| {
            let entries: Vec<_> = group
                .entries
                .iter()
                .filter(|entry| self.pattern.is_match(&entry.display_name))
                .collect();
            (!entries.is_empty()).then_some(FilteredGroup {
                name: group.name.as_str(),
                entries,
            })
        })
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

impl<'f, 'a> IntoIterator for &'f Filter<'a> {
    type Item = &'a InterfaceEntry;
    type IntoIter = Box<dyn Iterator<Item = &'a InterfaceEntry> + 'f>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
