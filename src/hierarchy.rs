// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Two-level category tree built once from the flat `parent_id` list, so the
//! aggregation loops never chase parent pointers.

use crate::error::{IntegrityWarning, RecordRef};
use crate::models::Category;
use std::collections::{HashMap, HashSet};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub subgroups: Vec<i64>,
}

/// Where a category id sits once the tree is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Group(i64),
    Subgroup { group: i64, subgroup: i64 },
    /// Cyclic or dangling parent chain; counted as uncategorized.
    Detached,
}

/// Group/subgroup pair a record is counted under. `group == None` is the
/// synthetic uncategorized group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribution {
    pub group: Option<i64>,
    pub subgroup: Option<i64>,
}

impl Attribution {
    const UNCATEGORIZED: Attribution = Attribution {
        group: None,
        subgroup: None,
    };
}

#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    groups: Vec<Group>,
    placements: HashMap<i64, Placement>,
    names: HashMap<i64, String>,
    warnings: Vec<IntegrityWarning>,
}

impl CategoryTree {
    pub fn build(categories: &[Category]) -> Self {
        let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();
        let mut tree = CategoryTree::default();

        for c in categories {
            tree.names.insert(c.id, c.name.clone());
            let placement = match root_of(c, &by_id) {
                Some((root, 0)) => Placement::Group(root),
                Some((root, depth)) => {
                    if depth > 1 {
                        tree.warnings.push(IntegrityWarning::NestedTooDeep {
                            record: RecordRef::Category(c.id),
                            root,
                        });
                    }
                    Placement::Subgroup {
                        group: root,
                        subgroup: c.id,
                    }
                }
                None => {
                    tree.warnings.push(IntegrityWarning::BrokenParentChain {
                        record: RecordRef::Category(c.id),
                    });
                    Placement::Detached
                }
            };
            tree.placements.insert(c.id, placement);
        }

        for c in categories {
            if let Some(Placement::Group(id)) = tree.placements.get(&c.id) {
                tree.groups.push(Group {
                    id: *id,
                    name: c.name.clone(),
                    subgroups: Vec::new(),
                });
            }
        }
        for c in categories {
            if let Some(Placement::Subgroup { group, subgroup }) = tree.placements.get(&c.id) {
                if let Some(g) = tree.groups.iter_mut().find(|g| g.id == *group) {
                    g.subgroups.push(*subgroup);
                }
            }
        }
        tree
    }

    /// Groups in input order, each with its subgroups in input order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn placement(&self, id: i64) -> Option<Placement> {
        self.placements.get(&id).copied()
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Problems found in the category list itself.
    pub fn warnings(&self) -> &[IntegrityWarning] {
        &self.warnings
    }

    /// Resolves an expense's `(group_id, subgroup_id)` onto the normalized
    /// tree. The subgroup's real parent wins over a conflicting `group_id`.
    pub fn attribute(
        &self,
        record: RecordRef,
        group_id: Option<i64>,
        subgroup_id: Option<i64>,
        warnings: &mut Vec<IntegrityWarning>,
    ) -> Attribution {
        if let Some(sub) = subgroup_id {
            match self.placement(sub) {
                Some(Placement::Subgroup { group, subgroup }) => {
                    if let Some(gid) = group_id.filter(|gid| *gid != group) {
                        warnings.push(IntegrityWarning::SubgroupParentMismatch {
                            record,
                            group_id: gid,
                            subgroup_id: sub,
                            actual_parent: group,
                        });
                    }
                    return Attribution {
                        group: Some(group),
                        subgroup: Some(subgroup),
                    };
                }
                Some(Placement::Group(group)) => {
                    if let Some(gid) = group_id.filter(|gid| *gid != group) {
                        warnings.push(IntegrityWarning::SubgroupParentMismatch {
                            record,
                            group_id: gid,
                            subgroup_id: sub,
                            actual_parent: group,
                        });
                    }
                    return Attribution {
                        group: Some(group),
                        subgroup: None,
                    };
                }
                Some(Placement::Detached) => return Attribution::UNCATEGORIZED,
                None => warnings.push(IntegrityWarning::UnknownCategory {
                    record,
                    category_id: sub,
                }),
            }
        }

        match group_id {
            None => {
                if subgroup_id.is_none() {
                    warnings.push(IntegrityWarning::MissingGroup { record });
                }
                Attribution::UNCATEGORIZED
            }
            Some(gid) => match self.placement(gid) {
                Some(Placement::Group(group)) => Attribution {
                    group: Some(group),
                    subgroup: None,
                },
                Some(Placement::Subgroup { group, subgroup }) => Attribution {
                    group: Some(group),
                    subgroup: Some(subgroup),
                },
                Some(Placement::Detached) => Attribution::UNCATEGORIZED,
                None => {
                    warnings.push(IntegrityWarning::UnknownCategory {
                        record,
                        category_id: gid,
                    });
                    Attribution::UNCATEGORIZED
                }
            },
        }
    }
}

/// Root ancestor id and the number of hops to it, or `None` for a cyclic or
/// dangling chain.
fn root_of(c: &Category, by_id: &HashMap<i64, &Category>) -> Option<(i64, usize)> {
    let mut seen = HashSet::from([c.id]);
    let mut cur = c;
    let mut depth = 0;
    while let Some(parent) = cur.parent_id {
        if !seen.insert(parent) {
            return None;
        }
        cur = by_id.get(&parent)?;
        depth += 1;
    }
    Some((cur.id, depth))
}
