//! Propagating changes between tables

use std::collections::BTreeSet;

use font_types::Tag;

use crate::{graph::DependencyGraph, registry::TableRegistry, Error};

/// What happened during an update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    recomputed: Vec<Tag>,
}

impl UpdateReport {
    /// Tables whose recompute step ran, in the order it ran.
    pub fn recomputed(&self) -> &[Tag] {
        &self.recomputed
    }

    pub fn was_recomputed(&self, tag: Tag) -> bool {
        self.recomputed.contains(&tag)
    }

    /// The position of `tag` in [`recomputed`](Self::recomputed).
    pub fn position(&self, tag: Tag) -> Option<usize> {
        self.recomputed.iter().position(|t| *t == tag)
    }
}

/// Recompute dirty tables and everything downstream of them.
///
/// Tables are visited in dependency order. A table is recomputed if it is
/// dirty, or if any of its upstream tables was recomputed during this pass.
/// The order is re-derived after every step, so tables created by a
/// recompute step are visited too.
pub(crate) fn update(
    registry: &mut TableRegistry,
    graph: &DependencyGraph,
) -> Result<UpdateReport, Error> {
    let mut visited = BTreeSet::new();
    let mut report = UpdateReport::default();

    loop {
        let order = graph.order(registry.tags());
        let Some(tag) = order.into_iter().find(|tag| !visited.contains(tag)) else {
            break;
        };
        visited.insert(tag);

        let dirty = registry.get_if_present(tag).is_some_and(|t| t.is_dirty());
        let upstream_changed = graph
            .upstream(tag)
            .any(|up| report.recomputed.contains(&up));
        if !(dirty || upstream_changed) {
            continue;
        }

        log::debug!("recomputing '{tag}' (dirty: {dirty}, upstream changed: {upstream_changed})");
        let dirty_before = registry.dirty_tags();
        registry.recompute(tag)?;
        report.recomputed.push(tag);

        let newly_dirty = registry.dirty_tags();
        if let Some(dirtied) = newly_dirty
            .difference(&dirty_before)
            .find(|dirtied| **dirtied != tag && visited.contains(*dirtied))
        {
            log::warn!("recomputing '{tag}' dirtied already updated '{dirtied}'");
            return Err(Error::OrderingViolation {
                recomputed: tag,
                dirtied: *dirtied,
            });
        }
    }
    Ok(report)
}
