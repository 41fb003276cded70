//! Merging matters from the three feeds, plus the filters the portal UI
//! applies on top of the merged set.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tracing::debug;

use crate::matters::normalize::{normalize_matter_data, MatterDataSource, NormalizedMatter};
use crate::matters::policy::{has_admin_access, MatterRole, MatterStatus};

/// Merge raw matter collections from all three sources into one
/// deduplicated set keyed by matter id.
///
/// Sources are applied in fixed priority order, `legacy_all` (lowest) then
/// `legacy_user` then `vnet_direct` (highest), and a later source replaces the
/// whole record for an id, never patching it field-by-field. The parameter
/// order encodes the priority; it has nothing to do with arrival time.
/// Records whose normalized id is empty are skipped. Output order is the
/// first-insertion order of each id and is not part of the contract.
pub fn merge_matters_from_sources(
    all_matters: &[Value],
    user_matters: &[Value],
    vnet_matters: &[Value],
    user_full_name: &str,
) -> Vec<NormalizedMatter> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<NormalizedMatter> = Vec::new();

    let sources = [
        (all_matters, MatterDataSource::LegacyAll),
        (user_matters, MatterDataSource::LegacyUser),
        (vnet_matters, MatterDataSource::VnetDirect),
    ];

    for (records, source) in sources {
        for raw in records {
            let normalized = normalize_matter_data(raw, user_full_name, source);
            if normalized.matter_id.is_empty() {
                continue;
            }
            match slots.entry(normalized.matter_id.clone()) {
                Entry::Occupied(slot) => merged[*slot.get()] = normalized,
                Entry::Vacant(slot) => {
                    slot.insert(merged.len());
                    merged.push(normalized);
                }
            }
        }
    }

    debug!(
        total = merged.len(),
        legacy_all = all_matters.len(),
        legacy_user = user_matters.len(),
        vnet_direct = vnet_matters.len(),
        "merged matter sources"
    );
    merged
}

/// Status filter for [`filter_matters_by_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Closed,
    All,
}

/// Keep matters where the user holds one of the allowed roles. A `both`
/// role always passes, since it satisfies any single-role filter.
pub fn filter_matters_by_role(
    matters: &[NormalizedMatter],
    allowed_roles: &[MatterRole],
) -> Vec<NormalizedMatter> {
    matters
        .iter()
        .filter(|matter| allowed_roles.contains(&matter.role) || matter.role == MatterRole::Both)
        .cloned()
        .collect()
}

/// Keep matters with the given derived status.
pub fn filter_matters_by_status(
    matters: &[NormalizedMatter],
    status: StatusFilter,
) -> Vec<NormalizedMatter> {
    let wanted = match status {
        StatusFilter::All => return matters.to_vec(),
        StatusFilter::Active => MatterStatus::Active,
        StatusFilter::Closed => MatterStatus::Closed,
    };
    matters
        .iter()
        .filter(|matter| matter.status == wanted)
        .cloned()
        .collect()
}

/// Keep matters in the given practice area (case-insensitive). "All" or an
/// empty area keeps everything.
pub fn filter_matters_by_area(
    matters: &[NormalizedMatter],
    practice_area: &str,
) -> Vec<NormalizedMatter> {
    if practice_area.is_empty() || practice_area.eq_ignore_ascii_case("all") {
        return matters.to_vec();
    }
    matters
        .iter()
        .filter(|matter| matter.practice_area.eq_ignore_ascii_case(practice_area))
        .cloned()
        .collect()
}

/// Apply the admin visibility rule: non-admins only ever see their own
/// matters; admins see everything when the "show everyone" toggle is on,
/// and their own matters otherwise.
pub fn apply_admin_filter(
    matters: &[NormalizedMatter],
    show_everyone: bool,
    user_full_name: &str,
    user_role: &str,
) -> Vec<NormalizedMatter> {
    if has_admin_access(user_role, user_full_name) && show_everyone {
        return matters.to_vec();
    }
    matters
        .iter()
        .filter(|matter| matter.role != MatterRole::None)
        .cloned()
        .collect()
}

/// Distinct practice areas across the merged set, sorted.
pub fn unique_practice_areas(matters: &[NormalizedMatter]) -> Vec<String> {
    matters
        .iter()
        .filter(|matter| !matter.practice_area.is_empty())
        .map(|matter| matter.practice_area.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
