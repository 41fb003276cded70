//! Solicitor name matching.
//!
//! The matter feeds record the same solicitor in several ways: "Zemanek,
//! Lukasz", "Luke Zemanek", "L. Zemanek - Commercial". Matching is
//! deliberately conservative: exact-after-normalization plus a fixed
//! nickname table, and nothing else. Misattributing solicitor credit is
//! worse than missing it, so there is no edit-distance fallback.

/// Symmetric nickname equivalence groups. Every name in a group matches
/// every other name in the same group.
const NICKNAME_GROUPS: &[&[&str]] = &[
    &["lukasz", "luke", "lucas"],
    &["samuel", "sam"],
    &["alexander", "alex"],
    &["william", "will", "bill"],
    &["robert", "rob", "bob"],
    &["michael", "mike"],
    &["christopher", "chris"],
    &["elizabeth", "liz", "beth"],
];

/// Normalize a person name for comparison: lowercase, strip decorations
/// ("Jane Doe - Commercial", "Jane Doe (Partner)", "Jane Doe / Leeds"),
/// flip "Last, First" ordering, drop periods, collapse whitespace.
pub(crate) fn normalize_person_name(raw: &str) -> String {
    let mut name = raw.trim().to_lowercase();

    for sep in [" - ", "/", "|"] {
        if let Some(idx) = name.find(sep) {
            name.truncate(idx);
        }
    }
    if let Some(idx) = name.find('(') {
        name.truncate(idx);
    }

    if let Some((last, first)) = name.split_once(',') {
        name = format!("{} {}", first.trim(), last.trim());
    }

    name = name.replace('.', "");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn nickname_group(name: &str) -> &'static [&'static str] {
    NICKNAME_GROUPS
        .iter()
        .find(|group| group.contains(&name))
        .copied()
        .unwrap_or(&[])
}

fn first_names_match(a: &str, b: &str) -> bool {
    a == b || nickname_group(a).contains(&b) || nickname_group(b).contains(&a)
}

/// True when two solicitor names refer to the same person.
///
/// Exact normalized match always wins. When either side is a single token,
/// only first names are compared (through the nickname table). With two or
/// more tokens on both sides, last names must match exactly and first names
/// must match exactly or via the nickname table.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = normalize_person_name(a);
    let b = normalize_person_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }

    let a_tokens: Vec<&str> = a.split(' ').collect();
    let b_tokens: Vec<&str> = b.split(' ').collect();

    if a_tokens.len() < 2 || b_tokens.len() < 2 {
        return first_names_match(a_tokens[0], b_tokens[0]);
    }

    let (a_first, a_last) = (a_tokens[0], a_tokens[a_tokens.len() - 1]);
    let (b_first, b_last) = (b_tokens[0], b_tokens[b_tokens.len() - 1]);
    a_last == b_last && first_names_match(a_first, b_first)
}
