use crate::qso::Reference;

/// First reference of `ref_type`.
pub fn find_ref<'a>(refs: &'a [Reference], ref_type: &str) -> Option<&'a Reference> {
    refs.iter().find(|r| r.ref_type == ref_type)
}

/// All references of `ref_type`, in order.
pub fn filter_refs<'a>(refs: &'a [Reference], ref_type: &str) -> Vec<&'a Reference> {
    refs.iter().filter(|r| r.ref_type == ref_type).collect()
}

/// True when `refs` contains any reference of `ref_type`.
pub fn has_ref_type(refs: &[Reference], ref_type: &str) -> bool {
    refs.iter().any(|r| r.ref_type == ref_type)
}

/// True when `refs` contains `needle` (same type and key).
pub fn has_ref(refs: &[Reference], needle: &Reference) -> bool {
    refs.iter().any(|r| r.same_as(needle))
}

/// True when every reference in `needles` is present in `refs`.
pub fn contains_all_refs(refs: &[Reference], needles: &[Reference]) -> bool {
    needles.iter().all(|n| has_ref(refs, n))
}

/// Copy of `refs` without any reference of `ref_type`.
pub fn without_ref_type(refs: &[Reference], ref_type: &str) -> Vec<Reference> {
    refs.iter()
        .filter(|r| r.ref_type != ref_type)
        .cloned()
        .collect()
}

/// Replaces every reference of `ref_type` with `replacements`.
///
/// Replacements land where the first reference of that type was, or at the
/// end when there was none.
pub fn replace_refs(
    refs: &[Reference],
    ref_type: &str,
    replacements: Vec<Reference>,
) -> Vec<Reference> {
    let insert_at = refs
        .iter()
        .position(|r| r.ref_type == ref_type)
        .map(|pos| refs[..pos].iter().filter(|r| r.ref_type != ref_type).count());

    let mut out = without_ref_type(refs, ref_type);
    let at = insert_at.unwrap_or(out.len());
    out.splice(at..at, replacements);
    out
}

/// Sorted, deduplicated keys of every reference of `ref_type`.
pub fn ref_keys(refs: &[Reference], ref_type: &str) -> Vec<String> {
    let mut keys: Vec<String> = filter_refs(refs, ref_type)
        .into_iter()
        .map(|r| r.reference.clone())
        .filter(|k| !k.is_empty())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
