use qsoscore::{
    qso::Reference,
    refs::{
        contains_all_refs, filter_refs, find_ref, has_ref, has_ref_type, ref_keys, replace_refs,
        without_ref_type,
    },
};

fn sample() -> Vec<Reference> {
    vec![
        Reference::new("pota", "US-0002"),
        Reference::new("sota", "W1/HA-001"),
        Reference::new("pota", "US-0001"),
        Reference::new("pota", ""),
    ]
}

#[test]
fn lookups_by_type_and_identity() {
    let refs = sample();

    assert_eq!(find_ref(&refs, "pota").map(|r| r.reference.as_str()), Some("US-0002"));
    assert!(find_ref(&refs, "wwff").is_none());
    assert_eq!(filter_refs(&refs, "pota").len(), 3);
    assert!(has_ref_type(&refs, "sota"));
    assert!(has_ref(&refs, &Reference::new("pota", "US-0001")));
    assert!(!has_ref(&refs, &Reference::new("sota", "US-0001")));
    assert!(contains_all_refs(
        &refs,
        &[Reference::new("pota", "US-0001"), Reference::new("sota", "W1/HA-001")]
    ));
    assert!(contains_all_refs(&refs, &[]));
}

#[test]
fn identity_ignores_decoration() {
    let mut named = Reference::new("pota", "US-0001");
    named.name = Some("Acadia".to_string());
    assert!(has_ref(&sample(), &named));
}

#[test]
fn keys_are_sorted_unique_and_non_empty() {
    let mut refs = sample();
    refs.push(Reference::new("pota", "US-0001"));
    assert_eq!(ref_keys(&refs, "pota"), vec!["US-0001", "US-0002"]);
}

#[test]
fn replace_keeps_position_of_first_match() {
    let refs = sample();
    let replaced = replace_refs(&refs, "pota", vec![Reference::new("pota", "CA-0001")]);
    assert_eq!(
        replaced,
        vec![Reference::new("pota", "CA-0001"), Reference::new("sota", "W1/HA-001")]
    );

    let appended = replace_refs(&refs, "wwff", vec![Reference::new("wwff", "KFF-0001")]);
    assert_eq!(appended.len(), 5);
    assert_eq!(appended[4].ref_type, "wwff");

    assert_eq!(without_ref_type(&refs, "pota"), vec![Reference::new("sota", "W1/HA-001")]);
}
