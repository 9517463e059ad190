use super::*;

#[test]
fn intern_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("Person");
    let b = interner.intern("Person");
    assert_eq!(a, b);
    assert_eq!(interner.lookup(a), "Person");
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    assert_ne!(interner.intern("Left"), interner.intern("Right"));
}

#[test]
fn empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn reserved_words_are_pre_interned() {
    let interner = StringInterner::new();
    assert!(interner.get("Integer").is_some());
    assert!(interner.get("Any").is_some());
    assert!(interner.get("not_yet_seen").is_none());
}

#[test]
fn try_intern_succeeds() {
    let interner = StringInterner::new();
    let name = interner.try_intern("Edge").unwrap();
    assert_eq!(interner.lookup(name), "Edge");
}

#[test]
fn join_builds_dotted_path() {
    let interner = StringInterner::new();
    let path = [interner.intern("L"), interner.intern("Graph"), interner.intern("V")];
    assert_eq!(interner.join(&path), "L.Graph.V");
    assert_eq!(interner.join(&[]), "");
}

#[test]
fn shared_interner_derefs() {
    let shared = SharedInterner::new();
    let other = shared.clone();
    let name = shared.intern("Shared");
    assert_eq!(other.lookup(name), "Shared");
}

#[test]
fn interner_is_usable_across_threads() {
    let shared = SharedInterner::new();
    let names: Vec<Name> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = shared.clone();
                scope.spawn(move || interner.intern("Concurrent"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(names.windows(2).all(|w| w[0] == w[1]));
}
