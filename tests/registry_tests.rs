//! Concurrent use of the runtime registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use interop_bindgen::interop_core::TypeImplementation;
use interop_bindgen::interop_registry::{InteropRegistry, NativeHandle, RegistryError};
use pretty_assertions::assert_eq;

const OBJECT: NativeHandle = NativeHandle::new(0x1000);
const ACTOR: NativeHandle = NativeHandle::new(0x2000);
const PAWN: NativeHandle = NativeHandle::new(0x3000);
const CHARACTER: NativeHandle = NativeHandle::new(0x4000);

fn super_type_of(class: NativeHandle) -> Option<NativeHandle> {
    match class {
        c if c == CHARACTER => Some(PAWN),
        c if c == PAWN => Some(ACTOR),
        c if c == ACTOR => Some(OBJECT),
        _ => None,
    }
}

#[derive(Debug)]
struct Wrapper {
    handle: NativeHandle,
    managed_type: String,
}

fn registry() -> Arc<InteropRegistry<Wrapper>> {
    let registry = InteropRegistry::new();
    registry
        .register_type(OBJECT, "Unreal.Object", TypeImplementation::Native)
        .unwrap();
    registry
        .register_type(ACTOR, "Unreal.Actor", TypeImplementation::Native)
        .unwrap();
    Arc::new(registry)
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn test_concurrent_get_or_create_builds_one_wrapper() {
    let registry = registry();
    let created = Arc::new(AtomicUsize::new(0));
    let object = NativeHandle::new(0xbeef);

    let wrappers: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let created = Arc::clone(&created);
            thread::spawn(move || {
                registry
                    .get_or_create(object, |_| CHARACTER, super_type_of, |r| {
                        created.fetch_add(1, Ordering::SeqCst);
                        Wrapper {
                            handle: object,
                            managed_type: r.managed_type.clone(),
                        }
                    })
                    .unwrap()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|t| t.join().unwrap())
        .collect();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(wrappers.iter().all(|w| Arc::ptr_eq(w, &wrappers[0])));
    assert_eq!(wrappers[0].managed_type, "Unreal.Actor");
    assert_eq!(wrappers[0].handle, object);
}

#[test]
fn test_parallel_register_and_unregister_of_distinct_objects() {
    let registry = registry();

    let threads: Vec<_> = (0..8u64)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..100u64 {
                    let handle = NativeHandle::new(0x10_0000 + t * 0x1000 + i + 1);
                    registry
                        .register(
                            handle,
                            Arc::new(Wrapper {
                                handle,
                                managed_type: "Unreal.Object".into(),
                            }),
                        )
                        .unwrap();
                    // every other object is destroyed again
                    if i % 2 == 0 {
                        registry.unregister(handle).unwrap();
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(registry.objects().len(), 8 * 50);
}

#[test]
fn test_destroyed_object_is_unknown() {
    let registry = registry();
    let object = NativeHandle::new(0x77);
    registry
        .get_or_create(object, |_| ACTOR, super_type_of, |r| Wrapper {
            handle: object,
            managed_type: r.managed_type.clone(),
        })
        .unwrap();

    let wrapper = registry.unregister(object).unwrap();
    assert_eq!(wrapper.managed_type, "Unreal.Actor");
    assert_eq!(
        registry.unregister(object).unwrap_err(),
        RegistryError::UnknownHandle { handle: object }
    );
}

// =============================================================================
// Best Fit
// =============================================================================

#[test]
fn test_concurrent_best_fit_agrees() {
    let registry = registry();

    let answers: Vec<String> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .types()
                    .best_fit(CHARACTER, super_type_of)
                    .unwrap()
                    .managed_type
                    .clone()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|t| t.join().unwrap())
        .collect();

    assert!(answers.iter().all(|a| a == "Unreal.Actor"));
    assert_eq!(registry.types().best_fit_len(), 1);
    assert!(registry.types().lookup(CHARACTER).is_none());
}

#[test]
fn test_registering_a_closer_type_does_not_change_cached_fits() {
    let registry = registry();
    let before = registry.types().best_fit(CHARACTER, super_type_of).unwrap();
    assert_eq!(before.managed_type, "Unreal.Actor");

    registry
        .register_type(PAWN, "Unreal.Pawn", TypeImplementation::Native)
        .unwrap();
    assert_eq!(
        registry.types().best_fit(PAWN, super_type_of).unwrap().managed_type,
        "Unreal.Pawn"
    );
    let after = registry.types().best_fit(CHARACTER, super_type_of).unwrap();
    assert!(Arc::ptr_eq(&before, &after));

    registry.clear();
    assert!(registry.types().is_empty());
    assert_eq!(registry.types().best_fit_len(), 0);
}

#[test]
fn test_class_outside_any_hierarchy() {
    let registry = registry();
    let stray = NativeHandle::new(0x9999);
    let err = registry
        .get_or_create(stray, |h| h, super_type_of, |r| Wrapper {
            handle: stray,
            managed_type: r.managed_type.clone(),
        })
        .unwrap_err();
    assert_eq!(err, RegistryError::NoKnownAncestor { handle: stray });
    assert!(registry.lookup(stray).is_none());
}
