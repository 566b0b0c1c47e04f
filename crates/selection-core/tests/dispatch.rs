use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use selection_core::domain::{
    Capability, HandlerError, Invoker, Operation, ParamType, ReturnType, Signature,
};
use selection_core::typed::{CandidateHandler, Classifier};
use selection_core::{
    Candidate, DispatchOutcome, HandlerRegistry, Params, SelectionError, SelectionRequest,
};
use serde_json::{Value, json};
use url::Url;

type Calls = Arc<Mutex<Vec<(String, Params)>>>;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn handler(name: &str, accepts: bool, calls: &Calls) -> Candidate {
    let sink = calls.clone();
    let label = name.to_string();
    Candidate::builder(name)
        .supports(move |_| Ok(accepts))
        .select(move |_, params| {
            sink.lock().unwrap().push((label.clone(), params.clone()));
            Ok(())
        })
        .build()
}

fn called(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
}

#[test]
fn names_without_suffix_are_never_registered() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    for name in ["Image", "ImageSelector", "SelectionOfImages", "imageselection"] {
        assert!(!registry.register_if_selection_handler(handler(name, true, &calls)));
    }
    assert_eq!(registry.len(), 0);
}

#[test]
fn suffixed_candidates_without_select_are_rejected() {
    let registry = HandlerRegistry::new();
    let noop: Invoker = Arc::new(|_: &[Value]| -> Result<Value, HandlerError> { Ok(Value::Null) });
    let wrong_shape = Candidate::builder("ImageSelection")
        .supports(|_| Ok(true))
        .operation(Operation::new(
            Signature::new("select", vec![ParamType::Uri], ReturnType::Void),
            noop,
        ))
        .build();

    assert!(!registry.register_if_selection_handler(wrong_shape));
    assert!(registry.is_empty());
}

#[test]
fn suffixed_candidates_with_select_are_registered_with_or_without_supports() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();

    assert!(registry.register_if_selection_handler(handler("ImageSelection", true, &calls)));
    assert_eq!(registry.len(), 1);
    assert!(registry.register_if_selection_handler(
        Candidate::builder("PdfSelection").select(|_, _| Ok(())).build()
    ));
    assert_eq!(registry.len(), 2);
}

#[test]
fn first_matching_handler_wins() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(handler("H1Selection", false, &calls));
    registry.register_if_selection_handler(handler("H2Selection", true, &calls));
    registry.register_if_selection_handler(handler("H3Selection", true, &calls));

    let mut params = Params::new();
    params.insert("limit".into(), json!(5));
    let outcome = registry.dispatch(&url("crm://contact/1"), &params).unwrap();

    assert_eq!(outcome.handler(), Some("H2Selection"));
    assert_eq!(called(&calls), vec!["H2Selection".to_string()]);
    assert_eq!(calls.lock().unwrap()[0].1["limit"], json!(5));
}

#[test]
fn no_match_returns_normally() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(handler("H1Selection", false, &calls));
    registry.register_if_selection_handler(handler("H2Selection", false, &calls));

    let outcome = registry.dispatch(&url("crm://contact/1"), &Params::new()).unwrap();

    assert_eq!(outcome, DispatchOutcome::NoMatch);
    assert!(!outcome.is_selected());
    assert!(called(&calls).is_empty());
}

#[test]
fn first_match_without_select_does_not_fall_through() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(handler("H1Selection", false, &calls));

    // classification would reject it, so bind and register it directly (the name still passes)
    let no_select = Candidate::builder("H2Selection").supports(|_| Ok(true)).build();
    let adapter = CandidateHandler::bind(
        Arc::new(no_select),
        registry.classifier(),
        registry.config().missing_supports,
    );
    registry.register(Arc::new(adapter)).unwrap();
    registry.register_if_selection_handler(handler("H3Selection", true, &calls));

    let err = registry.dispatch(&url("crm://contact/1"), &Params::new()).unwrap_err();

    assert!(matches!(
        err,
        SelectionError::MissingCapability { ref handler, capability: Capability::Select }
            if handler == "H2Selection"
    ));
    assert!(called(&calls).is_empty());
}

#[test]
fn image_selection_without_supports_fails_at_dispatch() {
    let registry = HandlerRegistry::new();
    let selected = Arc::new(AtomicBool::new(false));
    let flag = selected.clone();
    let image = Candidate::builder("ImageSelection")
        .select(move |_, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .build();

    assert!(registry.register_if_selection_handler(image));

    let err = registry.dispatch(&url("file:///a.png"), &Params::new()).unwrap_err();
    assert!(matches!(
        err,
        SelectionError::MissingCapability { capability: Capability::Supports, .. }
    ));
    assert!(!selected.load(Ordering::SeqCst));
}

#[test]
fn missing_supports_aborts_before_later_handlers() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(
        Candidate::builder("ImageSelection").select(|_, _| Ok(())).build(),
    );
    registry.register_if_selection_handler(handler("PdfSelection", true, &calls));

    assert!(registry.dispatch(&url("file:///a.pdf"), &Params::new()).is_err());
    assert!(called(&calls).is_empty());
}

#[test]
fn handler_failures_propagate_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("contact {0} is archived")]
    struct Archived(u32);

    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(
        Candidate::builder("ContactSelection")
            .supports(|uri| Ok(uri.scheme() == "crm"))
            .select(|_, _| Err(Archived(7).into()))
            .build(),
    );
    registry.register_if_selection_handler(handler("FallbackSelection", true, &calls));

    let request = SelectionRequest::parse("crm://contact/7").unwrap();
    let err = registry.dispatch_request(&request).unwrap_err();

    assert_eq!(err.to_string(), "contact 7 is archived");
    let source = err.handler_error().unwrap().downcast_ref::<Archived>().unwrap();
    assert_eq!(source.0, 7);
    assert!(called(&calls).is_empty());
}

#[test]
fn supports_failures_propagate_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded for {0}")]
    struct Quota(String);

    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    registry.register_if_selection_handler(
        Candidate::builder("ASelection")
            .supports(|uri| Err(Quota(uri.scheme().to_string()).into()))
            .select(|_, _| Ok(()))
            .build(),
    );
    registry.register_if_selection_handler(handler("BSelection", true, &calls));

    let err = registry.dispatch(&url("crm://contact/1"), &Params::new()).unwrap_err();

    assert_eq!(err.to_string(), "quota exceeded for crm");
    let source = err.handler_error().unwrap().downcast_ref::<Quota>().unwrap();
    assert_eq!(source.0, "crm");
    assert!(called(&calls).is_empty());
}

#[test]
fn directly_registered_handlers_must_follow_the_naming_convention() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    let audit = CandidateHandler::bind(
        Arc::new(handler("AuditService", true, &calls)),
        registry.classifier(),
        registry.config().missing_supports,
    );

    let err = registry.register(Arc::new(audit)).unwrap_err();

    assert!(matches!(
        err,
        SelectionError::NotSelectionHandler { ref handler, .. } if handler == "AuditService"
    ));
    assert_eq!(registry.len(), 0);
    let outcome = registry.dispatch(&url("file:///a.png"), &Params::new()).unwrap();
    assert_eq!(outcome, DispatchOutcome::NoMatch);
    assert!(called(&calls).is_empty());
}

#[test]
fn registering_the_same_candidate_twice_is_rejected() {
    let registry = HandlerRegistry::new();
    let calls = Calls::default();
    let candidate = Arc::new(handler("ImageSelection", true, &calls));

    assert!(registry.register_if_selection_handler(candidate.clone()));
    assert!(!registry.register_if_selection_handler(candidate));
    assert_eq!(registry.handler_names(), vec!["ImageSelection".to_string()]);
}

#[test]
fn selectable_tag_is_informational_only() {
    let candidate = Candidate::builder("ImageSelection").select(|_, _| Ok(())).build();
    assert_eq!(candidate.selectable_operations().collect::<Vec<_>>(), vec!["select"]);
    assert!(Classifier::default().is_selection_candidate(&candidate));
}

#[test]
fn concurrent_dispatch_during_reload_sees_whole_snapshots() {
    let registry = Arc::new(HandlerRegistry::new());
    let hits = Arc::new(AtomicUsize::new(0));

    let counting = |name: &str, hits: &Arc<AtomicUsize>| {
        let hits = hits.clone();
        Candidate::builder(name)
            .supports(|uri| Ok(uri.scheme() == "file"))
            .select(move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    };

    registry.reload(vec![counting("ASelection", &hits), counting("BSelection", &hits)]);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = registry.snapshot();
                    assert!(snapshot.len() == 2 || snapshot.len() == 3);
                    let outcome = registry
                        .dispatch(&Url::parse("file:///a.png").unwrap(), &Params::new())
                        .unwrap();
                    assert!(outcome.is_selected());
                }
            })
        })
        .collect();

    for i in 0..50 {
        if i % 2 == 0 {
            registry.reload(vec![
                counting("ASelection", &hits),
                counting("BSelection", &hits),
                counting("CSelection", &hits),
            ]);
        } else {
            registry.reload(vec![counting("ASelection", &hits), counting("BSelection", &hits)]);
        }
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 800);
}
