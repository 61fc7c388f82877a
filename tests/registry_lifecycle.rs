//! Integration tests for registry lifecycle and event routing.

mod common;

use common::*;
use content_listeners::error::FaultKind;
use content_listeners::graph::Retag;
use content_listeners::prelude::*;
use content_listeners::prelude::ConnectionReason::{ContextLifetime, GraphStructureChange, RetagChange};
use parking_lot::Mutex;
use std::sync::Arc;

fn build(
    graph: &Arc<MemoryGraph>,
    observers: Vec<ObserverDescriptor>,
    sink: &Arc<CollectingFaultSink>,
    settings: RegistrySettings,
) -> ListenerRegistry {
    ListenerRegistry::builder()
        .with_context(editable_view())
        .with_graph(graph.clone())
        .with_type_relation(Arc::new(PathRelation))
        .with_observers(observers)
        .with_fault_sink(sink.clone())
        .with_settings(settings)
        .build()
        .unwrap()
}

#[test]
fn test_add_retag_remove_close_scenario() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, activated) = observer("text", &["text"], &log, Failure::None);
    let registry = build(&graph, vec![text], &sink, RegistrySettings::default());

    assert_eq!(activations(&activated), 0);

    let r1 = graph.insert("text/plain");
    assert_eq!(take(&log), vec![connected("text", GraphStructureChange, &[r1.id.0])]);

    graph.retag(r1.id, "binary");
    assert_eq!(take(&log), vec![disconnected("text", RetagChange, &[r1.id.0])]);

    graph.remove(&[r1.id]);
    assert!(take(&log).is_empty());

    registry.close();
    assert!(take(&log).is_empty());
    assert_eq!(activations(&activated), 1);
    assert!(sink.is_empty());
}

#[test]
fn test_initial_scan_connects_full_set_once() {
    let graph = Arc::new(MemoryGraph::with_resources([
        Resource::new(1, "text/plain"),
        Resource::new(2, "binary"),
        Resource::new(3, "text/markdown"),
    ]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let (image, image_activations) = observer("image", &["image"], &log, Failure::None);

    let _registry = build(&graph, vec![text, image], &sink, RegistrySettings::default());

    assert_eq!(take(&log), vec![connected("text", ContextLifetime, &[1, 3])]);
    assert_eq!(activations(&image_activations), 0);
}

#[test]
fn test_role_mismatch_is_never_activated() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (preview, activated) = observer("preview", &["text"], &log, Failure::None);
    let preview = preview.with_role("preview");
    let (editor, _) = observer("editor", &["text"], &log, Failure::None);
    let editor = editor.with_role("Editable");

    let registry = build(&graph, vec![preview, editor], &sink, RegistrySettings::default());
    graph.insert("text/plain");
    registry.close();

    assert_eq!(registry.observer_count(), 1);
    assert_eq!(activations(&activated), 0);
    assert!(take(&log).iter().all(|call| match call {
        Call::Connected { observer, .. } | Call::Disconnected { observer, .. } => observer == "editor",
    }));
}

#[test]
fn test_lazy_activation_and_reuse() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (code, activated) = observer("code", &["code"], &log, Failure::None);
    let registry = build(&graph, vec![code], &sink, RegistrySettings::default());

    graph.insert("text");
    assert!(!registry.is_active("code"));
    assert_eq!(activations(&activated), 0);

    graph.insert("code/rust");
    graph.insert("code/go");
    assert!(registry.is_active("code"));
    assert_eq!(registry.active_observers(), vec!["code".to_string()]);
    assert_eq!(activations(&activated), 1);
}

#[test]
fn test_removal_skips_unactivated_observers() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let (any, _) = observer("any", &["any"], &log, Failure::None);
    let _registry = build(&graph, vec![text, any], &sink, RegistrySettings::default());

    let r = graph.insert("binary");
    take(&log);

    graph.remove(&[r.id]);
    assert_eq!(take(&log), vec![disconnected("any", GraphStructureChange, &[r.id.0])]);
}

#[test]
fn test_retag_without_match_change_is_silent() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![text], &sink, RegistrySettings::default());

    let r = graph.insert("text/plain");
    take(&log);

    graph.retag(r.id, "text/markdown");
    assert!(take(&log).is_empty());
}

#[test]
fn test_retag_disconnects_before_connects() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    // Registered connect-side first to show ordering is not registration order.
    let (binary, _) = observer("binary", &["binary"], &log, Failure::None);
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![binary, text], &sink, RegistrySettings::default());

    let r = graph.insert("text");
    take(&log);

    graph.retag(r.id, "binary");
    assert_eq!(
        take(&log),
        vec![
            disconnected("text", RetagChange, &[r.id.0]),
            connected("binary", RetagChange, &[r.id.0]),
        ]
    );
}

#[test]
fn test_structure_change_disconnects_before_connects() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (markdown, _) = observer("markdown", &["text/markdown"], &log, Failure::None);
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![markdown, text], &sink, RegistrySettings::default());

    let old = graph.insert("text/plain");
    take(&log);

    graph.change(vec![Resource::new(10, "text/markdown")], &[old.id]);
    assert_eq!(
        take(&log),
        vec![
            disconnected("text", GraphStructureChange, &[old.id.0]),
            connected("markdown", GraphStructureChange, &[10]),
            connected("text", GraphStructureChange, &[10]),
        ]
    );
}

fn swap_scenario(ordering: RetagOrdering) -> Vec<Call> {
    let graph = Arc::new(MemoryGraph::with_resources([
        Resource::new(1, "text"),
        Resource::new(2, "binary"),
    ]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let (binary, _) = observer("binary", &["binary"], &log, Failure::None);
    let settings = RegistrySettings::default().with_retag_ordering(ordering);
    let _registry = build(&graph, vec![text, binary], &sink, settings);
    take(&log);

    graph.retag_many(vec![
        (ResourceId(1), ContentType::new("binary")),
        (ResourceId(2), ContentType::new("text")),
    ]);
    take(&log)
}

#[test]
fn test_batched_retags_whole_change() {
    assert_eq!(
        swap_scenario(RetagOrdering::WholeChange),
        vec![
            disconnected("text", RetagChange, &[1]),
            disconnected("binary", RetagChange, &[2]),
            connected("text", RetagChange, &[2]),
            connected("binary", RetagChange, &[1]),
        ]
    );
}

#[test]
fn test_batched_retags_per_resource() {
    assert_eq!(
        swap_scenario(RetagOrdering::PerResource),
        vec![
            disconnected("text", RetagChange, &[1]),
            connected("binary", RetagChange, &[1]),
            disconnected("binary", RetagChange, &[2]),
            connected("text", RetagChange, &[2]),
        ]
    );
}

#[test]
fn test_whole_change_folds_round_trip_retags() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let (code, code_activations) = observer("code", &["code"], &log, Failure::None);
    let _registry = build(&graph, vec![text, code], &sink, RegistrySettings::default());
    take(&log);

    graph.retag_many(vec![
        (ResourceId(1), ContentType::new("code")),
        (ResourceId(1), ContentType::new("text")),
    ]);

    assert!(take(&log).is_empty());
    assert_eq!(activations(&code_activations), 0);
}

#[test]
fn test_close_disconnects_current_matches_once() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let (code, _) = observer("code", &["code"], &log, Failure::None);
    let registry = build(&graph, vec![text, code], &sink, RegistrySettings::default());

    let a = graph.insert("text/plain");
    let b = graph.insert("text/markdown");
    graph.insert("binary");
    take(&log);

    registry.close();
    registry.close();
    assert_eq!(
        take(&log),
        vec![disconnected("text", ContextLifetime, &[a.id.0, b.id.0])]
    );
    assert!(registry.is_closed());

    graph.insert("text");
    graph.insert("code");
    assert!(take(&log).is_empty());
    assert_eq!(graph.subscriber_count(), 0);
}

#[test]
fn test_drop_closes() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(5, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let registry = build(&graph, vec![text], &sink, RegistrySettings::default());

    drop(registry);
    assert_eq!(
        take(&log),
        vec![
            connected("text", ContextLifetime, &[5]),
            disconnected("text", ContextLifetime, &[5]),
        ]
    );
}

#[test]
fn test_faulting_observer_does_not_block_others() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (broken, _) = observer("broken", &["text"], &log, Failure::ErrOnConnect);
    let (healthy, _) = observer("healthy", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![broken, healthy], &sink, RegistrySettings::default());

    let r = graph.insert("text");
    assert_eq!(
        take(&log),
        vec![
            connected("broken", GraphStructureChange, &[r.id.0]),
            connected("healthy", GraphStructureChange, &[r.id.0]),
        ]
    );

    let faults = sink.take();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].observer, "broken");
    assert_eq!(faults[0].kind, FaultKind::Connected);
    assert_eq!(faults[0].message, "broken refused");

    // Bookkeeping is not rolled back: the faulting observer still gets its disconnect.
    graph.remove(&[r.id]);
    assert_eq!(
        take(&log),
        vec![
            disconnected("broken", GraphStructureChange, &[r.id.0]),
            disconnected("healthy", GraphStructureChange, &[r.id.0]),
        ]
    );
}

#[test]
fn test_panicking_observer_is_isolated() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (wild, _) = observer("wild", &["text"], &log, Failure::PanicOnConnect);
    let (calm, _) = observer("calm", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![wild, calm], &sink, RegistrySettings::default());

    graph.insert("text");

    assert_eq!(take(&log).len(), 2);
    let faults = sink.take();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].message, "panicked: wild exploded");
}

#[test]
fn test_failing_disconnect_does_not_block_others() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (sticky, _) = observer("sticky", &["text"], &log, Failure::ErrOnDisconnect);
    let (tidy, _) = observer("tidy", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![sticky, tidy], &sink, RegistrySettings::default());
    take(&log);

    graph.retag(ResourceId(1), "binary");
    assert_eq!(
        take(&log),
        vec![
            disconnected("sticky", RetagChange, &[1]),
            disconnected("tidy", RetagChange, &[1]),
        ]
    );

    let faults = sink.take();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].observer, "sticky");
    assert_eq!(faults[0].kind, FaultKind::Disconnected);
    assert_eq!(faults[0].message, "sticky could not let go");

    // The pair counts as disconnected, so the next match connects again.
    graph.retag(ResourceId(1), "text");
    assert_eq!(
        take(&log),
        vec![
            connected("sticky", RetagChange, &[1]),
            connected("tidy", RetagChange, &[1]),
        ]
    );
}

#[test]
fn test_activator_may_read_graph() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let describe = |name: &'static str| {
        let graph = Arc::clone(&graph);
        let seen = Arc::clone(&seen);
        let log = Arc::clone(&log);
        ObserverDescriptor::new(name, move || {
            seen.lock().push(graph.len());
            Ok(recorder(name, &log, Failure::None))
        })
    };
    let text = describe("text").with_content_type("text");
    let code = describe("code").with_content_type("code");
    let _registry = build(&graph, vec![text, code], &sink, RegistrySettings::default());

    graph.insert("code");

    assert_eq!(*seen.lock(), vec![1, 2]);
    assert_eq!(
        take(&log),
        vec![
            connected("text", ContextLifetime, &[1]),
            connected("code", GraphStructureChange, &[2]),
        ]
    );
    assert!(sink.is_empty());
}

#[test]
fn test_activation_failure_is_reported_once() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let attempts = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&attempts);
    let missing = ObserverDescriptor::new("missing", move || -> Result<Recorder, ListenerError> {
        *counter.lock() += 1;
        Err("plugin assembly not found".into())
    })
    .with_content_type("text");
    let (present, _) = observer("present", &["text"], &log, Failure::None);
    let registry = build(&graph, vec![missing, present], &sink, RegistrySettings::default());

    let a = graph.insert("text");
    graph.insert("text");
    graph.remove(&[a.id]);

    assert_eq!(*attempts.lock(), 1);
    assert!(!registry.is_active("missing"));
    let faults = sink.take();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::Activation);
    assert_eq!(take(&log).len(), 3);
}

#[test]
fn test_declared_base_types_drive_matching() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let types = Arc::new(ContentTypeRegistry::new().with_bases("code", ["text"]));
    let (text, _) = observer("text", &["text"], &log, Failure::None);

    let _registry = ListenerRegistry::create(editable_view(), graph.clone(), types, vec![text]);

    let r = graph.insert("code/rust");
    assert_eq!(take(&log), vec![connected("text", GraphStructureChange, &[r.id.0])]);
}

#[test]
fn test_close_with_declared_bases_disconnects_only_connected() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(0, "text/plain")]));
    let log = new_log();
    let mut types = ContentTypeRegistry::new();
    types.declare("code", ["text"]);
    let (text, _) = observer("text", &["text"], &log, Failure::None);

    let registry =
        ListenerRegistry::create(editable_view(), graph.clone(), Arc::new(types), vec![text]);
    let rust = graph.insert("code/rust");
    graph.insert("image/png");
    registry.close();

    assert_eq!(
        take(&log),
        vec![
            connected("text", ContextLifetime, &[0]),
            connected("text", GraphStructureChange, &[rust.id.0]),
            disconnected("text", ContextLifetime, &[0, rust.id.0]),
        ]
    );
}

#[derive(Default)]
struct QueueDispatcher {
    jobs: Mutex<Vec<content_listeners::core::Job>>,
}

impl QueueDispatcher {
    fn run_all(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock());
        for job in jobs {
            job();
        }
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, job: content_listeners::core::Job) {
        self.jobs.lock().push(job);
    }
}

#[test]
fn test_marshaled_delivery_runs_on_dispatcher() {
    let graph = Arc::new(MemoryGraph::new());
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let dispatcher = Arc::new(QueueDispatcher::default());
    let (ui, _) = observer("ui", &["text"], &log, Failure::ErrOnConnect);
    let ui = ui.with_delivery(Delivery::Marshaled(dispatcher.clone()));
    let _registry = build(&graph, vec![ui], &sink, RegistrySettings::default());

    let r = graph.insert("text");
    graph.retag(r.id, "binary");
    assert!(take(&log).is_empty());

    dispatcher.run_all();
    assert_eq!(
        take(&log),
        vec![
            connected("ui", GraphStructureChange, &[r.id.0]),
            disconnected("ui", RetagChange, &[r.id.0]),
        ]
    );
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_mixed_delivery_orders_per_thread() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let dispatcher = Arc::new(QueueDispatcher::default());
    let (queued, _) = observer("queued", &["text"], &log, Failure::None);
    let queued = queued.with_delivery(Delivery::Marshaled(dispatcher.clone()));
    let (direct, _) = observer("direct", &["binary"], &log, Failure::None);
    let _registry = build(&graph, vec![queued, direct], &sink, RegistrySettings::default());
    dispatcher.run_all();
    take(&log);

    graph.retag(ResourceId(1), "binary");
    assert_eq!(take(&log), vec![connected("direct", RetagChange, &[1])]);

    dispatcher.run_all();
    assert_eq!(take(&log), vec![disconnected("queued", RetagChange, &[1])]);
}

#[test]
fn test_retag_to_unrelated_type() {
    let graph = Arc::new(MemoryGraph::with_resources([Resource::new(1, "text")]));
    let log = new_log();
    let sink = Arc::new(CollectingFaultSink::new());
    let (text, _) = observer("text", &["text"], &log, Failure::None);
    let _registry = build(&graph, vec![text], &sink, RegistrySettings::default());
    take(&log);

    let retag = graph.retag(ResourceId(1), "image/png").unwrap();
    assert_eq!(retag, Retag::new(&Resource::new(1, "text"), "image/png"));
    assert_eq!(take(&log), vec![disconnected("text", RetagChange, &[1])]);
}
