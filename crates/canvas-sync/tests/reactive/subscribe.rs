//! Tests for `subscribe` against a hand-driven node and against `Graph`.

use std::sync::{Arc, Mutex};

use canvas_sync::{
    reactive::{
        subscribe, Graph, GraphNode, ListenerId, NodeKind, NodeListener, Publication, UpdateEvent,
    },
    GraphConfig,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

/// A node whose updates are fired by the test itself.
#[derive(Clone)]
struct ManualNode {
    kind: NodeKind,
    listeners: Arc<Mutex<Vec<(ListenerId, Arc<NodeListener>)>>>,
    next_id: Arc<Mutex<ListenerId>>,
    off_calls: Arc<Mutex<Vec<ListenerId>>>,
}

impl ManualNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
            off_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn fire(&self, event: UpdateEvent) {
        let snapshot: Vec<Arc<NodeListener>> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(&event);
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl GraphNode for ManualNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn on(&self, listener: Arc<NodeListener>) -> ListenerId {
        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;
        self.listeners.lock().unwrap().push((id, listener));
        id
    }

    fn off(&self, id: ListenerId) {
        self.off_calls.lock().unwrap().push(id);
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }
}

fn make_log() -> Arc<Mutex<Vec<Publication>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorder(log: &Arc<Mutex<Vec<Publication>>>) -> impl Fn(Publication) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |p| log.lock().unwrap().push(p)
}

fn entries(p: &Publication) -> Vec<(String, Value)> {
    p.entries().expect("collection publication").to_vec()
}

fn pairs(items: &[(&str, Value)]) -> Vec<(String, Value)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn graph() -> Graph {
    Graph::connect(GraphConfig::default()).expect("default config is valid")
}

// ============================================================================
// Scalar mode
// ============================================================================

#[test]
fn scalar_publishes_once_per_update_in_order() {
    let node = ManualNode::new(NodeKind::Scalar);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    assert!(log.lock().unwrap().is_empty(), "scalar mode has no initial publish");

    node.fire(UpdateEvent::new(json!(1), "k"));
    node.fire(UpdateEvent::new(json!({ "x": 2 }), "k"));
    node.fire(UpdateEvent::new(Value::Null, "k"));

    let log = log.lock().unwrap();
    let values: Vec<Value> = log.iter().map(|p| p.value().unwrap().clone()).collect();
    assert_eq!(values, vec![json!(1), json!({ "x": 2 }), Value::Null]);
}

#[test]
fn scalar_publication_carries_key_and_origin() {
    let node = ManualNode::new(NodeKind::Scalar);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    let event = UpdateEvent::new(json!("v"), "title").via("boards/main");
    node.fire(event.clone());

    assert_eq!(*log.lock().unwrap(), vec![Publication::Value(event)]);
}

// ============================================================================
// Collection mode
// ============================================================================

#[test]
fn collection_first_publish_is_empty() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let _sub = subscribe(node, recorder(&log));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert!(entries(&log[0]).is_empty());
}

#[test]
fn collection_tracks_membership_and_drops_deleted_entries() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    node.fire(UpdateEvent::new(json!(1), "a"));
    node.fire(UpdateEvent::new(json!(2), "b"));
    node.fire(UpdateEvent::new(Value::Null, "a"));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(entries(&log[1]), pairs(&[("a", json!(1))]));
    assert_eq!(entries(&log[2]), pairs(&[("a", json!(1)), ("b", json!(2))]));
    assert_eq!(entries(&log[3]), pairs(&[("b", json!(2))]));
}

#[test]
fn collection_identity_prefers_intrinsic_soul() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    let value = json!({ "_": { "#": "soul-a" }, "n": 1 });
    node.fire(UpdateEvent::new(value.clone(), "k1").via("origin-1"));

    let log = log.lock().unwrap();
    assert_eq!(entries(&log[1]), vec![("soul-a".to_string(), value)]);
}

#[test]
fn collection_identity_prefers_origin_over_raw_key() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    node.fire(UpdateEvent::new(json!(5), "k1").via("origin-1"));
    // Same origin under a different raw key updates the same entry.
    node.fire(UpdateEvent::new(json!(6), "k2").via("origin-1"));

    let log = log.lock().unwrap();
    assert_eq!(entries(&log[2]), pairs(&[("origin-1", json!(6))]));
}

#[test]
fn collection_deletion_resolves_identity_through_origin() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let _sub = subscribe(node.clone(), recorder(&log));

    node.fire(UpdateEvent::new(json!({ "_": { "#": "items/a" } }), "a").via("items/a"));
    node.fire(UpdateEvent::new(Value::Null, "a").via("items/a"));

    let log = log.lock().unwrap();
    assert!(entries(&log[2]).is_empty());
}

#[test]
fn separate_subscriptions_keep_separate_caches() {
    let node = ManualNode::new(NodeKind::Collection);
    let first = make_log();
    let _sub1 = subscribe(node.clone(), recorder(&first));
    node.fire(UpdateEvent::new(json!(1), "a"));

    let second = make_log();
    let _sub2 = subscribe(node.clone(), recorder(&second));
    node.fire(UpdateEvent::new(json!(2), "b"));

    assert_eq!(
        entries(first.lock().unwrap().last().unwrap()),
        pairs(&[("a", json!(1)), ("b", json!(2))])
    );
    assert_eq!(
        entries(second.lock().unwrap().last().unwrap()),
        pairs(&[("b", json!(2))])
    );
}

// ============================================================================
// Unsubscribe
// ============================================================================

#[test]
fn off_stops_deliveries_and_is_idempotent() {
    let node = ManualNode::new(NodeKind::Collection);
    let log = make_log();
    let sub = subscribe(node.clone(), recorder(&log));

    node.fire(UpdateEvent::new(json!(1), "a"));
    assert!(sub.is_active());

    sub.off();
    sub.off();
    node.fire(UpdateEvent::new(json!(2), "b"));

    assert!(!sub.is_active());
    assert_eq!(log.lock().unwrap().len(), 2, "no publish after off()");
    assert_eq!(node.listener_count(), 0);
    assert_eq!(node.off_calls.lock().unwrap().len(), 1);
}

#[test]
fn off_does_not_rewind_published_values() {
    let node = ManualNode::new(NodeKind::Scalar);
    let log = make_log();
    let sub = subscribe(node.clone(), recorder(&log));

    node.fire(UpdateEvent::new(json!("kept"), "k"));
    sub.off();

    assert_eq!(log.lock().unwrap()[0].value(), Some(&json!("kept")));
}

// ============================================================================
// Against Graph
// ============================================================================

#[test]
fn graph_scalar_subscription_replays_then_follows_puts() {
    let g = graph();
    let title = g.get("boards").get("main").get("title");
    title.put(json!("Draft"));

    let log = make_log();
    let _sub = title.subscribe(recorder(&log));
    title.put(json!("Final"));

    let log = log.lock().unwrap();
    let values: Vec<&Value> = log.iter().filter_map(|p| p.value()).collect();
    assert_eq!(values, vec![&json!("Draft"), &json!("Final")]);
}

#[test]
fn graph_collection_subscription_aggregates_members() {
    let g = graph();
    let items = g.get("boards").get("main").get("items");
    items.get("a").put(json!({ "x": 1 }));

    let log = make_log();
    let sub = items.map().subscribe(recorder(&log));

    items.get("b").put(json!({ "x": 2 }));
    items.get("a").put(Value::Null);

    let log = log.lock().unwrap();
    // Empty initial publish, replay of "a", put of "b", delete of "a".
    assert_eq!(log.len(), 4);
    assert!(entries(&log[0]).is_empty());

    let last = entries(&log[3]);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].0, "boards/main/items/b");
    assert_eq!(last[0].1["x"], json!(2));

    sub.off();
    assert_eq!(g.listener_count(), 0);
}

#[test]
fn graph_collection_ignores_grandchildren() {
    let g = graph();
    let items = g.get("items");

    let log = make_log();
    let _sub = items.map().subscribe(recorder(&log));
    items.get("a").get("deep").put(json!(1));

    assert_eq!(log.lock().unwrap().len(), 1, "only the initial publish");
}

#[test]
fn graph_collection_drops_member_stored_under_a_foreign_soul() {
    let g = graph();
    let items = g.get("items");

    let log = make_log();
    let _sub = items.map().subscribe(recorder(&log));

    let alice = json!({ "_": { "#": "people/alice" }, "name": "alice" });
    items.get("a").put(alice.clone());
    assert_eq!(
        entries(log.lock().unwrap().last().unwrap()),
        vec![("people/alice".to_string(), alice)]
    );

    items.get("a").put(Value::Null);

    assert_eq!(items.get("a").once(), None);
    assert!(entries(log.lock().unwrap().last().unwrap()).is_empty());
}
