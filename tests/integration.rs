//! End-to-end integration tests for the refrigeration-plant twin.
//!
//! These tests exercise the full pipeline from a noisy fact file through graph
//! construction, queries and question routing, validating that the loader,
//! graph, resolver and router work together.

use std::cell::Cell;
use std::collections::BTreeSet;

use reefer_twin::error::{FactError, GraphError};
use reefer_twin::export::GraphExport;
use reefer_twin::fact::{self, Fact};
use reefer_twin::graph::resolve::resolve;
use reefer_twin::graph::{PlantGraph, QueryEngine, QueryKind, QueryResult};
use reefer_twin::llm::{Collaborator, CollaboratorError};
use reefer_twin::router::{Answer, IntentRouter, Interpretation, Route};

/// Extractor output as it typically arrives: prose, fences, then the array.
const RAW_FACTS: &str = r#"Sure! Here are the extracted facts.

```json
[
  {"subject": "Room Thermostat", "subject_class": "Controller", "predicate": "triggers",
   "object": "Solenoid Valve", "object_class": "Valve", "source_page": "12"},
  {"subject": "Solenoid Valve", "subject_class": "Valve", "predicate": "feeds",
   "object": "Expansion Valve", "object_class": "Valve"},
  {"subject": "Expansion Valve", "subject_class": "Valve", "predicate": "feeds",
   "object": "Evaporator", "object_class": "Evaporator"},
  {"subject": "Evaporator", "subject_class": "Evaporator", "predicate": "returnsTo",
   "object": "Compressor", "object_class": "Compressor"},
  {"subject": "Low Pressure Switch", "subject_class": "Sensor", "predicate": "measuredBy",
   "object": "Compressor", "object_class": "Compressor"},
  {"subject": "Low Pressure Switch", "subject_class": "Sensor", "predicate": "triggers",
   "object": "Compressor", "object_class": "Compressor"},
  {"subject": "Compressor", "subject_class": "Compressor", "predicate": "feeds",
   "object": "Condenser", "object_class": "Condenser"},
  {"subject": "Condenser", "subject_class": "Condenser", "predicate": "feeds",
   "object": "Solenoid Valve", "object_class": "Valve"}
]
```

Let me know if you need anything else."#;

/// Collaborator with a fixed classifier answer that counts its calls.
struct FixedIntent {
    intent: &'static str,
    calls: Cell<usize>,
}

impl FixedIntent {
    fn new(intent: &'static str) -> Self {
        Self {
            intent,
            calls: Cell::new(0),
        }
    }
}

impl Collaborator for FixedIntent {
    fn explain(&self, question: &str) -> Result<String, CollaboratorError> {
        self.calls.set(self.calls.get() + 1);
        Ok(format!("explanation for: {question}"))
    }

    fn classify(&self, _question: &str) -> Result<String, CollaboratorError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.intent.to_string())
    }
}

fn plant_from_file() -> (Vec<Fact>, PlantGraph) {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("raw_facts.json");
    std::fs::write(&path, RAW_FACTS).unwrap();
    let facts = fact::load_file(&path).unwrap();
    let graph = PlantGraph::build(&facts);
    (facts, graph)
}

fn set(items: Vec<String>) -> BTreeSet<String> {
    items.into_iter().collect()
}

#[test]
fn noisy_file_loads_in_order() {
    let (facts, graph) = plant_from_file();
    assert_eq!(facts.len(), 8);
    assert_eq!(facts[0].source_page.as_deref(), Some("12"));
    assert_eq!(graph.node_count(), 7);
    // Two facts share (Low Pressure Switch, Compressor).
    assert_eq!(graph.edge_count(), 7);
}

#[test]
fn later_fact_overwrites_label() {
    let (_, graph) = plant_from_file();
    let edge = graph.edge("Low Pressure Switch", "Compressor").unwrap();
    assert_eq!(edge.label, "triggers");

    let who = QueryEngine::new(&graph).who_affects("Compressor").unwrap();
    let labels: Vec<_> = who
        .iter()
        .filter(|i| i.component == "Low Pressure Switch")
        .map(|i| i.relation.as_str())
        .collect();
    assert_eq!(labels, ["triggers"]);
}

#[test]
fn refrigerant_loop_is_cycle_safe() {
    let (_, graph) = plant_from_file();
    let q = QueryEngine::new(&graph);

    // Solenoid -> Expansion -> Evaporator -> Compressor -> Condenser -> Solenoid
    let down = q.downstream_impact("solenoid_valve").unwrap();
    assert_eq!(down.len(), set(down.clone()).len());
    assert_eq!(
        set(down),
        set(vec![
            "Solenoid Valve".into(),
            "Expansion Valve".into(),
            "Evaporator".into(),
            "Compressor".into(),
            "Condenser".into(),
        ])
    );

    let up = q.upstream_dependencies("Room Thermostat").unwrap();
    assert!(up.is_empty());
}

#[test]
fn three_node_cycle_returns_all_nodes() {
    let facts = [
        Fact::new("A", "Pipe", "feeds", "B", "Pipe"),
        Fact::new("B", "Pipe", "feeds", "C", "Pipe"),
        Fact::new("C", "Pipe", "feeds", "A", "Pipe"),
    ];
    let graph = PlantGraph::build(&facts);
    let down = QueryEngine::new(&graph).downstream_impact("A").unwrap();
    assert_eq!(set(down), set(vec!["A".into(), "B".into(), "C".into()]));
}

#[test]
fn resolution_ignores_case_and_underscores() {
    let (_, graph) = plant_from_file();
    assert_eq!(
        resolve(&graph, "Room_Thermostat").unwrap(),
        resolve(&graph, "room thermostat").unwrap()
    );
    assert!(matches!(
        QueryEngine::new(&graph).what_it_affects("Oil Pump"),
        Err(GraphError::ComponentNotFound { .. })
    ));
}

#[test]
fn fault_question_routes_to_downstream_impact() {
    let (_, graph) = plant_from_file();
    let collaborator = FixedIntent::new("{}");
    let router = IntentRouter::new(&graph, &collaborator);

    let answer = router.route("What happens if the compressor trips?").unwrap();
    assert_eq!(answer.route(), Route::FaultImpact);
    assert_eq!(
        answer.interpretation(),
        Some(&Interpretation::new(QueryKind::DownstreamImpact, "Compressor"))
    );
    assert_eq!(collaborator.calls.get(), 0);
}

#[test]
fn safety_question_ignores_named_component() {
    let (_, graph) = plant_from_file();
    let collaborator = FixedIntent::new("{}");
    let router = IntentRouter::new(&graph, &collaborator);

    let answer = router
        .route("Which safety device protects the condenser?")
        .unwrap();
    match answer {
        Answer::Graph {
            interpretation,
            result: QueryResult::Relations(relations),
            ..
        } => {
            assert_eq!(
                interpretation,
                Interpretation::new(QueryKind::WhoAffects, "compressor")
            );
            let names: Vec<_> = relations.iter().map(|r| r.component.as_str()).collect();
            assert_eq!(names, ["Evaporator", "Low Pressure Switch"]);
        }
        other => panic!("unexpected answer: {other:?}"),
    }
}

#[test]
fn classifier_fallback_end_to_end() {
    let (_, graph) = plant_from_file();
    let collaborator = FixedIntent::new(
        r#"{"query_type": "what_it_affects(component)", "component": "Room_Thermostat"}"#,
    );
    let router = IntentRouter::new(&graph, &collaborator);

    let answer = router.route("What does the room thermostat control?").unwrap();
    let rendered = answer.to_string();
    assert!(rendered.contains("what_it_affects('Room_Thermostat')"));
    assert!(rendered.contains("Solenoid Valve (triggers)"));
    assert_eq!(collaborator.calls.get(), 1);
}

#[test]
fn explanatory_question_is_free_text() {
    let (_, graph) = plant_from_file();
    let collaborator = FixedIntent::new("{}");
    let router = IntentRouter::new(&graph, &collaborator);

    let question = "Why does frost build up on the evaporator?";
    let answer = router.route(question).unwrap();
    assert!(matches!(answer, Answer::Explanation(ref text) if text.ends_with(question)));
}

#[test]
fn export_round_trips_through_json() {
    let (_, graph) = plant_from_file();
    let export = GraphExport::from_graph(&graph);
    let json = serde_json::to_string(&export).unwrap();
    let back: GraphExport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, export);
    assert_eq!(back.edges.len(), graph.edge_count());
}

#[test]
fn truncated_file_is_rejected() {
    let err = fact::load("```json\n[{\"subject\": \"A\", \"subject_class\": \"Pipe\"").unwrap_err();
    assert!(matches!(err, FactError::NoArray));
}
