use dataflow_dsl::{
    ast::{ChannelType, TaskElement},
    error::ErrorCode,
    graph::Graph,
    parse_stream, parse_task, validate_task,
};

#[test]
fn test_simple_stream() {
    let stream = parse_stream(Some("ticktock"), "time | log").expect("Failed to parse");

    assert_eq!(stream.name(), Some("ticktock"));
    let names: Vec<_> = stream.apps().iter().map(|app| app.name()).collect();
    assert_eq!(names, vec!["time", "log"]);
    assert!(stream.source.is_none());
    assert!(stream.sink.is_none());
}

#[test]
fn test_stream_with_arguments_and_labels() {
    let stream = parse_stream(None, "http | f: filter --expression=true | log")
        .expect("Failed to parse");

    let filter = stream.app("f").expect("labeled app");
    assert_eq!(filter.name(), "filter");
    assert_eq!(
        filter.arguments_as_map().get("expression").map(String::as_str),
        Some("true")
    );
    assert_eq!(stream.index_of_label("log"), Some(2));
}

#[test]
fn test_stream_between_destinations() {
    let stream = parse_stream(None, ":orders > transform > :audit.out").expect("Failed to parse");
    assert_eq!(stream.source_destination_name().as_deref(), Some("orders"));
    assert_eq!(stream.sink_destination_name().as_deref(), Some("audit.out"));
    assert_eq!(
        stream.source.as_ref().map(|c| c.channel_type),
        Some(ChannelType::Destination)
    );
}

#[test]
fn test_duplicate_stream_labels() {
    let err = parse_stream(None, "foo: timestamp | foo: timestamp").unwrap_err();

    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E143));
    assert!(err.annotated().starts_with("143E:(pos 17):"));
}

#[test]
fn test_simple_task() {
    let task = parse_task(Some("single"), "timestamp --format=yyyy", true, true)
        .expect("Failed to parse");

    assert!(!task.is_composed());
    let app = task.task_app().expect("single app");
    assert_eq!(app.name(), "timestamp");
    assert_eq!(
        task.to_graph().unwrap().to_verbose_string(),
        "[0:START][1:timestamp:format=yyyy][2:END][0-1][1-2]"
    );
}

#[test]
fn test_composed_task() {
    let dsl = "extract && <clean || index 'FAILED'->alert> && report";
    let task = parse_task(Some("nightly"), dsl, false, true).expect("Failed to parse");

    assert!(task.is_composed());
    assert_eq!(task.sequences.len(), 1);
    let start = task.start().expect("primary sequence");
    assert!(matches!(start.series[1], TaskElement::Split(_)));

    let names: Vec<_> = task.task_apps().iter().map(|app| app.name.clone()).collect();
    assert_eq!(names, vec!["extract", "clean", "index", "alert", "report"]);
}

#[test]
fn test_task_graph_to_json_and_back() {
    let task = parse_task(None, "a && <b || c> && d", false, true).unwrap();
    let graph = task.to_graph().unwrap();

    let json = serde_json::to_string(&graph).unwrap();
    let back: Graph = serde_json::from_str(&json).unwrap();

    assert_eq!(back, graph);
    assert_eq!(back.to_dsl_text().unwrap(), "a && <b || c> && d");
}

#[test]
fn test_label_transitions_across_sequences() {
    let dsl = "extract 'FAILED'->:cleanup && load\ncleanup: notify && purge";
    let task = parse_task(None, dsl, false, true).unwrap();

    assert_eq!(task.sequences.len(), 2);
    assert!(task.sequence_with_label("cleanup").is_some());

    let graph = task.to_graph().unwrap();
    let names: Vec<_> = graph.nodes.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["START", "extract", "load", "END", "notify", "purge"]);
}

#[test]
fn test_validation_reports_every_problem() {
    let err = parse_task(None, "aa 1->:x 2->:y && bb", false, true).unwrap_err();
    let codes: Vec<_> = err
        .diagnostics()
        .iter()
        .map(|diag| diag.code())
        .collect();
    assert_eq!(codes, vec![Some(ErrorCode::E160), Some(ErrorCode::E160)]);

    let task = parse_task(None, "aa 1->:x 2->:y && bb", false, false).unwrap();
    assert_eq!(validate_task(&task).len(), 2);
}

#[test]
fn test_parsing_is_repeatable() {
    for dsl in ["a && b", "<a || b && c> && d", "a 'x'->b 0->$END && c"] {
        let first = parse_task(None, dsl, false, true).unwrap();
        let again = parse_task(None, &first.to_dsl(), false, true).unwrap();
        assert_eq!(first.to_dsl(), again.to_dsl(), "for {dsl}");
    }
}
