//! Snapshot wire format: field names are a compatibility contract with
//! snapshot files written by earlier releases of the tool.

use rmqt_schemas::*;

const LEGACY_SNAPSHOT: &str = r#"{
  "VHosts": [ { "Name": "/", "Tracing": false } ],
  "Exchanges": [
    {
      "Name": "orders",
      "Vhost": "/",
      "Type": "fanout",
      "Durable": true,
      "AutoDelete": false,
      "Internal": false,
      "Arguments": { "alternate-exchange": "unrouted" },
      "MessageStats": null
    }
  ],
  "Queues": [
    {
      "Name": "orders",
      "Vhost": "/",
      "Durable": true,
      "AutoDelete": false,
      "Arguments": null,
      "Messages": 12
    }
  ],
  "Bindings": [
    {
      "Source": "orders",
      "Vhost": "/",
      "Destination": "orders",
      "DestinationType": "queue",
      "RoutingKey": "",
      "Arguments": {},
      "PropertiesKey": "~"
    }
  ]
}"#;

#[test]
fn legacy_snapshot_loads_and_ignores_statistics() {
    let s = Schema::from_json(LEGACY_SNAPSHOT).unwrap();
    assert_eq!(s.vhosts, vec![VHost::new("/")]);
    assert_eq!(s.exchanges.len(), 1);
    assert_eq!(s.exchanges[0].kind, ExchangeType::Fanout);
    assert_eq!(
        s.exchanges[0].arguments.get("alternate-exchange").map(String::as_str),
        Some("unrouted")
    );
    assert!(s.queues[0].arguments.is_empty(), "null arguments read as empty");
    assert_eq!(s.bindings[0].destination_kind(), Some(DestinationKind::Queue));
    assert_eq!(s.bindings[0].properties_key, "~");
}

#[test]
fn output_uses_stable_field_names_in_declaration_order() {
    let mut schema = Schema::empty();
    schema.vhosts.push(VHost::new("/"));
    schema.queues.push(Queue::new("/", "q1"));

    let json = schema.to_json_pretty().unwrap();

    let order = ["\"VHosts\"", "\"Exchanges\"", "\"Queues\"", "\"Bindings\""];
    let positions: Vec<usize> = order.iter().map(|k| json.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");

    assert!(json.contains("\"Name\": \"q1\""));
    assert!(json.contains("\"AutoDelete\": false"));
    assert!(json.contains("\n  \"Queues\""), "two-space indentation");
}

#[test]
fn written_snapshot_reads_back_identically() {
    let original = Schema::from_json(LEGACY_SNAPSHOT).unwrap();
    let json = original.to_json_pretty().unwrap();
    let again = Schema::from_json(&json).unwrap();
    assert_eq!(original, again);
    assert_eq!(json, again.to_json_pretty().unwrap());
}

#[test]
fn lowercase_and_snake_case_aliases_are_accepted() {
    let raw = r#"{
      "vhosts": [ { "name": "prod" } ],
      "exchanges": [ { "name": "ex", "vhost": "prod", "type": "topic", "durable": true, "auto_delete": false, "internal": false } ],
      "queues": [ { "name": "q", "vhost": "prod", "durable": false, "autoDelete": true, "arguments": { "x-message-ttl": 60000 } } ],
      "bindings": [ { "source": "ex", "vhost": "prod", "destination": "q", "destination_type": "queue", "routing_key": "a.#", "properties_key": "a.#" } ]
    }"#;

    let s = Schema::from_json(raw).unwrap();
    assert_eq!(s.vhosts[0].name, "prod");
    assert_eq!(s.exchanges[0].kind, ExchangeType::Topic);
    assert!(s.queues[0].auto_delete);
    assert_eq!(
        s.queues[0].arguments.get("x-message-ttl").map(String::as_str),
        Some("60000"),
        "numeric argument values are carried as their JSON text"
    );
    assert_eq!(s.bindings[0].routing_key, "a.#");
}

#[test]
fn missing_sections_default_to_empty() {
    let s = Schema::from_json("{}").unwrap();
    assert!(s.is_empty());

    let s = Schema::from_json("\u{feff}{\"Queues\": []}").unwrap();
    assert!(s.queues.is_empty());
}

#[test]
fn malformed_document_is_an_error() {
    assert!(Schema::from_json("[1, 2, 3]").is_err());
    assert!(Schema::from_json("not json").is_err());
}
