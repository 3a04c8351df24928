use super::{HandlerTable, TableOwner};
use crate::dispatcher::RouteHandler;
use crate::matcher::split_path;
use crate::plugins::PluginRoute;

fn noop() -> RouteHandler {
    RouteHandler::inline(|_| Ok(()))
}

fn table_with(schemas: &[&str]) -> HandlerTable {
    let mut table = HandlerTable::internal();
    for schema in schemas {
        table.register(schema, noop()).unwrap();
    }
    table
}

fn winner(table: &HandlerTable, path: &str) -> Option<String> {
    table
        .best_match(&split_path(path))
        .map(|m| m.entry.pattern().schema().to_string())
}

#[test]
fn test_param_beats_shorter_literal() {
    let table = table_with(&["/", "/page", "/page/:id"]);
    let m = table.best_match(&split_path("/page/foo/bar/bat")).unwrap();
    assert_eq!(m.entry.pattern().schema(), "/page/:id");
    assert_eq!(m.path_match.get_param("id"), Some("foo"));
    assert_eq!(m.path_match.consumed, 2);
}

#[test]
fn test_exact_literal_beats_shorter_literal() {
    let table = table_with(&["/", "/page", "/page/foo", "/page/bar"]);
    assert_eq!(winner(&table, "/page/foo/bar/bat").as_deref(), Some("/page/foo"));
}

#[test]
fn test_falls_back_to_next_most_specific() {
    let table = table_with(&["/", "/page", "/page/bar"]);
    assert_eq!(winner(&table, "/page/foo/bar/bat").as_deref(), Some("/page"));
}

#[test]
fn test_literal_beats_param_at_equal_length() {
    // Registration order must not matter here
    let table = table_with(&["/page/foo", "/page/:id"]);
    assert_eq!(winner(&table, "/page/foo").as_deref(), Some("/page/foo"));
    let table = table_with(&["/page/:id", "/page/foo"]);
    assert_eq!(winner(&table, "/page/foo").as_deref(), Some("/page/foo"));
    assert_eq!(winner(&table, "/page/other").as_deref(), Some("/page/:id"));
}

#[test]
fn test_tie_goes_to_first_registration() {
    let table = table_with(&["/page/:id", "/page/:name"]);
    let m = table.best_match(&split_path("/page/x")).unwrap();
    assert_eq!(m.entry.pattern().schema(), "/page/:id");
    assert_eq!(m.entry.seq(), 0);
}

#[test]
fn test_root_matches_everything() {
    let table = table_with(&["/"]);
    assert_eq!(winner(&table, "/").as_deref(), Some("/"));
    assert_eq!(winner(&table, "/a/b/c").as_deref(), Some("/"));
}

#[test]
fn test_no_match() {
    let table = table_with(&["/page", "/cluster/:id"]);
    assert!(winner(&table, "/settings").is_none());
    assert!(winner(&table, "/cluster").is_none());
    assert!(HandlerTable::internal().best_match(&split_path("/x")).is_none());
}

#[test]
fn test_register_invalid_schema_leaves_table_unchanged() {
    let mut table = table_with(&["/page"]);
    assert!(table.register("/:@", noop()).is_err());
    assert_eq!(table.len(), 1);
    assert_eq!(table.schemas(), vec!["/page".to_string()]);
}

#[test]
fn test_from_routes_skips_invalid_schemas() {
    let routes = vec![
        PluginRoute::new("/install/:chart", noop()),
        PluginRoute::new("/bad@schema", noop()),
        PluginRoute::new("/", noop()),
    ];
    let table = HandlerTable::from_routes(TableOwner::plugin("helm"), &routes);
    assert_eq!(table.owner(), &TableOwner::plugin("helm"));
    assert_eq!(
        table.schemas(),
        vec!["/install/:chart".to_string(), "/".to_string()]
    );
}

#[test]
fn test_owner_display() {
    assert_eq!(TableOwner::Internal.to_string(), "internal");
    assert_eq!(TableOwner::plugin("@acme/helm").to_string(), "plugin:@acme/helm");
    assert_eq!(TableOwner::plugin("x").plugin_name(), Some("x"));
    assert_eq!(TableOwner::Internal.plugin_name(), None);
}

#[test]
fn test_owner_serializes_as_tag() {
    assert_eq!(
        serde_json::to_value(TableOwner::Internal).unwrap(),
        serde_json::json!("internal")
    );
    assert_eq!(
        serde_json::to_value(TableOwner::plugin("helm")).unwrap(),
        serde_json::json!({ "plugin": "helm" })
    );
}
