//! Container lifecycle scenarios: construction from parsed references,
//! dynamic mutation, and copy-construction through `to_reference`.

use futures::executor::block_on;
use rulekit_core::{
    Application, ContainerError, CoreError, ElementRegistry, Rule, RuleSet, Scope,
};
use serde_json::json;

fn parse_one(source: &str) -> rulekit_core::ApplicationReference {
    let (mut applications, _) = rulekit_core::parse_applications(source, &json!({})).unwrap();
    applications.remove(0)
}

#[test]
fn test_construction_preserves_child_order_and_scope_links() {
    let reference =
        parse_one("<<ap name=A>> <<rs name=S1>> <<ru name=R1>> x = 1 <<rs name=S2>>");
    let application = Application::from_reference(&reference, None).unwrap();

    let names: Vec<_> = application
        .rule_sets()
        .map(|rule_set| rule_set.ref_name())
        .collect();
    assert_eq!(names, ["S1", "S2"]);

    let rule_set = application.get_rule_set("S1").unwrap();
    assert!(rule_set.scope().parent().unwrap().ptr_eq(application.scope()));
    let rule = rule_set.get_rule("R1").unwrap();
    assert!(rule.scope().parent().unwrap().ptr_eq(rule_set.scope()));
}

#[test]
fn test_rule_moves_between_rule_sets() {
    let mut source_set = RuleSet::new("S1", Scope::new(json!({})));
    let mut target_set = RuleSet::new("S2", Scope::new(json!({})));
    source_set
        .add_rule(Rule::new("R", "x = 1", Scope::new(json!({}))))
        .unwrap();

    let reference = source_set.get_rule("R").unwrap().to_reference();
    assert!(source_set.remove_rule("R"));
    let rule = Rule::from_reference(&reference, None).unwrap();
    target_set.add_rule(rule).unwrap();

    assert!(!source_set.has_rule("R"));
    let moved = target_set.get_rule("R").unwrap();
    assert_eq!(moved.condition(), "x = 1");
    assert!(moved.scope().parent().unwrap().ptr_eq(target_set.scope()));
}

#[test]
fn test_duplicate_add_keeps_existing_child_intact() {
    let mut application = Application::new("A", Scope::new(json!({})));
    let mut original = RuleSet::new("S", Scope::new(json!({})));
    original
        .add_rule(Rule::new("R", "x = 1", Scope::new(json!({}))))
        .unwrap();
    application.add_rule_set(original).unwrap();

    let err = application
        .add_rule_set(RuleSet::new("S", Scope::new(json!({}))))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Container(ContainerError::DuplicateName { .. })
    ));
    let kept = application.get_rule_set("S").unwrap();
    assert!(kept.has_rule("R"));
    assert!(kept.scope().parent().unwrap().ptr_eq(application.scope()));
}

#[test]
fn test_copy_construction_shares_scopes_and_state() {
    let reference = parse_one("<<ap name=A>> <<rs name=S>> <<ru name=R>> x = 1");
    let application = Application::from_reference(&reference, None).unwrap();
    let copy = Application::from_reference(&application.to_reference(), None).unwrap();

    assert!(copy.scope().ptr_eq(application.scope()));
    assert!(copy
        .get_rule_set("S")
        .unwrap()
        .scope()
        .ptr_eq(application.get_rule_set("S").unwrap().scope()));

    let domain = json!({"x": 1});
    let original_result = block_on(application.evaluate(&domain).settle()).unwrap();
    let copied_result = block_on(copy.evaluate(&domain).settle()).unwrap();
    assert_eq!(original_result, copied_result);
}

#[test]
fn test_registry_surface_is_disabled_everywhere() {
    let mut application = Application::new("A", Scope::new(json!({})));
    let mut rule_set = RuleSet::new("S", Scope::new(json!({})));

    for err in [
        application
            .register(RuleSet::new("S", Scope::new(json!({}))))
            .unwrap_err(),
        application.unregister("S").unwrap_err(),
        rule_set
            .register(Rule::new("R", "", Scope::new(json!({}))))
            .unwrap_err(),
        rule_set.unregister("R").unwrap_err(),
    ] {
        assert!(matches!(
            err,
            CoreError::Container(ContainerError::UnsupportedOperation { .. })
        ));
    }
}

#[test]
fn test_containers_render_debug_output() {
    let mut application = Application::new("A", Scope::new(json!({})));
    let mut rule_set = RuleSet::new("S", Scope::new(json!({})));
    rule_set
        .add_rule(Rule::new("R", "x = 1", Scope::new(json!({}))))
        .unwrap();
    application.add_rule_set(rule_set).unwrap();

    let rendered = format!("{application:?}");
    assert!(rendered.contains("\"A\""));
    assert!(rendered.contains("\"S\""));
    assert!(rendered.contains("x = 1"));
}

#[test]
fn test_find_first_rule_searches_sets_in_order() {
    let reference = parse_one(
        "<<ap name=A>> <<rs name=S1>> <<ru name=Shared>> first = 1 \
         <<rs name=S2>> <<ru name=Shared>> second = 2 <<ru name=Only>> third = 3",
    );
    let application = Application::from_reference(&reference, None).unwrap();
    assert_eq!(
        application.find_first_rule("Shared").unwrap().condition(),
        "first = 1"
    );
    assert_eq!(
        application.find_first_rule("Only").unwrap().condition(),
        "third = 3"
    );
    assert!(application.find_first_rule("Nope").is_none());
}

#[test]
fn test_removed_child_can_join_another_container() {
    let mut first = Application::new("A1", Scope::new(json!({})));
    let mut second = Application::new("A2", Scope::new(json!({})));
    first
        .add_rule_set(RuleSet::new("S", Scope::new(json!({}))))
        .unwrap();

    let reference = first.get_rule_set("S").unwrap().to_reference();
    assert!(first.remove_rule_set("S"));
    let rule_set = RuleSet::from_reference(&reference, None).unwrap();
    second.add_rule_set(rule_set).unwrap();

    assert!(second.has_rule_set("S"));
    assert!(second
        .get_rule_set("S")
        .unwrap()
        .scope()
        .parent()
        .unwrap()
        .ptr_eq(second.scope()));
}
