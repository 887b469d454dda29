use maml::error::MamlError;
use maml::identity::IdRegistry;
use maml::links::{LinkResolver, Relation};
use maml::templates::{FILE_EXCHANGE, SOFTWARE_INTERFACE};
use serde_json::json;

#[test]
fn created_links_resolve_in_both_directions() {
    let mut ids = IdRegistry::seeded(1);
    let mut operation = json!({ "@ID": "op-1", "ExternalInterface": [] });
    let mut file = json!({ "@ID": "file-1" });
    let mut resolver = LinkResolver::new();
    resolver
        .create_link(&mut operation, &mut file, Relation::OutputFile, &mut ids)
        .unwrap();

    let source = &operation["ExternalInterface"][0];
    let target = &file["ExternalInterface"][0];
    assert_eq!(source["@Name"], "OutputFile");
    assert_eq!(target["@Name"], "OutputOf");
    assert_eq!(source["@RefBaseClassPath"], FILE_EXCHANGE);
    assert_eq!(target["@RefBaseClassPath"], FILE_EXCHANGE);

    let source_stub = source["@ID"].as_str().unwrap();
    let target_stub = target["@ID"].as_str().unwrap();
    assert_eq!(resolver.resolve(source_stub), Some("file-1"));
    assert_eq!(resolver.resolve(target_stub), Some("op-1"));

    let raw = resolver.to_raw();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["@Name"], "InternalLink1");
    assert_eq!(raw[0]["@RefPartnerSideA"], source_stub);
    assert_eq!(raw[0]["@RefPartnerSideB"], target_stub);
}

#[test]
fn link_names_are_sequential() {
    let mut ids = IdRegistry::seeded(2);
    let mut software = json!({ "@ID": "sw" });
    let mut operation = json!({ "@ID": "op" });
    let mut config = json!({ "@ID": "cfg" });
    let mut resolver = LinkResolver::new();
    resolver
        .create_link(&mut operation, &mut software, Relation::SoftwareUsed, &mut ids)
        .unwrap();
    resolver
        .create_link(&mut software, &mut config, Relation::ConfigFile, &mut ids)
        .unwrap();
    let names: Vec<&str> = resolver.links().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["InternalLink1", "InternalLink2"]);
    assert_eq!(software["ExternalInterface"][0]["@Name"], "Operation");
    assert_eq!(software["ExternalInterface"][0]["@RefBaseClassPath"], SOFTWARE_INTERFACE);
    assert_eq!(software["ExternalInterface"][1]["@Name"], "ConfigFile");
    assert_eq!(config["ExternalInterface"][0]["@Name"], "ConfigOf");
}

#[test]
fn decoded_links_resolve_through_lineage() {
    let records = [
        json!({ "@ID": "op", "ExternalInterface": [
            { "@Name": "SoftwareUsed", "@ID": "s1", "@RefBaseClassPath": SOFTWARE_INTERFACE }
        ]}),
        json!({ "@ID": "sw", "ExternalInterface": [
            { "@Name": "Operation", "@ID": "s2", "@RefBaseClassPath": SOFTWARE_INTERFACE }
        ]}),
    ];
    let links = [json!({ "@Name": "InternalLink1", "@RefPartnerSideA": "s1", "@RefPartnerSideB": "s2" })];
    let resolver = LinkResolver::from_raw(records.iter(), &links);
    assert_eq!(resolver.resolve("s1"), Some("sw"));
    assert_eq!(resolver.resolve("s2"), Some("op"));
    assert_eq!(resolver.resolve("elsewhere"), None);
}

#[test]
fn unsupported_interfaces_do_not_resolve() {
    let records = [
        json!({ "@ID": "op", "ExternalInterface": [
            { "@Name": "InputFile", "@ID": "s1", "@RefBaseClassPath": FILE_EXCHANGE }
        ]}),
        json!({ "@ID": "file", "ExternalInterface": [
            { "@Name": "InputOf", "@ID": "s2", "@RefBaseClassPath": "SomeLib/OtherConnector" }
        ]}),
    ];
    let links = [json!({ "@Name": "InternalLink1", "@RefPartnerSideA": "s1", "@RefPartnerSideB": "s2" })];
    let resolver = LinkResolver::from_raw(records.iter(), &links);
    assert_eq!(resolver.resolve("s1"), None);
    assert_eq!(resolver.resolve("s2"), Some("op"));
}

#[test]
fn relationship_table() {
    for (name, reciprocal) in [
        ("InputFile", "InputOf"),
        ("OutputFile", "OutputOf"),
        ("SoftwareUsed", "Operation"),
        ("ConfigFile", "ConfigOf"),
    ] {
        let relation: Relation = name.parse().unwrap();
        assert_eq!(relation.name(), name);
        assert_eq!(relation.reciprocal(), reciprocal);
        assert_eq!(relation.to_string(), name);
    }
    match "OutputOf".parse::<Relation>() {
        Err(MamlError::UnknownRelationship(name)) => assert_eq!(name, "OutputOf"),
        other => panic!("unexpected {other:?}"),
    }
}
