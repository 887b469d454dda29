use maml::error::MamlError;
use maml::identity::IdRegistry;
use maml::master::MasterAml;
use maml::node;
use serde_json::json;
use uuid::Uuid;

const LEGACY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CAEXFile FileName="legacy.aml" SchemaVersion="3.0">
  <InstanceHierarchy Name="DigitalThreads">
    <InternalElement Name="Legacy thread" ID="dt-1" RefBaseSystemUnitPath="Structures/DigitalThread">
      <Attribute Name="Modules">
        <Attribute Name="Module1"><Value>Requirements</Value></Attribute>
        <Attribute Name="Module2"><Value>Milling</Value></Attribute>
        <Attribute Name="Module3"><Value>Milling</Value></Attribute>
      </Attribute>
      <InternalElement Name="Operations" ID="c-ops">
        <InternalElement Name="Mill" ID="op-1" RefBaseSystemUnitPath="Operations/Machining">
          <Attribute Name="Success"><Value>maybe</Value></Attribute>
          <Attribute Name="Stage"><Value>Manufacturing</Value></Attribute>
          <Attribute Name="Comments"><Value>first pass</Value></Attribute>
          <ExternalInterface Name="InputFile" ID="ei-1" RefBaseClassPath="DigitalThreadInterfaces/FileExchangeConnector"/>
          <ExternalInterface Name="OutputFile" ID="ei-2" RefBaseClassPath="DigitalThreadInterfaces/FileExchangeConnector"/>
          <InternalElement Name="UserInfo" ID="ui-1">
            <Attribute Name="User Name"><Value>jdoe</Value></Attribute>
            <Attribute Name="UserID"><Value>42</Value></Attribute>
            <Attribute Name="Timestmp"><Value>2021-05-04T10:00:00</Value></Attribute>
          </InternalElement>
        </InternalElement>
      </InternalElement>
      <InternalElement Name="Files" ID="c-files">
        <InternalElement Name="stock.step" ID="file-1">
          <ExternalInterface Name="InputOf" ID="ei-3" RefBaseClassPath="DigitalThreadInterfaces/FileExchangeConnector"/>
          <InternalElement Name="File" ID="sf-1">
            <ExternalInterface Name="FileInterface" ID="fi-1">
              <Attribute Name="File">
                <Attribute Name="Name"><Value>stock.step</Value></Attribute>
                <Attribute Name="MIMEType"><Value>model/step</Value></Attribute>
              </Attribute>
              <Attribute Name="Connection">
                <Attribute Name="Port"><Value>8080</Value></Attribute>
              </Attribute>
            </ExternalInterface>
          </InternalElement>
          <InternalElement Name="Broken" ID="sf-2"/>
        </InternalElement>
        <InternalElement Name="orphan" ID="None"/>
      </InternalElement>
      <InternalLink Name="InternalLink1" RefPartnerSideA="ei-1" RefPartnerSideB="ei-3"/>
    </InternalElement>
    <InternalElement Name="Not a thread" ID="other-1" RefBaseSystemUnitPath="Structures/Something"/>
  </InstanceHierarchy>
</CAEXFile>
"#;

fn legacy() -> MasterAml {
    MasterAml::from_aml_str(LEGACY, IdRegistry::new()).unwrap()
}

#[test]
fn threads_and_modules() {
    let master = legacy();
    assert_eq!(master.file_name.as_deref(), Some("legacy.aml"));
    assert_eq!(master.digital_threads.len(), 1);
    let thread = &master.digital_threads[0];
    assert_eq!(thread.id, "dt-1");
    assert_eq!(thread.name.as_deref(), Some("Legacy thread"));
    assert_eq!(thread.modules, vec!["Requirements", "Milling"]);
    assert!(thread.softwares.is_empty());
}

#[test]
fn linked_and_unresolved_stubs() {
    let master = legacy();
    let operation = &master.digital_threads[0].operations[0];
    assert_eq!(operation.input_file, ["file-1"]);
    // ei-2 takes part in no internal link
    assert!(operation.output_file.is_empty());
    assert!(operation.software_used.is_empty());
}

#[test]
fn operation_fields() {
    let master = legacy();
    let operation = &master.digital_threads[0].operations[0];
    assert_eq!(operation.name.as_deref(), Some("Mill"));
    assert_eq!(operation.operation_type(), Some("Machining"));
    assert_eq!(operation.stage.as_deref(), Some("Manufacturing"));
    assert_eq!(operation.comments.as_deref(), Some("first pass"));
    assert_eq!(operation.success, None);
}

#[test]
fn user_info_keys_are_corrected() {
    let master = legacy();
    let info = &master.digital_threads[0].operations[0].user_info;
    assert_eq!(info.username.as_deref(), Some("jdoe"));
    assert_eq!(info.user_id.as_deref(), Some("42"));
    assert_eq!(info.timestamp.as_deref(), Some("2021-05-04T10:00:00"));

    let value = master.to_dict().unwrap();
    let exported = &value["Digital Threads"][0]["Operations"][0]["UserInfo"];
    assert_eq!(exported, &json!({ "Username": "jdoe", "UserID": "42", "Timestamp": "2021-05-04T10:00:00" }));
}

#[test]
fn malformed_subfiles_are_skipped() {
    let master = legacy();
    let file = &master.digital_threads[0].files[0];
    assert_eq!(file.files.len(), 1);
    let subfile = &file.files[0];
    assert_eq!(subfile.file.name.as_deref(), Some("stock.step"));
    assert_eq!(subfile.file.mime_type.as_deref(), Some("model/step"));
    assert_eq!(subfile.connection.port.as_deref(), Some("8080"));
    assert_eq!(subfile.security.checksum, None);
}

#[test]
fn null_identifiers_are_replaced() {
    let master = legacy();
    let orphan = &master.digital_threads[0].files[1];
    assert_eq!(orphan.name.as_deref(), Some("orphan"));
    assert_ne!(orphan.id, "None");
    assert!(Uuid::parse_str(&orphan.id).is_ok());
    assert!(orphan.files.is_empty());
}

#[test]
fn documents_without_catalog_refuse_types() {
    let mut master = legacy();
    assert!(master.library().is_empty());
    let mut thread = master.thread_mut(0).unwrap();
    let mut operation = thread.operation_mut(0).unwrap();
    assert!(!operation.set_operation_type("Build"));
    assert_eq!(operation.operation_type(), Some("Machining"));
}

#[test]
fn colliding_identifiers_abort_decoding() {
    let xml = LEGACY.replace(r#"ID="ui-1""#, r#"ID="file-1""#);
    match MasterAml::from_aml_str(&xml, IdRegistry::new()) {
        Err(MamlError::IdentifierCollision { id }) => assert_eq!(id, "file-1"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn identical_duplicates_are_tolerated() {
    // copied fragments carry the same identifier with the same content
    let tree = json!({
        "Root": [{
            "Item": [
                { "@ID": "same", "@Name": "copy" },
                { "@ID": "same", "@Name": "copy" }
            ]
        }]
    });
    let found = node::unique_ids(&tree, node::ID).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found["same"]["@Name"], "copy");

    let changed = json!({
        "Root": [{
            "Item": [
                { "@ID": "same", "@Name": "copy" },
                { "@ID": "same", "@Name": "edited" }
            ]
        }]
    });
    assert!(matches!(
        node::unique_ids(&changed, node::ID),
        Err(MamlError::IdentifierCollision { .. })
    ));
}

#[test]
fn missing_root_is_malformed() {
    let result = MasterAml::from_aml_str("<Other/>", IdRegistry::new());
    assert!(matches!(result, Err(MamlError::Malformed(_))));
}

const REPEATED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CAEXFile FileName="copied.aml" SchemaVersion="3.0">
  <InstanceHierarchy Name="DigitalThreads">
    <InternalElement Name="Copied thread" ID="dt-1" RefBaseSystemUnitPath="Structures/DigitalThread">
      <InternalElement Name="Files" ID="c-files">
        <InternalElement Name="scan" ID="file-1">
          <InternalElement Name="File" ID="sf-1">
            <ExternalInterface Name="FileInterface" ID="fi-1">
              <Attribute Name="File">
                <Attribute Name="Name"><Value>scan.ply</Value></Attribute>
              </Attribute>
            </ExternalInterface>
          </InternalElement>
        </InternalElement>
        <InternalElement Name="scan" ID="file-1">
          <InternalElement Name="File" ID="sf-1">
            <ExternalInterface Name="FileInterface" ID="fi-1">
              <Attribute Name="File">
                <Attribute Name="Name"><Value>scan.ply</Value></Attribute>
              </Attribute>
            </ExternalInterface>
          </InternalElement>
        </InternalElement>
      </InternalElement>
    </InternalElement>
  </InstanceHierarchy>
</CAEXFile>
"#;

#[test]
fn repeated_records_are_decoded_once() {
    let mut master = MasterAml::from_aml_str(REPEATED, IdRegistry::new()).unwrap();
    let files = &master.digital_threads[0].files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].files[0].file.name.as_deref(), Some("scan.ply"));

    let aml = master.to_aml_string().unwrap();
    let again = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
    assert_eq!(again.digital_threads[0].files, master.digital_threads[0].files);
    assert_eq!(again.fingerprint().unwrap(), master.fingerprint().unwrap());
}

const CROSSED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CAEXFile FileName="crossed.aml" SchemaVersion="3.0">
  <InstanceHierarchy Name="DigitalThreads">
    <InternalElement Name="Crossed thread" ID="dt-1" RefBaseSystemUnitPath="Structures/DigitalThread">
      <InternalElement Name="Operations" ID="c-ops">
        <InternalElement Name="Print" ID="op-1">
          <ExternalInterface Name="InputFile" ID="ei-1" RefBaseClassPath="DigitalThreadInterfaces/FileExchangeConnector"/>
          <ExternalInterface Name="SoftwareUsed" ID="ei-2" RefBaseClassPath="DigitalThreadInterfaces/SoftwareInterfaceConnector"/>
        </InternalElement>
      </InternalElement>
      <InternalElement Name="Softwares" ID="c-sw">
        <InternalElement Name="Slicer" ID="sw-1">
          <ExternalInterface Name="Operation" ID="ei-3" RefBaseClassPath="DigitalThreadInterfaces/SoftwareInterfaceConnector"/>
        </InternalElement>
      </InternalElement>
      <InternalLink Name="InternalLink1" RefPartnerSideA="ei-1" RefPartnerSideB="ei-3"/>
      <InternalLink Name="InternalLink2" RefPartnerSideA="ei-2" RefPartnerSideB="ei-3"/>
    </InternalElement>
  </InstanceHierarchy>
</CAEXFile>
"#;

#[test]
fn links_to_records_of_the_wrong_kind_are_dropped() {
    let mut master = MasterAml::from_aml_str(CROSSED, IdRegistry::new()).unwrap();
    let operation = &master.digital_threads[0].operations[0];
    assert!(operation.input_file.is_empty());
    assert_eq!(operation.software_used, ["sw-1"]);

    let aml = master.to_aml_string().unwrap();
    let again = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
    assert_eq!(again.digital_threads[0].operations[0].software_used, ["sw-1"]);
}

#[test]
fn types_survive_export_without_catalog() {
    let mut master = legacy();
    let before = master.fingerprint().unwrap();
    let aml = master.to_aml_string().unwrap();
    assert!(aml.contains(r#"RefBaseSystemUnitPath="Operations/Machining""#));

    let again = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
    assert_eq!(again.digital_threads[0].operations[0].operation_type(), Some("Machining"));
    assert_eq!(again.fingerprint().unwrap(), before);
}
