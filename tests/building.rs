use maml::element::{Context, Element};
use maml::error::MamlError;
use maml::file::File;
use maml::identity::IdRegistry;
use maml::library::OperationLibrary;
use maml::master::MasterAml;
use maml::node;
use maml::operation::Operation;

fn new_master() -> MasterAml {
    MasterAml::new(IdRegistry::seeded(2024)).unwrap()
}

#[test]
fn modules_are_deduplicated_in_order() {
    let mut master = new_master();
    let mut thread = master.new_digital_thread();
    assert!(thread.add_module("Nailing"));
    assert!(!thread.add_module("Nailing"));
    assert!(!thread.add_module("Requirements"));
    assert!(thread.add_module("Painting"));
    assert_eq!(thread.modules, vec!["Requirements", "Nailing", "Painting"]);
}

#[test]
fn modules_survive_export() {
    let mut master = new_master();
    {
        let mut thread = master.new_digital_thread();
        thread.add_module("Nailing");
        thread.add_module("Painting");
    }
    let aml = master.to_aml_string().unwrap();
    assert_eq!(aml.matches(r#"Name="Module3""#).count(), 1);
    assert!(!aml.contains(r#"Name="Module4""#));

    let imported = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
    assert_eq!(
        imported.digital_threads[0].modules,
        vec!["Requirements", "Nailing", "Painting"]
    );
}

#[test]
fn empty_subfiles_are_reused() {
    let mut file = File::default();
    assert_eq!(file.files.len(), 1);
    file.new_sub_file();
    file.new_sub_file();
    assert_eq!(file.files.len(), 1);

    file.new_sub_file().file.name = Some("part-1.hdf5".into());
    assert_eq!(file.files.len(), 1);
    file.new_sub_file();
    assert_eq!(file.files.len(), 2);
    file.new_sub_file();
    assert_eq!(file.files.len(), 2);
}

#[test]
fn subfiles_survive_export() {
    let mut master = new_master();
    {
        let mut thread = master.new_digital_thread();
        let file = thread.new_file();
        file.name = Some("scan".into());
        let first = file.new_sub_file();
        first.file.name = Some("scan-1.ply".into());
        first.file.mime_type = Some("model/ply".into());
        first.connection.url = Some("https://example.org/scan-1.ply".into());
        let second = file.new_sub_file();
        second.file.name = Some("scan-2.ply".into());
        second.security.checksum = Some("abc123".into());
    }
    let aml = master.to_aml_string().unwrap();
    let imported = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
    assert_eq!(imported.digital_threads[0].files, master.digital_threads[0].files);
    assert_eq!(imported.digital_threads[0].files[0].files.len(), 2);
}

#[test]
fn factories_keep_relationships_in_step() {
    let mut master = new_master();
    let mut thread = master.new_digital_thread();
    let mut operation = thread.new_operation();
    let input = operation.new_input_file().id.clone();
    let output = operation.new_output_file().id.clone();
    let software = operation.new_software_used().id.clone();
    assert_eq!(operation.input_file, [input.clone()]);
    assert_eq!(operation.output_file, [output.clone()]);
    assert_eq!(operation.software_used, [software.clone()]);

    let mut handle = thread.software_mut(0).unwrap();
    let config = handle.new_config_file().id.clone();
    assert_eq!(handle.config_file, [config.clone()]);
    assert_eq!(handle.relation("ConfigFile"), Some(&vec![config.clone()]));

    assert_eq!(thread.files.len(), 3);
    assert!(thread.file(&input).is_some());
    assert!(thread.file(&config).is_some());
    assert!(thread.software(&software).is_some());
    assert!(thread.check_references().is_ok());
}

#[test]
fn unknown_operation_types_are_refused() {
    let mut master = new_master();
    let mut thread = master.new_digital_thread();
    let mut operation = thread.new_operation();
    assert!(!operation.set_operation_type("Welding"));
    assert_eq!(operation.operation_type(), None);
    assert_eq!(operation.stage, None);

    assert!(operation.operation_types_available().contains("Inspection"));
    assert!(operation.set_operation_type("Inspection"));
    assert_eq!(operation.stage.as_deref(), Some("Quality"));
    assert_eq!(operation.step.as_deref(), Some("Inspection"));
    assert_eq!(operation.operation.as_deref(), Some("Metrology"));
}

#[test]
fn default_catalog() {
    let master = new_master();
    let library = master.library();
    assert_eq!(library.version(), Some("1.0"));
    let names: Vec<&str> = library.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["Design", "Simulation", "Build", "Machining", "Inspection", "Test"]);
    let build = library.get("Build").unwrap();
    assert_eq!(build.stage.as_deref(), Some("Manufacturing"));
    assert_eq!(build.step.as_deref(), Some("Build"));
    assert_eq!(build.operation.as_deref(), Some("Assembly"));
}

#[test]
fn types_can_keep_existing_attributes() {
    let master = new_master();
    let mut operation = Operation::default();
    operation.stage = Some("Prototype".into());
    assert!(operation.set_operation_type("Build", master.library(), false));
    assert_eq!(operation.operation_type(), Some("Build"));
    assert_eq!(operation.stage.as_deref(), Some("Prototype"));
    assert_eq!(operation.step, None);
    assert_eq!(operation.operation, None);

    assert!(!operation.set_operation_type("Welding", master.library(), false));
    assert_eq!(operation.operation_type(), Some("Build"));
}

#[test]
fn exporting_a_dangling_reference_fails() {
    let mut master = new_master();
    {
        let mut thread = master.new_digital_thread();
        let mut operation = thread.new_operation();
        operation.output_file.push("missing".into());
    }
    match master.to_aml_string() {
        Err(MamlError::DanglingReference { id }) => assert_eq!(id, "missing"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn file_encoding_mints_only_subfile_identifiers() {
    let mut ids = IdRegistry::seeded(3);
    let mut file = File::new(&mut ids);
    file.new_sub_file().file.name = Some("a.csv".into());
    file.new_sub_file().file.name = Some("b.csv".into());
    let library = OperationLibrary::default();
    let before = ids.len();
    let raw = file.encode(&mut Context::new(&mut ids, &library)).unwrap();
    // one element and one interface per subfile
    assert_eq!(ids.len(), before + 4);
    assert_eq!(node::children(&raw, "InternalElement").len(), 2);
}
