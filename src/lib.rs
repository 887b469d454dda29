//! maml – conversion between Master AML documents and their simplified model.
//!
//! A Master AML document is an AutomationML (CAEX 3.0) file describing one or
//! more *digital threads*: the manufacturing operations of a product, the
//! files they consume and produce, and the software they run. The exchange
//! form is verbose. Relationships are never stored on the records themselves,
//! they are pairs of interface stubs joined by internal links. The simplified
//! model flattens all of this into plain records with identifier lists:
//! * A [`thread::DigitalThread`] groups module tags, operations, files and softwares.
//! * An [`operation::Operation`] references input files, output files and software.
//! * A [`file::File`] carries one [`file::SubFile`] per physical part.
//! * A [`software::Software`] references its configuration files.
//!
//! ## Modules
//! * [`codec`] – AML text to raw tree and back.
//! * [`node`] – Helpers over the raw tree.
//! * [`element`] – The shared decode/encode contract of every record.
//! * [`links`] – Link reconstruction and synthesis inside a thread.
//! * [`document`] – The root record owning threads, catalog and identifiers.
//! * [`thread`] – Digital threads and their editing handle.
//! * [`operation`] – Operations, user info and operation types.
//! * [`file`] – Files and their subfiles.
//! * [`software`] – Softwares and their configuration files.
//! * [`templates`] – Default raw skeletons of every record.
//! * [`library`] – The catalog of operation types.
//! * [`identity`] – Identifier registry, random or seeded.
//! * [`master`] – File level conversion facade.
//! * [`settings`] – Layered settings used by the `maml` binary.
//!
//! ## Identifiers
//! Every record owns a UUID drawn from the [`identity::IdRegistry`] of its
//! document. The registry never hands out an identifier twice. A seeded
//! registry produces the same sequence for the same calls, which makes
//! exports byte-for-byte reproducible.
//!
//! ## Quick Start
//! ```
//! use maml::identity::IdRegistry;
//! use maml::master::MasterAml;
//!
//! let mut master = MasterAml::new(IdRegistry::seeded(7)).unwrap();
//! {
//!     let mut thread = master.new_digital_thread();
//!     thread.name = Some("Analog thread".into());
//!     let mut operation = thread.new_operation();
//!     operation.name = Some("Assembly".into());
//!     assert!(operation.set_operation_type("Build"));
//!     operation.new_output_file().name = Some("scope.hdf5".into());
//! }
//! let aml = master.to_aml_string().unwrap();
//! let again = MasterAml::from_aml_str(&aml, IdRegistry::new()).unwrap();
//! assert_eq!(master.fingerprint().unwrap(), again.fingerprint().unwrap());
//! ```
//!
//! ## Command Line
//! `maml input.aml` writes `input.json` next to it and `maml input.json`
//! writes `input.aml`. An explicit output path picks the format by extension.

pub mod codec;
pub mod document;
pub mod element;
pub mod error;
pub mod file;
pub mod identity;
pub mod library;
pub mod links;
pub mod master;
pub mod node;
pub mod operation;
pub mod settings;
pub mod software;
pub mod templates;
pub mod thread;
