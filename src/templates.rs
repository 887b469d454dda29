// Default raw skeletons for every record type.
//
// Records are encoded by filling a fresh copy of their skeleton, so anything
// the skeleton declares (attribute tags, nested containers, interface stubs)
// shows up in the output even when the record leaves it empty. Null `@ID`s
// are placeholders replaced by fresh identifiers on encode.

use lazy_static::lazy_static;
use serde_json::json;

use crate::node::Node;

pub const DIGITAL_THREAD_PATH: &str = "Structures/DigitalThread";
pub const FILE_EXCHANGE: &str = "DigitalThreadInterfaces/FileExchangeConnector";
pub const SOFTWARE_INTERFACE: &str = "DigitalThreadInterfaces/SoftwareInterfaceConnector";
pub const FIXED_WRITING_TIME: &str = "1970-01-01T00:00:00Z";

fn string_attribute(name: &str) -> Node {
    json!({ "@Name": name, "@AttributeDataType": "xs:string" })
}

fn operation_type(name: &str, stage: &str, step: &str, operation: &str) -> Node {
    json!({
        "@Name": name,
        "@ID": null,
        "Attribute": [
            { "@Name": "Stage", "@AttributeDataType": "xs:string", "Value": [stage] },
            { "@Name": "Step", "@AttributeDataType": "xs:string", "Value": [step] },
            { "@Name": "Operation", "@AttributeDataType": "xs:string", "Value": [operation] }
        ]
    })
}

lazy_static! {
    static ref DOCUMENT: Node = json!({
        "CAEXFile": [{
            "@xmlns:xsi": "http://www.w3.org/2001/XMLSchema-instance",
            "@xmlns": "http://www.dke.de/CAEX",
            "@SchemaVersion": "3.0",
            "@FileName": "master.aml",
            "@xsi:schemaLocation": "http://www.dke.de/CAEX CAEX_ClassModel_V.3.0.xsd",
            "SuperiorStandardVersion": ["AutomationML 2.10"],
            "SourceDocumentInformation": [{
                "@OriginName": "maml",
                "@OriginID": "maml",
                "@OriginVersion": env!("CARGO_PKG_VERSION"),
                "@OriginRelease": env!("CARGO_PKG_VERSION"),
                "@LastWritingDateTime": FIXED_WRITING_TIME
            }],
            "InstanceHierarchy": [{
                "@Name": "DigitalThreads",
                "Version": ["1.0"],
                "InternalElement": []
            }],
            "InterfaceClassLib": [{
                "@Name": "DigitalThreadInterfaces",
                "Version": ["1.0"],
                "InterfaceClass": [
                    { "@Name": "FileExchangeConnector", "@RefBaseClassPath": "AutomationMLInterfaceClassLib/AutomationMLBaseInterface" },
                    { "@Name": "SoftwareInterfaceConnector", "@RefBaseClassPath": "AutomationMLInterfaceClassLib/AutomationMLBaseInterface" },
                    { "@Name": "FileInterface", "@RefBaseClassPath": "AutomationMLInterfaceClassLib/AutomationMLBaseInterface" }
                ]
            }],
            "SystemUnitClassLib": [
                {
                    "@Name": "Structures",
                    "Version": ["1.0"],
                    "SystemUnitClass": [
                        { "@Name": "DigitalThread", "@ID": null },
                        { "@Name": "Operation", "@ID": null },
                        { "@Name": "File", "@ID": null },
                        { "@Name": "SubFile", "@ID": null },
                        { "@Name": "Software", "@ID": null }
                    ]
                },
                {
                    "@Name": "Operations",
                    "Version": ["1.0"],
                    "SystemUnitClass": [
                        operation_type("Design", "Design", "Product design", "CAD modelling"),
                        operation_type("Simulation", "Design", "Process design", "Process simulation"),
                        operation_type("Build", "Manufacturing", "Build", "Assembly"),
                        operation_type("Machining", "Manufacturing", "Build", "Machining"),
                        operation_type("Inspection", "Quality", "Inspection", "Metrology"),
                        operation_type("Test", "Quality", "Testing", "Functional test")
                    ]
                }
            ]
        }]
    });

    static ref DIGITAL_THREAD: Node = json!({
        "@Name": null,
        "@ID": null,
        "@RefBaseSystemUnitPath": DIGITAL_THREAD_PATH,
        "Attribute": [{
            "@Name": "Modules",
            "@AttributeDataType": "xs:string",
            "Attribute": [
                { "@Name": "Module1", "@AttributeDataType": "xs:string", "Value": ["Requirements"] }
            ]
        }],
        "InternalElement": [
            { "@Name": "Operations", "@ID": null, "InternalElement": [] },
            { "@Name": "Files", "@ID": null, "InternalElement": [] },
            { "@Name": "Softwares", "@ID": null, "InternalElement": [] }
        ],
        "InternalLink": []
    });

    static ref OPERATION: Node = json!({
        "@Name": null,
        "@ID": null,
        "@RefBaseSystemUnitPath": "Structures/Operation",
        "Attribute": [
            string_attribute("Module"),
            { "@Name": "Success", "@AttributeDataType": "xs:boolean" },
            string_attribute("Stage"),
            string_attribute("Step"),
            string_attribute("Operation"),
            string_attribute("Comments")
        ],
        "ExternalInterface": [],
        "InternalElement": [{
            "@Name": "UserInfo",
            "@ID": null,
            "Attribute": [
                string_attribute("Username"),
                string_attribute("UserID"),
                { "@Name": "Timestamp", "@AttributeDataType": "xs:dateTime" }
            ]
        }]
    });

    static ref FILE: Node = json!({
        "@Name": null,
        "@ID": null,
        "@RefBaseSystemUnitPath": "Structures/File",
        "ExternalInterface": [],
        "InternalElement": [{
            "@Name": "File",
            "@ID": null,
            "@RefBaseSystemUnitPath": "Structures/SubFile",
            "ExternalInterface": [{
                "@Name": "FileInterface",
                "@ID": null,
                "@RefBaseClassPath": "DigitalThreadInterfaces/FileInterface",
                "Attribute": [
                    {
                        "@Name": "File",
                        "Attribute": [string_attribute("Name"), string_attribute("MIMEType"), string_attribute("UUID")]
                    },
                    {
                        "@Name": "Connection",
                        "Attribute": [string_attribute("IP"), string_attribute("Port"), { "@Name": "URL", "@AttributeDataType": "xs:anyURI" }]
                    },
                    {
                        "@Name": "Security",
                        "Attribute": [string_attribute("Checksum")]
                    }
                ]
            }]
        }]
    });

    static ref LIBRARY_ENTRY: Node = json!({
        "@Name": null,
        "@ID": null,
        "Attribute": [string_attribute("Stage"), string_attribute("Step"), string_attribute("Operation")]
    });

    static ref SOFTWARE: Node = json!({
        "@Name": null,
        "@ID": null,
        "@RefBaseSystemUnitPath": "Structures/Software",
        "Attribute": [
            string_attribute("Software Name"),
            string_attribute("Version"),
            string_attribute("Description"),
            string_attribute("Input type(s)"),
            string_attribute("Output type(s)")
        ],
        "ExternalInterface": []
    });
}

// every accessor hands out a deep copy so callers never share template state
pub fn document() -> Node {
    DOCUMENT.clone()
}
pub fn digital_thread() -> Node {
    DIGITAL_THREAD.clone()
}
pub fn operation() -> Node {
    OPERATION.clone()
}
pub fn file() -> Node {
    FILE.clone()
}
/// The subfile element of the file skeleton, still holding its placeholders.
pub fn sub_file() -> Node {
    FILE["InternalElement"][0].clone()
}
pub fn software() -> Node {
    SOFTWARE.clone()
}
pub fn library_entry() -> Node {
    LIBRARY_ENTRY.clone()
}
