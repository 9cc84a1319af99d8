//! Facade tests against synthetic FMU archives (model description only, no
//! platform binary).

use std::io::Write;
use std::sync::Arc;

use fmi2::resource::FmuResource;
use fmi2::{Error, Fmu, PackageError};

const MODEL_DESCRIPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
  fmiVersion="2.0"
  modelName="TorsionBar"
  guid="{bf267ba3-8886-4ab6-8e4c-cad4e1d7b957}"
  generationTool="20-sim"
  numberOfEventIndicators="0">
  <CoSimulation modelIdentifier="TorsionBar" canHandleVariableCommunicationStepSize="true"/>
  <DefaultExperiment startTime="0.0" stopTime="12.0"/>
  <ModelVariables>
    <ScalarVariable name="MotorDiskRev" valueReference="105" causality="output" variability="continuous">
      <Real unit="rev"/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs><Unknown index="1"/></Outputs>
  </ModelStructure>
</fmiModelDescription>"#;

fn write_fmu(model_description: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
    zip.start_file("modelDescription.xml", zip::write::FileOptions::default())
        .unwrap();
    zip.write_all(model_description.as_bytes()).unwrap();
    zip.finish().unwrap();
    file
}

#[test]
fn test_open_and_introspect() {
    let _ = env_logger::builder().is_test(true).try_init();

    let archive = write_fmu(MODEL_DESCRIPTION);
    let fmu = Fmu::open(archive.path()).unwrap();

    let descr = fmu.model_description();
    assert_eq!(descr.model_name, "TorsionBar");
    assert_eq!(descr.guid, "{bf267ba3-8886-4ab6-8e4c-cad4e1d7b957}");
    assert_eq!(
        descr
            .model_variable_by_name("MotorDiskRev")
            .unwrap()
            .value_reference,
        105
    );
    assert!(fmu.supports_co_simulation());
    assert!(!fmu.supports_model_exchange());

    let outputs: Vec<_> = descr.outputs().map(|v| v.name.as_str()).collect();
    assert_eq!(outputs, ["MotorDiskRev"]);
}

#[test]
fn test_missing_variant() {
    let archive = write_fmu(MODEL_DESCRIPTION);
    let fmu = Fmu::open(archive.path()).unwrap();
    assert!(matches!(
        fmu.as_model_exchange(),
        Err(Error::UnsupportedFmuType("ModelExchange"))
    ));
}

#[test]
fn test_missing_platform_binary() {
    // the archive declares Co-Simulation but ships no binaries/ directory
    let archive = write_fmu(MODEL_DESCRIPTION);
    let fmu = Fmu::open(archive.path()).unwrap();
    match fmu.as_co_simulation() {
        Err(Error::Package(PackageError::MissingBinary { path })) => {
            assert!(path.to_string_lossy().contains("binaries"));
        }
        other => panic!("expected MissingBinary, got {:?}", other.err()),
    }
}

#[test]
fn test_unsupported_fmi_version() {
    let archive = write_fmu(
        r#"<fmiModelDescription fmiVersion="1.0" modelName="old" guid="{g}">
             <ModelVariables/>
           </fmiModelDescription>"#,
    );
    assert!(matches!(
        Fmu::open(archive.path()),
        Err(Error::Package(PackageError::UnsupportedFmiVersion(v))) if v == "1.0"
    ));
}

#[test]
fn test_invalid_description() {
    let archive = write_fmu("<notAModelDescription/>");
    assert!(matches!(
        Fmu::open(archive.path()),
        Err(Error::Package(PackageError::Schema(_)))
    ));
}

#[test]
fn test_resource_shared_ownership() {
    // the unpacked directory lives exactly as long as its last holder
    let archive = write_fmu(MODEL_DESCRIPTION);
    let resource = Arc::new(FmuResource::unpack(archive.path()).unwrap());
    let dir = resource.path().to_path_buf();

    let second = resource.clone();
    drop(resource);
    assert!(dir.exists());

    drop(second);
    assert!(!dir.exists());
}
