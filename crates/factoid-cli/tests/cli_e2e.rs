use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn factoid_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_factoid"))
}

fn run(args: &[&str]) -> Output {
    Command::new(factoid_bin())
        .args(args)
        .output()
        .expect("run factoid")
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(factoid_bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn factoid");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait factoid")
}

const DOCUMENT: &str = r#"{
  "interactions": [
    {
      "type": "Protein Controls State",
      "controller": {"type": "protein", "name": "MDM2", "xref": {"id": "Q00987", "db": "uniprot"}},
      "target": {"type": "protein", "name": "TP53", "xref": {"id": "P04637", "db": "uniprot"}},
      "controlType": "inhibition"
    },
    {"type": "Location Change"}
  ],
  "publication": {"id": "31234567", "db": "pubmed"}
}"#;

// ============================================================================
// to-biopax
// ============================================================================

#[test]
fn test_to_biopax_writes_rdf_xml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("doc.json");
    let out = dir.path().join("doc.owl");
    fs::write(&input, DOCUMENT).expect("write input");

    let output = run(&[
        "to-biopax",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let xml = fs::read_to_string(&out).expect("read output");
    assert!(xml.contains("<bp:Catalysis"));
    assert!(xml.contains("<bp:PublicationXref"));
    assert!(xml.contains("http://biofactoid.org/Protein_"));
}

#[test]
fn test_to_biopax_reads_stdin_and_honors_base_iri() {
    let output = run_with_stdin(&["to-biopax", "-", "--base-iri", "urn:factoid:"], DOCUMENT);
    assert!(output.status.success());
    let xml = String::from_utf8(output.stdout).expect("utf8");
    assert!(xml.contains("rdf:about=\"urn:factoid:Conversion_0\""));
}

#[test]
fn test_strict_flag_fails_on_unknown_template() {
    let output = run_with_stdin(&["to-biopax", "-", "--strict"], DOCUMENT);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Location Change"), "stderr: {stderr}");
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"strict": true}"#).expect("write config");

    let output = run_with_stdin(&["to-biopax", "-", "--config", config.to_str().unwrap()], DOCUMENT);
    assert!(!output.status.success());
}

#[test]
fn test_malformed_document_exits_non_zero() {
    let output = run_with_stdin(&["to-biopax", "-"], "{\"publication\": null}");
    assert!(!output.status.success());
}

// ============================================================================
// inspect / to-json
// ============================================================================

#[test]
fn test_inspect_json_reports_skipped_templates() {
    let output = run_with_stdin(&["inspect", "-", "--json"], DOCUMENT);
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["report"]["applied"], 1);
    assert_eq!(summary["report"]["unknown"][0]["template_type"], "Location Change");
    assert_eq!(summary["stats"]["by_class"]["Catalysis"], 1);
}

#[test]
fn test_to_json_round_trips_through_rdf_xml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let owl = dir.path().join("doc.owl");
    let forward = run_with_stdin(&["to-biopax", "-", "--out", owl.to_str().unwrap()], DOCUMENT);
    assert!(forward.status.success());

    let output = run(&["to-json", owl.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    // No evidence codes are written by the forward path, so nothing qualifies.
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report, serde_json::json!({}));
}

#[test]
fn test_missing_input_file_is_an_error() {
    let output = run(&["inspect", "/nonexistent/factoid.json"]);
    assert!(!output.status.success());
}
