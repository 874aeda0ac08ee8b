//! Integration test: hotspots → SARIF → file on disk.

use hotlint_core::{Hotspot, ReportConfig};
use hotlint_report::emit::{emit_report, StdFileSystem};
use hotlint_report::sarif::to_sarif;

#[test]
fn report_on_disk_matches_ranked_hotspots() {
    let hotspots: Vec<Hotspot> = (0..25u64)
        .map(|i| Hotspot {
            file: format!("pkg/m{i:02}.go"),
            churn: 100 - i,
            complexity: 1.5,
            score: 10.0 - i as f64 * 0.25,
        })
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join(".hotlint/hotspots.sarif");
    let emitted = emit_report(
        &StdFileSystem,
        &to_sarif(&hotspots, &ReportConfig::default()),
        &dest,
    )
    .unwrap();
    assert_eq!(emitted.results, 25);

    let text = std::fs::read_to_string(&dest).unwrap();
    assert!(text.starts_with("{\n  \"version\": \"2.1.0\",\n  \"$schema\": "));

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let results = parsed["runs"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), hotspots.len());
    for (result, hotspot) in results.iter().zip(&hotspots) {
        assert_eq!(
            result["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            hotspot.file.as_str()
        );
        assert_eq!(result["ruleId"], "hotspot");
        assert_eq!(result["level"], "note");
    }
    assert_eq!(
        results[0]["message"]["text"],
        "Hotspot candidate: churn=100, complexity=1.50, score=10.00"
    );
}
