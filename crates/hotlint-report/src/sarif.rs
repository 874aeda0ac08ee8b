use hotlint_core::{to_slash, Hotspot, ReportConfig};
use serde::{Deserialize, Serialize};

/// SARIF version written into every report.
pub const SARIF_VERSION: &str = "2.1.0";

/// Schema URL written into every report.
pub const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json";

/// Rule ID attached to every hotspot result.
pub const HOTSPOT_RULE_ID: &str = "hotspot";

/// A SARIF log with exactly one run.
///
/// Field order is the serialized key order; downstream consumers compare the
/// output byte for byte, so do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifLog {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub information_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

impl SarifLog {
    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns a serialization error; in practice this cannot fail for the
    /// types above.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Convert ranked hotspots to a SARIF v2.1.0 log.
///
/// Produces one result per hotspot, in the given order, each with rule
/// `hotspot` at level `note`.
///
/// # Examples
///
/// ```
/// use hotlint_core::{Hotspot, ReportConfig};
/// use hotlint_report::sarif::to_sarif;
///
/// let hotspots = vec![Hotspot {
///     file: "a.go".into(),
///     churn: 10,
///     complexity: 2.0,
///     score: 2.397895,
/// }];
/// let log = to_sarif(&hotspots, &ReportConfig::default());
/// assert_eq!(log.version, "2.1.0");
/// assert_eq!(
///     log.runs[0].results[0].message.text,
///     "Hotspot candidate: churn=10, complexity=2.00, score=2.40"
/// );
/// ```
pub fn to_sarif(hotspots: &[Hotspot], driver: &ReportConfig) -> SarifLog {
    let results = hotspots.iter().map(hotspot_result).collect();

    SarifLog {
        version: SARIF_VERSION.into(),
        schema: SARIF_SCHEMA.into(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: driver.tool_name.clone(),
                    information_uri: driver.information_uri.clone(),
                },
            },
            results,
        }],
    }
}

fn hotspot_result(h: &Hotspot) -> SarifResult {
    SarifResult {
        rule_id: HOTSPOT_RULE_ID.into(),
        level: "note".into(),
        message: SarifMessage {
            text: format!(
                "Hotspot candidate: churn={}, complexity={:.2}, score={:.2}",
                h.churn, h.complexity, h.score
            ),
        },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation {
                    uri: to_slash(&h.file),
                },
            },
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(file: &str, churn: u64, complexity: f64, score: f64) -> Hotspot {
        Hotspot {
            file: file.into(),
            churn,
            complexity,
            score,
        }
    }

    #[test]
    fn sarif_has_required_fields() {
        let log = to_sarif(&[], &ReportConfig::default());
        let sarif = serde_json::to_value(&log).unwrap();

        assert_eq!(sarif["version"], "2.1.0");
        assert!(sarif["$schema"].as_str().unwrap().contains("sarif-schema"));
        assert_eq!(sarif["runs"].as_array().unwrap().len(), 1);

        let run = &sarif["runs"][0];
        assert_eq!(run["tool"]["driver"]["name"], "hotlint");
        assert_eq!(
            run["tool"]["driver"]["informationUri"],
            "https://github.com/hotlint/hotlint"
        );
        assert!(run["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn key_order_is_fixed() {
        let log = to_sarif(&[hotspot("a.go", 1, 1.0, 0.5)], &ReportConfig::default());
        let json = serde_json::to_string(&log).unwrap();
        let v = json.find("\"version\"").unwrap();
        let s = json.find("\"$schema\"").unwrap();
        let r = json.find("\"runs\"").unwrap();
        assert!(v < s && s < r);

        let rule = json.find("\"ruleId\"").unwrap();
        let level = json.find("\"level\"").unwrap();
        let message = json.find("\"message\"").unwrap();
        let locations = json.find("\"locations\"").unwrap();
        assert!(rule < level && level < message && message < locations);
    }

    #[test]
    fn results_follow_ranked_order() {
        let hotspots = vec![
            hotspot("z.go", 50, 3.0, 4.2),
            hotspot("a.go", 5, 1.0, 1.1),
            hotspot("m.go", 2, 0.5, -0.3),
        ];
        let log = to_sarif(&hotspots, &ReportConfig::default());
        let results = &log.runs[0].results;
        assert_eq!(results.len(), 3);
        let uris: Vec<&str> = results
            .iter()
            .map(|r| r.locations[0].physical_location.artifact_location.uri.as_str())
            .collect();
        assert_eq!(uris, vec!["z.go", "a.go", "m.go"]);
        assert!(results.iter().all(|r| r.rule_id == "hotspot" && r.level == "note"));
    }

    #[test]
    fn message_formats_two_decimals_and_negative_scores() {
        let log = to_sarif(&[hotspot("m.go", 2, 0.456, -0.3)], &ReportConfig::default());
        assert_eq!(
            log.runs[0].results[0].message.text,
            "Hotspot candidate: churn=2, complexity=0.46, score=-0.30"
        );
    }

    #[test]
    fn uris_use_forward_slashes() {
        let log = to_sarif(
            &[hotspot(r"pkg\api\handler.go", 1, 1.0, 1.0)],
            &ReportConfig::default(),
        );
        assert_eq!(
            log.runs[0].results[0].locations[0]
                .physical_location
                .artifact_location
                .uri,
            "pkg/api/handler.go"
        );
    }

    #[test]
    fn driver_metadata_is_configurable() {
        let driver = ReportConfig {
            tool_name: "ci-lint".into(),
            information_uri: "https://example.com".into(),
        };
        let log = to_sarif(&[], &driver);
        assert_eq!(log.runs[0].tool.driver.name, "ci-lint");
        assert_eq!(log.runs[0].tool.driver.information_uri, "https://example.com");
    }

    #[test]
    fn pretty_json_ends_with_newline_and_parses_back() {
        let log = to_sarif(&[hotspot("a.go", 1, 1.0, 1.0)], &ReportConfig::default());
        let text = log.to_json_pretty().unwrap();
        assert!(text.ends_with("}\n"));
        let parsed: SarifLog = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, log);
    }
}
