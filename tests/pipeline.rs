use std::fs;
use std::path::Path;

use persona_ranker::error::Result;
use persona_ranker::{
    AnalyzerError, Analyzer, CollectionPaths, Config, Embedder, HashingEmbedder, LayoutSource,
    OutputJson, TextSpan,
};

/// Reads fixture "PDFs" written as `size|y|text` lines, pages split by `---`.
struct StubLayout;

impl LayoutSource for StubLayout {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<Vec<TextSpan>>> {
        let text = std::str::from_utf8(bytes).map_err(|e| AnalyzerError::extraction("", e))?;
        if text.starts_with("%CORRUPT") {
            return Err(AnalyzerError::extraction("", "corrupt fixture"));
        }
        Ok(text
            .split("---")
            .map(|page| {
                page.lines()
                    .filter_map(|l| {
                        let mut parts = l.trim().splitn(3, '|');
                        let size = parts.next()?.parse().ok()?;
                        let y = parts.next()?.parse().ok()?;
                        Some(TextSpan::new(parts.next()?, size, y))
                    })
                    .collect()
            })
            .collect())
    }
}

/// Controlled vectors: one axis per trip-planning term, one for legal text.
struct TravelEmbedder;

const TRAVEL_TERMS: &[&str] = &["trip", "itinerary", "hotel", "budget", "friends", "plan"];

impl Embedder for TravelEmbedder {
    fn dimensions(&self) -> usize {
        TRAVEL_TERMS.len() + 1
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = TRAVEL_TERMS
            .iter()
            .map(|t| if lower.contains(t) { 1.0 } else { 0.0 })
            .collect();
        v.push(if lower.contains("copyright") || lower.contains("rights") { 1.0 } else { 0.0 });
        Ok(v)
    }
}

struct Fixture {
    _root: tempfile::TempDir,
    paths: CollectionPaths,
}

fn write_collection(root: &Path, name: &str, input: &str, docs: &[(&str, &str)]) -> CollectionPaths {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("PDFs")).unwrap();
    fs::write(dir.join("challenge1b_input.json"), input).unwrap();
    for (file, content) in docs {
        fs::write(dir.join("PDFs").join(file), content).unwrap();
    }
    CollectionPaths {
        name: name.to_string(),
        input_path: dir.join("challenge1b_input.json"),
        output_path: dir.join("out").join("challenge1b_output.json"),
    }
}

const TRAVEL_INPUT: &str = r#"{
    "challenge_info": {"challenge_id": "round_1b_002", "test_case_name": "travel_planner"},
    "documents": [
        {"filename": "cities.pdf", "title": "Cities"},
        {"filename": "legal.pdf", "title": "Legal"},
        {"filename": "tips.pdf", "title": "Tips"}
    ],
    "persona": {"role": "Travel Planner"},
    "job_to_be_done": {"task": "Plan a 4-day trip for 6 college friends"}
}"#;

fn travel_fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let paths = write_collection(
        root.path(),
        "Collection 1",
        TRAVEL_INPUT,
        &[
            (
                "cities.pdf",
                "20|700|Trip Itinerary\n11|650|Day one starts with a walking tour of the old port. \
                 Book a hotel near the station to keep the budget low. The museum opens at nine.\n\
                 ---\n\
                 18|700|Hotel Guide\n11|650|Every hotel listed here suits groups of friends. Prices vary by season.",
            ),
            (
                "legal.pdf",
                "16|700|Copyright Notice\n9|650|All rights reserved. No part may be reproduced.\n---\n",
            ),
            (
                "tips.pdf",
                "22|700|Budget Tips for Friends\n11|650|Plan shared meals to stretch the budget. \
                 Friends can split a hotel room. Trains are cheap on weekdays.\n\
                 ---\n\
                 14|700|Local Phrases\n11|650|Plan to learn a few words. Bonjour means hello.\n\
                 ---\n\
                 14|700|Packing\n11|650|Plan light. Bring sunscreen and a hat.\n\
                 ---\n\
                 14|700|Festivals\n11|650|Summer festivals fill the squares with music.",
            ),
        ],
    );
    Fixture { _root: root, paths }
}

fn read_output(paths: &CollectionPaths) -> OutputJson {
    serde_json::from_str(&fs::read_to_string(&paths.output_path).unwrap()).unwrap()
}

#[test]
fn travel_scenario_ranks_planning_pages_above_legal_page() {
    let fixture = travel_fixture();
    let analyzer = Analyzer::new(TravelEmbedder, StubLayout, Config::default());
    let summary = analyzer.process_collection(&fixture.paths).unwrap();
    assert_eq!(summary.sections, 5);

    let output = read_output(&fixture.paths);
    assert_eq!(output.metadata.input_documents, ["cities.pdf", "legal.pdf", "tips.pdf"]);
    assert_eq!(output.metadata.persona, "Travel Planner");
    assert_eq!(output.metadata.job_to_be_done, "Plan a 4-day trip for 6 college friends");
    assert!(chrono::DateTime::parse_from_rfc3339(&output.metadata.processing_timestamp).is_ok());

    let titles: Vec<_> = output
        .extracted_sections
        .iter()
        .map(|s| s.section_title.as_str())
        .collect();
    assert_eq!(
        titles,
        ["Budget Tips for Friends", "Trip Itinerary", "Local Phrases", "Packing", "Hotel Guide"]
    );
    assert!(!titles.contains(&"Copyright Notice"));

    let ranks: Vec<_> = output.extracted_sections.iter().map(|s| s.importance_rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4, 5]);

    assert_eq!(output.extracted_sections.len(), output.subsection_analysis.len());
    for (section, sub) in output.extracted_sections.iter().zip(&output.subsection_analysis) {
        assert_eq!(section.document, sub.document);
        assert_eq!(section.page_number, sub.page_number);
    }

    let itinerary = &output.subsection_analysis[1];
    assert_eq!(itinerary.document, "cities.pdf");
    assert_eq!(itinerary.page_number, 1);
    assert_eq!(
        itinerary.refined_text,
        "Trip Itinerary Day one starts with a walking tour of the old port. \
         Book a hotel near the station to keep the budget low."
    );
}

#[test]
fn repeated_runs_produce_identical_rankings() {
    let fixture = travel_fixture();
    let analyzer = Analyzer::new(TravelEmbedder, StubLayout, Config::default());
    analyzer.process_collection(&fixture.paths).unwrap();
    let first = read_output(&fixture.paths);
    analyzer.process_collection(&fixture.paths).unwrap();
    let second = read_output(&fixture.paths);
    assert_eq!(first.extracted_sections, second.extracted_sections);
    assert_eq!(first.subsection_analysis, second.subsection_analysis);
}

#[test]
fn vegetarian_job_excludes_meat_pages() {
    let root = tempfile::tempdir().unwrap();
    let paths = write_collection(
        root.path(),
        "Dinner",
        r#"{
            "documents": [{"filename": "mains.pdf"}],
            "persona": {"role": "Food Contractor"},
            "job_to_be_done": {"task": "Plan a vegetarian menu for a buffet dinner"}
        }"#,
        &[(
            "mains.pdf",
            "18|700|Vegetarian Buffet Menu Mains\n11|650|Grilled chicken breast for the buffet menu.\n\
             ---\n\
             18|700|Vegetarian Buffet Menu Sides\n11|650|Roasted peppers for the buffet menu.",
        )],
    );
    let analyzer = Analyzer::new(HashingEmbedder::new(256, true), StubLayout, Config::default());
    analyzer.process_collection(&paths).unwrap();

    let output = read_output(&paths);
    assert_eq!(output.extracted_sections.len(), 1);
    assert_eq!(output.extracted_sections[0].page_number, 2);
}

#[test]
fn bad_documents_are_skipped_without_failing_the_collection() {
    let root = tempfile::tempdir().unwrap();
    let paths = write_collection(
        root.path(),
        "Mixed",
        r#"{
            "documents": [{"filename": "missing.pdf"}, {"filename": "corrupt.pdf"}, {"filename": "ok.pdf"}],
            "persona": {"role": "Travel Planner"},
            "job_to_be_done": {"task": "Plan a trip"}
        }"#,
        &[
            ("corrupt.pdf", "%CORRUPT"),
            ("ok.pdf", "16|700|Trip Plan\n11|650|Plan the trip with friends."),
        ],
    );
    let analyzer = Analyzer::new(TravelEmbedder, StubLayout, Config::default());
    analyzer.process_collection(&paths).unwrap();

    let output = read_output(&paths);
    assert_eq!(output.metadata.input_documents.len(), 3);
    assert_eq!(output.extracted_sections.len(), 1);
    assert_eq!(output.extracted_sections[0].document, "ok.pdf");
    assert_eq!(output.subsection_analysis[0].refined_text, "Trip Plan Plan the trip with friends.");
}

#[test]
fn no_surviving_pages_yields_empty_sections() {
    let root = tempfile::tempdir().unwrap();
    let paths = write_collection(
        root.path(),
        "Empty",
        r#"{
            "documents": [{"filename": "blank.pdf"}],
            "persona": {"role": "Travel Planner"},
            "job_to_be_done": {"task": "Plan a trip"}
        }"#,
        &[("blank.pdf", "---\n---")],
    );
    let analyzer = Analyzer::new(TravelEmbedder, StubLayout, Config::default());
    let summary = analyzer.process_collection(&paths).unwrap();
    assert_eq!(summary.sections, 0);

    let output = read_output(&paths);
    assert!(output.extracted_sections.is_empty());
    assert!(output.subsection_analysis.is_empty());
}

#[test]
fn failing_collection_does_not_stop_others() {
    let fixture = travel_fixture();
    let root = tempfile::tempdir().unwrap();
    let broken = write_collection(
        root.path(),
        "Broken",
        r#"{"documents": [{"filename": "a.pdf"}], "persona": {"role": ""}, "job_to_be_done": {"task": "x"}}"#,
        &[],
    );
    let malformed = write_collection(root.path(), "Malformed", "{ not json", &[]);

    let analyzer = Analyzer::new(TravelEmbedder, StubLayout, Config::default());
    let reports = analyzer.process_all(&[broken, fixture.paths.clone(), malformed]);

    assert_eq!(reports.len(), 3);
    let err = reports[0].outcome.as_ref().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalyzerError>(),
        Some(AnalyzerError::Configuration { collection, .. }) if collection == "Broken"
    ));
    assert_eq!(reports[1].outcome.as_ref().unwrap().sections, 5);
    assert!(reports[2].outcome.is_err());
}

#[test]
fn embedding_failure_is_fatal_for_the_collection() {
    struct Offline;

    impl Embedder for Offline {
        fn dimensions(&self) -> usize {
            1
        }

        fn embed(&self, _: &str) -> Result<Vec<f32>> {
            Err(AnalyzerError::EmbeddingUnavailable("model not loaded".into()))
        }
    }

    let fixture = travel_fixture();
    let analyzer = Analyzer::new(Offline, StubLayout, Config::default());
    let err = analyzer.process_collection(&fixture.paths).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalyzerError>(),
        Some(AnalyzerError::EmbeddingUnavailable(_))
    ));
    assert!(!fixture.paths.output_path.exists());
}
