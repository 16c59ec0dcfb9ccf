//! End-to-end scenarios over the public API: dataset file -> fitted model ->
//! engine context -> ranked researchers.

use researcher_recommend::classifier::train::{fit, save_artifact, TrainOptions};
use researcher_recommend::classifier::{
    validate_title, ClassifierResult, LinearThemeClassifier, ThemeClassifier, ThemePrediction,
};
use researcher_recommend::config::EngineConfig;
use researcher_recommend::models::GrantRecord;
use researcher_recommend::provider::open_provider;
use researcher_recommend::recommend::{EngineContext, RecommendError};
use researcher_recommend::repository::GrantRepository;
use researcher_recommend::server::{RecommendServer, ServerConfig};

const DATASET: &str = "Code\tTime\tTheme\tTitle\tAuthors\n\
P-01\t2024\tQuantum\tQuantum Sensing for Navigation\tAlice Chen, Bob Ito\n\
P-02\t2023\tQuantum\tQuantum Error Correction Codes\tAlice Chen\n\
P-03\t2019\tQuantum\tQuantum Key Distribution Networks\tCarol Diaz\n\
P-04\t2022\tQuantum\tTrapped Ion Quantum Processors\tDan Evans\n\
P-05\t2021\tQuantum\tSuperconducting Qubit Control\tErin Fox\n\
P-06\t2024\tHealthcare / Biomedical\tClinical Imaging with Deep Learning\tFrank Gale, Alice Chen\n\
P-07\t2023\tHealthcare / Biomedical\tPatient Monitoring Wearables\tGina Hu\n\
P-08\t2022\tHealthcare / Biomedical\tClinical Decision Support for Hospitals\tFrank Gale\n\
P-09\t2020\tHealthcare / Biomedical\tBiomedical Imaging of Patient Tissue\tGina Hu\n";

async fn load_records(dir: &tempfile::TempDir) -> Vec<GrantRecord> {
    let path = dir.path().join("grants_final.tsv");
    tokio::fs::write(&path, DATASET).await.unwrap();
    let provider = open_provider(&path).await.unwrap();
    provider.fetch_records().await.unwrap()
}

async fn fitted_context(dir: &tempfile::TempDir) -> EngineContext<LinearThemeClassifier> {
    let records = load_records(dir).await;
    let options = TrainOptions {
        max_iter: 500,
        ..TrainOptions::default()
    };
    let model = fit(&records, &options).unwrap();
    let model_path = dir.path().join("model.json");
    save_artifact(&model.artifact, &model_path).unwrap();

    let classifier = LinearThemeClassifier::load(&model_path).unwrap();
    EngineContext::new(GrantRepository::new(records), classifier, &EngineConfig::default())
}

struct FixedClassifier {
    labels: Vec<String>,
}

impl ThemeClassifier for FixedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, title: &str) -> ClassifierResult<ThemePrediction> {
        validate_title(title)?;
        Ok(ThemePrediction {
            theme: self.labels[0].clone(),
            confidence: 0.9,
        })
    }
}

#[test]
fn single_record_exact_title_ranks_author_first() {
    let records = vec![GrantRecord::new("P-1", 2020, "Quantum", "Quantum Sensing", "A")];
    let context = EngineContext::new(
        GrantRepository::new(records),
        FixedClassifier {
            labels: vec!["Quantum".to_string()],
        },
        &EngineConfig::default(),
    );

    let result = context
        .orchestrator()
        .recommend("Quantum Sensing", None, 5, 2026)
        .unwrap();
    assert_eq!(result.predicted_theme, "Quantum");
    assert_eq!(result.ranked[0].researcher, "A");
    assert_eq!(result.ranked[0].score.keyword_score, 200.0);
}

#[tokio::test]
async fn fitted_model_predicts_known_label_with_bounded_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let context = fitted_context(&dir).await;
    let orchestrator = context.orchestrator();

    for title in ["Quantum Sensing", "Clinical Imaging for Patients", "Robots"] {
        let result = orchestrator.recommend(title, None, 5, 2026).unwrap();
        assert!(context.classifier().labels().contains(&result.predicted_theme));
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    let quantum = orchestrator
        .recommend("Quantum Sensing for Navigation", None, 5, 2026)
        .unwrap();
    assert_eq!(quantum.predicted_theme, "Quantum");
    assert_eq!(quantum.ranked[0].researcher, "Alice Chen");
    assert!(quantum.ranked.iter().all(|r| r.score.is_consistent()));
}

#[tokio::test]
async fn absent_override_theme_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let context = fitted_context(&dir).await;
    let err = context
        .orchestrator()
        .recommend("Quantum Sensing", Some("Astrophysics"), 5, 2026)
        .unwrap_err();
    assert!(matches!(err, RecommendError::UnknownTheme(_)));
}

#[tokio::test]
async fn top_two_of_five_quantum_researchers() {
    let dir = tempfile::tempdir().unwrap();
    let context = fitted_context(&dir).await;

    let all = context
        .orchestrator()
        .recommend("Quantum Sensing", Some("Quantum"), 10, 2026)
        .unwrap();
    assert_eq!(all.ranked.len(), 5);

    let top = context
        .orchestrator()
        .recommend("Quantum Sensing", Some("Quantum"), 2, 2026)
        .unwrap();
    assert_eq!(top.ranked.len(), 2);
    assert_eq!(top.ranked, all.ranked[..2].to_vec());
    assert_eq!(top.confidence, 1.0);
    assert_eq!(top.total_researchers_scored, 5);
}

#[tokio::test]
async fn server_answers_each_line() {
    let dir = tempfile::tempdir().unwrap();
    let context = fitted_context(&dir).await;
    let server = RecommendServer::new(
        &context,
        ServerConfig {
            default_top_n: 5,
            current_year: 2026,
        },
    );

    let input = concat!(
        "{\"project_title\": \"Quantum Sensing\", \"top_n\": 1}\n",
        "{\"project_title\": \"\"}\n",
        "{\"project_title\": \"Clinical Imaging\", \"target_theme\": \"Healthcare / Biomedical\"}\n",
    );
    let mut output = Vec::new();
    let stats = server.run(input.as_bytes(), &mut output).await.unwrap();
    assert_eq!((stats.handled, stats.failed), (2, 1));

    let lines: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0]["recommendations"].as_array().map(Vec::len), Some(1));
    assert_eq!(lines[1]["status"], 400);
    assert_eq!(lines[2]["predicted_theme"], "Healthcare / Biomedical");
}
