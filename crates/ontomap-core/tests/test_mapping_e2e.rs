//! End-to-end mapping runs over temporary drug folders with the mock embedder.

use std::path::Path;

use ontomap_core::{read_similarity_csv, run_mapping, MappingJob, OntomapError};
use ontomap_test_utils::{write_drug_folder, write_terms_csv, MockEmbedder};
use pretty_assertions::assert_eq;

fn job(base: &Path) -> MappingJob {
    MappingJob {
        input_dir: base.join("ontology_mapping/input_data"),
        output_root: base.join("ontology_mapping/output_data"),
        predicted_dataset: "omim".to_string(),
        observed_dataset: "faers_cong".to_string(),
        term_column: "Outcome".to_string(),
        precision: 6,
        save_embeddings: false,
        preview: 3,
    }
}

fn drug_folder(job: &MappingJob, drug: &str, predicted: &[&str], observed: &[&str]) {
    let predicted_file = format!("{drug}_omim.csv");
    let observed_file = format!("{drug}_faers_cong.csv");
    write_drug_folder(
        &job.input_dir,
        drug,
        &[(predicted_file.as_str(), predicted), (observed_file.as_str(), observed)],
    )
    .unwrap();
}

fn matrix_path(job: &MappingJob, model: &str, drug: &str) -> std::path::PathBuf {
    job.output_root
        .join(model)
        .join(drug)
        .join(format!("{drug}_omim_faers_cong_similarity_matrix.csv"))
}

#[tokio::test]
async fn test_identical_term_scores_one() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    drug_folder(&job, "valproate", &["headache", "nausea"], &["headache"]);

    let embedder = MockEmbedder::new();
    let report = run_mapping(&job, &embedder).await.unwrap();

    assert_eq!(report.processed.len(), 1);
    let done = &report.processed[0];
    assert_eq!((done.predicted_terms, done.observed_terms), (2, 1));
    assert_eq!(done.dimension, 128);
    assert_eq!(done.output, matrix_path(&job, "mock/trigram-embedder", "valproate"));

    let back = read_similarity_csv(&done.output).unwrap();
    assert_eq!(back.matrix.shape(), (2, 1));
    assert!((back.matrix.get(0, 0).unwrap() - 1.0).abs() < 1e-6);
    assert!(back.matrix.get(1, 0).unwrap() < 1.0);
}

#[tokio::test]
async fn test_incomplete_folder_is_skipped_and_batch_continues() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    drug_folder(&job, "drugA", &["Seizure"], &["Seizure", "Rash"]);
    let only_predicted: &[&str] = &["Seizure"];
    write_drug_folder(&job.input_dir, "drugB", &[("drugB_omim.csv", only_predicted)]).unwrap();
    drug_folder(&job, "drugC", &["Seizure"], &["Seizure", "Rash"]);

    let embedder = MockEmbedder::new();
    let report = run_mapping(&job, &embedder).await.unwrap();

    let processed: Vec<&str> = report.processed.iter().map(|d| d.drug.as_str()).collect();
    assert_eq!(processed, vec!["drugA", "drugC"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].drug, "drugB");
    assert_eq!(report.skipped[0].reason, "missing observed file");
    assert!(report.is_clean());

    assert!(matrix_path(&job, "mock/trigram-embedder", "drugA").exists());
    assert!(matrix_path(&job, "mock/trigram-embedder", "drugC").exists());
    assert!(!job.output_root.join("mock/trigram-embedder/drugB").exists());
}

#[tokio::test]
async fn test_labels_keep_input_order_and_duplicates() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    let predicted = ["Cleft palate", "Rash", "Cleft palate", ""];
    let observed = ["Rash", "Neural tube defect", "Rash"];
    drug_folder(&job, "topiramate", &predicted, &observed);

    let report = run_mapping(&job, &MockEmbedder::new()).await.unwrap();
    let back = read_similarity_csv(&report.processed[0].output).unwrap();

    assert_eq!(back.row_labels, predicted.map(String::from).to_vec());
    assert_eq!(back.col_labels, observed.map(String::from).to_vec());
    assert_eq!(back.matrix.shape(), (4, 3));
    assert!(back.matrix.values().iter().all(|v| (-1.0..=1.0).contains(v)));
    // duplicate rows score identically, the empty term scores 0 everywhere
    assert_eq!(back.matrix.row(0), back.matrix.row(2));
    assert!(back.matrix.row(3).unwrap().iter().all(|&v| v == 0.0));
    assert!(back.matrix.row(4).is_none());
    assert!((back.matrix.get(1, 0).unwrap() - 1.0).abs() < 1e-6);
    assert!((back.matrix.get(1, 2).unwrap() - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_missing_outcome_column_halts_run() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    let dir = job.input_dir.join("lithium");
    std::fs::create_dir_all(&dir).unwrap();
    write_terms_csv(&dir.join("lithium_omim.csv"), "Term", &["Ebstein anomaly"]).unwrap();
    write_terms_csv(&dir.join("lithium_faers_cong.csv"), "Outcome", &["Ebstein anomaly"]).unwrap();

    let err = run_mapping(&job, &MockEmbedder::new()).await.unwrap_err();
    match err {
        OntomapError::MissingColumn { column, path, .. } => {
            assert_eq!(column, "Outcome");
            assert!(path.ends_with("lithium_omim.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_embedding_failure_halts_run() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    drug_folder(&job, "isotretinoin", &["Microtia"], &["Microtia"]);

    let embedder = MockEmbedder::new().failing_on("Microtia");
    let err = run_mapping(&job, &embedder).await.unwrap_err();
    assert!(matches!(err, OntomapError::Embedding(_)));
}

#[tokio::test]
async fn test_write_failure_is_recorded_and_batch_continues() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    drug_folder(&job, "alpha", &["Fever"], &["Fever"]);
    drug_folder(&job, "beta", &["Fever"], &["Fever"]);
    // A plain file where alpha's output directory should go.
    let model_dir = job.output_root.join("mock/trigram-embedder");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join("alpha"), "not a directory").unwrap();

    let report = run_mapping(&job, &MockEmbedder::new()).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].drug, "alpha");
    assert!(!report.is_clean());
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].drug, "beta");
}

#[tokio::test]
async fn test_hidden_entries_and_stray_files_ignored() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    drug_folder(&job, ".hidden", &["Fever"], &["Fever"]);
    std::fs::write(job.input_dir.join(".DS_Store"), [0u8; 4]).unwrap();
    std::fs::write(job.input_dir.join("readme_omim.csv"), "Outcome\nFever\n").unwrap();

    let report = run_mapping(&job, &MockEmbedder::new()).await.unwrap();
    assert!(report.processed.is_empty());
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn test_save_embeddings_writes_both_lists() {
    let base = tempfile::tempdir().unwrap();
    let mut job = job(base.path());
    job.save_embeddings = true;
    drug_folder(
        &job,
        "warfarin",
        &["Nasal hypoplasia", "Stippled epiphyses"],
        &["Nasal hypoplasia"],
    );

    let embedder = MockEmbedder::new().with_dimension(16);
    run_mapping(&job, &embedder).await.unwrap();

    let drug_dir = job.output_root.join("mock/trigram-embedder/warfarin");
    let predicted = std::fs::read_to_string(drug_dir.join("warfarin_omim_embeddings.csv")).unwrap();
    let observed = std::fs::read_to_string(drug_dir.join("warfarin_faers_cong_embeddings.csv")).unwrap();
    assert_eq!(predicted.lines().count(), 2);
    assert_eq!(observed.lines().count(), 1);
    assert!(predicted.lines().all(|l| l.split(',').count() == 16));
}

#[tokio::test]
async fn test_missing_input_dir_is_error() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    let err = run_mapping(&job, &MockEmbedder::new()).await.unwrap_err();
    assert!(matches!(err, OntomapError::Io { .. }));
}

#[tokio::test]
async fn test_each_drug_embeds_two_lists() {
    let base = tempfile::tempdir().unwrap();
    let job = job(base.path());
    for drug in ["a", "b", "c"] {
        drug_folder(&job, drug, &["X"], &["Y"]);
    }

    let embedder = MockEmbedder::new();
    let report = run_mapping(&job, &embedder).await.unwrap();
    assert_eq!(report.processed.len(), 3);
    assert_eq!(embedder.calls(), 6);
    assert_eq!(report.model, "mock/trigram-embedder");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["processed"][2]["drug"], "c");
    assert_eq!(json["skipped"].as_array().map(Vec::len), Some(0));
}
