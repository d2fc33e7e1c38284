#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = MappingConfig::default();
        assert_eq!(cfg.datasets.predicted, "omim");
        assert_eq!(cfg.datasets.observed, "faers_cong");
        assert_eq!(cfg.datasets.term_column, "Outcome");
        assert_eq!(cfg.embedding.model, EmbeddingModel::SapBertPubMedBert);
        assert_eq!(cfg.output.precision, 6);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = MappingConfig::from_toml_str(
            r#"
            [paths]
            base_dir = "/data/interim"

            [datasets]
            observed = "onsides"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.datasets.predicted, "omim");
        assert_eq!(cfg.datasets.observed, "onsides");
        assert_eq!(cfg.embedding.batch_size, 32);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_derived_paths() {
        let cfg = MappingConfig::from_toml_str(
            r#"
            [paths]
            base_dir = "/data/interim"
            [embedding]
            model = "all-MiniLM-L6-v2"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.input_dir(),
            PathBuf::from("/data/interim/ontology_mapping/input_data")
        );
        assert_eq!(
            cfg.model_output_dir(),
            PathBuf::from("/data/interim/ontology_mapping/output_data/sentence-transformers/all-MiniLM-L6-v2")
        );
    }

    #[test]
    fn test_unsupported_model_is_parse_error() {
        let err = MappingConfig::from_toml_str(
            r#"
            [embedding]
            model = "all-mpnet-base-v2"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_identical_datasets_rejected() {
        let mut cfg = MappingConfig::default();
        cfg.paths.base_dir = PathBuf::from("/tmp");
        cfg.datasets.observed = "omim".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("omim"));
    }

    #[test]
    fn test_dataset_with_separator_rejected() {
        let mut cfg = MappingConfig::default();
        cfg.paths.base_dir = PathBuf::from("/tmp");
        cfg.datasets.predicted = "../omim".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_base_dir_from_env_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontomap.toml");
        std::fs::write(&path, "[datasets]\nobserved = \"bumps\"\n").unwrap();

        let cfg = MappingConfig::load_with(Some(&path), Some("/srv/interim".to_string())).unwrap();
        assert_eq!(cfg.paths.base_dir, PathBuf::from("/srv/interim"));
        assert_eq!(cfg.datasets.observed, "bumps");
    }

    #[test]
    fn test_file_base_dir_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontomap.toml");
        std::fs::write(&path, "[paths]\nbase_dir = \"/from/file\"\n").unwrap();

        let cfg = MappingConfig::load_with(Some(&path), Some("/from/env".to_string())).unwrap();
        assert_eq!(cfg.paths.base_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontomap.toml");
        std::fs::write(&path, "").unwrap();

        let err = MappingConfig::load_with(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseDir));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = MappingConfig::load_with(Some(&path), Some("/x".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_embedding_config_carries_model() {
        let mut cfg = MappingConfig::default();
        cfg.embedding.model = EmbeddingModel::SPubMedBertMsMarco;
        cfg.embedding.batch_size = 8;
        let embed = cfg.embedding_config();
        assert_eq!(embed.model, EmbeddingModel::SPubMedBertMsMarco);
        assert_eq!(embed.batch_size, 8);
        assert!(embed.pooling.is_none());
    }
}
