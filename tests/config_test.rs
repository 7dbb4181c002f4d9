use std::io::Write;

use grouprs::config::{DEFAULT_MAX_GROUPS, DEFAULT_PARALLEL_THRESHOLD};
use grouprs::groupby::MAX_GROUPS;
use grouprs::{DataFrame, Error, GroupKey, GroupedView, GroupingConfig, KeyVector};

#[test]
fn test_default_config() {
    let config = GroupingConfig::default();
    assert!(config.drop);
    assert!(!config.lazy);
    assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    assert_eq!(config.max_threads, None);
    assert!(!config.reject_empty);
    assert_eq!(config.max_groups, DEFAULT_MAX_GROUPS);
}

#[test]
fn test_config_builder() {
    let config = GroupingConfig::new()
        .with_drop(false)
        .with_lazy(true)
        .with_parallel_threshold(10)
        .with_max_threads(2);

    assert!(!config.drop);
    assert!(config.lazy);
    assert_eq!(config.threads(), 2);
    assert!(config.should_parallelize(10, 2));
    assert!(!config.should_parallelize(9, 2));
    assert!(!config.should_parallelize(10, 1));
}

#[test]
fn test_config_from_toml_yaml_json() {
    let toml = "drop = false\nparallel_threshold = 100\n";
    let config = GroupingConfig::from_toml_str(toml).unwrap();
    assert!(!config.drop);
    assert_eq!(config.parallel_threshold, 100);
    // 指定のない項目はデフォルト値
    assert!(!config.lazy);

    let yaml = "lazy: true\nmax_threads: 4\n";
    let config = GroupingConfig::from_yaml_str(yaml).unwrap();
    assert!(config.lazy);
    assert_eq!(config.max_threads, Some(4));

    let json = r#"{"reject_empty": true}"#;
    let config = GroupingConfig::from_json_str(json).unwrap();
    assert!(config.reject_empty);
    assert!(config.drop);
}

#[test]
fn test_config_validation() {
    let result = GroupingConfig::from_toml_str("max_threads = 0\n");
    assert!(matches!(result, Err(Error::Config(_))));

    let result = GroupingConfig::from_toml_str("max_groups = 0\n");
    assert!(matches!(result, Err(Error::Config(_))));

    let too_many = GroupingConfig::new().with_max_groups(MAX_GROUPS + 1);
    assert!(matches!(too_many.validate(), Err(Error::Config(_))));

    let result = GroupingConfig::from_toml_str("drop = \"yes\"\n");
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "lazy = true").unwrap();
    writeln!(file, "drop = false").unwrap();
    file.flush().unwrap();

    let config = GroupingConfig::from_file(file.path()).unwrap();
    assert!(config.lazy);
    assert!(!config.drop);

    let other = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    assert!(matches!(
        GroupingConfig::from_file(other.path()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_config_from_env() {
    std::env::set_var("GROUPRS_LAZY", "true");
    std::env::set_var("GROUPRS_PARALLEL_THRESHOLD", "123");
    let config = GroupingConfig::from_env().unwrap();
    assert!(config.lazy);
    assert_eq!(config.parallel_threshold, 123);

    std::env::set_var("GROUPRS_PARALLEL_THRESHOLD", "many");
    assert!(matches!(GroupingConfig::from_env(), Err(Error::Config(_))));

    std::env::remove_var("GROUPRS_LAZY");
    std::env::remove_var("GROUPRS_PARALLEL_THRESHOLD");
}

#[test]
fn test_config_max_groups_limits_cross_product() {
    // 水準数 4 x 4 = 16 グループ
    let levels = vec!["a", "b", "c", "d"];
    let df = DataFrame::new()
        .with_column("x", KeyVector::categorical(vec!["a"], levels.clone()).unwrap())
        .unwrap()
        .with_column("y", KeyVector::categorical(vec!["b"], levels).unwrap())
        .unwrap();
    let keys = vec![GroupKey::column("x"), GroupKey::column("y")];

    let config = GroupingConfig::new().with_drop(false).with_max_groups(15);
    let result = GroupedView::build_with_config(&df, keys.clone(), config);
    assert!(matches!(result, Err(Error::TooManyGroups { levels: 4, .. })));

    let config = GroupingConfig::new().with_drop(false).with_max_groups(16);
    let mut view = GroupedView::build_with_config(&df, keys, config).unwrap();
    assert_eq!(view.group_count().unwrap(), 16);
}
