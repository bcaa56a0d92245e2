//! Layered configuration: global file, workspace files, environment

use super::test_utils::with_xdg_env;
use postsmith::config::{ConfigLoader, ProviderType};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_global_config(test_dir: &TempDir, contents: &str) -> PathBuf {
    let dir = test_dir.path().join("xdg-config").join("postsmith");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_global_config_is_loaded() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_global_config(
        &test_dir,
        r#"
[generator]
model = "qwen2"

[quality]
min_words = 400
"#,
    );

    with_xdg_env(&test_dir, || {
        let expected = test_dir
            .path()
            .join("xdg-config")
            .join("postsmith")
            .join("config.toml");
        assert_eq!(ConfigLoader::global_config_path(), Some(expected));

        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.generator.model, "qwen2");
        assert_eq!(config.quality.min_words, 400);
    });
}

#[test]
fn test_workspace_overrides_global() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_global_config(
        &test_dir,
        r#"
[generator]
model = "qwen2"

[run]
workers = 2
"#,
    );
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[generator]\nmodel = \"mistral\"\n").unwrap();

    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(config.generator.model, "mistral");
        assert_eq!(config.run.workers, 2);
    });
}

#[test]
fn test_environment_file_selected_by_postsmith_env() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[run]\nlimit = 10\n").unwrap();
    std::fs::write(config_dir.join("production.toml"), "[run]\nlimit = 50\n").unwrap();

    with_xdg_env(&test_dir, || {
        let development = ConfigLoader::load(workspace.path()).unwrap();
        assert_eq!(development.run.limit, 10);

        with_env_unlocked("POSTSMITH_ENV", "production", || {
            let production = ConfigLoader::load(workspace.path()).unwrap();
            assert_eq!(production.run.limit, 50);
        });
    });
}

#[test]
fn test_environment_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[generator]\nmodel = \"mistral\"\n\n[run]\nlimit = 10\n",
    )
    .unwrap();

    with_xdg_env(&test_dir, || {
        with_env_unlocked("POSTSMITH__RUN__LIMIT", "3", || {
            with_env_unlocked("POSTSMITH__GENERATOR__PROVIDER", "openai", || {
                let config = ConfigLoader::load(workspace.path()).unwrap();
                assert_eq!(config.run.limit, 3);
                assert_eq!(config.generator.provider, ProviderType::OpenAI);
                assert_eq!(config.generator.model, "mistral");
            });
        });
    });
}

#[test]
fn test_relative_paths_resolve_against_workspace() {
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[workspace]\nsource_dir = \"outlines\"\n").unwrap();

    let test_dir = TempDir::new().unwrap();
    let mut config = with_xdg_env(&test_dir, || ConfigLoader::load(workspace.path()).unwrap());
    config.resolve_paths(workspace.path());

    assert!(config.workspace.source_dir.is_absolute());
    assert!(config.workspace.source_dir.ends_with("outlines"));
    assert!(config.workspace.cache_dir.ends_with(".postsmith/cache"));
    assert!(config.workspace.store_path.ends_with(".postsmith/posts.db"));
}

#[test]
fn test_invalid_values_fail_validation() {
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[generator]\nmax_attempts = 0\n\n[run]\nworkers = 0\n",
    )
    .unwrap();

    let test_dir = TempDir::new().unwrap();
    let config = with_xdg_env(&test_dir, || ConfigLoader::load(workspace.path()).unwrap());
    let errors = config.validate().unwrap_err();
    assert!(errors.len() >= 2);
    assert!(config.ensure_valid().unwrap_err().is_configuration_fault());
}

/// Set one variable inside an outer `with_xdg_env` scope, which already holds
/// the lock.
fn with_env_unlocked<F: FnOnce()>(name: &str, value: &str, f: F) {
    let previous = std::env::var(name).ok();
    std::env::set_var(name, value);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    match previous {
        Some(orig) => std::env::set_var(name, orig),
        None => std::env::remove_var(name),
    }
    if let Err(panic) = result {
        std::panic::resume_unwind(panic);
    }
}
