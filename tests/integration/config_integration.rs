//! Configuration loading across files and environment overrides.

use crate::integration::test_utils::{func_input, named, EnvState, ENV_LOCK};
use genstub::config::ConfigLoader;
use genstub::generators::builtin_registry;
use genstub::{GeneratorParamMap, Stub, StubError, Target, UnknownInputPolicy};
use std::fs;
use tempfile::TempDir;

fn lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
target = "x86-64-linux-avx2"

[binding]
unknown_inputs = "reject"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    assert_eq!(config.binding.unknown_inputs, UnknownInputPolicy::Reject);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.output, "stderr");
    assert!(config.target().unwrap().has_feature("avx2"));
}

#[test]
fn test_defaults_without_files() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert_eq!(config.binding.unknown_inputs, UnknownInputPolicy::Warn);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.target().unwrap(), Target::host());
}

#[test]
fn test_workspace_file_overrides_global() {
    let _guard = lock();
    let _env = EnvState::capture();
    let global_dir = TempDir::new().unwrap();
    let global_path = global_dir.path().join("config.toml");
    fs::write(
        &global_path,
        "[binding]\nunknown_inputs = \"ignore\"\n\n[logging]\nlevel = \"info\"\n",
    )
    .unwrap();

    let workspace = TempDir::new().unwrap();
    fs::create_dir_all(workspace.path().join("config")).unwrap();
    fs::write(
        workspace.path().join("config").join("config.toml"),
        "[binding]\nunknown_inputs = \"reject\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_with_global(workspace.path(), Some(&global_path)).unwrap();
    assert_eq!(config.binding.unknown_inputs, UnknownInputPolicy::Reject);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_environment_file_selected_by_env_name() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[logging]\nlevel = \"info\"\n").unwrap();
    fs::write(config_dir.join("ci.toml"), "[logging]\nlevel = \"error\"\n").unwrap();

    std::env::set_var("GENSTUB_ENV", "ci");
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert_eq!(config.logging.level, "error");
}

#[test]
fn test_environment_overrides_files() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();
    fs::create_dir_all(workspace.path().join("config")).unwrap();
    fs::write(
        workspace.path().join("config").join("config.toml"),
        "[binding]\nunknown_inputs = \"reject\"\n",
    )
    .unwrap();

    std::env::set_var("GENSTUB_UNKNOWN_INPUTS", "IGNORE");
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert_eq!(config.binding.unknown_inputs, UnknownInputPolicy::Ignore);
}

#[test]
fn test_invalid_target_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "target = \"z80-8-cpm\"\n").unwrap();

    assert!(ConfigLoader::load_from_file(&config_path).is_err());
}

#[test]
fn test_invalid_policy_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[binding]\nunknown_inputs = \"explode\"\n").unwrap();

    assert!(ConfigLoader::load_from_file(&config_path).is_err());
}

fn simplestub_inputs_with_extra() -> genstub::StubInputs {
    let typed = genstub::Buffer::new(genstub::ScalarType::UInt8, &[10, 10, 3]);
    named(vec![
        ("typed_buffer_input", typed.into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
        ("extra", genstub::RawValue::Int(1)),
    ])
}

#[test]
fn test_configured_policy_reaches_stub() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();
    let registry = builtin_registry().unwrap();

    std::env::set_var("GENSTUB_UNKNOWN_INPUTS", "reject");
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let stub = Stub::from_config(&registry, "simplestub", &config).unwrap();
    assert_eq!(stub.policy(), UnknownInputPolicy::Reject);

    let target = config.target().unwrap();
    let err = stub
        .generate(&target, simplestub_inputs_with_extra(), &GeneratorParamMap::new())
        .unwrap_err();
    assert!(matches!(
        err,
        StubError::ArgumentCountMismatch {
            expected: 3,
            got: 4
        }
    ));
}

#[test]
fn test_default_policy_ignores_extra_keys() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();
    let registry = builtin_registry().unwrap();

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let stub = Stub::from_config(&registry, "simplestub", &config).unwrap();
    assert!(stub
        .generate(
            &config.target().unwrap(),
            simplestub_inputs_with_extra(),
            &GeneratorParamMap::new()
        )
        .is_ok());
}

#[test]
fn test_target_from_environment() {
    let _guard = lock();
    let _env = EnvState::capture();
    let workspace = TempDir::new().unwrap();

    std::env::set_var("GENSTUB_TARGET", "arm-64-linux-sve");
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let target = config.target().unwrap();
    assert_eq!(target.arch, "arm");
    assert!(target.has_feature("sve"));

    // A single config file without a target still honors GENSTUB_TARGET.
    let config_path = workspace.path().join("only.toml");
    fs::write(&config_path, "[binding]\nunknown_inputs = \"warn\"\n").unwrap();
    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    assert_eq!(config.target().unwrap(), Target::from_env().unwrap());
    assert_eq!(config.target().unwrap().arch, "arm");
}
