use admissions_console::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic};

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: [&str; 5] = [
    "APP_ENV",
    "UPSTREAM_API_URL",
    "BIND_ADDR",
    "SIDEBAR_BREAKPOINT",
    "APP_TITLE",
];

/// Runs `test` with a clean configuration environment and restores the original values.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // UPSTREAM_API_URL is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without an upstream URL"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.upstream_url, "http://localhost:8000");
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.sidebar_breakpoint, 768);
}

#[test]
#[serial]
fn test_app_config_production_reads_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("UPSTREAM_API_URL", "https://api.example.edu/");
            env::set_var("SIDEBAR_BREAKPOINT", "1024");
            env::set_var("APP_TITLE", "Admissions");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    // Trailing slash is trimmed so endpoint paths can be appended directly.
    assert_eq!(config.upstream_url, "https://api.example.edu");
    assert_eq!(config.sidebar_breakpoint, 1024);
    assert_eq!(config.app_title, "Admissions");
}

#[test]
#[serial]
fn test_app_config_rejects_bad_breakpoint() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("SIDEBAR_BREAKPOINT", "wide");
            }
            AppConfig::load()
        })
    });

    assert!(result.is_err());
}
