//! End-to-end runs against scripted collaborators.

use predicates::prelude::*;
use std::fs;

use crate::common::{TestPanel, arg};

fn current_user() -> String {
    let output = std::process::Command::new("id").arg("-un").output().unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn configure(panel: &TestPanel, php_body: &str) {
    let php = panel.script("php", php_body);
    let composer = panel.script("composer", "echo \"composer $*\"");
    panel.write_config(&format!(
        "php = \"{}\"\ncomposer = \"{}\"\n",
        arg(&php),
        arg(&composer)
    ));
}

#[test]
fn test_failing_step_halts_with_diagnostics() {
    let panel = TestPanel::new();
    let log = panel.temp.path().join("php.log");
    configure(
        &panel,
        &format!(
            "echo \"$*\" >> '{}'\nif [ \"$2\" = down ]; then echo 'database is locked' >&2; exit 3; fi",
            arg(&log)
        ),
    );

    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--user", "nginx", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("artisan down"))
        .stdout(predicate::str::contains("Finished running upgrade.").not())
        .stderr(predicate::str::contains("Enable maintenance mode"))
        .stderr(predicate::str::contains("exit code 3"))
        .stderr(predicate::str::contains("database is locked"))
        .stderr(predicate::str::contains("No changes were made"));

    let calls = fs::read_to_string(&log).unwrap();
    assert_eq!(calls.lines().collect::<Vec<_>>(), vec!["artisan down"]);
}

#[test]
fn test_failure_in_maintenance_mentions_maintenance() {
    let panel = TestPanel::new();
    configure(&panel, "if [ \"$2\" = migrate ]; then echo 'SQLSTATE[HY000]' >&2; exit 1; fi");

    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--user", "nginx", "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("composer install --no-ansi --optimize-autoloader --no-dev"))
        .stderr(predicate::str::contains("Run database migrations"))
        .stderr(predicate::str::contains("maintenance mode"));
}

#[test]
fn test_successful_run_executes_every_step() {
    let panel = TestPanel::new();
    let log = panel.temp.path().join("php.log");
    configure(&panel, &format!("echo \"$*\" >> '{}'", arg(&log)));
    let user = current_user();

    panel
        .command()
        .args(["upgrade", "-n", "--skip-download", "--user", &user, "--path"])
        .arg(arg(&panel.root()))
        .assert()
        .success()
        .stdout(predicate::str::contains("chmod -R 755 storage bootstrap/cache"))
        .stdout(predicate::str::contains(format!("chown -R {user}:{user} *")))
        .stdout(predicate::str::contains("Finished running upgrade."));

    let calls = fs::read_to_string(&log).unwrap();
    assert_eq!(
        calls.lines().collect::<Vec<_>>(),
        vec![
            "artisan down",
            "artisan view:clear",
            "artisan config:clear",
            "artisan migrate --seed --force",
            "artisan queue:restart",
            "artisan up",
        ]
    );
}

#[test]
fn test_download_failure_stops_before_maintenance() {
    let panel = TestPanel::new();
    let log = panel.temp.path().join("php.log");
    configure(&panel, &format!("echo \"$*\" >> '{}'", arg(&log)));
    let archive = panel.temp.path().join("missing.tar.gz");

    panel
        .command()
        .args(["upgrade", "-n", "--user", "nginx", "--url"])
        .arg(format!("file://{}", arg(&archive)))
        .arg("--path")
        .arg(arg(&panel.root()))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("does not verify the integrity"))
        .stdout(predicate::str::contains("Download Source"))
        .stderr(predicate::str::contains("Download and unpack release archive"));

    assert!(!log.exists());
}
