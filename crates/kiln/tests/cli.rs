use std::io::Write;

use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.arg("--ping");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pong"));

    Ok(())
}

#[test]
fn test_no_args_starts_and_stops() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Startup of 'greeter' ended in Active"))
        .stdout(predicate::str::contains("Shutdown of 'greeter' ended in Stopped"))
        .stdout(predicate::str::contains("pong").not());

    Ok(())
}

#[test]
fn test_run_invokes_commands() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.args(["run", "--invoke", "greet alex 2", "--emit", "player.join:player=sam", "--invoke", "history"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CONSOLE> greet alex 2"))
        .stdout(predicate::str::contains("Hello, alex! Hello, alex!"))
        .stdout(predicate::str::contains("event player.join: Continue"))
        // events are published after every --invoke line
        .stdout(predicate::str::contains("Greeted: alex\n"));

    Ok(())
}

#[test]
fn test_run_executes_scheduled_commands() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.args(["run", "--invoke", "greet alex", "--invoke", "history clear"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CONSOLE> history clear\nscheduled"))
        .stdout(predicate::str::contains("history (scheduled)> Forgot 1 greeting(s)"));

    Ok(())
}

#[test]
fn test_run_as_player_checks_permissions() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.args(["run", "--as", "guest", "--invoke", "history"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("You do not have permission to do that (greeter.history)"));

    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.args(["run", "--as", "mod", "--grant", "greeter.*", "--invoke", "hist"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Nobody has been greeted yet"));

    Ok(())
}

#[test]
fn test_run_reads_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "[greeter]\ngreeting = \"Howdy\"\nmax_times = 5")?;

    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.arg("run")
        .arg("--config")
        .arg(file.path())
        .args(["--invoke", "greet alex 4"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Howdy, alex! Howdy, alex! Howdy, alex! Howdy, alex!"));

    Ok(())
}

#[test]
fn test_invalid_config_fails_startup() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    write!(file, r#"{{ "greeter": {{ "max_times": "plenty" }} }}"#)?;

    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.arg("run").arg("--config").arg(file.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ended in Failed"))
        .stderr(predicate::str::contains("Error: Startup failed"));

    Ok(())
}

#[test]
fn test_scan_lists_descriptors() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("kiln")?;
    cmd.arg("scan");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "command 'greet' from greeter::commands route \"<name> [times=1]\"",
        ))
        .stdout(predicate::str::contains("command 'history' from greeter::commands aliases [hist]"))
        .stdout(predicate::str::contains("listener 'welcome' from greeter::events on 'player.join' (high)"))
        .stdout(predicate::str::contains("config schema 'greeter' from greeter::config backed by"))
        .stdout(predicate::str::contains("config schema 'greeter_messages' from greeter::config"));

    Ok(())
}
