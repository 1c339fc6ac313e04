use std::{
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

use geocache_core::WELCOME_BANNER;

fn play(save_dir: &Path, extra_args: &[&str], script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_geocache"))
        .arg("--save-dir")
        .arg(save_dir)
        .args(extra_args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch geocache");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("failed to write the script");
    child.wait_with_output().expect("geocache did not finish")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn collects_and_deposits_through_the_prompt() {
    let directory = tempfile::tempdir().expect("tempdir");
    let output = play(
        directory.path(),
        &[],
        "look 3:4\ncollect 3:4 3:4#3\ninventory\ndeposit 3:4\ninventory\nquit\n",
    );
    let text = stdout(&output);

    assert!(output.status.success());
    assert!(text.starts_with(WELCOME_BANNER));
    assert!(text.contains("cache 3:4"));
    assert!(text.contains("collected 3:4#3 from 3:4"));
    assert!(text.contains("you carry 1 coins (newest last): 3:4#3"));
    assert!(text.contains("deposited 3:4#3 into 3:4"));
    assert!(text.contains("you carry no coins"));
    assert!(directory.path().join("gameState.json").is_file());
}

#[test]
fn bad_input_keeps_the_prompt_running() {
    let directory = tempfile::tempdir().expect("tempdir");
    let output = play(directory.path(), &[], "dance\ndeposit 3:4\nn\nmap\nq\n");
    let text = stdout(&output);

    assert!(output.status.success());
    assert!(text.contains("unknown command `dance`"));
    assert!(text.contains("you have no coins to deposit"));
    assert!(text.contains("you at"));
}

#[test]
fn failed_save_is_reported_and_play_continues() {
    let blocker = tempfile::NamedTempFile::new().expect("temp file");
    let save_dir = blocker.path().join("saves");
    let output = play(&save_dir, &["--no-autosave"], "save\ninventory\nquit\n");
    let text = stdout(&output);

    assert!(output.status.success(), "a failed save ended the game");
    assert!(text.contains("could not save the game"));
    assert!(!text.contains("game saved"));
    assert!(text.contains("you carry no coins"));
}

#[test]
fn saved_game_resumes_in_a_new_process() {
    let directory = tempfile::tempdir().expect("tempdir");
    let first = play(directory.path(), &[], "collect 3:4 3:4#0\nquit\n");
    assert!(first.status.success());

    let second = play(directory.path(), &[], "inventory\nquit\n");
    let text = stdout(&second);
    assert!(text.contains("resumed at"));
    assert!(text.contains("you carry 1 coins (newest last): 3:4#0"));
}
