use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("m3u8-unpack");
    cmd.env_remove("RUST_LOG")
        .env_remove("M3U8_UNPACK_USER_AGENT")
        .env_remove("M3U8_UNPACK_LOCATION")
        .env_remove("M3U8_UNPACK_MAX_DECODE_DEPTH");
    cmd
}

/// Test that a missing argument is reported and fails
#[test]
fn missing_argument_exits_with_error() {
    cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Please provide packed JavaScript as an argument",
        ));
}

#[test]
fn empty_argument_counts_as_missing() {
    cmd().arg("").assert().code(1);
}

#[test]
fn prints_evaluated_string() {
    cmd()
        .arg("'https://x.com/a.m3u8'")
        .assert()
        .success()
        .stdout("https://x.com/a.m3u8\n");
}

#[test]
fn accepts_input_starting_with_hyphen() {
    cmd().arg("-1").assert().success().stdout("-1\n");
    cmd()
        .args(["--json", "-'https://x.com/a.m3u8'"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""value": "NaN""#));
}

#[test]
fn prints_direct_matches() {
    cmd()
        .arg("https://host/path/file.m3u8")
        .assert()
        .success()
        .stdout("Found URLs directly in the packed JavaScript:\nhttps://host/path/file.m3u8\n")
        .stderr(predicate::str::contains("Direct eval failed"));
}

#[test]
fn prints_function_body_and_urls() {
    cmd()
        .arg(r#"function(){var u="http://cdn.example/live/index.m3u8";}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Function body extracted:"))
        .stdout(predicate::str::contains(
            "Found URLs in function body:\nhttp://cdn.example/live/index.m3u8\n",
        ));
}

#[test]
fn decodes_base64() {
    cmd()
        .arg("atob('aHR0cHM6Ly9hLmNvbS9iLm0zdTg=')")
        .assert()
        .success()
        .stdout("Found URLs in decoded base64 content:\nhttps://a.com/b.m3u8\n");
}

#[test]
fn falls_back_to_raw_input() {
    cmd()
        .arg("var a = b;")
        .assert()
        .success()
        .stdout("Raw packed JavaScript:\nvar a = b;\n");
}

#[test]
fn user_agent_from_environment() {
    cmd()
        .env("M3U8_UNPACK_USER_AGENT", "EnvAgent/1.0")
        .arg("navigator.userAgent")
        .assert()
        .success()
        .stdout("EnvAgent/1.0\n");
}

#[test]
fn location_from_flag_and_environment() {
    cmd()
        .args(["--location", "https://player.example/embed"])
        .arg("window.location.href + '#t'")
        .assert()
        .success()
        .stdout("https://player.example/embed#t\n");

    cmd()
        .env("M3U8_UNPACK_LOCATION", "https://env.example/page")
        .arg("window.location.href")
        .assert()
        .success()
        .stdout("https://env.example/page\n");
}

#[test]
fn settings_from_dotenv_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(
        temp_dir.path().join(".env"),
        "M3U8_UNPACK_LOCATION=https://dotenv.example/page\nM3U8_UNPACK_USER_AGENT=DotenvAgent/1\n",
    )
    .expect("Failed to write .env");

    cmd()
        .current_dir(temp_dir.path())
        .arg("window.location.href + ' ' + navigator.userAgent")
        .assert()
        .success()
        .stdout("https://dotenv.example/page DotenvAgent/1\n");
}

#[test]
fn json_output() {
    cmd()
        .args(["--json", "atob('aHR0cHM6Ly9hLmNvbS9iLm0zdTg=')"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""stage": "base64""#))
        .stdout(predicate::str::contains(r#""kind": "url""#))
        .stdout(predicate::str::contains(r#""value": "https://a.com/b.m3u8""#));
}
