use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::path::PathBuf;

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn testdata(name: &str) -> String {
    project_root()
        .join("testdata")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn x509ck() -> Command {
    let mut cmd = Command::cargo_bin("x509ck").unwrap();
    cmd.current_dir(project_root());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case::sha256("server.pem")]
#[case::sha1("server_sha1.pem")]
#[case::sha384("server_sha384.pem")]
#[case::sha512("server_sha512.pem")]
#[case::pss("server_pss.pem")]
fn test_verify_ok_with_ca(#[case] cert: &str) {
    x509ck()
        .args([
            "--ca",
            &testdata("ca.pem"),
            "--cert",
            &testdata(cert),
            "--key",
            &testdata("server.key"),
        ])
        .assert()
        .success()
        .stdout("x509 ok!\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_verify_bundle_warns_about_extra_blocks() {
    x509ck()
        .args([
            "-a",
            &testdata("ca.pem"),
            "-c",
            &testdata("server_bundle.pem"),
            "-k",
            &testdata("server.key"),
        ])
        .assert()
        .success()
        .stdout("x509 ok!\n")
        .stderr(predicate::str::contains("ignoring 1 PEM block(s) after the first"));
}

#[test]
fn test_verify_ok_without_ca() {
    x509ck()
        .args(["-c", &testdata("server.pem"), "-k", &testdata("server.key")])
        .assert()
        .success()
        .stdout("x509 ok!\n");
}

#[test]
fn test_not_rsa_certificate() {
    let cert = testdata("ec.pem");
    x509ck()
        .args(["-c", &cert, "-k", &testdata("server.key")])
        .assert()
        .code(3)
        .stdout(format!(
            "certificate '{cert}': not an RSA-derived certificate\n"
        ));
}

#[rstest]
#[case::other_key("other.key")]
#[case::flipped_modulus("server_flipped_modulus.key")]
fn test_modulus_mismatch(#[case] key: &str) {
    let cert = testdata("server.pem");
    let key = testdata(key);
    x509ck()
        .args(["-c", &cert, "-k", &key])
        .assert()
        .code(4)
        .stdout(format!(
            "certificate '{cert}' modulus doesn't match that of private key {key}\n"
        ));
}

#[test]
fn test_exponent_mismatch() {
    let cert = testdata("server.pem");
    let key = testdata("server_bad_exponent.key");
    x509ck()
        .args(["-c", &cert, "-k", &key])
        .assert()
        .code(5)
        .stdout(format!(
            "certificate '{cert}' exponent doesn't match that of private key {key}\n"
        ));
}

#[rstest]
#[case::unrelated_ca("other_ca.pem")]
#[case::ec_ca("ec.pem")]
fn test_not_signed_by_ca(#[case] ca: &str) {
    let ca = testdata(ca);
    let cert = testdata("server.pem");
    x509ck()
        .args(["-a", &ca, "-c", &cert, "-k", &testdata("server.key")])
        .assert()
        .code(6)
        .stdout(predicate::str::starts_with(format!(
            "certificate '{cert}' isn't signed by certificate authority '{ca}' ("
        )));
}

#[test]
fn test_key_mismatch_wins_over_signature() {
    x509ck()
        .args([
            "-a",
            &testdata("other_ca.pem"),
            "-c",
            &testdata("server.pem"),
            "-k",
            &testdata("other.key"),
        ])
        .assert()
        .code(4);
}

#[rstest]
#[case::empty("empty.pem")]
#[case::json("garbage.json")]
fn test_certificate_not_pem(#[case] cert: &str) {
    let cert = testdata(cert);
    x509ck()
        .args(["-c", &cert, "-k", &testdata("server.key")])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(format!("certificate '{cert}': not a valid PEM file\n"));
}

#[test]
fn test_ca_is_not_a_certificate() {
    let ca = testdata("ca.key");
    x509ck()
        .args([
            "-a",
            &ca,
            "-c",
            &testdata("server.pem"),
            "-k",
            &testdata("server.key"),
        ])
        .assert()
        .code(2)
        .stderr(format!("certificate authority '{ca}': not a certificate\n"));
}

#[test]
fn test_malformed_certificate() {
    let cert = testdata("malformed.pem");
    x509ck()
        .args(["-c", &cert, "-k", &testdata("server.key")])
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with(format!(
            "certificate '{cert}': not a valid certificate ("
        )));
}

#[rstest]
#[case::pkcs8("server_pkcs8.key")]
#[case::sec1("ec.key")]
#[case::certificate("server.pem")]
fn test_malformed_private_key(#[case] key: &str) {
    let key = testdata(key);
    x509ck()
        .args(["-c", &testdata("server.pem"), "-k", &key])
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with(format!(
            "private key '{key}': not a valid private key ("
        )));
}

#[test]
fn test_missing_file() {
    let cert = testdata("does_not_exist.pem");
    x509ck()
        .args(["-c", &cert, "-k", &testdata("server.key")])
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with(format!("certificate '{cert}': ")));
}

#[test]
fn test_ca_decoded_before_certificate() {
    let ca = testdata("garbage.json");
    x509ck()
        .args([
            "-a",
            &ca,
            "-c",
            &testdata("does_not_exist.pem"),
            "-k",
            &testdata("server.key"),
        ])
        .assert()
        .code(2)
        .stderr(format!(
            "certificate authority '{ca}': not a valid PEM file\n"
        ));
}

#[test]
fn test_json_output_ok() {
    x509ck()
        .args([
            "-c",
            &testdata("server.pem"),
            "-k",
            &testdata("server.key"),
            "-o",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status":"ok""#))
        .stdout(predicate::str::contains(r#""exit_code":0"#))
        .stdout(predicate::str::contains(r#""message":"x509 ok!""#));
}

#[test]
fn test_json_output_decode_error_on_stdout() {
    x509ck()
        .args([
            "-c",
            &testdata("garbage.json"),
            "-k",
            &testdata("server.key"),
            "--output",
            "json",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains(r#""status":"decode""#))
        .stdout(predicate::str::contains("not a valid PEM file"));
}

#[test]
fn test_json_output_exponent_mismatch() {
    x509ck()
        .args([
            "-c",
            &testdata("server.pem"),
            "-k",
            &testdata("server_bad_exponent.key"),
            "-o",
            "json",
        ])
        .assert()
        .code(5)
        .stdout(predicate::str::contains(r#""status":"exponent_mismatch""#));
}

#[test]
fn test_verbose_logs_to_stderr() {
    x509ck()
        .args(["-vv", "-c", &testdata("server.pem"), "-k", &testdata("server.key")])
        .assert()
        .success()
        .stdout("x509 ok!\n")
        .stderr(predicate::str::contains("private key"));
}

#[test]
fn test_help() {
    x509ck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cert"))
        .stdout(predicate::str::contains("--ca"));
}

#[test]
fn test_version() {
    x509ck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("x509ck "));
}

#[rstest]
#[case::missing_cert(&["-k", "server.key"], "Usage")]
#[case::missing_key(&["-c", "server.pem"], "Usage")]
#[case::bad_output(
    &["-c", "server.pem", "-k", "server.key", "-o", "yaml"],
    "invalid value 'yaml'"
)]
#[case::unknown_flag(&["-c", "server.pem", "-k", "server.key", "--chain"], "unexpected argument")]
fn test_usage_error(#[case] args: &[&str], #[case] expected: &str) {
    x509ck()
        .args(args)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(expected));
}
