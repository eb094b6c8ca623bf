#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

const SOAPNS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const MNS: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
const TNS: &str = "http://schemas.microsoft.com/exchange/services/2006/types";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "soapwire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn soapwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_soapwire"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("soapwire should run")
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="{SOAPNS}" xmlns:m="{MNS}" xmlns:t="{TNS}"><s:Body>{body}</s:Body></s:Envelope>"#
    )
}

#[test]
fn version_prints_package_version() {
    let output = soapwire(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("soapwire "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn codes_json_lists_expected_conditions() {
    let output = soapwire(&["--format", "json", "codes", "--expected"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("response-codes.schema.json"));
    assert!(stdout.contains("ErrorServerBusy"));
    assert!(stdout.contains("ErrorBatchProcessingStopped"));
    assert!(!stdout.contains("ErrorItemNotFound"));
    assert!(!stdout.contains("\"fatal\""));
}

#[test]
fn codes_single_fatal_code() {
    let output = soapwire(&["--format", "json", "codes", "ErrorItemNotFound"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"count\":1"));
    assert!(stdout.contains("\"disposition\":\"fatal\""));
}

#[test]
fn codes_unknown_code_fails() {
    let output = soapwire(&["codes", "ErrorNotARealCode"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn payload_get_item_wraps_item_ids() {
    let output = soapwire(&[
        "--format",
        "json",
        "payload",
        "getitem",
        "--id",
        "AAA:ck1",
        "--server-version",
        "Exchange2010_SP2",
        "--impersonate",
        "user@example.com",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("request-envelopes.schema.json"));
    assert!(stdout.contains("ItemId"));
    assert!(stdout.contains("AAA"));
    assert!(stdout.contains("Exchange2010_SP2"));
    assert!(stdout.contains("user@example.com"));
}

#[test]
fn payload_below_minimum_server_version_is_usage_error() {
    let output = soapwire(&[
        "payload",
        "GetServerTimeZones",
        "--server-version",
        "Exchange2007",
    ]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GetServerTimeZones"));
}

#[test]
fn payload_without_ids_is_usage_error() {
    let output = soapwire(&["payload", "DeleteItem"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn unknown_operation_is_usage_error() {
    let output = soapwire(&["payload", "Subscribe"]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown operation"));
}

#[test]
fn parse_replays_saved_get_item_response() {
    let dir = unique_temp_dir("parse");
    let path = dir.join("get-item.xml");
    let body = envelope(
        r#"<m:GetItemResponse><m:ResponseMessages>
            <m:GetItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode>
              <m:Items><t:Message><t:ItemId Id="AAA" ChangeKey="ck1"/></t:Message></m:Items>
            </m:GetItemResponseMessage>
            <m:GetItemResponseMessage ResponseClass="Error"><m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
              <m:MessageText>gone</m:MessageText>
            </m:GetItemResponseMessage>
        </m:ResponseMessages></m:GetItemResponse>"#,
    );
    std::fs::write(&path, body).expect("response file should be writable");

    let output = soapwire(&[
        "--format",
        "json",
        "parse",
        "GetItem",
        path.to_str().expect("utf-8 path"),
    ]);
    let _ = std::fs::remove_dir_all(&dir);

    // An error message aborts the whole exchange with its response code.
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ErrorItemNotFound"));
}

#[test]
fn parse_walks_find_item_pages() {
    let dir = unique_temp_dir("pages");
    let page = |attrs: &str, ids: &[&str]| {
        let items: String = ids
            .iter()
            .map(|id| format!(r#"<t:Message><t:ItemId Id="{id}"/></t:Message>"#))
            .collect();
        envelope(&format!(
            r#"<m:FindItemResponse><m:ResponseMessages>
                <m:FindItemResponseMessage ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode>
                  <m:RootFolder {attrs}><t:Items>{items}</t:Items></m:RootFolder>
                </m:FindItemResponseMessage>
            </m:ResponseMessages></m:FindItemResponse>"#
        ))
    };
    let first = dir.join("page-1.xml");
    let second = dir.join("page-2.xml");
    std::fs::write(
        &first,
        page(r#"IndexedPagingOffset="2" TotalItemsInView="3" IncludesLastItemInRange="false""#, &["A", "B"]),
    )
    .expect("page should be writable");
    std::fs::write(
        &second,
        page(r#"IndexedPagingOffset="3" TotalItemsInView="3" IncludesLastItemInRange="true""#, &["C"]),
    )
    .expect("page should be writable");

    let output = soapwire(&[
        "--format",
        "json",
        "parse",
        "FindItem",
        first.to_str().expect("utf-8 path"),
        second.to_str().expect("utf-8 path"),
    ]);
    let _ = std::fs::remove_dir_all(&dir);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("outcomes.schema.json"));
    assert!(stdout.contains("\"count\":3"));
    let a = stdout.find("Id=\\\"A\\\"").expect("first item present");
    let c = stdout.find("Id=\\\"C\\\"").expect("last item present");
    assert!(a < c);
}
