use std::{io::Write, process::Command};

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

const PLATFORM: &str = r#"
rtc { addr 0x2000; };
uart {
    interface "sifive,uart0";
    clock 50_000_000;
    label "console";
    irq 3;
    mem 0x10013000 0x10013fff;
};
core { 0 { 0 { isa rv64imafdc; }; }; };
"#;

fn config_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn path(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

fn cfgstr(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_cfgstr"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    (
        output.status.success(),
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
    )
}

#[test]
fn test_devices_text() {
    let file = config_file(PLATFORM);
    let (ok, stdout, _) = cfgstr(&["devices", path(&file)]);

    assert!(ok);
    assert_eq!(
        stdout,
        "uart (sifive,uart0)\n  irq  .            0x3\n  mem  .            0x10013000-0x10013fff\n"
    );
}

#[test]
fn test_devices_json() {
    let file = config_file(PLATFORM);
    let (ok, stdout, _) = cfgstr(&["devices", "--json", path(&file)]);
    assert!(ok);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json[0]["name"], "uart");
    assert_eq!(json[0]["id"], -1);
    assert_eq!(json[0]["driver"], "sifive,uart0");
    assert_eq!(json[0]["resources"][0]["kind"], "irq");
    assert_eq!(json[0]["resources"][1]["start"], 0x1001_3000u64);
    assert_eq!(json[0]["resources"][1]["end"], 0x1001_3fffu64);
}

#[test]
fn test_devices_keep_range_form() {
    let file = config_file(r#"rom { interface "r"; mem 0x1000 0x1000; irq 4; };"#);
    let (ok, stdout, _) = cfgstr(&["devices", path(&file)]);
    assert!(ok);
    assert_eq!(
        stdout,
        "rom (r)\n  mem  .            0x1000-0x1000\n  irq  .            0x4\n"
    );

    let (ok, stdout, _) = cfgstr(&["devices", "--json", path(&file)]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json[0]["resources"][0]["range"], true);
    assert_eq!(json[0]["resources"][1]["range"], false);
}

#[test]
fn test_get_values() {
    let file = config_file(PLATFORM);

    let (ok, stdout, _) = cfgstr(&["get", path(&file), "clock", "--device", "uart"]);
    assert!(ok);
    assert_eq!(stdout, "50000000 (0x2faf080)\n");

    let (ok, stdout, _) = cfgstr(&["get", "--string", path(&file), "core.0.0.isa"]);
    assert!(ok);
    assert_eq!(stdout, "rv64imafdc\n");

    let (ok, stdout, _) = cfgstr(&["get", "-d", "uart", "-s", path(&file), "label"]);
    assert!(ok);
    assert_eq!(stdout, "console\n");
}

#[test]
fn test_get_failures() {
    let file = config_file(PLATFORM);

    let (ok, _, stderr) = cfgstr(&["get", "--device", "uart", path(&file), "rtc.addr"]);
    assert!(!ok);
    assert!(stderr.contains("key `rtc.addr` not found in device `uart`"));

    let (ok, _, stderr) = cfgstr(&["get", "--device", "gpio", path(&file), "clock"]);
    assert!(!ok);
    assert!(stderr.contains("no device named `gpio`"));

    let (ok, _, stderr) = cfgstr(&["get", "--device", "uart", path(&file), "label"]);
    assert!(!ok);
    assert!(stderr.contains("value of `label` is not a number"));
}

#[test]
fn test_layout() {
    let file = config_file(PLATFORM);
    let image = tempfile::tempdir().unwrap();
    let image_path = image.path().join("devices.img");

    let (ok, stdout, _) = cfgstr(&[
        "layout",
        "--output",
        image_path.to_str().unwrap(),
        path(&file),
    ]);
    assert!(ok);
    // "uart\0" + "sifive,uart0\0" + ".\0" + ".\0"
    assert_eq!(
        stdout,
        "devices        1 @ 0x1c\nresources      2 @ 0x48\nnames         22 @ 0x78\nsize      0x1000\n"
    );
    assert_eq!(std::fs::metadata(&image_path).unwrap().len(), 0x1000);
}

#[test]
fn test_layout_options() {
    let file = config_file(PLATFORM);

    let (ok, stdout, _) = cfgstr(&["--page-size", "256", "layout", "--json", path(&file)]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["size"], 256);
    assert_eq!(json["devices"], 1);

    let (ok, _, stderr) = cfgstr(&["layout", "--page-size", "1000", path(&file)]);
    assert!(!ok);
    assert!(stderr.contains("invalid page size 0x3e8"));
}

#[test]
fn test_max_depth() {
    let file = config_file(r#"soc { bus { uart { interface "u"; }; }; };"#);
    let (ok, stdout, _) = cfgstr(&["devices", "--max-depth", "2", path(&file)]);
    assert!(ok);
    assert_eq!(stdout, "");

    let (ok, stdout, _) = cfgstr(&["devices", path(&file)]);
    assert!(ok);
    assert_eq!(stdout, "soc.bus.uart (u)\n");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent");
    let (ok, _, stderr) = cfgstr(&["devices", absent.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("cannot access"));
}
