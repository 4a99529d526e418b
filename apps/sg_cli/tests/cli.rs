// apps/sg_cli/tests/cli.rs
//!
//! 命令行端到端测试：退出码与输出文件

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn sg_cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sg_cli"))
}

/// 3×3 顶点的平面网格 (OBJ) 与线性场 f = 1 + 2x + 3y (CSV)
fn write_inputs(dir: &Path) {
    let mut obj = String::new();
    let mut csv = String::from("f\n");
    for j in 0..3 {
        for i in 0..3 {
            let (x, y) = (i as f64 * 0.5, j as f64 * 0.5);
            obj.push_str(&format!("v {x} {y} 0\n"));
            csv.push_str(&format!("{}\n", 1.0 + 2.0 * x + 3.0 * y));
        }
    }
    for j in 0..2 {
        for i in 0..2 {
            let a = j * 3 + i + 1;
            obj.push_str(&format!("f {} {} {}\n", a, a + 1, a + 4));
            obj.push_str(&format!("f {} {} {}\n", a, a + 4, a + 3));
        }
    }
    std::fs::write(dir.join("plane.obj"), obj).unwrap();
    std::fs::write(dir.join("field.csv"), csv).unwrap();
}

#[test]
fn test_gradient_command_writes_output() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let output = dir.path().join("grad.csv");

    let status = sg_cli()
        .args(["--log-level", "warn", "gradient"])
        .arg(dir.path().join("plane.obj"))
        .arg(dir.path().join("field.csv"))
        .arg(&output)
        .args(["-n", "2", "-v", "4", "--threads", "1"])
        .status()
        .unwrap();
    assert!(status.success());

    let text = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<Vec<f32>> = text
        .lines()
        .skip(1)
        .map(|l| l.split(',').map(|c| c.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 9);
    for row in rows {
        assert_eq!(row.len(), 2);
        assert!((row[1] - 13.0).abs() < 1e-3);
        assert!((row[0] - 13.0_f32.sqrt()).abs() < 1e-3);
    }
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let status = sg_cli()
        .arg("gradient")
        .arg(dir.path().join("missing.obj"))
        .arg(dir.path().join("missing.csv"))
        .arg(dir.path().join("out.csv"))
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn test_invalid_neighborhood_size_fails() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let status = sg_cli()
        .arg("gradient")
        .arg(dir.path().join("plane.obj"))
        .arg(dir.path().join("field.csv"))
        .arg(dir.path().join("out.csv"))
        .args(["-n", "0"])
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn test_validate_command() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    std::fs::write(&good, r#"{ "neighborhood_size": 2, "norm": "rms" }"#).unwrap();
    std::fs::write(&bad, r#"{ "neighborhood_size": 11 }"#).unwrap();

    assert!(sg_cli().arg("validate").arg(&good).status().unwrap().success());
    assert!(!sg_cli().arg("validate").arg(&bad).status().unwrap().success());
}
