// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

const LI_GP_1: u32 = 0x0010_0193; // addi gp, zero, 1
const LI_GP_21: u32 = 0x0150_0193; // addi gp, zero, 21
const ECALL: u32 = 0x0000_0073;
const LOOP_FOREVER: u32 = 0x0000_006F; // jal zero, 0

/// Build a minimal ELF32 executable with one loadable RV32 text segment at
/// the reference base address 0x8000_0000.
fn rv32_elf(text: &[u32]) -> Vec<u8> {
    const BASE: u32 = 0x8000_0000;
    let body: Vec<u8> = text.iter().flat_map(|word| word.to_le_bytes()).collect();

    let mut image = Vec::new();
    image.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
    image.extend_from_slice(&[0; 8]);
    image.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    image.extend_from_slice(&243u16.to_le_bytes()); // EM_RISCV
    image.extend_from_slice(&1u32.to_le_bytes());
    image.extend_from_slice(&BASE.to_le_bytes()); // entry point
    image.extend_from_slice(&52u32.to_le_bytes()); // program header offset
    image.extend_from_slice(&0u32.to_le_bytes()); // no section headers
    image.extend_from_slice(&0u32.to_le_bytes());
    image.extend_from_slice(&52u16.to_le_bytes());
    image.extend_from_slice(&32u16.to_le_bytes());
    image.extend_from_slice(&1u16.to_le_bytes()); // one program header
    image.extend_from_slice(&[0; 6]);

    image.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
    image.extend_from_slice(&84u32.to_le_bytes()); // file offset
    image.extend_from_slice(&BASE.to_le_bytes()); // vaddr
    image.extend_from_slice(&BASE.to_le_bytes()); // paddr
    image.extend_from_slice(&(body.len() as u32).to_le_bytes());
    image.extend_from_slice(&(body.len() as u32).to_le_bytes());
    image.extend_from_slice(&5u32.to_le_bytes()); // R + X
    image.extend_from_slice(&4u32.to_le_bytes());

    image.extend_from_slice(&body);
    image
}

fn temp_suite_dir(tag: &str) -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("hartlab-suite-{}-{}", tag, nonce));
    std::fs::create_dir_all(&dir).expect("Failed to create suite directory");
    dir
}

fn read_results(output_dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(output_dir.join("results.json"))
        .expect("Failed to read results.json");
    serde_json::from_str(&content).expect("Failed to parse results.json")
}

#[test]
fn test_suite_mixed_results() {
    let dir = temp_suite_dir("mixed");
    std::fs::write(dir.join("rv32ui-p-add"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();
    std::fs::write(dir.join("rv32ui-p-beq"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();
    std::fs::write(dir.join("rv32ui-p-sub"), rv32_elf(&[LI_GP_21, ECALL])).unwrap();
    // Decoys the discovery pass must skip.
    std::fs::write(dir.join("rv32ui-p-add.dump"), b"80000000 <_start>:").unwrap();
    std::fs::write(dir.join("README.txt"), b"not a test").unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args([
            "suite",
            "--dir",
            dir.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));

    let results = read_results(&output_dir);
    assert_eq!(results["result_schema_version"], "1.0");
    assert_eq!(results["status"], "fail");
    assert_eq!(results["total"], 3);
    assert_eq!(results["passed"], 2);
    assert_eq!(results["failed"], 1);
    assert_eq!(results["errored"], 0);

    let tests = results["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 3);

    // Discovery sorts by file name.
    assert_eq!(tests[0]["name"], "rv32ui-p-add");
    assert_eq!(tests[1]["name"], "rv32ui-p-beq");
    assert_eq!(tests[2]["name"], "rv32ui-p-sub");

    assert_eq!(tests[0]["status"], "pass");
    assert_eq!(tests[0]["stop_reason"], "pass");
    assert_eq!(tests[0]["steps"], 2);
    assert!(tests[0]["failure_code"].is_null());

    assert_eq!(tests[2]["status"], "fail");
    assert_eq!(tests[2]["stop_reason"], "fail");
    assert_eq!(tests[2]["failure_code"], 21);

    let mut hasher = Sha256::new();
    hasher.update(rv32_elf(&[LI_GP_1, ECALL]));
    let expected = format!("{:x}", hasher.finalize());
    assert_eq!(tests[0]["sha256"], expected.as_str());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_suite_all_pass_exit_0() {
    let dir = temp_suite_dir("pass");
    std::fs::write(dir.join("rv32ui-p-and"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();
    std::fs::write(dir.join("rv32ui-p-or"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args(["suite", "--dir", dir.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_suite_runtime_error_takes_precedence() {
    let dir = temp_suite_dir("error");
    std::fs::write(dir.join("rv32ui-p-add"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();
    std::fs::write(dir.join("rv32ui-p-bad"), rv32_elf(&[0xFFFF_FFFF])).unwrap();
    std::fs::write(dir.join("rv32ui-p-sub"), rv32_elf(&[LI_GP_21, ECALL])).unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args([
            "suite",
            "--dir",
            dir.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(3));

    let results = read_results(&output_dir);
    assert_eq!(results["status"], "error");
    assert_eq!(results["errored"], 1);
    assert_eq!(results["failed"], 1);

    let tests = results["tests"].as_array().unwrap();
    assert_eq!(tests[1]["name"], "rv32ui-p-bad");
    assert_eq!(tests[1]["status"], "error");
    assert_eq!(tests[1]["stop_reason"], "illegal_instruction");
    assert!(tests[1]["message"]
        .as_str()
        .unwrap()
        .contains("Illegal instruction"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_suite_no_matches_exit_2() {
    let dir = temp_suite_dir("empty");
    std::fs::write(dir.join("README.txt"), b"nothing to run here").unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args([
            "suite",
            "--dir",
            dir.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    assert!(!output_dir.join("results.json").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_suite_missing_dir_exit_2() {
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args(["suite", "--dir", "no_such_suite_dir"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_suite_custom_prefix() {
    let dir = temp_suite_dir("prefix");
    std::fs::write(dir.join("smoke-add"), rv32_elf(&[LI_GP_1, ECALL])).unwrap();
    std::fs::write(dir.join("rv32ui-p-sub"), rv32_elf(&[LI_GP_21, ECALL])).unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args([
            "suite",
            "--dir",
            dir.to_str().unwrap(),
            "--prefix",
            "smoke-",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    // The failing rv32ui-p-sub binary is outside the prefix, so the suite
    // passes.
    assert_eq!(output.status.code(), Some(0));

    let results = read_results(&output_dir);
    assert_eq!(results["total"], 1);
    assert_eq!(results["tests"][0]["name"], "smoke-add");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_suite_step_budget_recorded() {
    let dir = temp_suite_dir("budget");
    std::fs::write(dir.join("rv32ui-p-spin"), rv32_elf(&[LOOP_FOREVER])).unwrap();

    let output_dir = dir.join("artifacts");
    let output = Command::new(env!("CARGO_BIN_EXE_hartlab"))
        .args([
            "suite",
            "--dir",
            dir.to_str().unwrap(),
            "--max-steps",
            "50",
            "--output-dir",
            output_dir.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));

    let results = read_results(&output_dir);
    assert_eq!(results["tests"][0]["stop_reason"], "max_steps");
    assert_eq!(results["tests"][0]["steps"], 50);

    let _ = std::fs::remove_dir_all(&dir);
}
