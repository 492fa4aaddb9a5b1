use std::fs;

use assert_cost::commands::util::{listing_path, write_listings};
use assert_cost_core::model::{DisassemblyIndex, FunctionRecord, Variant};
use assert_cost_core::services::measure::Listing;
use tempfile::tempdir;

fn record(name: &str, lines: &[&str]) -> FunctionRecord {
    FunctionRecord {
        name: name.to_string(),
        symbol: format!("ring::RingBuffer::{name}"),
        demangled: format!("ring::RingBuffer::{name}"),
        start_address: 0x1000,
        end_address: 0x1000 + 4 * (lines.len() as u64 - 1),
        byte_size: 4 * lines.len() as u64,
        instruction_lines: lines.iter().map(|l| l.to_string()).collect(),
    }
}

fn listing(architecture: &str, variant: Variant, label: &str, index: DisassemblyIndex) -> Listing {
    Listing { architecture: architecture.into(), variant, label: label.into(), index }
}

#[test]
fn listing_path_nests_by_function() {
    let path = listing_path(std::path::Path::new("out/disasm"), "riscv", "enqueue", "without");
    assert_eq!(path, std::path::Path::new("out/disasm/enqueue/riscv-enqueue-without.asm"));
}

#[test]
fn writes_one_file_per_function_and_variant() {
    let dir = tempdir().expect("tempdir");
    let with: DisassemblyIndex = [
        record("push", &["1000: 55  pushl %ebp", "1004: 0f 0b  ud2"]),
        record("call_push", &["1010: e8 eb ff ff ff  calll 0x1000"]),
    ]
    .into_iter()
    .collect();
    let without: DisassemblyIndex = [record("push", &["1000: c3  retl"])].into_iter().collect();
    let listings = vec![
        listing("x86", Variant::A, "with", with),
        listing("x86", Variant::B, "without", without),
    ];

    let written = write_listings(dir.path(), &listings).expect("write listings");
    assert_eq!(written, 3);

    let push_with = dir.path().join("push").join("x86-push-with.asm");
    assert_eq!(
        fs::read_to_string(&push_with).expect("push with"),
        "1000: 55  pushl %ebp\n1004: 0f 0b  ud2\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("push").join("x86-push-without.asm"))
            .expect("push without"),
        "1000: c3  retl\n"
    );
    assert!(dir.path().join("call_push").join("x86-call_push-with.asm").is_file());
    assert!(!dir.path().join("call_push").join("x86-call_push-without.asm").exists());
}

#[test]
fn rerun_overwrites_existing_listings() {
    let dir = tempdir().expect("tempdir");
    let first: DisassemblyIndex =
        [record("push", &["1000: 55  pushl %ebp", "1004: c3  retl"])].into_iter().collect();
    write_listings(dir.path(), &[listing("arm", Variant::A, "with", first)]).expect("first run");

    let second: DisassemblyIndex = [record("push", &["1000: c3  retl"])].into_iter().collect();
    let written =
        write_listings(dir.path(), &[listing("arm", Variant::A, "with", second)]).expect("rerun");

    assert_eq!(written, 1);
    let body = fs::read_to_string(dir.path().join("push").join("arm-push-with.asm"))
        .expect("rewritten listing");
    assert_eq!(body, "1000: c3  retl\n");
}
