use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cost_core::config::{ArchitectureConfig, HarnessConfig};
use assert_cost_core::disasm::{IdentityDemangler, SizeFormula};
use assert_cost_core::model::Variant;
use assert_cost_core::services::measure::{Measurement, MeasureError};
use assert_cost_core::tools::{CommandRunner, Disassembler, ToolError, ToolOutput};

const WITH_LISTING: &str = "\
smoke:\tfile format elf32-i386

Disassembly of section .text:

00001000 <ring::RingBuffer<T>::push>:
    1000: 55                   \tpushl\t%ebp
    1001: 89 e5                \tmovl\t%esp, %ebp
    1003: 0f 0b                \tud2
    1005: c3                   \tretl

00001010 <smoke::call_push>:
    1010: e8 eb ff ff ff       \tcalll\t0x1000
    1015: c3                   \tretl

00001020 <main>:
    1020: c3                   \tretl
";

const WITHOUT_LISTING: &str = "\
00001000 <ring::RingBuffer<T>::push>:
    1000: 55                   \tpushl\t%ebp
    1001: c3                   \tretl

00001010 <smoke::call_push>:
    1010: e8 eb ff ff ff       \tcalll\t0x1000
    1015: c3                   \tretl
";

/// Pretends to be cargo and llvm-objdump. "Built" binaries contain their project dir
/// name unless `binary_bytes` is set; each build also leaves a five-byte rlib.
#[derive(Default)]
struct FakeToolchain {
    fail_target: Option<String>,
    binary_bytes: Option<Vec<u8>>,
    calls: RefCell<Vec<String>>,
}

fn program_name(cmd: &Command) -> String {
    Path::new(cmd.get_program()).file_name().unwrap().to_string_lossy().to_string()
}

impl CommandRunner for FakeToolchain {
    fn run(&self, cmd: &mut Command) -> io::Result<ToolOutput> {
        let program = program_name(cmd);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        self.calls.borrow_mut().push(format!("{program} {}", args.join(" ")));

        if program.starts_with("cargo") {
            if args[0] == "clean" {
                return Ok(ToolOutput::ok(""));
            }
            let target = args.iter().position(|a| a == "--target").map(|i| args[i + 1].clone());
            if target.is_some() && target == self.fail_target {
                return Ok(ToolOutput::failed(101, "error: linker `cc` not found"));
            }
            let dir = cmd.get_current_dir().unwrap().to_path_buf();
            let mut out = dir.join("target");
            if let Some(t) = &target {
                out = out.join(t);
            }
            let out = out.join("release");
            std::fs::create_dir_all(&out)?;
            let project = dir.file_name().unwrap().to_string_lossy().to_string();
            let bytes = self.binary_bytes.clone().unwrap_or_else(|| project.into_bytes());
            std::fs::write(out.join("smoke"), bytes)?;
            std::fs::write(out.join("libsmoke.rlib"), b"rlib!")?;
            return Ok(ToolOutput::ok(""));
        }

        let binary = PathBuf::from(args.last().unwrap());
        let with = binary.components().any(|c| c.as_os_str() == "with_assertions");
        Ok(ToolOutput::ok(if with { WITH_LISTING } else { WITHOUT_LISTING }))
    }

    fn run_with_input(&self, cmd: &mut Command, _input: &[u8]) -> io::Result<ToolOutput> {
        self.run(cmd)
    }
}

fn config() -> HarnessConfig {
    HarnessConfig {
        functions: vec!["push".into(), "len".into()],
        binary_name: "smoke".into(),
        architectures: vec![
            ArchitectureConfig {
                name: "x86".into(),
                target: Some("i686-unknown-linux-gnu".into()),
                disassembler: Disassembler::LlvmObjdump,
                size_formula: SizeFormula::InclusiveBytes,
            },
            ArchitectureConfig {
                name: "arm".into(),
                target: Some("armv7-unknown-linux-gnueabihf".into()),
                disassembler: Disassembler::LlvmObjdump,
                size_formula: SizeFormula::InclusiveBytes,
            },
        ],
        ..Default::default()
    }
}

#[test]
fn measures_every_architecture_and_variant() {
    let temp = tempfile::tempdir().unwrap();
    let config = config();
    let runner = FakeToolchain::default();
    let measurement = Measurement {
        root: temp.path(),
        config: &config,
        runner: &runner,
        demangler: &IdentityDemangler,
    };

    let result = measurement.run().expect("measurement");
    let report = &result.report;

    // push + call_push per architecture; main is never reported.
    assert_eq!(report.rows.len(), 4);
    assert_eq!(report.rows[0].function_name, "call_push");
    assert_eq!(report.rows[0].architecture, "arm");
    let push_x86 = report
        .rows
        .iter()
        .find(|r| r.function_name == "push" && r.architecture == "x86")
        .unwrap();
    assert_eq!((push_x86.size_variant_a, push_x86.size_variant_b, push_x86.delta), (6, 2, 4));

    let summary = report.summary("x86").unwrap();
    assert_eq!(summary.total_delta, 4);
    assert_eq!(summary.percent_change, 200.0);

    assert_eq!(report.binary_sizes.len(), 2);
    assert_eq!(report.binary_sizes[0].size_a, "with_assertions".len() as u64);
    assert_eq!(result.binaries.len(), 4);
    assert!(result.binaries.iter().all(|b| b.sha256.is_some()));
    assert!(result.binaries.iter().all(|b| b.rlib_size_bytes == Some(5)));
    assert!(result.binaries.iter().all(|b| b.detected_architecture.is_none()));
    assert!(result.binaries.iter().all(|b| !b.architecture_mismatch));
    assert_eq!(result.variant_labels, ["with".to_string(), "without".to_string()]);

    let listing = result
        .listings
        .iter()
        .find(|l| l.architecture == "arm" && l.variant == Variant::A)
        .unwrap();
    assert_eq!(listing.index.get("push").unwrap().instruction_lines.len(), 4);

    let calls = runner.calls.borrow();
    assert_eq!(calls.iter().filter(|c| c.starts_with("cargo clean")).count(), 2);
    assert_eq!(calls.iter().filter(|c| c.starts_with("cargo build")).count(), 4);
}

#[test]
fn build_failure_aborts_the_run_with_diagnostics() {
    let temp = tempfile::tempdir().unwrap();
    let config = config();
    let runner = FakeToolchain {
        fail_target: Some("armv7-unknown-linux-gnueabihf".into()),
        ..Default::default()
    };
    let measurement = Measurement {
        root: temp.path(),
        config: &config,
        runner: &runner,
        demangler: &IdentityDemangler,
    };

    let err = measurement.run().unwrap_err();
    match &err {
        MeasureError::Tool { variant, architecture, source: ToolError::Failed { stderr, .. } } => {
            assert_eq!(variant, "with");
            assert_eq!(architecture, "arm");
            assert!(stderr.contains("linker"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("arm"));
}

#[test]
fn skips_clean_when_disabled() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config();
    config.clean = false;
    config.architectures.truncate(1);
    let runner = FakeToolchain::default();
    Measurement { root: temp.path(), config: &config, runner: &runner, demangler: &IdentityDemangler }
        .run()
        .unwrap();
    assert!(runner.calls.borrow().iter().all(|c| !c.starts_with("cargo clean")));
}

#[test]
fn compares_captured_listings_without_building() {
    use assert_cost_core::disasm::{DisasmFormat, FunctionFilter, ParseOptions};
    use assert_cost_core::services::measure::compare_listings;

    let filter = FunctionFilter::new(["push"], Some("call"));
    let report = compare_listings(
        "x86",
        WITH_LISTING,
        WITHOUT_LISTING,
        ParseOptions::new(DisasmFormat::Table, SizeFormula::InclusiveBytes),
        &filter,
        &IdentityDemangler,
    );

    let names: Vec<_> = report.rows.iter().map(|r| r.function_name.as_str()).collect();
    assert_eq!(names, ["call_push", "push"]);
    let summary = report.summary("x86").unwrap();
    assert_eq!((summary.total_size_a, summary.total_size_b), (6, 2));
    assert!(report.binary_sizes.is_empty());
}

#[test]
fn function_missing_from_one_listing_counts_as_zero() {
    use assert_cost_core::disasm::{DisasmFormat, FunctionFilter, ParseOptions};
    use assert_cost_core::services::measure::compare_listings;

    let filter = FunctionFilter::new(["push", "check_invariants"], None);
    let with = "check_invariants:\n 100 cmp\n 102 b\npush:\n 200 ldr\n";
    let without = "push:\n 200 ldr\n";
    let report = compare_listings(
        "arm",
        with,
        without,
        ParseOptions::new(DisasmFormat::LinearScan, SizeFormula::trailing(2).unwrap()),
        &filter,
        &IdentityDemangler,
    );

    let row = report.rows.iter().find(|r| r.function_name == "check_invariants").unwrap();
    assert_eq!((row.size_variant_a, row.size_variant_b, row.delta), (4, 0, 4));
    let summary = report.summary("arm").unwrap();
    assert_eq!(summary.total_delta, 4);
    assert_eq!(summary.percent_change, 200.0);
}

#[cfg(feature = "object-inspect")]
fn elf_object(architecture: object::Architecture) -> Vec<u8> {
    use object::write::Object;
    use object::{BinaryFormat, Endianness, SectionKind};

    let mut obj = Object::new(BinaryFormat::Elf, architecture, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(text, &[0x13, 0x00, 0x00, 0x00], 4);
    obj.write().expect("write elf fixture")
}

#[cfg(feature = "object-inspect")]
#[test]
fn flags_binaries_built_for_another_architecture() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config();
    config.architectures.truncate(2);
    let runner = FakeToolchain {
        binary_bytes: Some(elf_object(object::Architecture::Riscv32)),
        ..Default::default()
    };
    let result =
        Measurement { root: temp.path(), config: &config, runner: &runner, demangler: &IdentityDemangler }
            .run()
            .unwrap();

    for binary in &result.binaries {
        assert_eq!(binary.detected_architecture.as_deref(), Some("riscv"));
        assert!(binary.architecture_mismatch, "{} is not riscv", binary.architecture);
    }
    let json = serde_json::to_value(&result.binaries[0]).unwrap();
    assert_eq!(json["architecture_mismatch"], true);
}

#[cfg(feature = "object-inspect")]
#[test]
fn matching_machine_is_not_flagged() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config();
    config.architectures.truncate(1);
    let runner = FakeToolchain {
        binary_bytes: Some(elf_object(object::Architecture::I386)),
        ..Default::default()
    };
    let result =
        Measurement { root: temp.path(), config: &config, runner: &runner, demangler: &IdentityDemangler }
            .run()
            .unwrap();

    assert_eq!(result.binaries.len(), 2);
    assert!(result.binaries.iter().all(|b| b.detected_architecture.as_deref() == Some("x86")));
    assert!(result.binaries.iter().all(|b| !b.architecture_mismatch));
    let json = serde_json::to_value(&result.binaries[0]).unwrap();
    assert!(json.get("architecture_mismatch").is_none());
}
