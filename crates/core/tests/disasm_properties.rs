use assert_cost_core::disasm::{
    scan, DisasmFormat, DisassemblyParser, FunctionFilter, IdentityDemangler, ParseOptions,
    SizeFormula,
};
use assert_cost_core::report::{compare_indexes, summarize};
use proptest::prelude::*;

/// A generated function: label plus instruction offsets (possibly none).
fn function_strategy() -> impl Strategy<Value = (String, Vec<u16>)> {
    ("[a-z][a-z_]{0,8}", prop::collection::vec(any::<u16>(), 0..6))
}

fn linear_listing(funcs: &[(String, Vec<u16>)]) -> String {
    let mut text = String::new();
    for (label, offsets) in funcs {
        text.push_str(label);
        text.push_str(":\n");
        for off in offsets {
            text.push_str(&format!("\t{:08x}\tnop\n", 0x1000u32 + u32::from(*off)));
        }
    }
    text
}

fn table_listing(funcs: &[(String, Vec<u16>)]) -> String {
    let mut text = String::from("smoke:\tfile format elf32-i386\n\nDisassembly of section .text:\n\n");
    for (i, (label, offsets)) in funcs.iter().enumerate() {
        text.push_str(&format!("{:08x} <{label}>:\n", i * 0x100));
        for off in offsets {
            text.push_str(&format!("  {:x}: 90                   \tnop\n", u32::from(*off)));
        }
        text.push('\n');
    }
    text
}

proptest! {
    #[test]
    fn record_count_matches_nonempty_boundaries(funcs in prop::collection::vec(function_strategy(), 0..12)) {
        let raw = scan(&linear_listing(&funcs), DisasmFormat::LinearScan);
        let expected = funcs.iter().filter(|(_, offs)| !offs.is_empty()).count();
        prop_assert_eq!(raw.len(), expected);
    }

    #[test]
    fn table_record_count_matches_nonempty_boundaries(funcs in prop::collection::vec(function_strategy(), 0..12)) {
        let raw = scan(&table_listing(&funcs), DisasmFormat::Table);
        let expected = funcs.iter().filter(|(_, offs)| !offs.is_empty()).count();
        prop_assert_eq!(raw.len(), expected);
    }

    #[test]
    fn sizes_never_fall_below_one_instruction(
        funcs in prop::collection::vec(function_strategy(), 0..12),
        width in 1u64..16,
    ) {
        let formula = SizeFormula::trailing(width).unwrap();
        for raw in scan(&linear_listing(&funcs), DisasmFormat::LinearScan) {
            prop_assert!(raw.byte_size(formula) >= width);
        }
        for raw in scan(&table_listing(&funcs), DisasmFormat::Table) {
            prop_assert!(raw.byte_size(SizeFormula::InclusiveBytes) >= 1);
        }
    }

    #[test]
    fn parsing_is_idempotent(funcs in prop::collection::vec(function_strategy(), 0..12)) {
        let filter = FunctionFilter::new(funcs.iter().map(|(l, _)| l.clone()), Some("call"));
        let parser = DisassemblyParser::new(
            ParseOptions::new(DisasmFormat::Table, SizeFormula::InclusiveBytes),
            &filter,
            &IdentityDemangler,
        );
        let text = table_listing(&funcs);
        prop_assert_eq!(parser.parse(&text), parser.parse(&text));
    }

    #[test]
    fn filter_law_holds(
        funcs in prop::collection::vec(function_strategy(), 0..12),
        allow in prop::collection::vec("[a-z][a-z_]{0,8}", 0..4),
    ) {
        let filter = FunctionFilter::new(allow.clone(), Some("call"));
        let parser = DisassemblyParser::new(
            ParseOptions::new(DisasmFormat::LinearScan, SizeFormula::trailing(4).unwrap()),
            &filter,
            &IdentityDemangler,
        );
        let index = parser.parse(&linear_listing(&funcs));
        for record in index.iter() {
            prop_assert!(allow.contains(&record.name) || record.demangled.contains("call"));
            prop_assert_ne!(record.name.as_str(), "main");
        }
    }

    #[test]
    fn aggregation_law_holds(
        funcs_a in prop::collection::vec(function_strategy(), 0..10),
        funcs_b in prop::collection::vec(function_strategy(), 0..10),
        allow in prop::collection::vec("[a-z][a-z_]{0,8}", 0..6),
    ) {
        let filter = FunctionFilter::new(allow.clone(), Some("call"));
        let parser = DisassemblyParser::new(
            ParseOptions::new(DisasmFormat::LinearScan, SizeFormula::trailing(2).unwrap()),
            &filter,
            &IdentityDemangler,
        );
        let a = parser.parse(&linear_listing(&funcs_a));
        let b = parser.parse(&linear_listing(&funcs_b));
        let rows = compare_indexes("arm", &a, &b);
        let summary = summarize("arm", &rows, &filter);

        let row_sum: i64 = rows
            .iter()
            .filter(|r| filter.is_allowed(&r.function_name))
            .map(|r| r.delta)
            .sum();
        let total_a: u64 = a.iter().filter(|f| filter.is_allowed(&f.name)).map(|f| f.byte_size).sum();
        let total_b: u64 = b.iter().filter(|f| filter.is_allowed(&f.name)).map(|f| f.byte_size).sum();
        prop_assert_eq!(summary.total_delta, row_sum);
        prop_assert_eq!(summary.total_delta, total_a as i64 - total_b as i64);
        if total_b == 0 {
            prop_assert_eq!(summary.percent_change, 0.0);
        } else {
            prop_assert!(summary.percent_change.is_finite());
        }
    }
}

#[test]
fn enqueue_scenario() {
    let filter = FunctionFilter::new(["enqueue"], None);
    let parser = DisassemblyParser::new(
        ParseOptions::new(DisasmFormat::LinearScan, SizeFormula::trailing(4).unwrap()),
        &filter,
        &IdentityDemangler,
    );
    let index = parser.parse("enqueue:\n 100 push r1\n 104 push r2\n");
    assert_eq!(index.len(), 1);
    assert_eq!(index.get("enqueue").unwrap().byte_size, 8);
}
