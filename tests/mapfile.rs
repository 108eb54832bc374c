//! End-to-end parse of a synthetic map file through the public API.

use mapscope::prelude::*;
use std::path::Path;

const RULE: &str = "*******************************************************************************";

fn fixture() -> String {
    let banner = |title: &str| format!("{RULE}\n*** {title}\n***\n");
    format!(
        "{runtime}\
  some attribute = value

{modules}\
    main.cpp.obj: [2]
    startup_stm32.o: [3]
    SensorFusionMobile.cpp.obj: [6]

{placement}\
\"P1\":  place in [from 0x08000000 to 0x0800ffff] {{ ro, code }};
\"P2\":  place in [from 0x20000000 to 0x20007fff] {{
          rw, block CSTACK, block HEAP, section .noinit }};

\"P1\":        0x29ac
 .text                ro code  0x08000000    0x288c  SensorFusionMobile.cpp.obj [6]
 .intvec              ro code  0x0800288c    0x0100  startup_stm32.o [3]
 .rodata              ro const  0x0800298c     0x20  <strings-blob> [2]
                             - 0x080029ac   0x29ac

\"P2\":        0x1480
 .data                rw inited  0x20000000   0x0400  main.cpp.obj [2]
 .bss                 rw zero  0x20000400   0x1000  sensor_state.cpp.o
 CSTACK               rw       0x20001400   0x0080  linker-reserved
                             - 0x20001480   0x1480
",
        runtime = banner("RUNTIME MODEL ATTRIBUTES"),
        modules = banner("MODULE SUMMARY"),
        placement = banner("PLACEMENT SUMMARY"),
    )
}

#[test]
fn full_pipeline_produces_expected_tables() {
    let map = MapFile::parse(&fixture(), "FSP312").unwrap();

    assert_eq!(map.device(), "FSP312");
    assert!(map.sections.get("RUNTIME MODEL ATTRIBUTES").is_some());

    // geometry
    assert_eq!(map.placement.blocks.len(), 2);
    let p1 = &map.placement.blocks["P1"];
    assert_eq!(p1.size, 0xffff);
    assert_eq!(p1.expected_modifier(), KindModifier::Ro);
    let p2 = &map.placement.blocks["P2"];
    assert_eq!(p2.size, 0x7fff);
    assert_eq!(p2.tags, vec!["rw", "CSTACK", "HEAP", ".noinit"]);

    // P1: three real rows plus the unused remainder
    let p1_rows: Vec<&PlacedObject> = map.placement.objects_in("P1").collect();
    assert_eq!(p1_rows.len(), 4);
    assert_eq!(p1_rows[0].module, "SensorFusionMobile.cpp.obj");
    assert_eq!(p1_rows[1].module, "startup_stm32.o");
    // synthetic marker name falls back to its section
    assert_eq!(p1_rows[2].object, ".rodata");
    assert_eq!(p1_rows[2].module, "main.cpp.obj");

    let p1_unused = p1_rows[3];
    assert_eq!(p1_unused.kind, ObjectKind::Unused);
    let p1_real: u64 = p1_rows[..3].iter().map(|o| o.size).sum();
    assert_eq!(p1_real + p1_unused.size, p1.size);

    // P2: the modifier-only CSTACK row has no kind word and is dropped
    let p2_rows: Vec<&PlacedObject> = map.placement.objects_in("P2").collect();
    assert_eq!(p2_rows.len(), 3);
    assert_eq!(p2_rows[1].module, "sensor_state.cpp.o");
    let p2_real: u64 = p2_rows[..2].iter().map(|o| o.size).sum();
    assert_eq!(p2_real + p2_rows[2].size, p2.size);
}

#[test]
fn reparsing_yields_identical_tables() {
    let text = fixture();
    let first = MapFile::parse(&text, "FSP312").unwrap();
    let second = MapFile::parse(&text, "FSP312").unwrap();

    assert_eq!(first.placement.objects, second.placement.objects);
    let first_blocks: Vec<_> = first
        .placement
        .blocks
        .values()
        .map(|b| (b.name.clone(), b.start, b.end, b.size))
        .collect();
    let second_blocks: Vec<_> = second
        .placement
        .blocks
        .values()
        .map(|b| (b.name.clone(), b.start, b.end, b.size))
        .collect();
    assert_eq!(first_blocks, second_blocks);
}

#[test]
fn report_totals_cover_declared_sizes() {
    let map = MapFile::parse(&fixture(), "FSP312").unwrap();
    let report = map.report();

    assert_eq!(report.ro.total, 0xffff);
    assert_eq!(report.rw.total, 0x7fff);
    assert_eq!(report.total, 0xffff + 0x7fff);
    assert_eq!(report.blocks["P1"], 0xffff);
    assert_eq!(report.blocks["P2"], 0x7fff);

    let lines = report.teamcity_lines();
    assert!(lines
        .iter()
        .all(|l| l.starts_with("##teamcity[buildStatisticValue key='FSP312.")));
    assert_eq!(
        lines[0],
        format!(
            "##teamcity[buildStatisticValue key='FSP312.total' value='{}']",
            0xffffu64 + 0x7fff
        )
    );
}

#[test]
fn text_without_placement_summary_fails() {
    let text = format!("{RULE}\n*** MODULE SUMMARY\n***\n    main.cpp.obj: [2]\n");
    let err = MapFile::parse(&text, "dev").unwrap_err();
    assert!(matches!(err, Error::MissingSection(name)
        if name == MapFile::PLACEMENT_SECTION));
}

#[test]
fn grammar_detection_is_exposed() {
    let map = MapFile::parse(&fixture(), "FSP312").unwrap();
    assert_eq!(map.placement.version, GrammarVersion::V2);
}

#[test]
fn devname_defaults_from_file_name() {
    assert_eq!(
        mapscope::mapfile::devname_from_path(Path::new("FSP312.release.map")),
        Some("FSP312".to_string())
    );
}
