use std::path::Path;

use mapscope::prelude::*;

use crate::{
    app::GlobalOptions,
    commands::common::load_map,
    output::{print_output, Align, TabWriter},
};

pub fn run(
    mapfile: &Path,
    tc: bool,
    devname: Option<&str>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let map = load_map(mapfile, devname)?;
    let report = map.report();

    if tc {
        for line in report.teamcity_lines() {
            println!("{line}");
        }
        return Ok(());
    }

    print_output(&report, opts, display_report)
}

fn display_report(report: &SizeReport) {
    println!("Size usage: {}", report.device);
    println!();

    println!("Blocks:");
    let mut blocks = TabWriter::new(vec![("BLOCK", Align::Left), ("SIZE", Align::Right)]);
    for (label, size) in &report.blocks {
        blocks.row(vec![label.clone(), size.to_string()]);
    }
    blocks.print();
    println!();

    for modifier in [KindModifier::Ro, KindModifier::Rw] {
        let partition = report.partition(modifier);
        println!("{} modules ({} bytes):", modifier, partition.total);
        let mut table = TabWriter::new(vec![("MODULE", Align::Left), ("SIZE", Align::Right)]);
        for (module, size) in &partition.modules {
            table.row(vec![module.clone(), size.to_string()]);
        }
        table.print();
        println!();
    }

    println!("Total: {} bytes", report.total);
}
