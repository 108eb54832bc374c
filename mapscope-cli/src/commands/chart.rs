use std::path::Path;

use anyhow::Context;
use mapscope::prelude::*;
use serde_json::json;

use crate::commands::common::load_map;

/// One ring of the pie chart: labels, values, and per-slice colors.
struct Ring {
    labels: Vec<String>,
    values: Vec<u64>,
    colors: Vec<String>,
}

pub fn run(
    mapfile: &Path,
    output: &Path,
    no_open: bool,
    devname: Option<&str>,
) -> anyhow::Result<()> {
    let map = load_map(mapfile, devname)?;
    let html = render_chart(&map);

    std::fs::write(output, html)
        .with_context(|| format!("failed to write chart to {}", output.display()))?;
    log::info!("chart written to {}", output.display());

    if !no_open {
        opener::open(output)
            .with_context(|| format!("failed to open {} in a viewer", output.display()))?;
    }
    Ok(())
}

// Slices sorted by module so same-colored wedges cluster; sort is stable, so
// listing order breaks ties deterministically.
fn partition_slices<'a>(map: &'a MapFile, modifier: KindModifier) -> Vec<&'a PlacedObject> {
    let mut slices: Vec<&PlacedObject> = map
        .placement
        .objects
        .iter()
        .filter(|obj| {
            map.placement
                .blocks
                .get(&obj.block)
                .is_some_and(|block| block.expected_modifier() == modifier)
        })
        .collect();
    slices.sort_by(|a, b| a.module.cmp(&b.module));
    slices
}

fn build_ring(slices: &[&PlacedObject], allocator: &mut ColorAllocator) -> Ring {
    Ring {
        labels: slices.iter().map(|obj| obj.object.clone()).collect(),
        values: slices.iter().map(|obj| obj.size).collect(),
        colors: slices
            .iter()
            .map(|obj| allocator.next_shade(&obj.module).to_string())
            .collect(),
    }
}

fn render_chart(map: &MapFile) -> String {
    let ro = partition_slices(map, KindModifier::Ro);
    let rw = partition_slices(map, KindModifier::Rw);

    // One allocator across both rings keeps a module's color identical in each
    let mut allocator = ColorAllocator::from_markers(
        ro.iter().chain(rw.iter()).map(|obj| obj.module.as_str()),
    );
    let ro_ring = build_ring(&ro, &mut allocator);
    let rw_ring = build_ring(&rw, &mut allocator);

    let figure = json!({
        "data": [
            {
                "labels": ro_ring.labels,
                "values": ro_ring.values,
                "type": "pie",
                "marker": { "colors": ro_ring.colors },
                "name": "readonly",
                "textposition": "inside",
                "domain": { "x": [0.0, 0.5], "y": [0.2, 0.8] },
                "hole": 0.35,
            },
            {
                "labels": rw_ring.labels,
                "values": rw_ring.values,
                "type": "pie",
                "marker": { "colors": rw_ring.colors },
                "name": "readwrite",
                "textposition": "inside",
                "domain": { "x": [0.5, 1.0], "y": [0.2, 0.8] },
                "hole": 0.3,
            },
        ],
        "layout": {
            "title": format!("Code Size Usage: {}", map.device()),
            "showlegend": true,
        },
    });

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Code Size Usage: {device}</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
var figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout);
</script>
</body>
</html>
"#,
        device = map.device(),
        figure = figure,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_map() -> MapFile {
        let rule = "*".repeat(79);
        let text = [
            rule.as_str(),
            "*** PLACEMENT SUMMARY",
            "***",
            "\"P1\":  place in [from 0x08000000 to 0x08000fff] { ro, code };",
            "\"P2\":  place in [from 0x20000000 to 0x20000fff] { rw };",
            "",
            "\"P1\":        0x300",
            " .text                ro code  0x08000000    0x100  main.cpp.obj",
            " .text                ro code  0x08000100    0x200  sensors.cpp.obj",
            "                             - 0x08000300   0x300",
            "",
            "\"P2\":        0x80",
            " .bss                 rw zero  0x20000000     0x80  main.cpp.obj",
            "                             - 0x20000080   0x80",
            "",
        ]
        .join("\n");
        MapFile::parse(&text, "FSP312").unwrap()
    }

    #[test]
    fn rings_split_by_block_partition() {
        let map = fixture_map();
        let ro = partition_slices(&map, KindModifier::Ro);
        let rw = partition_slices(&map, KindModifier::Rw);

        assert_eq!(ro.len(), 3); // two objects + unused
        assert_eq!(rw.len(), 2); // one object + unused
        assert!(ro.iter().all(|obj| obj.block == "P1"));
        assert!(rw.iter().all(|obj| obj.block == "P2"));
    }

    #[test]
    fn same_module_shares_color_family_across_rings() {
        let map = fixture_map();
        let ro = partition_slices(&map, KindModifier::Ro);
        let rw = partition_slices(&map, KindModifier::Rw);
        let allocator = ColorAllocator::from_markers(
            ro.iter().chain(rw.iter()).map(|obj| obj.module.as_str()),
        );
        assert_eq!(
            allocator.base_color("main.cpp.obj"),
            allocator.base_color("main.cpp.obj")
        );
        assert_ne!(
            allocator.base_color("main.cpp.obj"),
            allocator.base_color("sensors.cpp.obj")
        );
    }

    #[test]
    fn chart_html_is_standalone_and_deterministic() {
        let map = fixture_map();
        let first = render_chart(&map);
        let second = render_chart(&map);
        assert_eq!(first, second);
        assert!(first.contains("Plotly.newPlot"));
        assert!(first.contains("Code Size Usage: FSP312"));
        assert!(first.contains("\"unused\""));
        assert!(first.contains("rgb(100, 100, 100)"));
    }
}
