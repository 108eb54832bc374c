//! Size aggregation over the placement tables.
//!
//! [`SizeReport`] pivots the flat object table into per-module totals within the
//! read-only and read-write partitions, plus per-block and device-wide totals.
//! An object's partition comes from its owning block's identity, not from the
//! individual line. All maps are sorted, so rendering the same tables twice
//! produces byte-identical output.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::placement::{KindModifier, PlacementSummary};

/// Per-partition slice of the report: the partition total and its module totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartitionReport {
    /// Sum of all object sizes in this partition, unused remainder included.
    pub total: u64,
    /// Module name to summed object size, sorted by module name.
    pub modules: BTreeMap<String, u64>,
}

/// The aggregated size report for one map file.
#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    /// Device label the metrics are keyed under.
    pub device: String,
    /// Sum of both partitions.
    pub total: u64,
    /// Read-only partition (code block).
    pub ro: PartitionReport,
    /// Read-write partition (all other blocks).
    pub rw: PartitionReport,
    /// Declared size per block, sorted by block label.
    pub blocks: BTreeMap<String, u64>,
}

impl SizeReport {
    /// Aggregate the placement tables under the given device label.
    pub fn new(device: &str, placement: &PlacementSummary) -> SizeReport {
        let mut ro = PartitionReport::default();
        let mut rw = PartitionReport::default();

        for obj in &placement.objects {
            let partition = match placement.blocks.get(&obj.block) {
                Some(block) => match block.expected_modifier() {
                    KindModifier::Ro => &mut ro,
                    KindModifier::Rw => &mut rw,
                },
                // objects always come out of a declared block, but stay total-safe
                None => &mut rw,
            };
            partition.total += obj.size;
            *partition.modules.entry(obj.module.clone()).or_insert(0) += obj.size;
        }

        let blocks = placement
            .blocks
            .values()
            .map(|block| (block.name.clone(), block.size))
            .collect();

        SizeReport {
            device: device.to_string(),
            total: ro.total + rw.total,
            ro,
            rw,
            blocks,
        }
    }

    /// The partition slice for one modifier.
    pub fn partition(&self, modifier: KindModifier) -> &PartitionReport {
        match modifier {
            KindModifier::Ro => &self.ro,
            KindModifier::Rw => &self.rw,
        }
    }

    /// Render the report as build-metric service messages.
    ///
    /// One line per metric, in a fixed deterministic order: the device total,
    /// then per partition its total followed by its module totals:
    ///
    /// ```text
    /// ##teamcity[buildStatisticValue key='FSP312.total' value='187264']
    /// ##teamcity[buildStatisticValue key='FSP312.ro.total' value='121200']
    /// ##teamcity[buildStatisticValue key='FSP312.ro.main.cpp.obj' value='9000']
    /// ```
    pub fn teamcity_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let device = metric_key(&self.device);

        lines.push(statistic(&format!("{device}.total"), self.total));
        for modifier in [KindModifier::Ro, KindModifier::Rw] {
            let partition = self.partition(modifier);
            lines.push(statistic(
                &format!("{device}.{modifier}.total"),
                partition.total,
            ));
            for (module, size) in &partition.modules {
                lines.push(statistic(
                    &format!("{device}.{modifier}.{}", metric_key(module)),
                    *size,
                ));
            }
        }
        lines
    }
}

fn statistic(key: &str, value: u64) -> String {
    format!("##teamcity[buildStatisticValue key='{key}' value='{value}']")
}

// Service-message values cannot contain quotes, pipes or brackets; module names
// occasionally do.
fn metric_key(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\'' | '|' | '[' | ']' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
