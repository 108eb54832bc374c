use std::path::Path;

use anyhow::Context;
use mapscope::MapFile;

/// Load and parse a map file, with the CLI's devname defaulting rule applied.
pub fn load_map(path: &Path, devname: Option<&str>) -> anyhow::Result<MapFile> {
    let map = MapFile::from_file(path, devname)
        .with_context(|| format!("failed to parse map file {}", path.display()))?;
    log::debug!(
        "parsed {} blocks, {} object rows (grammar {})",
        map.placement.blocks.len(),
        map.placement.objects.len(),
        map.placement.version
    );
    Ok(map)
}
