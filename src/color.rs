//! Deterministic color assignment for chart rendering.
//!
//! Each distinct module gets a stable base color from a cyclic palette; repeated
//! slices of the same module are shaded by a multiplier that decreases linearly
//! from 1.0 towards a configurable floor, so wedges cluster visually by module
//! while staying distinguishable. The `unused` module is always a fixed neutral
//! gray regardless of palette state.
//!
//! Unlike a hash-seeded palette, assignment depends only on first-seen module
//! order and slice counts, so the same input always renders the same colors.

use std::collections::HashMap;

/// An RGB color, displayed in the `rgb(r, g, b)` form chart markup expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(
    /// Red channel.
    pub u8,
    /// Green channel.
    pub u8,
    /// Blue channel.
    pub u8,
);

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// The module every parse labels its remainder rows with.
const UNUSED_MODULE: &str = "unused";

/// Default low/medium/high channel intensities and shade floor.
const COLOR_LOW: u8 = 100;
const COLOR_MED: u8 = 175;
const COLOR_HIGH: u8 = 255;
const MIN_MULTIPLIER: f64 = 0.6;

#[derive(Debug)]
struct ModuleColor {
    base: Rgb,
    index: usize,
    count: usize,
}

/// Stateful per-module color allocator for one rendering pass.
///
/// Built from the module column of the object table (with repeats), then asked
/// for one shade per rendered slice via [`ColorAllocator::next_shade`].
#[derive(Debug)]
pub struct ColorAllocator {
    low: u8,
    min_multiplier: f64,
    assignments: HashMap<String, ModuleColor>,
}

// All distinct orderings of a channel triple, in a fixed generation order.
fn distinct_perms(triple: (u8, u8, u8)) -> Vec<Rgb> {
    let (a, b, c) = triple;
    let all = [
        (a, b, c),
        (a, c, b),
        (b, a, c),
        (b, c, a),
        (c, a, b),
        (c, b, a),
    ];
    let mut seen = Vec::new();
    for (r, g, b) in all {
        let rgb = Rgb(r, g, b);
        if !seen.contains(&rgb) {
            seen.push(rgb);
        }
    }
    seen
}

fn palette(low: u8, med: u8, high: u8) -> Vec<Rgb> {
    let mut colors = Vec::new();
    colors.extend(distinct_perms((low, low, high)));
    colors.extend(distinct_perms((low, high, high)));
    colors.extend(distinct_perms((med, med, high)));
    colors.extend(distinct_perms((med, high, high)));
    colors.push(Rgb(high, high, high));
    colors
}

impl ColorAllocator {
    /// Build an allocator from the module column of the object table.
    ///
    /// `markers` is the per-slice module name series, repeats included; the
    /// repeat count of each module drives its shade progression. Base colors are
    /// assigned in first-seen order, cycling the palette. `unused` never
    /// consumes a palette entry.
    pub fn from_markers<'a>(markers: impl IntoIterator<Item = &'a str>) -> ColorAllocator {
        Self::with_intensities(markers, COLOR_LOW, COLOR_MED, COLOR_HIGH, MIN_MULTIPLIER)
    }

    /// Build an allocator with explicit channel intensities and shade floor.
    pub fn with_intensities<'a>(
        markers: impl IntoIterator<Item = &'a str>,
        low: u8,
        med: u8,
        high: u8,
        min_multiplier: f64,
    ) -> ColorAllocator {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for marker in markers {
            if marker == UNUSED_MODULE {
                continue;
            }
            let count = counts.entry(marker).or_insert(0);
            if *count == 0 {
                order.push(marker);
            }
            *count += 1;
        }

        let palette = palette(low, med, high);
        let mut assignments = HashMap::new();
        for (i, marker) in order.iter().enumerate() {
            assignments.insert(
                marker.to_string(),
                ModuleColor {
                    base: palette[i % palette.len()],
                    index: 0,
                    count: counts[marker],
                },
            );
        }

        ColorAllocator {
            low,
            min_multiplier,
            assignments,
        }
    }

    fn gray(&self) -> Rgb {
        Rgb(self.low, self.low, self.low)
    }

    /// The stable base color for a module, without advancing any shade state.
    pub fn base_color(&self, module: &str) -> Rgb {
        self.assignments
            .get(module)
            .map(|mc| mc.base)
            .unwrap_or_else(|| self.gray())
    }

    /// The next shade for one rendered slice of `module`.
    ///
    /// Successive calls for the same module walk the multiplier down from 1.0
    /// to the floor. `unused` (and any module absent from the construction
    /// series) stays fixed gray.
    pub fn next_shade(&mut self, module: &str) -> Rgb {
        let Some(mc) = self.assignments.get_mut(module) else {
            return self.gray();
        };
        let base_multiplier = (mc.count - mc.index.min(mc.count)) as f64 / mc.count as f64;
        let multiplier = self.min_multiplier + (1.0 - self.min_multiplier) * base_multiplier;
        mc.index += 1;
        scale(mc.base, multiplier)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(color: Rgb, multiplier: f64) -> Rgb {
    let apply = |c: u8| (f64::from(c) * multiplier) as u8;
    Rgb(apply(color.0), apply(color.1), apply(color.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_no_duplicates() {
        let colors = palette(COLOR_LOW, COLOR_MED, COLOR_HIGH);
        for (i, a) in colors.iter().enumerate() {
            for b in colors.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        // 3 + 3 + 3 + 3 + 1 distinct arrangements
        assert_eq!(colors.len(), 13);
    }

    #[test]
    fn assignment_is_deterministic() {
        let markers = ["main.o", "sensors.o", "main.o", "unused", "startup.o"];
        let a = ColorAllocator::from_markers(markers);
        let b = ColorAllocator::from_markers(markers);
        for module in ["main.o", "sensors.o", "startup.o"] {
            assert_eq!(a.base_color(module), b.base_color(module));
        }
    }

    #[test]
    fn first_slice_gets_full_intensity() {
        let mut alloc = ColorAllocator::from_markers(["main.o", "main.o"]);
        let base = alloc.base_color("main.o");
        assert_eq!(alloc.next_shade("main.o"), base);
    }

    #[test]
    fn shades_decrease_but_respect_floor() {
        let markers = vec!["mod.o"; 10];
        let mut alloc = ColorAllocator::from_markers(markers.iter().copied());
        let base = alloc.base_color("mod.o");

        let mut previous = u16::MAX;
        for _ in 0..10 {
            let shade = alloc.next_shade("mod.o");
            let brightness = u16::from(shade.0) + u16::from(shade.1) + u16::from(shade.2);
            assert!(brightness <= previous);
            previous = brightness;

            // never below the floor
            assert!(f64::from(shade.0) >= f64::from(base.0) * MIN_MULTIPLIER - 1.0);
        }
    }

    #[test]
    fn unused_is_always_gray() {
        let mut alloc = ColorAllocator::from_markers(["unused", "main.o", "unused"]);
        assert_eq!(alloc.base_color("unused"), Rgb(100, 100, 100));
        assert_eq!(alloc.next_shade("unused"), Rgb(100, 100, 100));
        assert_eq!(alloc.next_shade("unused"), Rgb(100, 100, 100));
    }

    #[test]
    fn distinct_modules_get_distinct_base_colors() {
        let alloc = ColorAllocator::from_markers(["a.o", "b.o", "c.o"]);
        assert_ne!(alloc.base_color("a.o"), alloc.base_color("b.o"));
        assert_ne!(alloc.base_color("b.o"), alloc.base_color("c.o"));
    }
}
