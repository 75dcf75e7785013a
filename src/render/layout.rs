use crate::render::Point;

/// Ordered categorical axis. Requested entries come first (when present in
/// the data); categories the request does not name follow in data order so
/// that no point is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAxis {
    pub categories: Vec<String>,
}

impl CategoryAxis {
    pub fn resolve<'a, I>(present: I, requested: Option<&[String]>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: Vec<String> = Vec::new();
        for value in present {
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_string());
            }
        }
        let mut categories = Vec::with_capacity(seen.len());
        if let Some(order) = requested {
            for name in order {
                if seen.contains(name) && !categories.contains(name) {
                    categories.push(name.clone());
                }
            }
        }
        for name in seen {
            if !categories.contains(&name) {
                categories.push(name);
            }
        }
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }
}

pub fn x_axis(points: &[Point], requested: Option<&[String]>) -> CategoryAxis {
    CategoryAxis::resolve(points.iter().map(|p| p.x.as_str()), requested)
}

pub fn hue_axis(points: &[Point], requested: Option<&[String]>) -> CategoryAxis {
    CategoryAxis::resolve(points.iter().filter_map(|p| p.hue.as_deref()), requested)
}

pub fn size_axis(points: &[Point], requested: Option<&[String]>) -> CategoryAxis {
    CategoryAxis::resolve(points.iter().filter_map(|p| p.size.as_deref()), requested)
}

/// Total width shared by the dodged groups at one x position.
pub const GROUP_WIDTH: f64 = 0.8;

/// Centre offset of hue slot `slot` out of `slots` within one x position.
pub fn dodge_offset(slot: usize, slots: usize) -> f64 {
    if slots <= 1 {
        return 0.0;
    }
    let width = GROUP_WIDTH / slots as f64;
    -GROUP_WIDTH / 2.0 + width * (slot as f64 + 0.5)
}

pub fn slot_width(slots: usize) -> f64 {
    GROUP_WIDTH / slots.max(1) as f64
}

/// Deterministic offset in `[-width, width]` derived from `key`.
pub fn jitter(key: &str, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    let mut hasher = Fnv64::new();
    hasher.update(key.as_bytes());
    let unit = (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64;
    (unit * 2.0 - 1.0) * width
}

/// Marker radius for size category `slot`, growing by area.
pub fn marker_radius(slot: Option<usize>, slots: usize) -> u32 {
    const MIN_R: f64 = 2.0;
    const MAX_R: f64 = 10.0;
    let Some(slot) = slot else {
        return 4;
    };
    if slots <= 1 {
        return MAX_R as u32;
    }
    // Earlier categories are larger: size orders run from biggest to smallest.
    let t = 1.0 - slot as f64 / (slots - 1) as f64;
    let area = MIN_R * MIN_R + t * (MAX_R * MAX_R - MIN_R * MIN_R);
    area.sqrt().round() as u32
}

struct Fnv64 {
    hash: u64,
}

impl Fnv64 {
    fn new() -> Self {
        Self {
            hash: 0xcbf29ce484222325,
        }
    }

    fn update(&mut self, data: &[u8]) {
        let mut h = self.hash;
        for &b in data {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.hash = h;
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/layout.rs"]
mod tests;
