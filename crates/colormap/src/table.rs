//! Category color tables
//!
//! Maps land-cover category codes to display colors, sourced from the
//! raster's embedded palette. Class identity is an explicit named
//! mapping validated against the palette, never a positional slice, so a
//! reordered source palette fails loudly instead of miscoloring.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Whether this is pure black
    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Hex representation, e.g. `#419bdf`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The water blue substituted for overloaded black palette entries.
pub const WATER_BLUE: Rgb = Rgb::new(65, 155, 223); // #419bdf

/// Policy for palette entries that are pure black.
///
/// The land-cover sources this pipeline targets overload black to mean
/// both "unclassified" and water; other sources use black for genuine
/// nodata, so the disambiguation is a run parameter rather than a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaletteOverride {
    /// Replace pure-black entries with the given color
    RemapBlack(Rgb),
    /// Keep black entries as-is
    KeepBlack,
}

impl Default for PaletteOverride {
    fn default() -> Self {
        PaletteOverride::RemapBlack(WATER_BLUE)
    }
}

/// Semantic land-cover classes the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandCoverClass {
    Water,
    Trees,
    FloodedVegetation,
    Crops,
    BuiltArea,
    BareGround,
    SnowIce,
    Clouds,
    Rangeland,
}

impl LandCoverClass {
    /// Human-readable legend label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Water => "Water",
            Self::Trees => "Trees",
            Self::FloodedVegetation => "Flooded vegetation",
            Self::Crops => "Crops",
            Self::BuiltArea => "Built area",
            Self::BareGround => "Bare ground",
            Self::SnowIce => "Snow/ice",
            Self::Clouds => "Clouds",
            Self::Rangeland => "Rangeland",
        }
    }

    /// Category code used by the 10 m annual land-cover product this
    /// pipeline was built around
    pub fn default_code(&self) -> u8 {
        match self {
            Self::Water => 1,
            Self::Trees => 2,
            Self::FloodedVegetation => 4,
            Self::Crops => 5,
            Self::BuiltArea => 7,
            Self::BareGround => 8,
            Self::SnowIce => 9,
            Self::Clouds => 10,
            Self::Rangeland => 11,
        }
    }
}

/// A named class bound to a concrete category code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub class: LandCoverClass,
    pub code: u8,
}

impl ClassDef {
    pub fn new(class: LandCoverClass, code: u8) -> Self {
        Self { class, code }
    }

    /// The curated class set drawn in the legend and kept by the
    /// colorizer, with the default product codes. Clouds are left out on
    /// purpose: a cloud-coded cell carries no land-cover information.
    pub fn curated_defaults() -> Vec<ClassDef> {
        use LandCoverClass::*;
        [
            Water,
            Trees,
            FloodedVegetation,
            Crops,
            BuiltArea,
            BareGround,
            SnowIce,
            Rangeland,
        ]
        .into_iter()
        .map(|class| ClassDef::new(class, class.default_code()))
        .collect()
    }
}

/// One resolved color table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColor {
    pub code: u8,
    pub label: &'static str,
    pub color: Rgb,
}

/// Ordered mapping from category code to color, restricted to the
/// curated classes. Codes are unique; order follows the class list and
/// drives the legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<CategoryColor>,
}

impl ColorTable {
    /// Build a color table by looking the given classes up in an RGBA
    /// palette indexed by category code.
    ///
    /// Every class code must have a palette entry; a palette too short
    /// for a class is a startup error, not a silent default. The black
    /// override policy is applied per entry.
    pub fn from_palette(
        palette: &[[u8; 4]],
        classes: &[ClassDef],
        policy: PaletteOverride,
    ) -> Result<ColorTable> {
        if classes.is_empty() {
            return Err(Error::EmptyTable);
        }

        let mut entries: Vec<CategoryColor> = Vec::with_capacity(classes.len());
        for def in classes {
            if entries.iter().any(|e| e.code == def.code) {
                return Err(Error::DuplicateCode(def.code));
            }

            let raw = palette
                .get(def.code as usize)
                .ok_or(Error::MissingPaletteEntry {
                    label: def.class.label(),
                    code: def.code,
                    palette_len: palette.len(),
                })?;

            let mut color = Rgb::new(raw[0], raw[1], raw[2]);
            if color.is_black() {
                if let PaletteOverride::RemapBlack(replacement) = policy {
                    color = replacement;
                }
            }

            entries.push(CategoryColor {
                code: def.code,
                label: def.class.label(),
                color,
            });
        }

        Ok(ColorTable { entries })
    }

    /// Color for a category code, if the code is curated
    pub fn get(&self, code: u8) -> Option<Rgb> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.color)
    }

    /// The ordered entries (legend order)
    pub fn entries(&self) -> &[CategoryColor] {
        &self.entries
    }

    /// The curated category codes, in table order
    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|e| e.code)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Palette with distinctive colors; water (code 1) is pure black as
    /// in the real source product.
    fn test_palette() -> Vec<[u8; 4]> {
        let mut palette = vec![[0, 0, 0, 255]; 16];
        palette[2] = [53, 130, 33, 255]; // trees
        palette[4] = [135, 209, 158, 255];
        palette[5] = [255, 219, 92, 255];
        palette[7] = [237, 2, 42, 255];
        palette[8] = [237, 233, 228, 255];
        palette[9] = [242, 250, 255, 255];
        palette[11] = [200, 200, 130, 255];
        palette
    }

    #[test]
    fn black_water_entry_is_remapped() {
        let table = ColorTable::from_palette(
            &test_palette(),
            &ClassDef::curated_defaults(),
            PaletteOverride::default(),
        )
        .unwrap();

        assert_eq!(table.get(1), Some(WATER_BLUE));
        // no entry may remain black under the default policy
        for e in table.entries() {
            assert!(!e.color.is_black(), "{} stayed black", e.label);
        }
    }

    #[test]
    fn keep_black_policy_preserves_black() {
        let table = ColorTable::from_palette(
            &test_palette(),
            &[ClassDef::new(LandCoverClass::Water, 1)],
            PaletteOverride::KeepBlack,
        )
        .unwrap();

        assert_eq!(table.get(1), Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn non_black_entries_pass_through() {
        let table = ColorTable::from_palette(
            &test_palette(),
            &ClassDef::curated_defaults(),
            PaletteOverride::default(),
        )
        .unwrap();

        assert_eq!(table.get(2), Some(Rgb::new(53, 130, 33)));
    }

    #[test]
    fn short_palette_fails_validation() {
        let palette = vec![[10, 10, 10, 255]; 4];
        let result = ColorTable::from_palette(
            &palette,
            &ClassDef::curated_defaults(),
            PaletteOverride::default(),
        );

        assert!(matches!(
            result,
            Err(Error::MissingPaletteEntry { code: 4, .. })
        ));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let classes = vec![
            ClassDef::new(LandCoverClass::Water, 1),
            ClassDef::new(LandCoverClass::Trees, 1),
        ];
        let result =
            ColorTable::from_palette(&test_palette(), &classes, PaletteOverride::default());
        assert!(matches!(result, Err(Error::DuplicateCode(1))));
    }

    #[test]
    fn table_order_follows_class_order() {
        let table = ColorTable::from_palette(
            &test_palette(),
            &ClassDef::curated_defaults(),
            PaletteOverride::default(),
        )
        .unwrap();

        let labels: Vec<&str> = table.entries().iter().map(|e| e.label).collect();
        assert_eq!(labels[0], "Water");
        assert_eq!(labels[1], "Trees");
        assert_eq!(*labels.last().unwrap(), "Rangeland");
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(WATER_BLUE.to_hex(), "#419bdf");
    }
}
