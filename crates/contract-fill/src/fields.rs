//! Field coordinate registry for the lease contract template
//!
//! Every fillable field of the contract maps to a position on a specific
//! template page, plus a white-out rectangle sized to erase the pre-printed
//! placeholder before the value is drawn. Repeated sections (directors,
//! guarantors, equipment rows) are fixed-capacity slot lists, one spec per
//! slot, because each slot has its own printed line on the page.
//!
//! The registry is pure data, compiled in once and never mutated at
//! runtime. Pages that restate a field (the execution page restates the
//! entity name, the schedule page restates the equipment grid) get a
//! variant subtree whose specs fully replace the default ones; a field
//! missing from a variant subtree falls back to the default spec.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::FillError;

/// Named page-group of the contract template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Lease schedule and general terms. The default subtree.
    Lessee,
    /// Execution page (page 4 of the printed document).
    LesseePage4,
    /// Guarantee and indemnity page.
    Guarantee,
    /// Direct debit request page.
    DirectDebit,
    /// Equipment schedule grid.
    EquipmentSchedule,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Lessee => "lessee",
            Variant::LesseePage4 => "lessee_page4",
            Variant::Guarantee => "guarantee",
            Variant::DirectDebit => "direct_debit",
            Variant::EquipmentSchedule => "equipment_schedule",
        }
    }
}

/// An axis-aligned rectangle in template coordinates (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Position, size and white-out geometry for one fillable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// 0-based index into the loaded template's pages.
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// White-out rectangle dimensions. Zero means nothing is cleared.
    pub clear_width: f32,
    pub clear_height: f32,
    /// Offset of the white-out rectangle relative to the text anchor.
    pub clear_offset_x: f32,
    pub clear_offset_y: f32,
    /// Set on free-text fields that wrap over multiple lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars_per_line: Option<usize>,
}

impl FieldSpec {
    /// The white-out rectangle in page coordinates.
    pub fn clear_rect(&self) -> Rect {
        Rect {
            x: self.x + self.clear_offset_x,
            y: self.y + self.clear_offset_y,
            width: self.clear_width,
            height: self.clear_height,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        self.line_height.is_some() && self.max_chars_per_line.is_some()
    }

    fn clear_at(mut self, dx: f32, dy: f32) -> Self {
        self.clear_offset_x = dx;
        self.clear_offset_y = dy;
        self
    }

    fn clear_size(mut self, width: f32, height: f32) -> Self {
        self.clear_width = width;
        self.clear_height = height;
        self
    }

    fn wrapped(mut self, line_height: f32, max_chars_per_line: usize) -> Self {
        self.line_height = Some(line_height);
        self.max_chars_per_line = Some(max_chars_per_line);
        self
    }
}

/// Where a signature image is overlaid. One fixed slot per variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignatureBlock {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SignatureBlock {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A field is either a single slot or a fixed list of slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldDef {
    Single(FieldSpec),
    Repeated(Vec<FieldSpec>),
}

#[derive(Debug, Clone, Default)]
struct VariantFields {
    fields: HashMap<&'static str, FieldDef>,
    signature: Option<SignatureBlock>,
}

/// Immutable lookup table from (variant, field name, slot) to [`FieldSpec`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    variants: HashMap<Variant, VariantFields>,
}

/// Full path of a field for error messages and logs,
/// e.g. `guarantee/guarantor_name[1]`.
pub fn field_path(variant: Variant, name: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{}/{}[{}]", variant.as_str(), name, i),
        None => format!("{}/{}", variant.as_str(), name),
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in coordinate table for the lease contract template.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn single(&mut self, variant: Variant, name: &'static str, spec: FieldSpec) {
        self.variants
            .entry(variant)
            .or_default()
            .fields
            .insert(name, FieldDef::Single(spec));
    }

    pub fn repeated(&mut self, variant: Variant, name: &'static str, specs: Vec<FieldSpec>) {
        self.variants
            .entry(variant)
            .or_default()
            .fields
            .insert(name, FieldDef::Repeated(specs));
    }

    pub fn set_signature(&mut self, variant: Variant, block: SignatureBlock) {
        self.variants.entry(variant).or_default().signature = Some(block);
    }

    /// Resolve a field definition: the variant subtree wins outright, the
    /// default subtree is the fallback. No merging between the two.
    fn def(&self, variant: Variant, name: &str) -> Option<&FieldDef> {
        if let Some(def) = self
            .variants
            .get(&variant)
            .and_then(|v| v.fields.get(name))
        {
            return Some(def);
        }
        if variant != Variant::Lessee {
            return self
                .variants
                .get(&Variant::Lessee)
                .and_then(|v| v.fields.get(name));
        }
        None
    }

    /// Look up the spec for a field. Single fields take `index: None`;
    /// repeated fields take `Some(slot)` with the slot below the fixed
    /// list length.
    pub fn lookup(
        &self,
        variant: Variant,
        name: &str,
        index: Option<usize>,
    ) -> Result<&FieldSpec, FillError> {
        let not_found = || FillError::FieldNotFound(field_path(variant, name, index));
        match (self.def(variant, name).ok_or_else(not_found)?, index) {
            (FieldDef::Single(spec), None) => Ok(spec),
            (FieldDef::Repeated(specs), Some(i)) => specs.get(i).ok_or_else(not_found),
            _ => Err(not_found()),
        }
    }

    /// Fixed slot count for a repeated field (1 for a single field).
    pub fn slots(&self, variant: Variant, name: &str) -> Result<usize, FillError> {
        match self
            .def(variant, name)
            .ok_or_else(|| FillError::FieldNotFound(field_path(variant, name, None)))?
        {
            FieldDef::Single(_) => Ok(1),
            FieldDef::Repeated(specs) => Ok(specs.len()),
        }
    }

    /// The variant's signature slot, falling back to the default variant's.
    pub fn signature(&self, variant: Variant) -> Result<&SignatureBlock, FillError> {
        self.variants
            .get(&variant)
            .and_then(|v| v.signature.as_ref())
            .or_else(|| {
                self.variants
                    .get(&Variant::Lessee)
                    .and_then(|v| v.signature.as_ref())
            })
            .ok_or_else(|| FillError::FieldNotFound(field_path(variant, "signature", None)))
    }

    /// Check every spec against the loaded template. Run before the first
    /// render; a failure here is fatal for the whole render.
    pub fn validate(&self, page_count: usize) -> Result<(), FillError> {
        for (variant, name, index, spec) in self.all_specs() {
            let path = field_path(variant, name, index);
            if spec.page >= page_count {
                return Err(FillError::InvalidFieldSpec(format!(
                    "{}: page {} beyond template ({} pages)",
                    path, spec.page, page_count
                )));
            }
            if spec.clear_width < 0.0 || spec.clear_height < 0.0 {
                return Err(FillError::InvalidFieldSpec(format!(
                    "{}: negative clear rectangle {}x{}",
                    path, spec.clear_width, spec.clear_height
                )));
            }
            if spec.font_size <= 0.0 {
                return Err(FillError::InvalidFieldSpec(format!(
                    "{}: font size must be positive",
                    path
                )));
            }
            match (spec.line_height, spec.max_chars_per_line) {
                (None, None) => {}
                (Some(lh), Some(chars)) => {
                    if lh <= 0.0 || chars == 0 {
                        return Err(FillError::InvalidFieldSpec(format!(
                            "{}: wrapping needs a positive line height and width",
                            path
                        )));
                    }
                }
                _ => {
                    return Err(FillError::InvalidFieldSpec(format!(
                        "{}: line_height and max_chars_per_line must be set together",
                        path
                    )));
                }
            }
        }
        for (variant, fields) in &self.variants {
            if let Some(sig) = &fields.signature {
                if sig.page >= page_count {
                    return Err(FillError::InvalidFieldSpec(format!(
                        "{}/signature: page {} beyond template ({} pages)",
                        variant.as_str(),
                        sig.page,
                        page_count
                    )));
                }
                if sig.width <= 0.0 || sig.height <= 0.0 {
                    return Err(FillError::InvalidFieldSpec(format!(
                        "{}/signature: degenerate rectangle",
                        variant.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    fn all_specs(&self) -> impl Iterator<Item = (Variant, &'static str, Option<usize>, &FieldSpec)> {
        self.variants.iter().flat_map(|(variant, fields)| {
            fields.fields.iter().flat_map(move |(name, def)| {
                let specs: Vec<(Variant, &'static str, Option<usize>, &FieldSpec)> = match def {
                    FieldDef::Single(spec) => vec![(*variant, *name, None, spec)],
                    FieldDef::Repeated(specs) => specs
                        .iter()
                        .enumerate()
                        .map(|(i, spec)| (*variant, *name, Some(i), spec))
                        .collect(),
                };
                specs
            })
        })
    }
}

/// Single-line text field with the standard white-out geometry. The clear
/// rectangle hangs 2pt left and 3pt below the text anchor so it swallows
/// descenders of whatever placeholder the template pre-prints there.
fn text(page: usize, x: f32, y: f32, font_size: f32, clear_width: f32) -> FieldSpec {
    FieldSpec {
        page,
        x,
        y,
        font_size,
        clear_width,
        clear_height: font_size + 5.0,
        clear_offset_x: -2.0,
        clear_offset_y: -3.0,
        line_height: None,
        max_chars_per_line: None,
    }
}

static BUILTIN: Lazy<Registry> = Lazy::new(build_builtin);

// Coordinates below were hand-tuned against the printed template. Where a
// value looks arbitrary, it is: it was nudged until the proof print lined
// up with the pre-printed labels.
fn build_builtin() -> Registry {
    use Variant::*;

    let mut reg = Registry::new();

    // Page 1: lease schedule. Lessee details block.
    reg.single(Lessee, "entity_name", text(0, 155.0, 700.0, 9.0, 330.0));
    reg.single(Lessee, "trading_name", text(0, 155.0, 679.0, 9.0, 330.0));
    reg.single(Lessee, "abn", text(0, 155.0, 658.0, 9.0, 140.0));
    reg.single(Lessee, "address", text(0, 155.0, 637.0, 9.0, 380.0));
    reg.single(Lessee, "phone", text(0, 155.0, 616.0, 9.0, 150.0));
    reg.single(Lessee, "email", text(0, 355.0, 616.0, 9.0, 200.0));

    // Finance terms box, right-hand column.
    reg.single(Lessee, "amount_financed", text(0, 430.0, 560.0, 9.0, 110.0));
    reg.single(Lessee, "term_months", text(0, 430.0, 539.0, 9.0, 110.0));
    reg.single(Lessee, "repayment", text(0, 430.0, 518.0, 9.0, 110.0));
    reg.single(
        Lessee,
        "repayment_frequency",
        text(0, 430.0, 497.0, 9.0, 110.0),
    );

    // Director block, two printed rows.
    reg.repeated(
        Lessee,
        "director_name",
        vec![
            text(0, 70.0, 452.0, 9.0, 220.0),
            text(0, 70.0, 430.0, 9.0, 220.0),
        ],
    );
    reg.repeated(
        Lessee,
        "director_position",
        vec![
            text(0, 310.0, 452.0, 9.0, 130.0),
            text(0, 310.0, 430.0, 9.0, 130.0),
        ],
    );

    // Special conditions, page 2. Free text over a ruled box; the clear
    // rectangle blanks the whole three-line box before the wrapped lines
    // go in.
    reg.single(
        Lessee,
        "special_conditions",
        text(1, 60.0, 720.0, 8.0, 480.0)
            .clear_at(-2.0, -26.0)
            .clear_size(480.0, 35.0)
            .wrapped(11.0, 88),
    );

    // Equipment summary rows live on the schedule page; page 1 only
    // carries "as per equipment schedule".
    reg.repeated(
        Lessee,
        "equipment_description",
        vec![
            text(7, 65.0, 690.0, 9.0, 280.0),
            text(7, 65.0, 668.0, 9.0, 280.0),
            text(7, 65.0, 646.0, 9.0, 280.0),
        ],
    );
    reg.repeated(
        Lessee,
        "equipment_quantity",
        vec![
            text(7, 455.0, 690.0, 9.0, 40.0),
            text(7, 455.0, 668.0, 9.0, 40.0),
            text(7, 455.0, 646.0, 9.0, 40.0),
        ],
    );

    reg.set_signature(
        Lessee,
        SignatureBlock {
            page: 8,
            x: 90.0,
            y: 190.0,
            width: 170.0,
            height: 55.0,
        },
    );

    // Execution page restates the lessee identity above the signing lines.
    reg.single(LesseePage4, "entity_name", text(3, 140.0, 738.0, 9.0, 340.0));
    reg.single(LesseePage4, "abn", text(3, 140.0, 717.0, 9.0, 140.0));
    reg.repeated(
        LesseePage4,
        "director_name",
        vec![
            // Names sit under the ruled signing lines, not beside them.
            text(3, 95.0, 320.0, 9.0, 200.0),
            text(3, 95.0, 252.0, 9.0, 200.0),
        ],
    );
    reg.set_signature(
        LesseePage4,
        SignatureBlock {
            page: 3,
            x: 95.0,
            y: 352.0,
            width: 180.0,
            height: 50.0,
        },
    );

    // Guarantee and indemnity page.
    reg.single(Guarantee, "entity_name", text(5, 200.0, 742.0, 9.0, 290.0));
    reg.repeated(
        Guarantee,
        "guarantor_name",
        vec![
            text(5, 70.0, 600.0, 9.0, 240.0),
            text(5, 70.0, 430.0, 9.0, 240.0),
        ],
    );
    reg.repeated(
        Guarantee,
        "guarantor_address",
        vec![
            text(5, 70.0, 578.0, 9.0, 380.0),
            text(5, 70.0, 408.0, 9.0, 380.0),
        ],
    );
    reg.set_signature(
        Guarantee,
        SignatureBlock {
            page: 5,
            x: 330.0,
            y: 470.0,
            width: 170.0,
            height: 50.0,
        },
    );

    // Direct debit request page.
    reg.single(DirectDebit, "entity_name", text(6, 150.0, 750.0, 9.0, 320.0));
    reg.single(DirectDebit, "account_name", text(6, 150.0, 640.0, 9.0, 300.0));
    reg.single(DirectDebit, "institution", text(6, 150.0, 619.0, 9.0, 260.0));
    reg.single(DirectDebit, "bsb", text(6, 150.0, 598.0, 9.0, 90.0));
    reg.single(
        DirectDebit,
        "account_number",
        text(6, 290.0, 598.0, 9.0, 160.0),
    );
    reg.set_signature(
        DirectDebit,
        SignatureBlock {
            page: 6,
            x: 100.0,
            y: 260.0,
            width: 170.0,
            height: 50.0,
        },
    );

    // Equipment schedule grid. Same row names as the summary, different
    // columns; the serial and unit price columns only exist here.
    reg.repeated(
        EquipmentSchedule,
        "equipment_description",
        vec![
            text(7, 65.0, 560.0, 8.0, 230.0),
            text(7, 65.0, 536.0, 8.0, 230.0),
            text(7, 65.0, 512.0, 8.0, 230.0),
        ],
    );
    reg.repeated(
        EquipmentSchedule,
        "equipment_serial",
        vec![
            text(7, 310.0, 560.0, 8.0, 110.0),
            text(7, 310.0, 536.0, 8.0, 110.0),
            text(7, 310.0, 512.0, 8.0, 110.0),
        ],
    );
    reg.repeated(
        EquipmentSchedule,
        "equipment_quantity",
        vec![
            text(7, 432.0, 560.0, 8.0, 35.0),
            text(7, 432.0, 536.0, 8.0, 35.0),
            text(7, 432.0, 512.0, 8.0, 35.0),
        ],
    );
    reg.repeated(
        EquipmentSchedule,
        "equipment_unit_price",
        vec![
            text(7, 480.0, 560.0, 8.0, 70.0),
            text(7, 480.0, 536.0, 8.0, 70.0),
            text(7, 480.0, 512.0, 8.0, 70.0),
        ],
    );

    reg
}

/// Number of pages the built-in registry is laid out for.
pub const TEMPLATE_PAGE_COUNT: usize = 9;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_validates_against_template_page_count() {
        Registry::builtin().validate(TEMPLATE_PAGE_COUNT).unwrap();
    }

    #[test]
    fn test_builtin_rejects_shorter_template() {
        // The schedule grid sits on page 7, so a 7-page document is short.
        let err = Registry::builtin().validate(7).unwrap_err();
        assert!(matches!(err, FillError::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_lookup_single_field() {
        let spec = Registry::builtin()
            .lookup(Variant::Lessee, "entity_name", None)
            .unwrap();
        assert_eq!(spec.page, 0);
    }

    #[test]
    fn test_lookup_unknown_field_fails() {
        let err = Registry::builtin()
            .lookup(Variant::Lessee, "fax_number", None)
            .unwrap_err();
        assert!(matches!(err, FillError::FieldNotFound(_)));
        assert_eq!(err.to_string(), "unknown field: lessee/fax_number");
    }

    #[test]
    fn test_lookup_slot_beyond_capacity_fails() {
        let reg = Registry::builtin();
        assert!(reg.lookup(Variant::Lessee, "director_name", Some(1)).is_ok());
        let err = reg
            .lookup(Variant::Lessee, "director_name", Some(2))
            .unwrap_err();
        assert!(matches!(err, FillError::FieldNotFound(_)));
    }

    #[test]
    fn test_lookup_repeated_field_requires_index() {
        let err = Registry::builtin()
            .lookup(Variant::Lessee, "director_name", None)
            .unwrap_err();
        assert!(matches!(err, FillError::FieldNotFound(_)));
    }

    #[test]
    fn test_variant_override_fully_replaces_default() {
        let reg = Registry::builtin();
        let default = reg.lookup(Variant::Lessee, "entity_name", None).unwrap();
        let page4 = reg
            .lookup(Variant::LesseePage4, "entity_name", None)
            .unwrap();
        assert_eq!(page4.page, 3);
        assert!(default.page != page4.page);
        // Override coordinates, not default ones with patched page.
        assert!(default.x != page4.x || default.y != page4.y);
    }

    #[test]
    fn test_variant_falls_back_to_default_for_missing_field() {
        let reg = Registry::builtin();
        // The execution page subtree has no phone override.
        let spec = reg.lookup(Variant::LesseePage4, "phone", None).unwrap();
        let default = reg.lookup(Variant::Lessee, "phone", None).unwrap();
        assert_eq!(spec, default);
    }

    #[test]
    fn test_schedule_variant_overrides_equipment_rows() {
        let reg = Registry::builtin();
        let summary = reg
            .lookup(Variant::Lessee, "equipment_description", Some(0))
            .unwrap();
        let grid = reg
            .lookup(Variant::EquipmentSchedule, "equipment_description", Some(0))
            .unwrap();
        assert_eq!(summary.page, grid.page);
        assert!(summary.y != grid.y);
    }

    #[test]
    fn test_slots_counts_fixed_capacity() {
        let reg = Registry::builtin();
        assert_eq!(reg.slots(Variant::Lessee, "director_name").unwrap(), 2);
        assert_eq!(reg.slots(Variant::Guarantee, "guarantor_name").unwrap(), 2);
        assert_eq!(
            reg.slots(Variant::Lessee, "equipment_description").unwrap(),
            3
        );
        assert_eq!(reg.slots(Variant::Lessee, "entity_name").unwrap(), 1);
    }

    #[test]
    fn test_signature_slots_per_variant() {
        let reg = Registry::builtin();
        assert_eq!(reg.signature(Variant::Lessee).unwrap().page, 8);
        assert_eq!(reg.signature(Variant::Guarantee).unwrap().page, 5);
        assert_eq!(reg.signature(Variant::DirectDebit).unwrap().page, 6);
        // No schedule-page signature; falls back to the lessee slot.
        assert_eq!(reg.signature(Variant::EquipmentSchedule).unwrap().page, 8);
    }

    #[test]
    fn test_clear_rect_contains_nominal_text_box() {
        // The white-out must swallow the glyph box of the text drawn after
        // it: at least one descender depth below the baseline and a full
        // ascent above, starting at or left of the anchor.
        for (variant, name, index, spec) in Registry::builtin().all_specs() {
            if spec.clear_width <= 0.0 || spec.clear_height <= 0.0 {
                continue;
            }
            let path = field_path(variant, name, index);
            let rect = spec.clear_rect();
            assert!(rect.x <= spec.x, "{}: clear starts right of anchor", path);
            assert!(
                rect.y <= spec.y - 0.2 * spec.font_size,
                "{}: clear misses descenders",
                path
            );
            assert!(
                rect.y + rect.height >= spec.y + 0.75 * spec.font_size,
                "{}: clear shorter than ascent",
                path
            );
        }
    }

    #[test]
    fn test_validation_rejects_negative_clear() {
        let mut reg = Registry::new();
        let mut spec = text(0, 10.0, 10.0, 9.0, 100.0);
        spec.clear_height = -1.0;
        reg.single(Variant::Lessee, "entity_name", spec);
        let err = reg.validate(9).unwrap_err();
        assert!(matches!(err, FillError::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_validation_rejects_partial_wrap_config() {
        let mut reg = Registry::new();
        let mut spec = text(0, 10.0, 10.0, 9.0, 100.0);
        spec.line_height = Some(11.0);
        reg.single(Variant::Lessee, "special_conditions", spec);
        let err = reg.validate(9).unwrap_err();
        assert!(matches!(err, FillError::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_field_path_formats() {
        assert_eq!(
            field_path(Variant::Guarantee, "guarantor_name", Some(1)),
            "guarantee/guarantor_name[1]"
        );
        assert_eq!(
            field_path(Variant::Lessee, "entity_name", None),
            "lessee/entity_name"
        );
    }
}
