//! Contract rendering over a loaded template
//!
//! The renderer owns one parsed template and fills it in place: each field
//! render appends a small content stream to the target page, first a white
//! rectangle over the pre-printed placeholder, then the replacement text.
//! Signature images go in as RGB XObjects with an alpha soft mask. The
//! renderer is strictly single-document; run one renderer per concurrent
//! render and never share one across tasks.
//!
//! Lifecycle: `new` (template parsed, registry validated) -> any number of
//! render calls -> `finalize` (terminal). Mutation after `finalize` fails
//! with [`FillError::Finalized`]; repeated `finalize` calls return the same
//! bytes.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use crate::error::FillError;
use crate::fields::{field_path, Rect, Registry, Variant};
use crate::wrap::wrap_lines;

/// Resource name the embedded fill font is registered under on each page.
/// Prefixed to stay clear of whatever names the template already uses.
const FONT_RESOURCE: &str = "FillHelv";

#[derive(Debug)]
pub struct ContractRenderer<'a> {
    doc: Document,
    /// Page object ids in document order; a spec's `page` indexes this.
    pages: Vec<ObjectId>,
    registry: &'a Registry,
    /// Shared Helvetica font object, created on first text draw.
    font: Option<ObjectId>,
    xobject_seq: usize,
    /// Serialized output, present once `finalize` has run.
    finalized: Option<Vec<u8>>,
}

fn render_err(field: impl Into<String>, reason: impl ToString) -> FillError {
    FillError::Render {
        field: field.into(),
        reason: reason.to_string(),
    }
}

fn page_field(page: usize) -> String {
    format!("page[{}]", page)
}

impl<'a> ContractRenderer<'a> {
    /// Parse template bytes and validate `registry` against them. Refuses
    /// to construct on a registry that references pages the template does
    /// not have.
    pub fn new(template: &[u8], registry: &'a Registry) -> Result<Self, FillError> {
        let doc = Document::load_mem(template)
            .map_err(|e| FillError::TemplateLoad(e.to_string()))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(FillError::TemplateLoad("template has no pages".to_string()));
        }
        registry.validate(pages.len())?;
        Ok(Self {
            doc,
            pages,
            registry,
            font: None,
            xobject_seq: 0,
            finalized: None,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Render one field: white out the clear rectangle, then draw the
    /// value at the spec's anchor. Clear-before-draw on the same page is
    /// what keeps the text visible, so the order here is fixed.
    pub fn render_field(
        &mut self,
        variant: Variant,
        name: &str,
        value: &str,
        index: Option<usize>,
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        let registry = self.registry;
        let spec = registry.lookup(variant, name, index)?;
        let path = field_path(variant, name, index);

        self.clear_region(spec.page, spec.clear_rect())
            .map_err(|e| e.with_field(&path))?;
        match (spec.line_height, spec.max_chars_per_line) {
            (Some(line_height), Some(max_chars)) => self
                .draw_wrapped_text(
                    spec.page,
                    spec.x,
                    spec.y,
                    value,
                    spec.font_size,
                    line_height,
                    max_chars,
                )
                .map_err(|e| e.with_field(&path))?,
            _ => self
                .draw_text(spec.page, spec.x, spec.y, value, spec.font_size)
                .map_err(|e| e.with_field(&path))?,
        }
        debug!(field = %path, "rendered field");
        Ok(())
    }

    /// Render a repeated field into its fixed slots. Values beyond the
    /// slot count are dropped: there is no printed line for them.
    pub fn render_repeated_field<S: AsRef<str>>(
        &mut self,
        variant: Variant,
        name: &str,
        values: &[S],
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        let slots = self.registry.slots(variant, name)?;
        if values.len() > slots {
            warn!(
                field = %field_path(variant, name, None),
                dropped = values.len() - slots,
                "more values than slots, extra values dropped"
            );
        }
        for (i, value) in values.iter().take(slots).enumerate() {
            self.render_field(variant, name, value.as_ref(), Some(i))?;
        }
        Ok(())
    }

    /// Overlay a signature image on the variant's signature slot.
    pub fn render_signature(
        &mut self,
        variant: Variant,
        image_bytes: &[u8],
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        let block = *self.registry.signature(variant)?;
        let path = format!("{}/signature", variant.as_str());
        self.draw_image(block.page, block.rect(), image_bytes)
            .map_err(|e| e.with_field(&path))?;
        debug!(field = %path, "rendered signature");
        Ok(())
    }

    /// Paint an opaque white rectangle over `rect`, erasing whatever the
    /// template pre-printed there. Irreversible within this render pass.
    pub fn clear_region(&mut self, page: usize, rect: Rect) -> Result<(), FillError> {
        self.ensure_mutable()?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Ok(());
        }
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "rg",
                vec![Object::Real(1.0), Object::Real(1.0), Object::Real(1.0)],
            ),
            Operation::new(
                "re",
                vec![
                    Object::Real(rect.x),
                    Object::Real(rect.y),
                    Object::Real(rect.width),
                    Object::Real(rect.height),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page, ops)
    }

    /// Draw `text` left-anchored at `(x, y)`. Empty text draws nothing at
    /// all, not even an empty text object.
    pub fn draw_text(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        text: &str,
        font_size: f32,
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        if text.is_empty() {
            return Ok(());
        }
        self.ensure_page_font(page)?;
        self.append_content(page, text_ops(x, y, text, font_size))
    }

    /// Draw `text` wrapped to `max_chars` per line, each line dropping by
    /// `line_height` from the one above.
    pub fn draw_wrapped_text(
        &mut self,
        page: usize,
        x: f32,
        y: f32,
        text: &str,
        font_size: f32,
        line_height: f32,
        max_chars: usize,
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        if max_chars == 0 || line_height <= 0.0 {
            return Err(render_err(
                page_field(page),
                "wrapping needs a positive line height and width",
            ));
        }
        let lines = wrap_lines(text, max_chars);
        if lines.is_empty() {
            return Ok(());
        }
        self.ensure_page_font(page)?;
        let mut ops = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            ops.extend(text_ops(x, y - line_height * i as f32, line, font_size));
        }
        self.append_content(page, ops)
    }

    /// Decode a raster image and draw it scaled into `rect`. The alpha
    /// channel becomes a soft mask so signature strokes keep their
    /// transparent background.
    pub fn draw_image(
        &mut self,
        page: usize,
        rect: Rect,
        image_bytes: &[u8],
    ) -> Result<(), FillError> {
        self.ensure_mutable()?;
        let img = image::load_from_memory(image_bytes)
            .map_err(|e| render_err(page_field(page), e))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(render_err(page_field(page), "image has zero dimensions"));
        }

        let pixel_count = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in img.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let smask_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha).map_err(|e| render_err(page_field(page), e))?,
        ));
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
                "SMask" => Object::Reference(smask_id),
            },
            deflate(&rgb).map_err(|e| render_err(page_field(page), e))?,
        ));

        let name = format!("FillSig{}", self.xobject_seq);
        self.xobject_seq += 1;
        self.register_page_resource(page, "XObject", &name, image_id)?;

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(rect.width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(rect.height),
                    Object::Real(rect.x),
                    Object::Real(rect.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page, ops)
    }

    /// Serialize the filled document. Terminal: no render call is accepted
    /// afterwards. Calling again returns the same bytes.
    pub fn finalize(&mut self) -> Result<Vec<u8>, FillError> {
        if let Some(bytes) = &self.finalized {
            return Ok(bytes.clone());
        }
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| FillError::Serialization(e.to_string()))?;
        self.finalized = Some(out.clone());
        Ok(out)
    }

    fn ensure_mutable(&self) -> Result<(), FillError> {
        if self.finalized.is_some() {
            return Err(FillError::Finalized);
        }
        Ok(())
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, FillError> {
        self.pages
            .get(page)
            .copied()
            .ok_or_else(|| render_err(page_field(page), "page index out of range"))
    }

    /// Append a content stream to the page, preserving whatever streams
    /// the template already has.
    fn append_content(&mut self, page: usize, operations: Vec<Operation>) -> Result<(), FillError> {
        let page_id = self.page_id(page)?;
        let data = Content { operations }
            .encode()
            .map_err(|e| FillError::Serialization(e.to_string()))?;
        let stream_id = self.doc.add_object(Stream::new(dictionary! {}, data));

        let page_dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| render_err(page_field(page), e))?;
        let new_ref = Object::Reference(stream_id);
        let contents = match page_dict.get(b"Contents") {
            Ok(Object::Array(existing)) => {
                let mut arr = existing.clone();
                arr.push(new_ref);
                Object::Array(arr)
            }
            Ok(Object::Reference(existing)) => {
                Object::Array(vec![Object::Reference(*existing), new_ref])
            }
            _ => Object::Array(vec![new_ref]),
        };
        page_dict.set("Contents", contents);
        Ok(())
    }

    /// Make sure the fill font exists and is reachable from the page's
    /// resources under [`FONT_RESOURCE`].
    fn ensure_page_font(&mut self, page: usize) -> Result<(), FillError> {
        let font_id = match self.font {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                });
                self.font = Some(id);
                id
            }
        };
        self.register_page_resource(page, "Font", FONT_RESOURCE, font_id)
    }

    /// Point `Resources/<category>/<name>` on the page at `target`,
    /// wherever the template keeps that dictionary (inline, behind an
    /// indirect reference, or missing entirely).
    fn register_page_resource(
        &mut self,
        page: usize,
        category: &str,
        name: &str,
        target: ObjectId,
    ) -> Result<(), FillError> {
        let page_id = self.page_id(page)?;

        // Find where the resources and the category entry live before
        // taking any mutable borrow.
        let (res_ref, cat_ref) = {
            let page_dict = self
                .doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .map_err(|e| render_err(page_field(page), e))?;
            match page_dict.get(b"Resources") {
                Ok(Object::Reference(res_id)) => {
                    let res_dict = self
                        .doc
                        .get_object(*res_id)
                        .and_then(Object::as_dict)
                        .map_err(|e| render_err(page_field(page), e))?;
                    (Some(*res_id), category_ref(res_dict, category))
                }
                Ok(Object::Dictionary(res_dict)) => (None, category_ref(res_dict, category)),
                _ => (None, None),
            }
        };

        // Category dictionary is an indirect object: update it in place.
        if let Some(cat_id) = cat_ref {
            let cat = self
                .doc
                .get_object_mut(cat_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| render_err(page_field(page), e))?;
            cat.set(name.as_bytes().to_vec(), Object::Reference(target));
            return Ok(());
        }

        let res: &mut Dictionary = match res_ref {
            Some(res_id) => self
                .doc
                .get_object_mut(res_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| render_err(page_field(page), e))?,
            None => {
                let page_dict = self
                    .doc
                    .get_object_mut(page_id)
                    .and_then(Object::as_dict_mut)
                    .map_err(|e| render_err(page_field(page), e))?;
                if !matches!(page_dict.get(b"Resources"), Ok(Object::Dictionary(_))) {
                    page_dict.set("Resources", Dictionary::new());
                }
                match page_dict.get_mut(b"Resources") {
                    Ok(Object::Dictionary(dict)) => dict,
                    _ => {
                        return Err(render_err(
                            page_field(page),
                            "page resources are not a dictionary",
                        ))
                    }
                }
            }
        };

        if !matches!(res.get(category.as_bytes()), Ok(Object::Dictionary(_))) {
            res.set(category.as_bytes().to_vec(), Dictionary::new());
        }
        match res.get_mut(category.as_bytes()) {
            Ok(Object::Dictionary(cat)) => {
                cat.set(name.as_bytes().to_vec(), Object::Reference(target));
                Ok(())
            }
            _ => Err(render_err(
                page_field(page),
                format!("{} resources are malformed", category),
            )),
        }
    }
}

fn category_ref(res_dict: &Dictionary, category: &str) -> Option<ObjectId> {
    match res_dict.get(category.as_bytes()) {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    }
}

/// One text object: set font, move to the anchor, show the string.
fn text_ops(x: f32, y: f32, text: &str, font_size: f32) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                Object::Real(font_size),
            ],
        ),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldSpec;

    /// Blank multi-page A4 document, same shape the real template has.
    fn test_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..page_count)
            .map(|_| {
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => Object::Reference(pages_id),
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                });
                Object::Reference(page_id)
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn small_registry() -> Registry {
        let mut reg = Registry::new();
        reg.single(
            Variant::Lessee,
            "entity_name",
            FieldSpec {
                page: 0,
                x: 100.0,
                y: 700.0,
                font_size: 9.0,
                clear_width: 200.0,
                clear_height: 14.0,
                clear_offset_x: -2.0,
                clear_offset_y: -3.0,
                line_height: None,
                max_chars_per_line: None,
            },
        );
        reg
    }

    fn test_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([20, 20, 20, 255]));
        let mut out = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut out),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
        out
    }

    #[test]
    fn test_new_rejects_garbage_bytes() {
        let err = ContractRenderer::new(b"not a pdf", Registry::builtin()).unwrap_err();
        assert!(matches!(err, FillError::TemplateLoad(_)));
    }

    #[test]
    fn test_new_rejects_registry_beyond_page_count() {
        // The built-in registry needs 9 pages; a 2-page document fails
        // validation before anything renders.
        let err = ContractRenderer::new(&test_pdf(2), Registry::builtin()).unwrap_err();
        assert!(matches!(err, FillError::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_render_field_produces_page_content() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer
            .render_field(Variant::Lessee, "entity_name", "Acme Pty Ltd", None)
            .unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        // White-out first, then the text object.
        let clear_pos = text.find(" re").expect("clear rectangle missing");
        let draw_pos = text.find("Acme Pty Ltd").expect("drawn text missing");
        assert!(clear_pos < draw_pos);
    }

    #[test]
    fn test_empty_value_clears_but_draws_no_text() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer
            .render_field(Variant::Lessee, "entity_name", "", None)
            .unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains(" re"));
        assert!(!text.contains("BT"));
    }

    #[test]
    fn test_draw_text_empty_adds_nothing() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer.draw_text(0, 100.0, 700.0, "", 9.0).unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let page_dict = doc.get_object(pages[0]).unwrap().as_dict().unwrap();
        assert!(page_dict.get(b"Contents").is_err());
    }

    #[test]
    fn test_wrapped_text_descends_by_line_height() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        let input = "a".repeat(200);
        renderer
            .draw_wrapped_text(0, 60.0, 720.0, &input, 8.0, 12.0, 80)
            .unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        // ceil(200 / 80) lines, y stepping down by the line height.
        assert_eq!(text.matches("BT").count(), 3);
        assert!(text.contains("60 720 Td"));
        assert!(text.contains("60 708 Td"));
        assert!(text.contains("60 696 Td"));
    }

    #[test]
    fn test_repeated_field_drops_excess_values() {
        let mut reg = small_registry();
        reg.repeated(
            Variant::Lessee,
            "director_name",
            vec![
                FieldSpec {
                    page: 0,
                    x: 70.0,
                    y: 452.0,
                    font_size: 9.0,
                    clear_width: 220.0,
                    clear_height: 14.0,
                    clear_offset_x: -2.0,
                    clear_offset_y: -3.0,
                    line_height: None,
                    max_chars_per_line: None,
                },
                FieldSpec {
                    page: 0,
                    x: 70.0,
                    y: 430.0,
                    font_size: 9.0,
                    clear_width: 220.0,
                    clear_height: 14.0,
                    clear_offset_x: -2.0,
                    clear_offset_y: -3.0,
                    line_height: None,
                    max_chars_per_line: None,
                },
            ],
        );
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer
            .render_repeated_field(
                Variant::Lessee,
                "director_name",
                &["First", "Second", "Third", "Fourth"],
            )
            .unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("First"));
        assert!(text.contains("Second"));
        assert!(!text.contains("Third"));
        assert!(!text.contains("Fourth"));
    }

    #[test]
    fn test_render_after_finalize_fails() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer.finalize().unwrap();
        let err = renderer
            .render_field(Variant::Lessee, "entity_name", "Acme", None)
            .unwrap_err();
        assert!(matches!(err, FillError::Finalized));
    }

    #[test]
    fn test_finalize_twice_returns_same_bytes() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        renderer
            .render_field(Variant::Lessee, "entity_name", "Acme", None)
            .unwrap();
        let first = renderer.finalize().unwrap();
        let second = renderer.finalize().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_draw_image_rejects_garbage() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        let rect = Rect {
            x: 90.0,
            y: 190.0,
            width: 170.0,
            height: 55.0,
        };
        let err = renderer.draw_image(0, rect, b"definitely not an image").unwrap_err();
        assert!(matches!(err, FillError::Render { .. }));
    }

    #[test]
    fn test_draw_image_embeds_xobject_with_smask() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        let rect = Rect {
            x: 90.0,
            y: 190.0,
            width: 170.0,
            height: 55.0,
        };
        renderer.draw_image(0, rect, &test_png()).unwrap();
        let out = renderer.finalize().unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/FillSig0"));
        assert!(text.contains("/SMask"));

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("Do"));
    }

    #[test]
    fn test_unknown_field_error_carries_path() {
        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&test_pdf(1), &reg).unwrap();
        let err = renderer
            .render_field(Variant::Guarantee, "guarantor_name", "Jo", Some(0))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown field: guarantee/guarantor_name[0]"
        );
    }

    #[test]
    fn test_content_append_preserves_existing_streams() {
        // A page that already has content keeps it and gains the new
        // stream after it.
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let existing = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 10 Tf 50 800 Td (printed) Tj ET".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => Object::Reference(existing),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut template = Vec::new();
        doc.save_to(&mut template).unwrap();

        let reg = small_registry();
        let mut renderer = ContractRenderer::new(&template, &reg).unwrap();
        renderer
            .render_field(Variant::Lessee, "entity_name", "Acme", None)
            .unwrap();
        let out = renderer.finalize().unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let content = doc.get_page_content(pages[0]).unwrap();
        let text = String::from_utf8_lossy(&content);
        let printed = text.find("printed").expect("existing content lost");
        let added = text.find("Acme").expect("new content missing");
        assert!(printed < added);
    }
}
