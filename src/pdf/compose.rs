//! Template composition.
//!
//! The first page of the template is the base of every output document. An
//! overlay PDF is stamped onto it as a Form XObject drawn after the
//! template's own content, so the template shows through wherever the
//! overlay draws nothing.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document as LoDocument, Object as LoObject, ObjectId as LoObjectId, Stream as LoStream};

use super::canvas::PageSize;
use crate::error::{MergeError, Result};

const OVERLAY_XOBJECT: &str = "FLOvl";

/// A loaded template, reduced to its first page on use.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    doc: LoDocument,
    page_id: LoObjectId,
    size: PageSize,
}

impl TemplateDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| MergeError::Template(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes)
            .map_err(|e| MergeError::Template(format!("{}: {}", path.display(), template_reason(e))))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = LoDocument::load_mem(bytes)
            .map_err(|e| MergeError::Template(format!("not a readable PDF ({e})")))?;
        if doc.is_encrypted() {
            return Err(MergeError::Template("template PDF is encrypted".to_string()));
        }
        let page_id = match doc.get_pages().values().next() {
            Some(id) => *id,
            None => return Err(MergeError::Template("template PDF has no pages".to_string())),
        };
        let size = page_size(&doc, page_id);
        Ok(Self { doc, page_id, size })
    }

    /// Size and origin of the first page. US Letter when it has no usable
    /// media box.
    pub fn page_size(&self) -> PageSize {
        self.size
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Stamp a one-page overlay PDF onto a copy of the first template page
    /// and return the serialized result.
    pub fn stamp(&self, overlay_pdf: &[u8]) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();
        let extra: Vec<u32> = doc.get_pages().keys().copied().filter(|n| *n > 1).collect();
        if !extra.is_empty() {
            doc.delete_pages(&extra);
        }

        let mut overlay = LoDocument::load_mem(overlay_pdf)?;
        overlay.renumber_objects_with(doc.max_id + 1);
        let overlay_page_id = match overlay.get_pages().values().next() {
            Some(id) => *id,
            None => return Err(MergeError::Pdf("overlay has no pages".to_string())),
        };
        if overlay.max_id > doc.max_id {
            doc.max_id = overlay.max_id;
        }
        doc.objects.extend(overlay.objects);

        let overlay_page = doc
            .get_object(overlay_page_id)
            .and_then(LoObject::as_dict)?
            .clone();
        let content = doc.get_page_content(overlay_page_id)?;
        let bbox = match overlay_page.get(b"MediaBox").and_then(LoObject::as_array) {
            Ok(arr) => arr.clone(),
            Err(_) => vec![
                0.into(),
                0.into(),
                LoObject::Real(self.size.width as _),
                LoObject::Real(self.size.height as _),
            ],
        };
        let overlay_resources = overlay_page
            .get(b"Resources")
            .ok()
            .and_then(|obj| resolve(&doc, obj).ok())
            .cloned()
            .unwrap_or_else(|| LoObject::Dictionary(lopdf::Dictionary::new()));

        let form_id = doc.add_object(LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "FormType" => 1,
                "BBox" => LoObject::Array(bbox),
                "Resources" => overlay_resources,
            },
            content,
        ));

        let mut resources = inherited(&doc, self.page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok().cloned())
            .unwrap_or_default();
        let mut xobjects = match resources.get(b"XObject") {
            Ok(obj) => resolve(&doc, obj)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .cloned()
                .unwrap_or_default(),
            Err(_) => lopdf::Dictionary::new(),
        };
        let name = free_name(&xobjects);
        xobjects.set(name.as_bytes().to_vec(), LoObject::Reference(form_id));
        resources.set("XObject", LoObject::Dictionary(xobjects));

        let existing = page_contents(&doc, self.page_id);
        let open_id = doc.add_object(LoStream::new(dictionary! {}, b"q\n".to_vec()));
        let draw = format!(
            "Q\nq 1 0 0 1 {:.2} {:.2} cm /{} Do Q\n",
            self.size.x0, self.size.y0, name
        );
        let draw_id = doc.add_object(LoStream::new(dictionary! {}, draw.into_bytes()));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(LoObject::Reference(open_id));
        contents.extend(existing);
        contents.push(LoObject::Reference(draw_id));

        {
            let page = doc
                .get_object_mut(self.page_id)
                .and_then(LoObject::as_dict_mut)?;
            page.set("Resources", LoObject::Dictionary(resources));
            page.set("Contents", LoObject::Array(contents));
        }

        doc.prune_objects();
        doc.renumber_objects();
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| MergeError::Pdf(format!("cannot serialize document: {e}")))?;
        Ok(out)
    }
}

fn template_reason(err: MergeError) -> String {
    match err {
        MergeError::Template(reason) => reason,
        other => other.to_string(),
    }
}

fn resolve<'a>(doc: &'a LoDocument, obj: &'a LoObject) -> lopdf::Result<&'a LoObject> {
    match obj {
        LoObject::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// Look up a page attribute, following the page tree for inheritable keys.
fn inherited<'a>(doc: &'a LoDocument, page_id: LoObjectId, key: &[u8]) -> Option<&'a LoObject> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; malformed files can have cycles in Parent.
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value).ok();
        }
        let parent = node.get(b"Parent").and_then(LoObject::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(obj: &LoObject) -> Option<f64> {
    match obj {
        LoObject::Integer(i) => Some(*i as f64),
        LoObject::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn page_size(doc: &LoDocument, page_id: LoObjectId) -> PageSize {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| resolve(doc, o).ok().and_then(number)).collect::<Vec<_>>());

    match media_box.as_deref() {
        Some(&[x0, y0, x1, y1]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => PageSize {
            x0: x0.min(x1),
            y0: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        },
        _ => {
            log::warn!("Template page has no usable MediaBox, assuming US Letter");
            PageSize::LETTER
        }
    }
}

/// The page's content streams as references, in drawing order.
fn page_contents(doc: &LoDocument, page_id: LoObjectId) -> Vec<LoObject> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(LoObject::Reference(id)) => match doc.get_object(*id) {
            Ok(LoObject::Array(items)) => items.clone(),
            _ => vec![LoObject::Reference(*id)],
        },
        Ok(LoObject::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn free_name(xobjects: &lopdf::Dictionary) -> String {
    let mut name = OVERLAY_XOBJECT.to_string();
    let mut n = 1;
    while xobjects.has(name.as_bytes()) {
        n += 1;
        name = format!("{}{}", OVERLAY_XOBJECT, n);
    }
    name
}

/// Write `bytes` to `path` through a sibling `.part` file, so a failed
/// write never leaves a truncated PDF under the final name.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let io_err = |source| MergeError::IoWrite {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&partial, bytes).map_err(io_err)?;
    if let Err(e) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(io_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;
    use crate::pdf::{PageCanvas, PdfWriter};
    use crate::render::Canvas;

    fn make_pdf(media_box: Vec<LoObject>, pages: usize, text: &str) -> Vec<u8> {
        let mut doc = LoDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids = Vec::new();
        for i in 0..pages {
            let content = format!("BT /F1 18 Tf 72 720 Td ({} {}) Tj ET", text, i + 1).into_bytes();
            let content_id = doc.add_object(LoStream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        // MediaBox and Resources inherited from the page tree root.
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, LoObject::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn letter() -> Vec<LoObject> {
        vec![0.into(), 0.into(), 612.into(), 792.into()]
    }

    fn overlay(size: PageSize) -> Vec<u8> {
        let mut canvas = PageCanvas::new(size);
        canvas.set_font(StandardFont::HelveticaBold, 12.0);
        canvas.draw_text(61.2, 712.8, "Hello Ann Lee");
        PdfWriter::new().write(&canvas.finish())
    }

    fn content_of(bytes: &[u8]) -> String {
        let doc = LoDocument::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn test_inherited_media_box() {
        let bytes = make_pdf(vec![0.into(), 0.into(), 595.into(), 842.into()], 1, "T");
        let template = TemplateDocument::from_bytes(&bytes).unwrap();
        let size = template.page_size();
        assert_eq!((size.width, size.height), (595.0, 842.0));
    }

    #[test]
    fn test_shifted_media_box_origin() {
        let bytes = make_pdf(vec![10.into(), 20.into(), 622.into(), 812.into()], 1, "T");
        let size = TemplateDocument::from_bytes(&bytes).unwrap().page_size();
        assert_eq!(size, PageSize { x0: 10.0, y0: 20.0, width: 612.0, height: 792.0 });
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let bytes = make_pdf(vec![], 1, "T");
        let size = TemplateDocument::from_bytes(&bytes).unwrap().page_size();
        assert_eq!(size, PageSize::LETTER);
    }

    #[test]
    fn test_zero_pages_rejected() {
        let bytes = make_pdf(letter(), 0, "T");
        let err = TemplateDocument::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, MergeError::Template(ref m) if m.contains("no pages")));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = TemplateDocument::from_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, MergeError::Template(_)));
    }

    #[test]
    fn test_stamp_keeps_only_first_page() {
        let template = TemplateDocument::from_bytes(&make_pdf(letter(), 3, "PAGE")).unwrap();
        assert_eq!(template.page_count(), 3);
        let out = template.stamp(&overlay(template.page_size())).unwrap();
        let doc = LoDocument::load_mem(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        // Stamping does not consume the template.
        assert_eq!(template.page_count(), 3);
    }

    #[test]
    fn test_stamp_draws_overlay_after_template() {
        let template = TemplateDocument::from_bytes(&make_pdf(letter(), 1, "TEMPLATE")).unwrap();
        let out = template.stamp(&overlay(template.page_size())).unwrap();
        let content = content_of(&out);
        let template_at = content.find("TEMPLATE").unwrap();
        let overlay_at = content.find("/FLOvl Do").unwrap();
        assert!(template_at < overlay_at);
        assert!(content.trim_start().starts_with('q'));
    }

    #[test]
    fn test_stamp_keeps_inherited_fonts() {
        let template = TemplateDocument::from_bytes(&make_pdf(letter(), 1, "T")).unwrap();
        let out = template.stamp(&overlay(template.page_size())).unwrap();
        let doc = LoDocument::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.has(b"FLOvl"));
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        write_atomic(&path, b"%PDF-1.7").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!dir.path().join("out.pdf.part").exists());
    }

    #[test]
    fn test_atomic_write_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.pdf");
        let err = write_atomic(&path, b"x").unwrap_err();
        assert!(matches!(err, MergeError::IoWrite { .. }));
        assert!(err.is_row_scoped());
    }
}
