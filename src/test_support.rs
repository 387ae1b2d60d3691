//! Shared test fixtures: an in-memory engine and lopdf-built PDFs

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LoDocument, Object, Stream};

use crate::document::transform::{pixel_extent, PixelRect};
use crate::document::{
    DocumentError, EmbeddedImage, EngineDocument, PageGeometry, PdfEngine, PdfRect, Result,
    RgbPixels, ScaleFactor,
};

/// Page description for [`FakeEngine`]
#[derive(Clone)]
pub struct FakePage {
    pub width: f64,
    pub height: f64,
    pub geometry_fails: bool,
    pub render_fails: bool,
    pub walk_fails: bool,
    pub images: Vec<std::result::Result<(&'static str, Vec<u8>), String>>,
}

impl FakePage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            geometry_fails: false,
            render_fails: false,
            walk_fails: false,
            images: Vec::new(),
        }
    }

    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn broken_geometry() -> Self {
        Self {
            geometry_fails: true,
            ..Self::letter()
        }
    }

    pub fn broken_render() -> Self {
        Self {
            render_fails: true,
            ..Self::letter()
        }
    }

    pub fn with_image(mut self, ext: &'static str, bytes: &[u8]) -> Self {
        self.images.push(Ok((ext, bytes.to_vec())));
        self
    }

    pub fn with_bad_image(mut self, reason: &str) -> Self {
        self.images.push(Err(reason.to_string()));
        self
    }

    pub fn unwalkable(mut self) -> Self {
        self.walk_fails = true;
        self
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    rendered: AtomicUsize,
}

/// Deterministic engine that "renders" white pages of the right size
#[derive(Clone)]
pub struct FakeEngine {
    pages: Vec<FakePage>,
    fail_open: bool,
    counters: Arc<Counters>,
}

impl FakeEngine {
    /// Any buffer with a PDF header is accepted
    pub const BYTES: &'static [u8] = b"%PDF-1.7 fake";

    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            fail_open: false,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn letter(page_count: usize) -> Self {
        Self::new(vec![FakePage::letter(); page_count])
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn rendered(&self) -> usize {
        self.counters.rendered.load(Ordering::SeqCst)
    }
}

impl PdfEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn open(&self, _data: &[u8]) -> Result<Box<dyn EngineDocument>> {
        if self.fail_open {
            return Err(DocumentError::RenderError("no catalog".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeDocument {
            pages: self.pages.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeDocument {
    pages: Vec<FakePage>,
    counters: Arc<Counters>,
}

impl EngineDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry> {
        let page = &self.pages[index];
        if page.geometry_fails {
            return Err(DocumentError::RenderError("bad MediaBox".into()));
        }
        Ok(PageGeometry::new(index, page.width, page.height))
    }

    fn rasterize(
        &self,
        index: usize,
        scale: ScaleFactor,
        clip: Option<&PdfRect>,
    ) -> Result<RgbPixels> {
        let page = &self.pages[index];
        if page.render_fails {
            return Err(DocumentError::RenderError("corrupt content stream".into()));
        }
        self.counters.rendered.fetch_add(1, Ordering::SeqCst);

        let full_w = pixel_extent(page.width, scale);
        let full_h = pixel_extent(page.height, scale);
        let (width, height) = match clip {
            None => (full_w, full_h),
            Some(rect) => {
                let px = PixelRect::from_clip(rect, scale, full_w, full_h)
                    .ok_or_else(|| DocumentError::RenderError("empty clip".into()))?;
                (px.width, px.height)
            }
        };

        Ok(RgbPixels {
            width,
            height,
            data: vec![255; width as usize * height as usize * 3],
        })
    }

    fn embedded_images(&self, index: usize) -> Result<Vec<Result<EmbeddedImage>>> {
        let page = &self.pages[index];
        if page.walk_fails {
            return Err(DocumentError::ExtractionError("broken resources".into()));
        }
        Ok(page
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| match image {
                Ok((ext, bytes)) => Ok(EmbeddedImage {
                    xref: 10 + i as u32,
                    ext: ext.to_string(),
                    bytes: bytes.clone(),
                    width: 1,
                    height: 1,
                }),
                Err(reason) => Err(DocumentError::ExtractionError(reason.clone())),
            })
            .collect())
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a PDF with one page per `(width, height)` entry, each with a
/// filled rectangle so the renderer has something to draw.
pub fn pdf_with_pages(sizes: &[(f64, f64)]) -> Vec<u8> {
    build_pdf(sizes, |_, _| None)
}

/// Build a single letter page carrying one JPEG and one raw RGB image,
/// the JPEG referenced twice
pub fn pdf_with_images() -> Vec<u8> {
    build_pdf(&[(612.0, 792.0)], |doc, _| {
        let jpeg = doc.add_object(jpeg_image_stream(8, 6, [200, 30, 30]));
        let raw = doc.add_object(raw_rgb_image_stream(4, 3, [10, 120, 240]));
        Some(dictionary! {
            "Im0" => jpeg,
            "Im1" => raw,
            "Im2" => jpeg,
        })
    })
}

fn build_pdf<F>(sizes: &[(f64, f64)], mut xobjects: F) -> Vec<u8>
where
    F: FnMut(&mut LoDocument, usize) -> Option<lopdf::Dictionary>,
{
    let mut doc = LoDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for (index, &(width, height)) in sizes.iter().enumerate() {
        let images = xobjects(&mut doc, index);
        let mut operations = vec![
            Operation::new("rg", vec![0.2f32.into(), 0.4f32.into(), 0.6f32.into()]),
            Operation::new(
                "re",
                vec![
                    10.into(),
                    10.into(),
                    ((width - 20.0) as f32).into(),
                    ((height - 20.0) as f32).into(),
                ],
            ),
            Operation::new("f", vec![]),
        ];
        let mut resources = lopdf::Dictionary::new();
        if let Some(images) = images {
            for (i, name) in images.iter().map(|(k, _)| k.clone()).enumerate() {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        100.into(),
                        0.into(),
                        0.into(),
                        100.into(),
                        (50 + 120 * i as i64).into(),
                        50.into(),
                    ],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name)]));
                operations.push(Operation::new("Q", vec![]));
            }
            resources.set("XObject", images);
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap_or_default(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (width as f32).into(), (height as f32).into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize fixture pdf");
    out
}

/// JPEG-encoded solid image wrapped as an image XObject
pub fn jpeg_image_stream(width: u32, height: u32, color: [u8; 3]) -> Stream {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(color));
    let mut jpeg = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .expect("encode fixture jpeg");

    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
}

/// Unfiltered raw RGB image XObject
pub fn raw_rgb_image_stream(width: u32, height: u32, color: [u8; 3]) -> Stream {
    let raw: Vec<u8> = (0..width * height).flat_map(|_| color).collect();
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        raw,
    )
}
